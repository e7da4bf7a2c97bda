use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;

use netchess_engine::board::{BoardLayout, STANDARD_LAYOUT};
use netchess_net::config::is_valid_port;
use netchess_net::{DEFAULT_IP, DEFAULT_PORT, SessionConfig};

use crate::cli::ConfigArgs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Display name claimed on Listen/Connect. `None` keeps the side default.
    pub name: Option<String>,
    pub ip: IpAddr,
    pub port: u16,
    pub layout: String,
    /// Whether a second click onto the last rank promotes without asking.
    pub auto_promote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
    Cli,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub name: ValueSource,
    pub ip: ValueSource,
    pub port: ValueSource,
    pub layout: ValueSource,
    pub auto_promote: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            name: ValueSource::Default,
            ip: ValueSource::Default,
            port: ValueSource::Default,
            layout: ValueSource::Default,
            auto_promote: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            ip: DEFAULT_IP,
            port: DEFAULT_PORT,
            layout: STANDARD_LAYOUT.to_string(),
            auto_promote: true,
        }
    }
}

impl Config {
    /// Protocol defaults seeded from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ip: self.ip,
            port: self.port,
            layout: self.layout.clone(),
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => f.write_str(msg),
        }
    }
}

/// Defaults, then the `NETCHESS_CONFIG` file, then `NETCHESS_*` variables,
/// then command-line flags.
pub fn load_with_sources(cli: &ConfigArgs) -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var("NETCHESS_CONFIG")
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.name {
            cfg.name = Some(v);
            sources.name = ValueSource::File;
        }
        if let Some(v) = f.ip {
            cfg.ip = parse_ip(&v)?;
            sources.ip = ValueSource::File;
        }
        if let Some(v) = f.port {
            cfg.port = v;
            sources.port = ValueSource::File;
        }
        if let Some(v) = f.layout {
            cfg.layout = v;
            sources.layout = ValueSource::File;
        }
        if let Some(v) = f.auto_promote {
            cfg.auto_promote = v;
            sources.auto_promote = ValueSource::File;
        }
    }

    if let Ok(name) = std::env::var("NETCHESS_NAME")
        && !name.is_empty()
    {
        cfg.name = Some(name);
        sources.name = ValueSource::Env;
    }
    if let Ok(ip) = std::env::var("NETCHESS_IP")
        && !ip.is_empty()
    {
        cfg.ip = parse_ip(&ip)?;
        sources.ip = ValueSource::Env;
    }
    if let Ok(port) = std::env::var("NETCHESS_PORT")
        && !port.is_empty()
    {
        cfg.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("Invalid port '{}'", port)))?;
        sources.port = ValueSource::Env;
    }
    if let Ok(layout) = std::env::var("NETCHESS_LAYOUT")
        && !layout.is_empty()
    {
        cfg.layout = layout;
        sources.layout = ValueSource::Env;
    }
    if let Ok(flag) = std::env::var("NETCHESS_AUTO_PROMOTE")
        && !flag.is_empty()
    {
        cfg.auto_promote = parse_bool(&flag)
            .ok_or_else(|| ConfigError::Invalid("Invalid auto_promote".into()))?;
        sources.auto_promote = ValueSource::Env;
    }

    if let Some(name) = &cli.name {
        cfg.name = Some(name.clone());
        sources.name = ValueSource::Cli;
    }
    if let Some(ip) = cli.ip {
        cfg.ip = ip;
        sources.ip = ValueSource::Cli;
    }
    if let Some(port) = cli.port {
        cfg.port = port;
        sources.port = ValueSource::Cli;
    }
    if let Some(layout) = &cli.layout {
        cfg.layout = layout.clone();
        sources.layout = ValueSource::Cli;
    }
    if let Some(flag) = cli.auto_promote {
        cfg.auto_promote = flag;
        sources.auto_promote = ValueSource::Cli;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    auto_promote: Option<bool>,
}

fn parse_ip(s: &str) -> Result<IpAddr, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid ip '{}'", s)))
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !is_valid_port(cfg.port as u32) {
        return Err(ConfigError::Invalid(format!(
            "port must be between 1025 and 65534, got {}",
            cfg.port
        )));
    }
    if cfg.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ConfigError::Invalid("name must not be blank".into()));
    }
    BoardLayout::parse(&cfg.layout).map_err(|e| ConfigError::Invalid(format!("layout: {}", e)))?;
    Ok(())
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_both_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn validate_rejects_reserved_port() {
        let cfg = Config {
            port: 80,
            ..Config::default()
        };
        assert!(validate(&cfg).unwrap_err().to_string().contains("1025"));
    }

    #[test]
    fn validate_rejects_short_layout() {
        let cfg = Config {
            layout: "RNBQKBNR".into(),
            ..Config::default()
        };
        assert!(validate(&cfg).unwrap_err().to_string().starts_with("layout"));
    }

    #[test]
    fn session_config_keeps_default_names() {
        let cfg = Config {
            port: 4500,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.port, 4500);
        assert_eq!(session.player_names, SessionConfig::default().player_names);
    }
}
