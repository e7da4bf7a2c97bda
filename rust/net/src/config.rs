use std::net::{IpAddr, Ipv4Addr};

use netchess_engine::board::{BoardLayout, STANDARD_LAYOUT};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 3100;
pub const DEFAULT_PLAYER_NAMES: [&str; 2] = ["Player1", "Player2"];

/// Ports below the registered range and the top port are refused.
pub fn is_valid_port(port: u32) -> bool {
    port > 1024 && port < 65535
}

/// Network and match defaults for one protocol session.
///
/// `ip` and `port` double as the "previous value" that Listen/Connect fall back
/// to when given a missing or invalid argument, and are updated on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ip: IpAddr,
    pub port: u16,
    /// Display names indexed by side.
    pub player_names: [String; 2],
    /// Layout every new match starts from.
    pub layout: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_IP,
            port: DEFAULT_PORT,
            player_names: DEFAULT_PLAYER_NAMES.map(String::from),
            layout: STANDARD_LAYOUT.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_port(self.port as u32) {
            return Err(format!("port must be between 1025 and 65534, got {}", self.port));
        }
        if self.player_names.iter().any(|n| n.trim().is_empty()) {
            return Err("player names must not be empty".to_string());
        }
        if self.player_names[0] == self.player_names[1] {
            return Err("player names must differ".to_string());
        }
        BoardLayout::parse(&self.layout).map_err(|e| format!("layout: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn port_range_excludes_both_ends() {
        assert!(!is_valid_port(1024));
        assert!(is_valid_port(1025));
        assert!(is_valid_port(65534));
        assert!(!is_valid_port(65535));
    }

    #[test]
    fn rejects_duplicate_names_and_bad_layout() {
        let mut config = SessionConfig::default();
        config.player_names = ["Sam".into(), "Sam".into()];
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.layout = "K".into();
        assert!(config.validate().unwrap_err().contains("layout"));
    }
}
