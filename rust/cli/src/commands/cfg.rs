//! Configuration command handler.
//!
//! Prints every configuration value together with where it came from
//! (default, configuration file, environment or command line).
//!
//! # Example Output
//!
//! ```json
//! {
//!   "port": {
//!     "value": 3100,
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::cli::ConfigArgs;
use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

/// Handle the cfg command.
///
/// # Errors
///
/// Returns `CliError::Config` if configuration loading fails.
/// Returns `CliError::Io` if writing to output stream fails.
pub fn handle_cfg_command(
    overrides: &ConfigArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let resolved = match config::load_with_sources(overrides) {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "name": {
            "value": config.name,
            "source": sources.name,
        },
        "ip": {
            "value": config.ip.to_string(),
            "source": sources.ip,
        },
        "port": {
            "value": config.port,
            "source": sources.port,
        },
        "layout": {
            "value": config.layout,
            "source": sources.layout,
        },
        "auto_promote": {
            "value": config.auto_promote,
            "source": sources.auto_promote,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cfg_displays_json_output() {
        let mut out = Vec::new();
        let mut err = Vec::new();

        let result = handle_cfg_command(&ConfigArgs::default(), &mut out, &mut err);
        assert!(result.is_ok(), "cfg command should succeed");

        let output = String::from_utf8(out).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&output).expect("cfg output should be valid JSON");
        for key in ["name", "ip", "port", "layout", "auto_promote"] {
            assert!(json[key].get("value").is_some(), "missing value for {key}");
            assert!(json[key]["source"].is_string(), "missing source for {key}");
        }
    }

    #[test]
    fn test_cfg_flags_win() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let overrides = ConfigArgs {
            port: Some(4100),
            name: Some("Ada".into()),
            ..ConfigArgs::default()
        };

        handle_cfg_command(&overrides, &mut out, &mut err).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["port"]["value"].as_u64(), Some(4100));
        assert_eq!(json["port"]["source"].as_str(), Some("cli"));
        assert_eq!(json["name"]["value"].as_str(), Some("Ada"));
    }

    #[test]
    fn test_cfg_reports_invalid_flag_values() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let overrides = ConfigArgs {
            port: Some(22),
            ..ConfigArgs::default()
        };

        let result = handle_cfg_command(&overrides, &mut out, &mut err);

        assert!(matches!(result, Err(CliError::Config(_))));
        let error_output = String::from_utf8(err).unwrap();
        assert!(error_output.starts_with("Error: Invalid configuration"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_cfg_writes_pretty_json() {
        let mut out = Vec::new();
        let mut err = Vec::new();

        handle_cfg_command(&ConfigArgs::default(), &mut out, &mut err).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains('\n'), "output should be pretty-printed");
        assert!(output.contains("  "), "output should be indented");
        assert!(err.is_empty(), "should not write to stderr on success");
    }
}
