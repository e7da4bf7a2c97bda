use netchess_cli::run;
use serde_json::Value;
use serial_test::serial;
use std::io::Write;

fn clear_env() {
    for var in [
        "NETCHESS_CONFIG",
        "NETCHESS_NAME",
        "NETCHESS_IP",
        "NETCHESS_PORT",
        "NETCHESS_LAYOUT",
        "NETCHESS_AUTO_PROMOTE",
    ] {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

fn cfg(extra: &[&str]) -> (i32, Value, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut argv = vec!["netchess", "cfg"];
    argv.extend_from_slice(extra);
    let code = run(argv, &mut out, &mut err);
    let json = if code == 0 {
        serde_json::from_slice(&out).unwrap()
    } else {
        Value::Null
    };
    (code, json, String::from_utf8_lossy(&err).into_owned())
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn defaults_when_nothing_is_set() {
    clear_env();
    let (code, json, _) = cfg(&[]);
    assert_eq!(code, 0);
    assert_eq!(json["port"]["value"].as_u64(), Some(3100));
    assert_eq!(json["port"]["source"].as_str(), Some("default"));
    assert_eq!(json["ip"]["value"].as_str(), Some("127.0.0.1"));
    assert!(json["name"]["value"].is_null());
    assert_eq!(json["auto_promote"]["value"].as_bool(), Some(true));
}

#[test]
#[serial]
fn cli_over_env_over_file() {
    clear_env();
    let file = write_config("name = \"FromFile\"\nport = 4000\nip = \"10.0.0.5\"\nauto_promote = false\n");
    unsafe {
        std::env::set_var("NETCHESS_CONFIG", file.path());
        std::env::set_var("NETCHESS_PORT", "4001");
    }

    let (code, json, _) = cfg(&[]);
    assert_eq!(code, 0);
    assert_eq!(json["name"]["value"].as_str(), Some("FromFile"));
    assert_eq!(json["name"]["source"].as_str(), Some("file"));
    assert_eq!(json["ip"]["value"].as_str(), Some("10.0.0.5"));
    assert_eq!(json["port"]["value"].as_u64(), Some(4001));
    assert_eq!(json["port"]["source"].as_str(), Some("env"));
    assert_eq!(json["auto_promote"]["value"].as_bool(), Some(false));
    assert_eq!(json["auto_promote"]["source"].as_str(), Some("file"));

    let (code, json, _) = cfg(&["--port", "4002", "--auto-promote", "true"]);
    assert_eq!(code, 0);
    assert_eq!(json["port"]["value"].as_u64(), Some(4002));
    assert_eq!(json["port"]["source"].as_str(), Some("cli"));
    assert_eq!(json["auto_promote"]["value"].as_bool(), Some(true));
    assert_eq!(json["auto_promote"]["source"].as_str(), Some("cli"));

    clear_env();
}

#[test]
#[serial]
fn env_booleans_accept_words() {
    clear_env();
    unsafe {
        std::env::set_var("NETCHESS_AUTO_PROMOTE", "off");
    }
    let (code, json, _) = cfg(&[]);
    assert_eq!(code, 0);
    assert_eq!(json["auto_promote"]["value"].as_bool(), Some(false));
    assert_eq!(json["auto_promote"]["source"].as_str(), Some("env"));

    unsafe {
        std::env::set_var("NETCHESS_AUTO_PROMOTE", "sometimes");
    }
    let (code, _, err) = cfg(&[]);
    assert_eq!(code, 2);
    assert!(err.contains("Invalid auto_promote"));
    clear_env();
}

#[test]
#[serial]
fn invalid_port_in_env_is_rejected() {
    clear_env();
    unsafe {
        std::env::set_var("NETCHESS_PORT", "1024");
    }
    let (code, _, err) = cfg(&[]);
    assert_eq!(code, 2);
    assert!(err.starts_with("Error: Invalid configuration: port must be between 1025 and 65534"));
    clear_env();
}

#[test]
#[serial]
fn broken_config_file_is_reported() {
    clear_env();
    let file = write_config("port = \"not a number\"\n");
    unsafe {
        std::env::set_var("NETCHESS_CONFIG", file.path());
    }
    let (code, _, err) = cfg(&[]);
    assert_eq!(code, 2);
    assert!(err.contains("cannot parse config file"));
    clear_env();
}

#[test]
#[serial]
fn layout_from_env_must_parse() {
    clear_env();
    unsafe {
        std::env::set_var("NETCHESS_LAYOUT", "K");
    }
    let (code, _, err) = cfg(&[]);
    assert_eq!(code, 2);
    assert!(err.contains("layout: Board layout must be exactly 64 characters, got 1"));
    clear_env();
}
