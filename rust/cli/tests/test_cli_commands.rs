use netchess_cli::run;
use serial_test::serial;

const VARS: &[&str] = &[
    "NETCHESS_CONFIG",
    "NETCHESS_NAME",
    "NETCHESS_IP",
    "NETCHESS_PORT",
    "NETCHESS_LAYOUT",
    "NETCHESS_AUTO_PROMOTE",
];

fn clear_env() {
    for var in VARS {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

fn run_cli(args: &[&str]) -> (i32, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut argv = vec!["netchess"];
    argv.extend_from_slice(args);
    let code = run(argv, &mut out, &mut err);
    (
        code,
        String::from_utf8_lossy(&out).into_owned(),
        String::from_utf8_lossy(&err).into_owned(),
    )
}

#[test]
fn test_help_lists_subcommands() {
    let (code, out, _) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for c in ["play", "board", "cfg"] {
        assert!(out.contains(c), "help should mention {c}: {out}");
    }
}

#[test]
fn test_play_help_lists_flags() {
    let (code, out, _) = run_cli(&["play", "--help"]);
    assert_eq!(code, 0);
    for flag in ["--script", "--record", "--port", "--auto-promote", "--log-format"] {
        assert!(out.contains(flag), "play help should mention {flag}");
    }
}

#[test]
fn test_missing_subcommand_exits_2() {
    let (code, out, err) = run_cli(&[]);
    assert_eq!(code, 2);
    assert!(out.is_empty());
    assert!(err.contains("Usage: netchess <command> [options]"));
}

#[test]
#[serial]
fn test_board_renders_configured_layout() {
    clear_env();
    let (code, out, err) = run_cli(&["board"]);
    assert_eq!(code, 0, "stderr: {err}");
    assert!(out.contains("8|rnbqkbnr|8"));
    assert!(out.contains("1|RNBQKBNR|1"));
}

#[test]
fn test_board_with_explicit_layout() {
    let layout = format!("....K{}k..", ".".repeat(56));
    let (code, out, err) = run_cli(&["board", "--layout", &layout]);
    assert_eq!(code, 0);
    assert!(out.contains("1|....K...|1"));
    assert!(out.contains("8|.....k..|8"));
    assert!(out.contains("2 pieces: 1 white, 1 black"));
    assert!(err.is_empty());
}

#[test]
fn test_board_rejects_short_layout() {
    let (code, out, err) = run_cli(&["board", "--layout", "RNBQKBNR"]);
    assert_eq!(code, 2);
    assert!(out.is_empty());
    assert_eq!(
        err,
        "Error: Board layout must be exactly 64 characters, got 8\n"
    );
}

#[test]
fn test_bad_flag_value_exits_2() {
    let (code, _, err) = run_cli(&["cfg", "--ip", "not-an-ip"]);
    assert_eq!(code, 2);
    assert!(err.contains("--ip"));
}
