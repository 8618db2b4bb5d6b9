use super::*;
use crate::cli::Cli;
use clap::Parser;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("hotview").chain(args.iter().copied()))
}

#[test]
#[serial]
fn test_defaults_without_sources() {
    let temp = TempDir::new().unwrap();
    let options = ServeOptions::load(&parse(&[]), temp.path()).unwrap();
    assert_eq!(options, ServeOptions::default());
}

#[test]
#[serial]
fn test_config_file_in_cwd_is_used() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILE),
        r#"{ "port": 5000, "cors": true, "single": "app.html" }"#,
    )
    .unwrap();

    let options = ServeOptions::load(&parse(&[]), temp.path()).unwrap();

    assert_eq!(options.port, 5000);
    assert!(options.cors);
    assert_eq!(options.single, SingleSetting::File("app.html".to_string()));
}

#[test]
#[serial]
fn test_cli_flags_override_config_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILE),
        r#"{ "port": 5000, "single": true }"#,
    )
    .unwrap();

    let options =
        ServeOptions::load(&parse(&["--port", "6000", "--single=false"]), temp.path()).unwrap();

    assert_eq!(options.port, 6000);
    assert_eq!(options.single, SingleSetting::Flag(false));
}

#[test]
#[serial]
fn test_unset_bool_flag_keeps_config_value() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILE), r#"{ "preview": true }"#).unwrap();

    let options = ServeOptions::load(&parse(&[]), temp.path()).unwrap();

    assert!(options.preview);
}

#[test]
#[serial]
fn test_env_overrides_config_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILE), r#"{ "port": 5000 }"#).unwrap();

    unsafe {
        std::env::set_var("HOTVIEW_PORT", "7000");
    }
    let result = ServeOptions::load(&parse(&[]), temp.path());
    unsafe {
        std::env::remove_var("HOTVIEW_PORT");
    }

    assert_eq!(result.unwrap().port, 7000);
}

#[test]
#[serial]
fn test_explicit_missing_config_is_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("custom.json");
    let args = parse(&["--config", missing.to_str().unwrap()]);

    let err = ServeOptions::load(&args, temp.path()).unwrap_err();

    assert!(err.to_string().contains("Config file not found"));
}

#[test]
#[serial]
fn test_wrong_type_is_invalid_value() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILE), r#"{ "port": "http" }"#).unwrap();

    let err = ServeOptions::load(&parse(&[]), temp.path()).unwrap_err();

    assert!(err.to_string().contains("Invalid value for 'port'"));
}
