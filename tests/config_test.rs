//! Tests for layered settings loading

use tfwrap::config::{ChdirStyle, Settings};

#[test]
fn given_compiled_defaults_when_inspected_then_terraform_on_path() {
    let settings = Settings::default();

    assert_eq!(settings.bin_path, "terraform");
    assert_eq!(settings.parallelism, None);
    assert!(settings.inherit_env);
    assert_eq!(settings.chdir_style, ChdirStyle::Chdir);
}

#[test]
fn given_env_overrides_when_loading_then_they_win() {
    // Keep all env mutation inside this one test; the other tests in this
    // binary do not touch the environment.
    std::env::set_var("TFWRAP_BIN_PATH", "/opt/tf/terraform");
    std::env::set_var("TFWRAP_PARALLELISM", "7");
    std::env::set_var("TFWRAP_CHDIR_STYLE", "positional");

    let settings = Settings::load().unwrap();

    std::env::remove_var("TFWRAP_BIN_PATH");
    std::env::remove_var("TFWRAP_PARALLELISM");
    std::env::remove_var("TFWRAP_CHDIR_STYLE");

    assert_eq!(settings.bin_path, "/opt/tf/terraform");
    assert_eq!(settings.parallelism, Some(7));
    assert_eq!(settings.chdir_style, ChdirStyle::Positional);
}

#[test]
fn given_toml_config_when_parsing_then_chdir_style_lowercase() {
    let parsed: Settings =
        toml::from_str("bin_path = \"tf\"\nchdir_style = \"positional\"").unwrap();

    assert_eq!(parsed.bin_path, "tf");
    assert_eq!(parsed.chdir_style, ChdirStyle::Positional);
}

#[test]
fn given_settings_when_rendered_then_toml_round_trips() {
    let settings = Settings {
        bin_path: "/usr/local/bin/terraform".to_string(),
        parallelism: Some(12),
        inherit_env: false,
        chdir_style: ChdirStyle::Positional,
    };

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
}
