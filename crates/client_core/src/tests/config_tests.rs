use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("configurator_settings_{suffix}.toml"));
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/configurator.toml"), |_| None);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.length_scale(), LengthScale::SI);
    assert_eq!(settings.save_error_cooldown(), Duration::from_secs(5));
}

#[test]
fn file_values_are_overridden_by_environment() {
    let path = temp_settings_file(
        "server_url = \"http://lab:9000\"\nlength_scale = 100.0\nrequest_timeout_ms = 250\n",
    );
    let env_values = HashMap::from([
        ("APP__SERVER_URL", "http://override:1200"),
        ("APP__SAVE_ERROR_COOLDOWN_MS", "100"),
    ]);

    let settings = load_settings_from(&path, |key| env_values.get(key).map(|v| v.to_string()));
    assert_eq!(settings.server_url, "http://override:1200");
    assert_eq!(settings.length_scale, 100.0);
    assert_eq!(settings.request_timeout(), Duration::from_millis(250));
    assert_eq!(settings.save_error_cooldown(), Duration::from_millis(100));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn unparsable_overrides_are_ignored() {
    let env_values = HashMap::from([
        ("APP__LENGTH_SCALE", "lots"),
        ("APP__REQUEST_TIMEOUT_MS", "-1"),
    ]);
    let settings = load_settings_from(Path::new("/nonexistent/configurator.toml"), |key| {
        env_values.get(key).map(|v| v.to_string())
    });
    assert_eq!(settings.length_scale, 1.0);
    assert_eq!(settings.request_timeout_ms, 10_000);
}

#[test]
fn invalid_length_scale_falls_back_to_si() {
    let settings = Settings {
        length_scale: 0.0,
        ..Settings::default()
    };
    assert_eq!(settings.length_scale(), LengthScale::SI);
}
