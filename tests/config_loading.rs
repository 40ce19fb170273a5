use std::io::Write;

use kitchen_metrics::DashboardConfig;

mod support;
use support::with_scoped_env;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn env_overrides_win_over_file_values() {
    let file = write_config(
        r#"
[pos]
base_url = "https://file.example.com/api"
token = "file-token"
"#,
    );

    with_scoped_env(
        &[
            ("POS_BASE_URL", Some("https://env.example.com/api")),
            ("POS_TOKEN", Some("env-token")),
        ],
        || {
            let config = DashboardConfig::from_file(file.path()).unwrap().apply_env();
            assert_eq!(config.pos.base_url, "https://env.example.com/api");
            assert_eq!(config.pos.token, "env-token");
        },
    );
}

#[test]
fn file_values_survive_without_env() {
    let file = write_config(
        r#"
[pos]
base_url = "https://file.example.com/api"
token = "file-token"
"#,
    );

    with_scoped_env(&[("POS_BASE_URL", None), ("POS_TOKEN", None)], || {
        let config = DashboardConfig::from_file(file.path()).unwrap().apply_env();
        assert_eq!(config.pos.base_url, "https://file.example.com/api");
        assert_eq!(config.pos.token, "file-token");
    });
}

#[test]
fn load_falls_back_to_defaults_when_no_file_exists() {
    with_scoped_env(&[("POS_BASE_URL", None), ("POS_TOKEN", None)], || {
        let config = DashboardConfig::load().unwrap();
        assert_eq!(config.pos.base_url, "https://joinposter.com/api");
        assert!(config.pos.token.is_empty());
        config.validate().unwrap();
    });
}

#[test]
fn loaded_defaults_pass_validation_and_yield_the_default_window() {
    with_scoped_env(&[("POS_BASE_URL", None), ("POS_TOKEN", None)], || {
        let config = DashboardConfig::load().unwrap();
        let hours = config.hour_range().unwrap();
        assert_eq!((hours.start(), hours.end()), (10, 22));
        assert_eq!(hours.len(), 13);
    });
}
