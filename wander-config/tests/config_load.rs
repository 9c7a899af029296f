use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use wander_common::LogFormat;
use wander_config::WanderConfigLoader;

fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "0.1"
wiki:
  site_base: "https://${WANDER_TEST_LANG}.wikipedia.org"
  rest_base: "https://${WANDER_TEST_LANG}.wikipedia.org/api/rest_v1"
  action_url: "https://${WANDER_TEST_LANG}.wikipedia.org/w/api.php"
http:
  timeout_secs: 5
  retry:
    status_backoff_ms: 200
session:
  max_links: 4
log:
  format: json
  filter: "wander=debug,info"
"#;

#[test]
#[serial]
fn file_values_merge_over_defaults() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "wander.yaml", FILE_YAML);

    let config = temp_env::with_var("WANDER_TEST_LANG", Some("de"), || {
        WanderConfigLoader::new().with_file(&p).load()
    })
    .expect("load config");

    assert_eq!(config.version.as_deref(), Some("0.1"));
    assert_eq!(config.wiki.rest_base, "https://de.wikipedia.org/api/rest_v1");
    assert_eq!(config.http.timeout_secs, 5);
    assert_eq!(config.http.retry.status_backoff_ms, 200);
    assert_eq!(config.http.retry.network_backoff_ms, 500);
    assert_eq!(config.session.max_links, 4);
    assert_eq!(config.session.history_cap, 50);
    assert_eq!(config.log.format, LogFormat::Json);
    assert_eq!(config.log.filter, "wander=debug,info");
}

#[test]
#[serial]
fn environment_overrides_the_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "wander.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("WANDER_TEST_LANG", Some("fr")),
            ("WANDER__SESSION__MAX_LINKS", Some("2")),
            ("WANDER__HTTP__RETRY__MAX_ATTEMPTS", Some("5")),
        ],
        || WanderConfigLoader::new().with_file(&p).load(),
    )
    .expect("load config");

    assert_eq!(config.session.max_links, 2);
    assert_eq!(config.http.retry.max_attempts, 5);
    assert_eq!(config.wiki.site_base, "https://fr.wikipedia.org");
}

#[test]
#[serial]
fn missing_optional_file_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let config = WanderConfigLoader::new()
        .without_env()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");
    assert_eq!(config.session.max_links, 5);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = WanderConfigLoader::new()
        .without_env()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
