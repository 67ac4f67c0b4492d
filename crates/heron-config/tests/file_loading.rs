//! Loading configuration files from disk.

use heron_config::{ConfigError, ConfigLoader, LogFormat};
use heron_core::EvictionPolicy;
use heron_test::{flaky_sync, CallCounter, TestError};
use heron_combinators::Combinator;
use std::io::Write;
use std::time::Duration;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = write_temp(
        ".toml",
        r#"
        [cache]
        policy = "ttl"
        ttl_secs = 5
        capacity = 10

        [logging]
        format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(
        config.cache.eviction_policy(),
        EvictionPolicy::Ttl {
            ttl: Duration::from_secs(5),
            capacity: Some(10),
        }
    );
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_json_file() {
    let file = write_temp(".json", r#"{ "retry": { "max_attempts": 6 } }"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.retry.max_attempts, 6);
}

#[test]
fn test_unknown_extension() {
    let file = write_temp(".yaml", "retry: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_configured_retry_wraps_callable() {
    let file = write_temp(
        ".toml",
        r#"
        [retry]
        max_attempts = 3
        base_delay_ms = 1
        "#,
    );
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    let counter = CallCounter::new();
    let fetch = config
        .retry
        .retry(TestError::classify)
        .wrap_sync(flaky_sync("fetch", &counter, 2, "done"));

    assert_eq!(fetch.call(()), Ok("done"));
    assert_eq!(counter.count(), 3);
}
