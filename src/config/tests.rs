use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::checklist::Band;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_contextvec_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("CONTEXTVEC_EMBED_MODEL");
        env::remove_var("CONTEXTVEC_EMBED_DIM");
        env::remove_var("CONTEXTVEC_OLLAMA_URL");
        env::remove_var("CONTEXTVEC_EMBED_CONCURRENCY");
        env::remove_var("CONTEXTVEC_EMBED_TIMEOUT_SECS");
        env::remove_var("CONTEXTVEC_RETRY_LIMIT");
        env::remove_var("CONTEXTVEC_RETRY_BASE_DELAY_MS");
        env::remove_var("CONTEXTVEC_DATA_DIR");
        env::remove_var("CONTEXTVEC_CACHE_TTL_HOURS");
        env::remove_var("CONTEXTVEC_CACHE_MAX_SIZE_MB");
        env::remove_var("CONTEXTVEC_CACHE_SWEEP_INTERVAL_SECS");
        env::remove_var("CONTEXTVEC_DRIFT_THRESHOLD");
        env::remove_var("CONTEXTVEC_H2_COUNT_MIN");
        env::remove_var("CONTEXTVEC_H2_COUNT_MAX");
    }
}

#[test]
fn test_default_config() {
    let config = EngineConfig::default();

    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.embedding.dimension, 1024);
    assert_eq!(config.embedding.base_url, "http://localhost:11434");
    assert_eq!(config.embedding.concurrency, 4);
    assert_eq!(config.embedding.call_timeout, Duration::from_secs(30));
    assert_eq!(config.embedding.retry_limit, 3);
    assert_eq!(config.embedding.retry_base_delay, Duration::from_millis(200));
    assert_eq!(config.data_dir, PathBuf::from("./.data"));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_contextvec_env();

    let config = EngineConfig::from_env().expect("should parse with defaults");

    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.embedding.dimension, 1024);
    assert_eq!(config.cache.ttl, Duration::from_secs(24 * 60 * 60));
    assert_eq!(config.cache.max_size_bytes, 100 * 1024 * 1024);
}

#[test]
#[serial]
fn test_from_env_custom_embedding() {
    clear_contextvec_env();

    with_env_vars(
        &[
            ("CONTEXTVEC_EMBED_MODEL", "nomic-embed-text"),
            ("CONTEXTVEC_EMBED_DIM", "768"),
            ("CONTEXTVEC_OLLAMA_URL", "http://ollama.cluster:11434"),
            ("CONTEXTVEC_EMBED_CONCURRENCY", "8"),
        ],
        || {
            let config = EngineConfig::from_env().expect("should parse");

            assert_eq!(config.embedding.model, "nomic-embed-text");
            assert_eq!(config.embedding.dimension, 768);
            assert_eq!(config.embedding.base_url, "http://ollama.cluster:11434");
            assert_eq!(config.embedding.concurrency, 8);
        },
    );
}

#[test]
#[serial]
fn test_invalid_dimension_is_fatal() {
    clear_contextvec_env();

    with_env_vars(&[("CONTEXTVEC_EMBED_DIM", "not_a_number")], || {
        let result = EngineConfig::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInteger { .. }));
        assert!(err.to_string().contains("CONTEXTVEC_EMBED_DIM"));
    });
}

#[test]
#[serial]
fn test_invalid_concurrency_is_fatal() {
    clear_contextvec_env();

    with_env_vars(&[("CONTEXTVEC_EMBED_CONCURRENCY", "many")], || {
        let result = EngineConfig::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidInteger { .. }
        ));
    });
}

#[test]
#[serial]
fn test_unparseable_tunables_fall_back_to_defaults() {
    clear_contextvec_env();

    with_env_vars(
        &[
            ("CONTEXTVEC_RETRY_LIMIT", "not_a_number"),
            ("CONTEXTVEC_EMBED_TIMEOUT_SECS", "soon"),
            ("CONTEXTVEC_CACHE_MAX_SIZE_MB", "big"),
        ],
        || {
            let config = EngineConfig::from_env().expect("tunables are lenient");
            assert_eq!(config.embedding.retry_limit, 3);
            assert_eq!(config.embedding.call_timeout, Duration::from_secs(30));
            assert_eq!(config.cache.max_size_bytes, 100 * 1024 * 1024);
        },
    );
}

#[test]
#[serial]
fn test_cache_and_rule_knobs_from_env() {
    clear_contextvec_env();

    with_env_vars(
        &[
            ("CONTEXTVEC_CACHE_TTL_HOURS", "1"),
            ("CONTEXTVEC_CACHE_MAX_SIZE_MB", "5"),
            ("CONTEXTVEC_DRIFT_THRESHOLD", "0.65"),
            ("CONTEXTVEC_H2_COUNT_MIN", "3"),
            ("CONTEXTVEC_H2_COUNT_MAX", "10"),
        ],
        || {
            let config = EngineConfig::from_env().expect("should parse");

            assert_eq!(config.cache.ttl, Duration::from_secs(60 * 60));
            assert_eq!(config.cache.max_size_bytes, 5 * 1024 * 1024);
            assert_eq!(config.rules.drift_threshold, 0.65);
            assert_eq!(config.rules.h2_count_min, 3);
            assert_eq!(config.rules.h2_count_max, 10);
        },
    );
}

#[test]
#[serial]
fn test_from_env_custom_data_dir() {
    clear_contextvec_env();

    with_env_vars(&[("CONTEXTVEC_DATA_DIR", "/var/lib/contextvec")], || {
        let config = EngineConfig::from_env().expect("should parse");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/contextvec"));
    });
}

#[test]
fn test_validate_success_with_defaults() {
    let config = EngineConfig::default();
    assert!(
        config.validate().is_ok(),
        "validate() should succeed with default config"
    );
}

#[test]
fn test_validate_rejects_zero_dimension() {
    let config = EngineConfig {
        embedding: EmbeddingConfig {
            dimension: 0,
            ..Default::default()
        },
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert!(err.to_string().contains("embedding.dimension"));
}

#[test]
fn test_validate_rejects_zero_concurrency() {
    let config = EngineConfig {
        embedding: EmbeddingConfig {
            concurrency: 0,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::InvalidValue { .. }
    ));
}

#[test]
fn test_validate_rejects_empty_model() {
    let config = EngineConfig {
        embedding: EmbeddingConfig {
            model: "  ".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::InvalidValue { .. }
    ));
}

#[test]
fn test_validate_data_dir_is_file() {
    let config = EngineConfig {
        data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_delegates_to_the_rule_config() {
    let mut config = EngineConfig::default();
    config.rules.title_h1_band = Band::new(0.9, 0.5, 0.4);

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBand { .. }));
}

#[test]
fn test_retry_policy_mirrors_embedding_settings() {
    let embedding = EmbeddingConfig {
        retry_limit: 5,
        retry_base_delay: Duration::from_millis(50),
        call_timeout: Duration::from_secs(10),
        ..Default::default()
    };

    let policy = embedding.retry_policy();
    assert_eq!(policy.limit, 5);
    assert_eq!(policy.base_delay, Duration::from_millis(50));
    assert_eq!(policy.call_timeout, Duration::from_secs(10));
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = ConfigError::InvalidValue {
        key: "embedding.dimension",
        message: "vector width must be at least 1".to_string(),
    };
    assert!(err.to_string().contains("embedding.dimension"));

    let err = ConfigError::NotADirectory {
        path: PathBuf::from("/some/path"),
    };
    assert!(err.to_string().contains("/some/path"));

    let err = ConfigError::UnknownRuleCode {
        code: "CV-099".to_string(),
    };
    assert!(err.to_string().contains("CV-099"));
}
