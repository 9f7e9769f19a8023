use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use courtside_cli::commands::{catalog, config, doctor};
use courtside_core::catalog::Catalog;
use courtside_core::config::{ConfigOverrides, LoadOptions};
use serde_json::Value;

#[test]
fn doctor_warns_but_succeeds_when_images_are_missing() {
    let images = tempfile::tempdir().expect("temp dir");
    with_env(&[("COURTSIDE_LLM_PROVIDER", "ollama")], || {
        let result = doctor::run_with(options(images.path()), true);
        assert_eq!(result.exit_code, 0, "missing images are not fatal");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "warn");
        assert_eq!(check(&payload, "config_validation")["status"], "pass");
        assert_eq!(check(&payload, "oracle_readiness")["status"], "pass");

        let images_check = check(&payload, "image_assets");
        assert_eq!(images_check["status"], "warn");
        assert!(images_check["details"].as_str().unwrap_or_default().contains("9 of 9"));
    });
}

#[test]
fn doctor_passes_when_every_image_is_present() {
    let images = tempfile::tempdir().expect("temp dir");
    for item in Catalog::builtin().iter() {
        let path = images.path().join(&item.image);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("image dir");
        }
        fs::write(&path, b"jpeg").expect("image file");
    }

    with_env(&[("COURTSIDE_LLM_PROVIDER", "ollama")], || {
        let result = doctor::run_with(options(images.path()), true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(check(&payload, "image_assets")["status"], "pass");
    });
}

#[test]
fn doctor_fails_when_openai_key_is_missing() {
    let images = tempfile::tempdir().expect("temp dir");
    with_env(&[("COURTSIDE_LLM_PROVIDER", "openai")], || {
        let result = doctor::run_with(options(images.path()), false);
        assert_eq!(result.exit_code, 3, "expected doctor failure code");

        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] image_assets"));
    });
}

#[test]
fn config_redacts_api_key_and_attributes_sources() {
    let images = tempfile::tempdir().expect("temp dir");
    with_env(&[("COURTSIDE_LLM_API_KEY", "sk-very-secret-value")], || {
        let output = config::run_with(options(images.path()));

        assert!(output.contains("- llm.api_key = sk-*** (source: env (COURTSIDE_LLM_API_KEY))"));
        assert!(!output.contains("very-secret-value"));
        assert!(output.contains("- llm.model = gpt-3.5-turbo (source: default)"));
        assert!(output.contains("- llm.provider = openai (source: default)"));
    });
}

#[test]
fn config_falls_back_to_legacy_key_variable() {
    let images = tempfile::tempdir().expect("temp dir");
    with_env(&[("OPENAI_API_KEY", "sk-legacy")], || {
        let output = config::run_with(options(images.path()));

        assert!(output.contains("- llm.api_key = sk-*** (source: env (OPENAI_API_KEY))"));
    });
}

#[test]
fn config_reports_file_sources() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("courtside.toml");
    fs::write(&path, "[llm]\nprovider = \"ollama\"\nmodel = \"llama3\"\n").expect("config file");

    with_env(&[], || {
        let output = config::run_with(LoadOptions {
            config_path: Some(path.clone()),
            ..LoadOptions::default()
        });

        assert!(output.contains("- llm.model = llama3 (source: file ("));
        assert!(output.contains("- llm.api_key = <unset> (source: default)"));
    });
}

#[test]
fn config_reports_validation_failure() {
    let images = tempfile::tempdir().expect("temp dir");
    with_env(&[("COURTSIDE_LLM_PROVIDER", "openai")], || {
        let output = config::run_with(options(images.path()));
        assert!(output.starts_with("config validation failed:"));
    });
}

#[test]
fn catalog_prints_cards_for_one_tier() {
    let result = catalog::run(Some("Intermediate"));

    assert_eq!(result.exit_code, 0);
    assert!(result.output.starts_with("== Intermediate (3 items) =="));
    assert!(result.output.contains("49.99 €"));
}

fn options(image_root: &Path) -> LoadOptions {
    LoadOptions {
        config_path: Some(image_root.join("absent.toml")),
        overrides: ConfigOverrides {
            image_root: Some(image_root.to_path_buf()),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn check<'a>(payload: &'a Value, name: &str) -> &'a Value {
    payload["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .unwrap_or_else(|| panic!("missing check `{name}`"))
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "OPENAI_API_KEY",
        "COURTSIDE_LLM_PROVIDER",
        "COURTSIDE_LLM_API_KEY",
        "COURTSIDE_LLM_BASE_URL",
        "COURTSIDE_LLM_MODEL",
        "COURTSIDE_LLM_TIMEOUT_SECS",
        "COURTSIDE_LLM_MAX_TOKENS",
        "COURTSIDE_LLM_TEMPERATURE",
        "COURTSIDE_LLM_MAX_RETRIES",
        "COURTSIDE_LLM_RETRY_DELAY_SECS",
        "COURTSIDE_CHAT_TRANSPORT",
        "COURTSIDE_CHAT_RECONNECT_ATTEMPTS",
        "COURTSIDE_CHAT_RECONNECT_BACKOFF_MS",
        "COURTSIDE_ASSETS_IMAGE_ROOT",
        "COURTSIDE_SERVER_BIND_ADDRESS",
        "COURTSIDE_SERVER_HEALTH_CHECK_PORT",
        "COURTSIDE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "COURTSIDE_LOGGING_LEVEL",
        "COURTSIDE_LOGGING_FORMAT",
        "COURTSIDE_LOG_LEVEL",
        "COURTSIDE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
