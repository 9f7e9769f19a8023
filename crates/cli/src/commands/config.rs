use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use courtside_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl ConfigField {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    run_with(LoadOptions::default())
}

pub fn run_with(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: override > env > file > default):".to_string(),
    ];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        ConfigField::new("llm.provider", config.llm.provider.as_str(), &["COURTSIDE_LLM_PROVIDER"]),
        ConfigField::new("llm.model", config.llm.model.clone(), &["COURTSIDE_LLM_MODEL"]),
        ConfigField::new(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            &["COURTSIDE_LLM_BASE_URL"],
        ),
        ConfigField::new("llm.api_key", api_key, &["COURTSIDE_LLM_API_KEY", "OPENAI_API_KEY"]),
        ConfigField::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["COURTSIDE_LLM_TIMEOUT_SECS"],
        ),
        ConfigField::new(
            "llm.max_tokens",
            config.llm.max_tokens.to_string(),
            &["COURTSIDE_LLM_MAX_TOKENS"],
        ),
        ConfigField::new(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["COURTSIDE_LLM_TEMPERATURE"],
        ),
        ConfigField::new(
            "chat.transport",
            config.chat.transport.as_str(),
            &["COURTSIDE_CHAT_TRANSPORT"],
        ),
        ConfigField::new(
            "chat.reconnect_attempts",
            config.chat.reconnect_attempts.to_string(),
            &["COURTSIDE_CHAT_RECONNECT_ATTEMPTS"],
        ),
        ConfigField::new(
            "assets.image_root",
            config.assets.image_root.display().to_string(),
            &["COURTSIDE_ASSETS_IMAGE_ROOT"],
        ),
        ConfigField::new(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["COURTSIDE_SERVER_BIND_ADDRESS"],
        ),
        ConfigField::new(
            "server.health_check_port",
            config.server.health_check_port.to_string(),
            &["COURTSIDE_SERVER_HEALTH_CHECK_PORT"],
        ),
        ConfigField::new(
            "logging.level",
            config.logging.level.clone(),
            &["COURTSIDE_LOGGING_LEVEL", "COURTSIDE_LOG_LEVEL"],
        ),
        ConfigField::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["COURTSIDE_LOGGING_FORMAT", "COURTSIDE_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
