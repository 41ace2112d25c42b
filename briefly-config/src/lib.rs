//! Loader for Briefly configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files/snippets in the
//! order they were added, `BRIEFLY__`-prefixed environment variables
//! (`BRIEFLY__LLM__PROVIDER=openai`). String values may reference other
//! environment variables as `${VAR}`; references are expanded recursively.
//! Finally, API keys still missing are taken from `GEMINI_API_KEY` /
//! `OPENAI_API_KEY` (matching the provider) and `SERPAPI_KEY`.
//!
//! ```yaml
//! llm:
//!   provider: gemini          # or openai
//!   model: gemini-2.0-flash
//!   api_key: ${GEMINI_API_KEY}
//! search:
//!   api_key: ${SERPAPI_KEY}
//!   num_results: 5
//! fetch:
//!   timeout_secs: 10
//!   concurrency: 4
//! summary:
//!   max_attempts: 3
//!   base_delay_ms: 1000
//! logging:
//!   format: json
//! ```
use briefly_common::{Credentials, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL, LlmConfig, Secret};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const ENV_PREFIX: &str = "BRIEFLY";
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SERPAPI_KEY_ENV: &str = "SERPAPI_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrieflyConfig {
    pub llm: LlmSection,
    pub search: SearchSection,
    pub fetch: FetchSection,
    pub summary: SummarySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Provider,
    /// Falls back to the provider's default model.
    pub model: Option<String>,
    pub api_key: Option<Secret>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub api_key: Option<Secret>,
    pub engine: String,
    pub num_results: u32,
    pub endpoint: Option<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            api_key: None,
            engine: "google".into(),
            num_results: 5,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub concurrency: usize,
    pub min_fragment_chars: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            concurrency: 4,
            min_fragment_chars: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub context_window_tokens: u32,
    pub safety_buffer_tokens: u32,
    pub max_input_chars: Option<usize>,
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            context_window_tokens: 32_768,
            safety_buffer_tokens: 512,
            max_input_chars: Some(15_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub dir: Option<PathBuf>,
    /// `text` or `json`.
    pub format: String,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            format: "text".into(),
            stderr: false,
            filter: "info".into(),
        }
    }
}

impl BrieflyConfig {
    /// Provider settings ready for client construction.
    pub fn llm_config(&self) -> Result<LlmConfig, ConfigError> {
        let api_key = present(self.llm.api_key.as_ref())
            .ok_or_else(|| missing("llm.api_key", self.llm_key_env()))?;
        let endpoint = self.llm.endpoint.clone().filter(|e| !e.trim().is_empty());
        let model = |default: &str| {
            self.llm
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Ok(match self.llm.provider {
            Provider::Gemini => LlmConfig::Gemini {
                api_key,
                model: model(DEFAULT_GEMINI_MODEL),
                endpoint,
            },
            Provider::Openai => LlmConfig::OpenAi {
                api_key,
                model: model(DEFAULT_OPENAI_MODEL),
                endpoint,
            },
        })
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let llm = present(self.llm.api_key.as_ref())
            .ok_or_else(|| missing("llm.api_key", self.llm_key_env()))?;
        let search = present(self.search.api_key.as_ref())
            .ok_or_else(|| missing("search.api_key", SERPAPI_KEY_ENV))?;
        Ok(Credentials::new(llm, search))
    }

    /// Check everything a run needs before any work starts.
    pub fn validate(&self) -> Result<(LlmConfig, Credentials), ConfigError> {
        let credentials = self.credentials()?;
        let llm = self.llm_config()?;
        if self.search.num_results == 0 {
            return Err(ConfigError::Message(
                "search.num_results must be at least 1".into(),
            ));
        }
        if self.fetch.concurrency == 0 {
            return Err(ConfigError::Message(
                "fetch.concurrency must be at least 1".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "fetch.timeout_secs must be at least 1".into(),
            ));
        }
        Ok((llm, credentials))
    }

    fn llm_key_env(&self) -> &'static str {
        match self.llm.provider {
            Provider::Gemini => GEMINI_KEY_ENV,
            Provider::Openai => OPENAI_KEY_ENV,
        }
    }

    fn apply_key_fallbacks(&mut self) {
        if present(self.llm.api_key.as_ref()).is_none() {
            if let Some(key) = env_secret(self.llm_key_env()) {
                self.llm.api_key = Some(key);
            }
        }
        if present(self.search.api_key.as_ref()).is_none() {
            if let Some(key) = env_secret(SERPAPI_KEY_ENV) {
                self.search.api_key = Some(key);
            }
        }
    }
}

/// A usable key: not blank and not an unexpanded `${VAR}` reference.
fn present(secret: Option<&Secret>) -> Option<Secret> {
    secret
        .filter(|s| !s.is_blank() && !s.expose().contains("${"))
        .cloned()
}

fn env_secret(var: &str) -> Option<Secret> {
    std::env::var(var)
        .ok()
        .map(Secret::new)
        .filter(|s| !s.is_blank())
}

fn missing(field: &str, env: &str) -> ConfigError {
    ConfigError::Message(format!("missing {field}: set it in the config file or export {env}"))
}

/// `~/.config/briefly/config.yaml` (platform equivalent), if a config dir exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("briefly").join("config.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct BrieflyConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for BrieflyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BrieflyConfigLoader {
    /// Defaults plus `BRIEFLY__` env overrides; add files or snippets before `load`.
    ///
    /// ```
    /// use briefly_config::{BrieflyConfigLoader, Provider};
    ///
    /// let config = BrieflyConfigLoader::new()
    ///     .with_yaml_str("llm:\n  provider: openai\n  api_key: sk-1\nsearch:\n  api_key: s-1")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.llm.provider, Provider::Openai);
    /// assert_eq!(config.search.num_results, 5);
    /// assert_eq!(config.llm_config().unwrap().model(), "gpt-4o-mini");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    ///
    /// Environment overrides are added last so they win over every file.
    pub fn load(self) -> Result<BrieflyConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: BrieflyConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.apply_key_fallbacks();
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_nested_sections() {
        temp_env::with_vars([("SERP", Some("s-key")), ("GEM", Some("g-key"))], || {
            let mut v = json!({
                "llm": {"api_key": "${GEM}", "model": null},
                "search": {"api_key": "$SERP", "num_results": 3},
                "tags": ["${GEM}", 1, true]
            });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({
                    "llm": {"api_key": "g-key", "model": null},
                    "search": {"api_key": "s-key", "num_results": 3},
                    "tags": ["g-key", 1, true]
                })
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_BRIEFLY}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_BRIEFLY}"));
    }

    #[test]
    fn missing_search_key_names_the_env_var() {
        let cfg = BrieflyConfig {
            llm: LlmSection {
                api_key: Some(Secret::new("g")),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("search.api_key"));
        assert!(err.contains(SERPAPI_KEY_ENV));
    }

    #[test]
    fn zero_fetch_timeout_is_rejected() {
        let mut cfg = BrieflyConfig {
            llm: LlmSection {
                api_key: Some(Secret::new("g")),
                ..Default::default()
            },
            search: SearchSection {
                api_key: Some(Secret::new("s")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());

        cfg.fetch.timeout_secs = 0;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("fetch.timeout_secs"));
    }

    #[test]
    fn blank_model_falls_back_to_provider_default() {
        let cfg = BrieflyConfig {
            llm: LlmSection {
                provider: Provider::Gemini,
                model: Some("  ".into()),
                api_key: Some(Secret::new("g")),
                endpoint: None,
            },
            ..Default::default()
        };
        assert_eq!(cfg.llm_config().unwrap().model(), DEFAULT_GEMINI_MODEL);
    }
}
