//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: compiled defaults, the per-user file
//! (`<config dir>/chatprobe/chatprobe.yaml`, only when requested), explicit
//! files, inline YAML, and finally `CHATPROBE__`-prefixed environment
//! variables (`CHATPROBE__TIMING__GRACE_MS=1000`). String values may contain
//! `${VAR}` placeholders, which are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::path::{Path, PathBuf};

mod model;

pub use model::{
    CandidateConfig, ChatprobeConfig, DEFAULT_ANSWER_MIN_CHARS, DEFAULT_PROBE_MIN_CHARS,
    LogFormat, LoggingConfig, OutputConfig, SelectorConfig, ServerConfig, TargetConfig,
    TimingConfig, Viewport,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "CHATPROBE";

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

/// Location of the per-user configuration file, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chatprobe").join("chatprobe.yaml"))
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ChatprobeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    use_env: bool,
}

impl Default for ChatprobeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatprobeConfigLoader {
    /// Start from compiled defaults with `CHATPROBE__` env overrides enabled.
    ///
    /// ```
    /// use chatprobe_config::ChatprobeConfigLoader;
    ///
    /// let config = ChatprobeConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.selectors.thinking_indicator, ".thinking-bar");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            use_env: true,
        }
    }

    /// Skip the environment overlay (hermetic tests, `--no-env` style callers).
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Merge the per-user file when it exists.
    pub fn with_user_file(self) -> Self {
        match user_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use chatprobe_config::ChatprobeConfigLoader;
    ///
    /// let cfg = ChatprobeConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str(
    ///         r#"
    /// selectors:
    ///   candidates:
    ///     - selector: ".answer"
    ///       min_chars: 50
    ///     - selector: ".fallback"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.selectors.candidates.len(), 2);
    /// assert_eq!(cfg.selectors.candidates[0].min_chars, 50);
    /// assert_eq!(cfg.selectors.candidates[1].min_chars, 100);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use chatprobe_config::ChatprobeConfigLoader;
    ///
    /// unsafe { std::env::set_var("CHATPROBE_DOC_TARGET", "https://chat.example.com/"); }
    ///
    /// let config = ChatprobeConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str(r#"
    /// target:
    ///   url: "${CHATPROBE_DOC_TARGET}"
    ///   headless: false
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.target.url, "https://chat.example.com/");
    /// assert!(!config.target.headless);
    /// assert_eq!(config.target.webdriver_url, "http://localhost:9515");
    ///
    /// unsafe { std::env::remove_var("CHATPROBE_DOC_TARGET"); }
    /// ```
    pub fn load(self) -> Result<ChatprobeConfig, ConfigError> {
        let mut builder = self.builder;
        if self.use_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ChatprobeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate().map_err(ConfigError::Message)?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("CP_HOST", Some("chat.example.com"), || {
            let mut v = json!("https://${CP_HOST}/");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("https://chat.example.com/"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars(
            [("CP_INPUT", Some("textarea")), ("CP_FORM", Some("form"))],
            || {
                let mut v = json!([
                    "$CP_INPUT",
                    { "submit": "${CP_FORM} button" },
                    250,
                    true,
                    null
                ]);
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!(["textarea", { "submit": "form button" }, 250, true, null])
                );
            },
        );
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("CP_PORT", Some("9515")),
                ("CP_HOSTPORT", Some("localhost:${CP_PORT}")),
                ("CP_DRIVER", Some("http://${CP_HOSTPORT}")),
            ],
            || {
                let mut v = json!("${CP_DRIVER}/session");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("http://localhost:9515/session"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("CP_A", Some("${CP_B}")), ("CP_B", Some("${CP_A}"))], || {
            let mut v = json!("x=${CP_A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${CP_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${CP_DOES_NOT_EXIST}"));
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let cfg = ChatprobeConfigLoader::new().without_env().load().unwrap();
        assert_eq!(cfg.target.url, "https://chat.m5stack.com/");
        assert_eq!(cfg.selectors.candidates.len(), 15);
        assert!(
            cfg.selectors
                .candidates
                .iter()
                .all(|c| c.min_chars == DEFAULT_ANSWER_MIN_CHARS)
        );
        assert_eq!(cfg.selectors.probe_min_chars, DEFAULT_PROBE_MIN_CHARS);
        assert_eq!(cfg.timing.disappear_timeout_ms, 90_000);
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn rejects_empty_candidate_list() {
        let err = ChatprobeConfigLoader::new()
            .without_env()
            .with_yaml_str("selectors:\n  candidates: []\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("selectors.candidates"));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = ChatprobeConfigLoader::new()
            .without_env()
            .with_yaml_str("timing:\n  poll_interval_ms: 0\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn yaml_dump_reloads_to_same_selectors() {
        let cfg = ChatprobeConfig::default();
        let yaml = cfg.to_yaml().unwrap();
        let reloaded = ChatprobeConfigLoader::new()
            .without_env()
            .with_yaml_str(&yaml)
            .load()
            .unwrap();
        assert_eq!(reloaded.selectors.candidates, cfg.selectors.candidates);
        assert_eq!(reloaded.selectors.thinking_token, "考え中");
    }

    #[test]
    fn logging_format_parses_lowercase_names() {
        let cfg = ChatprobeConfigLoader::new()
            .without_env()
            .with_yaml_str("logging:\n  format: json\n  dir: /var/log/chatprobe\n")
            .load()
            .unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.dir, Some(PathBuf::from("/var/log/chatprobe")));

        let err = ChatprobeConfigLoader::new()
            .without_env()
            .with_yaml_str("logging:\n  format: pretty\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("pretty"));
    }

    #[test]
    fn default_submit_buttons_are_specific() {
        let selectors = ChatprobeConfig::default().selectors;
        assert!(selectors.enter_fallback);
        assert!(
            selectors
                .submit_buttons
                .iter()
                .all(|b| b != "button" && b != "form button")
        );
    }
}
