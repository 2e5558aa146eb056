use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::listener::{DEFAULT_HOST, DEFAULT_PORT};
use crate::pipeline::layout::{BOX_HEIGHT, BOX_WIDTH, DEFAULT_MARGIN, MAX_ROW_ITEMS};
use crate::pipeline::{
    LayoutSpec, PipelineSeparators, DEFAULT_ENTRY_SEPARATOR, DEFAULT_NAME_SEPARATOR,
    DEFAULT_PIPELINE_ENV,
};
use crate::RunArgs;

pub const DEFAULT_TICK_MS: u64 = 50;

pub const HOST_ENV: &str = "PROCESSVIEW_HOST";
pub const PORT_ENV: &str = "PROCESSVIEW_PORT";
pub const TICK_ENV: &str = "PROCESSVIEW_TICK_MS";
pub const MARGIN_ENV: &str = "PROCESSVIEW_MARGIN";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },
    InvalidEnv {
        name: String,
        value: String,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, error } => {
                write!(f, "failed to read config {}: {error}", path.display())
            }
            ConfigError::Parse { path, error } => {
                write!(f, "failed to parse config {}: {error}", path.display())
            }
            ConfigError::InvalidEnv { name, value } => {
                write!(f, "invalid value `{value}` for environment variable {name}")
            }
            ConfigError::Invalid(detail) => write!(f, "invalid configuration: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub box_width: u16,
    pub box_height: u16,
    pub margin: u16,
    pub max_row_items: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            box_width: BOX_WIDTH,
            box_height: BOX_HEIGHT,
            margin: DEFAULT_MARGIN,
            max_row_items: MAX_ROW_ITEMS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickConfig {
    pub tick_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub env: String,
    pub entry_separator: String,
    pub name_separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            env: DEFAULT_PIPELINE_ENV.to_owned(),
            entry_separator: DEFAULT_ENTRY_SEPARATOR.to_owned(),
            name_separator: DEFAULT_NAME_SEPARATOR.to_owned(),
        }
    }
}

/// Resolved settings: defaults, then the TOML file, then environment, then flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub listener: ListenerConfig,
    pub layout: LayoutConfig,
    pub dashboard: TickConfig,
    pub pipeline: PipelineConfig,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        toml::from_str(&source).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn resolve(args: &RunArgs) -> Result<Self, ConfigError> {
        let mut config = match args.config_path.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|value| !value.trim().is_empty()) {
            self.listener.host = host.trim().to_owned();
        }
        if let Some(port) = parse_env(&lookup, PORT_ENV)? {
            self.listener.port = port;
        }
        if let Some(tick_ms) = parse_env(&lookup, TICK_ENV)? {
            self.dashboard.tick_ms = tick_ms;
        }
        if let Some(margin) = parse_env(&lookup, MARGIN_ENV)? {
            self.layout.margin = margin;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &RunArgs) {
        if let Some(host) = &args.host {
            self.listener.host = host.clone();
        }
        if let Some(port) = args.port {
            self.listener.port = port;
        }
        if let Some(tick_ms) = args.tick_ms {
            self.dashboard.tick_ms = tick_ms;
        }
        if let Some(margin) = args.margin {
            self.layout.margin = margin;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.tick_ms must be greater than zero".to_owned(),
            ));
        }
        if self.layout.box_width == 0 || self.layout.box_height == 0 {
            return Err(ConfigError::Invalid(
                "layout box dimensions must be greater than zero".to_owned(),
            ));
        }
        if self.layout.max_row_items == 0 {
            return Err(ConfigError::Invalid(
                "layout.max_row_items must be greater than zero".to_owned(),
            ));
        }
        if self.pipeline.entry_separator.is_empty() || self.pipeline.name_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "pipeline separators must not be empty".to_owned(),
            ));
        }
        if self.pipeline.env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "pipeline.env must name an environment variable".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.dashboard.tick_ms)
    }

    pub fn layout_spec(&self) -> LayoutSpec {
        LayoutSpec {
            box_width: self.layout.box_width,
            box_height: self.layout.box_height,
            margin: self.layout.margin,
            max_row_items: self.layout.max_row_items,
        }
    }

    pub fn separators(&self) -> PipelineSeparators {
        PipelineSeparators {
            entry: self.pipeline.entry_separator.clone(),
            name: self.pipeline.name_separator.clone(),
        }
    }
}

fn parse_env<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            name: name.to_owned(),
            value: raw.clone(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<String, String>>();
        move |name| map.get(name).cloned()
    }

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("processview-config-{name}-{ts}.toml"));
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn defaults_match_dashboard_constants() {
        let config = DashboardConfig::default();
        assert_eq!(config.listen_address(), "127.0.0.1:8888");
        assert_eq!(config.tick(), Duration::from_millis(50));
        assert_eq!(config.layout_spec(), LayoutSpec::default());
        assert_eq!(config.separators(), PipelineSeparators::default());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let path = temp_config(
            "partial",
            "[listener]\nport = 9100\n\n[layout]\nmargin = 2\n",
        );
        let config = DashboardConfig::from_file(&path).expect("load config");
        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.listener.host, DEFAULT_HOST);
        assert_eq!(config.layout.margin, 2);
        assert_eq!(config.layout.box_width, BOX_WIDTH);
    }

    #[test]
    fn file_with_unknown_key_is_rejected() {
        let path = temp_config("unknown", "[listener]\nprot = 1\n");
        let err = DashboardConfig::from_file(&path).expect_err("unknown field");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("processview-config-does-not-exist.toml");
        let err = DashboardConfig::from_file(&path).expect_err("missing file");
        assert!(err.to_string().contains("processview-config-does-not-exist.toml"));
    }

    #[test]
    fn env_then_args_take_precedence() {
        let mut config = DashboardConfig::default();
        config
            .apply_env(env_from(&[
                (PORT_ENV, "9000"),
                (TICK_ENV, "20"),
                (HOST_ENV, "0.0.0.0"),
            ]))
            .expect("apply env");
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.dashboard.tick_ms, 20);

        config.apply_args(&RunArgs {
            port: Some(9001),
            ..RunArgs::default()
        });
        assert_eq!(config.listener.port, 9001);
        assert_eq!(config.listen_address(), "0.0.0.0:9001");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = DashboardConfig::default();
        config
            .apply_env(env_from(&[(PORT_ENV, "  "), (HOST_ENV, "")]))
            .expect("apply env");
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let mut config = DashboardConfig::default();
        let err = config
            .apply_env(env_from(&[(PORT_ENV, "eighty")]))
            .expect_err("invalid port");
        assert_eq!(
            err.to_string(),
            "invalid value `eighty` for environment variable PROCESSVIEW_PORT"
        );
    }

    #[test]
    fn validate_rejects_zero_tick_and_row_size() {
        let mut config = DashboardConfig::default();
        config.dashboard.tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.layout.max_row_items = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.pipeline.name_separator.clear();
        assert!(config.validate().is_err());
    }
}
