use super::env::{load_env_path, load_env_path_opt, load_env_string, load_env_var};
use super::groups::{BrokerSettings, QueueCapacities, TopicNames};
use super::{ConfigError, LogFormat, LogLevel};
use crate::pipeline::PipelineConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Redis host used for pub/sub
    #[arg(long, env = "LOG_FANOUT_REDIS_HOST", default_value = "127.0.0.1")]
    pub redis_host: String,

    /// Redis port
    #[arg(long, env = "LOG_FANOUT_REDIS_PORT", default_value = "6379")]
    pub redis_port: u16,

    /// Redis database index
    #[arg(long, env = "LOG_FANOUT_REDIS_DB", default_value = "0")]
    pub redis_db: u32,

    /// Publish events to the broker (otherwise fallback file only)
    #[arg(long, env = "LOG_FANOUT_PUBSUB")]
    pub pubsub_enabled: bool,

    /// Fallback file receiving one JSON event per line
    #[arg(long, env = "LOG_FANOUT_FALLBACK_PATH", default_value = "logs/fallback.log")]
    pub fallback_path: PathBuf,

    /// Topic for the all-events queue
    #[arg(long, env = "LOG_FANOUT_TOPIC_ALL", default_value = "logs")]
    pub topic_all: String,

    /// Topic for INFO events
    #[arg(long, env = "LOG_FANOUT_TOPIC_INFO", default_value = "log-info")]
    pub topic_info: String,

    /// Topic for WARNING events
    #[arg(long, env = "LOG_FANOUT_TOPIC_WARNING", default_value = "log-warn")]
    pub topic_warning: String,

    /// Topic for ERROR events
    #[arg(long, env = "LOG_FANOUT_TOPIC_ERROR", default_value = "log-error")]
    pub topic_error: String,

    /// Topic for custom-level events
    #[arg(long, env = "LOG_FANOUT_TOPIC_CUSTOM", default_value = "log-custom")]
    pub topic_custom: String,

    /// Capacity of the all-events queue
    #[arg(long, env = "LOG_FANOUT_CAPACITY_ALL", default_value = "10000")]
    pub capacity_all: usize,

    /// Capacity of the INFO queue
    #[arg(long, env = "LOG_FANOUT_CAPACITY_INFO", default_value = "8000")]
    pub capacity_info: usize,

    /// Capacity of the WARNING queue
    #[arg(long, env = "LOG_FANOUT_CAPACITY_WARNING", default_value = "1000")]
    pub capacity_warning: usize,

    /// Capacity of the ERROR queue
    #[arg(long, env = "LOG_FANOUT_CAPACITY_ERROR", default_value = "500")]
    pub capacity_error: usize,

    /// Capacity of the custom-level queue
    #[arg(long, env = "LOG_FANOUT_CAPACITY_CUSTOM", default_value = "500")]
    pub capacity_custom: usize,

    /// Pause applied to a producer after a dropped event, in milliseconds (0 disables)
    #[arg(long, env = "LOG_FANOUT_OVERFLOW_PAUSE_MS", default_value = "0")]
    pub overflow_pause_ms: u64,

    /// Echo every shipped event to the console logger
    #[arg(long, env = "LOG_FANOUT_CONSOLE_ECHO")]
    pub console_echo: bool,

    /// How long shutdown waits for workers to drain, in seconds
    #[arg(long, env = "LOG_FANOUT_SHUTDOWN_TIMEOUT_SECS", default_value = "5")]
    pub shutdown_timeout_secs: u64,

    /// Print the final counters in the Prometheus text format on exit
    #[arg(long, env = "LOG_FANOUT_PRINT_METRICS")]
    pub print_metrics: bool,

    /// Log level of the pipeline's own diagnostics
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Console log format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Origin service name attached to events read from stdin
    #[arg(long, env = "LOG_FANOUT_SERVICE", default_value = "log-fanout")]
    pub service_name: String,

    /// Level attached to events read from stdin (INFO, WARNING, ERROR or any custom string)
    #[arg(long, env = "LOG_FANOUT_LEVEL", default_value = "INFO")]
    pub event_level: String,

    /// Configuration file path (TOML or JSON)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub overflow_pause: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub shutdown_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub broker: BrokerSettings,

    #[serde(skip)]
    #[arg(skip)]
    pub topics: TopicNames,

    #[serde(skip)]
    #[arg(skip)]
    pub capacities: QueueCapacities,
}

impl Default for Config {
    fn default() -> Self {
        let broker = BrokerSettings::default();
        let topics = TopicNames::default();
        let capacities = QueueCapacities::default();

        Self {
            redis_host: broker.host.clone(),
            redis_port: broker.port,
            redis_db: broker.db,
            pubsub_enabled: false,
            fallback_path: PathBuf::from("logs/fallback.log"),
            topic_all: topics.all.clone(),
            topic_info: topics.info.clone(),
            topic_warning: topics.warning.clone(),
            topic_error: topics.error.clone(),
            topic_custom: topics.custom.clone(),
            capacity_all: capacities.all,
            capacity_info: capacities.info,
            capacity_warning: capacities.warning,
            capacity_error: capacities.error,
            capacity_custom: capacities.custom,
            overflow_pause_ms: 0,
            console_echo: false,
            shutdown_timeout_secs: 5,
            print_metrics: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            service_name: "log-fanout".to_string(),
            event_level: "INFO".to_string(),
            config_file: None,
            overflow_pause: Duration::ZERO,
            shutdown_timeout: Duration::from_secs(5),
            broker,
            topics,
            capacities,
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string("LOG_FANOUT_REDIS_HOST", &mut config.redis_host);
        load_env_var("LOG_FANOUT_REDIS_PORT", &mut config.redis_port)?;
        load_env_var("LOG_FANOUT_REDIS_DB", &mut config.redis_db)?;
        load_env_var("LOG_FANOUT_PUBSUB", &mut config.pubsub_enabled)?;
        load_env_path("LOG_FANOUT_FALLBACK_PATH", &mut config.fallback_path);

        load_env_string("LOG_FANOUT_TOPIC_ALL", &mut config.topic_all);
        load_env_string("LOG_FANOUT_TOPIC_INFO", &mut config.topic_info);
        load_env_string("LOG_FANOUT_TOPIC_WARNING", &mut config.topic_warning);
        load_env_string("LOG_FANOUT_TOPIC_ERROR", &mut config.topic_error);
        load_env_string("LOG_FANOUT_TOPIC_CUSTOM", &mut config.topic_custom);

        load_env_var("LOG_FANOUT_CAPACITY_ALL", &mut config.capacity_all)?;
        load_env_var("LOG_FANOUT_CAPACITY_INFO", &mut config.capacity_info)?;
        load_env_var("LOG_FANOUT_CAPACITY_WARNING", &mut config.capacity_warning)?;
        load_env_var("LOG_FANOUT_CAPACITY_ERROR", &mut config.capacity_error)?;
        load_env_var("LOG_FANOUT_CAPACITY_CUSTOM", &mut config.capacity_custom)?;

        load_env_var("LOG_FANOUT_OVERFLOW_PAUSE_MS", &mut config.overflow_pause_ms)?;
        load_env_var("LOG_FANOUT_CONSOLE_ECHO", &mut config.console_echo)?;
        load_env_var(
            "LOG_FANOUT_SHUTDOWN_TIMEOUT_SECS",
            &mut config.shutdown_timeout_secs,
        )?;
        load_env_var("LOG_FANOUT_PRINT_METRICS", &mut config.print_metrics)?;
        load_env_var("LOG_LEVEL", &mut config.log_level)?;
        load_env_var("LOG_FORMAT", &mut config.log_format)?;
        load_env_string("LOG_FANOUT_SERVICE", &mut config.service_name);
        load_env_string("LOG_FANOUT_LEVEL", &mut config.event_level);
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, or JSON when the extension is `.json`.
    /// Keys missing from the file keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.<ENV>.toml` (or `.json`) from `dir`, where `ENV` defaults to `dev`.
    pub fn for_environment<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let env = std::env::var("ENV")
            .ok()
            .filter(|env| !env.is_empty())
            .unwrap_or_else(|| "dev".to_string());
        Self::for_named_environment(dir, &env)
    }

    pub fn for_named_environment<P: AsRef<Path>>(dir: P, env: &str) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        for extension in ["toml", "json"] {
            let candidate = dir.join(format!("config.{env}.{extension}"));
            if candidate.is_file() {
                return Self::from_file(candidate);
            }
        }

        Err(ConfigError::MissingEnvironmentFile {
            env: env.to_string(),
            dir: dir.display().to_string(),
        })
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        // Convert raw numbers to Duration
        self.overflow_pause = Duration::from_millis(self.overflow_pause_ms);
        self.shutdown_timeout = Duration::from_secs(self.shutdown_timeout_secs);

        // Update grouped settings
        self.broker = BrokerSettings {
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
        };
        self.topics = TopicNames {
            all: self.topic_all.clone(),
            info: self.topic_info.clone(),
            warning: self.topic_warning.clone(),
            error: self.topic_error.clone(),
            custom: self.topic_custom.clone(),
        };
        self.capacities = QueueCapacities {
            all: self.capacity_all,
            info: self.capacity_info,
            warning: self.capacity_warning,
            error: self.capacity_error,
            custom: self.capacity_custom,
        };

        Ok(())
    }

    /// Settings consumed by the pipeline core.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            capacities: self.capacities,
            topics: self.topics.clone(),
            fallback_path: self.fallback_path.clone(),
            overflow_pause: self.overflow_pause,
            console_echo: self.console_echo,
        }
    }
}
