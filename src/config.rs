//! Configuration for the interviewer.
//!
//! Settings are read from `.interviewer/interviewer.toml` and layered:
//! file, then environment, then command-line flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [assistant]
//! api_base = "https://api.openai.com/v1"
//! assistant_id = "asst_abc123"
//! api_key_env = "OPENAI_API_KEY"
//! request_timeout_secs = 60
//!
//! [polling]
//! fast_interval_ms = 1000
//! fast_attempts = 10
//! medium_interval_ms = 2000
//! medium_attempts = 20
//! slow_interval_ms = 3000
//! max_attempts = 60
//! poll_retries = 3
//! poll_retry_delay_ms = 500
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 2000
//!
//! [interview]
//! min_reply_chars = 20
//! keyword_fallback = false
//! keyword_density = 0.5
//!
//! [store]
//! dir = "/var/lib/interviewer"
//!
//! [logging]
//! dir = ".interviewer/logs"
//!
//! [[links]]
//! phrase = "Brand Studio"
//! url = "https://example.com/studio"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assistant::OpenAiAssistant;
use crate::controller::ControllerSettings;
use crate::orchestrator::PollSchedule;
use crate::parser::PromoLink;
use crate::retry::RetryPolicy;
use crate::tracker::DEFAULT_MIN_REPLY_CHARS;

/// Directory holding the config file, local store and logs.
pub const CONFIG_DIR: &str = ".interviewer";
pub const CONFIG_FILE: &str = "interviewer.toml";

pub const ENV_ASSISTANT_ID: &str = "INTERVIEWER_ASSISTANT_ID";
pub const ENV_API_BASE: &str = "INTERVIEWER_API_BASE";
pub const ENV_STORE_DIR: &str = "INTERVIEWER_STORE_DIR";

/// Connection to the assistant service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Assistant to run on each thread
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            assistant_id: None,
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Run status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSection {
    #[serde(default = "default_fast_interval_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "default_fast_attempts")]
    pub fast_attempts: u32,
    #[serde(default = "default_medium_interval_ms")]
    pub medium_interval_ms: u64,
    #[serde(default = "default_medium_attempts")]
    pub medium_attempts: u32,
    #[serde(default = "default_slow_interval_ms")]
    pub slow_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_attempts: u32,
    /// Attempts per single status request
    #[serde(default = "default_poll_retries")]
    pub poll_retries: u32,
    #[serde(default = "default_poll_retry_delay_ms")]
    pub poll_retry_delay_ms: u64,
}

fn default_fast_interval_ms() -> u64 {
    1000
}

fn default_fast_attempts() -> u32 {
    10
}

fn default_medium_interval_ms() -> u64 {
    2000
}

fn default_medium_attempts() -> u32 {
    20
}

fn default_slow_interval_ms() -> u64 {
    3000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_poll_retries() -> u32 {
    3
}

fn default_poll_retry_delay_ms() -> u64 {
    500
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            fast_interval_ms: default_fast_interval_ms(),
            fast_attempts: default_fast_attempts(),
            medium_interval_ms: default_medium_interval_ms(),
            medium_attempts: default_medium_attempts(),
            slow_interval_ms: default_slow_interval_ms(),
            max_attempts: default_max_poll_attempts(),
            poll_retries: default_poll_retries(),
            poll_retry_delay_ms: default_poll_retry_delay_ms(),
        }
    }
}

impl PollingSection {
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            fast_interval: Duration::from_millis(self.fast_interval_ms),
            fast_attempts: self.fast_attempts,
            medium_interval: Duration::from_millis(self.medium_interval_ms),
            medium_attempts: self.medium_attempts,
            slow_interval: Duration::from_millis(self.slow_interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

/// End-to-end retry of a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Answer detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSection {
    /// Shortest reply that counts as an answer
    #[serde(default = "default_min_reply_chars")]
    pub min_reply_chars: usize,
    /// Match paraphrased questions by keyword overlap
    #[serde(default)]
    pub keyword_fallback: bool,
    #[serde(default = "default_keyword_density")]
    pub keyword_density: f64,
}

fn default_min_reply_chars() -> usize {
    DEFAULT_MIN_REPLY_CHARS
}

fn default_keyword_density() -> f64 {
    0.5
}

impl Default for InterviewSection {
    fn default() -> Self {
        Self {
            min_reply_chars: default_min_reply_chars(),
            keyword_fallback: false,
            keyword_density: default_keyword_density(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    /// Interview documents directory (default: `.interviewer/interviews`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Write daily-rolling log files here when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// The complete interviewer.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewerToml {
    #[serde(default)]
    pub assistant: AssistantSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub interview: InterviewSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// Promotional phrases linked in assistant prose
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<PromoLink>,
}

impl InterviewerToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse interviewer.toml")
    }

    /// Load `interviewer.toml` from the config directory, or defaults if it is absent.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize interviewer.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Assistant id, with the environment taking precedence over the file.
    pub fn assistant_id(&self) -> Option<String> {
        std::env::var(ENV_ASSISTANT_ID)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.assistant.assistant_id.clone())
    }

    /// API base URL, with the environment taking precedence over the file.
    pub fn api_base(&self) -> String {
        std::env::var(ENV_API_BASE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.assistant.api_base.clone())
    }

    /// API key read from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.assistant.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// Settings for the progression controller.
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            retry: RetryPolicy::new(
                self.retry.max_attempts,
                Duration::from_millis(self.retry.delay_ms),
            ),
            poll_retry: RetryPolicy::new(
                self.polling.poll_retries,
                Duration::from_millis(self.polling.poll_retry_delay_ms),
            ),
            schedule: self.polling.schedule(),
            min_reply_chars: self.interview.min_reply_chars,
            keyword_density: self
                .interview
                .keyword_fallback
                .then_some(self.interview.keyword_density),
            links: self.links.clone(),
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.assistant.api_base.starts_with("http://")
            && !self.assistant.api_base.starts_with("https://")
        {
            warnings.push(format!(
                "Invalid api_base '{}': should start with http:// or https://",
                self.assistant.api_base
            ));
        }
        if self.assistant.request_timeout_secs == 0 {
            warnings.push("request_timeout_secs must be greater than 0".to_string());
        }

        let p = &self.polling;
        if p.max_attempts == 0 {
            warnings.push("polling.max_attempts must be greater than 0".to_string());
        }
        if p.fast_attempts > p.medium_attempts {
            warnings.push(format!(
                "polling.fast_attempts ({}) is larger than polling.medium_attempts ({})",
                p.fast_attempts, p.medium_attempts
            ));
        }
        if p.poll_retries == 0 {
            warnings.push("polling.poll_retries of 0 is treated as 1".to_string());
        }
        if self.retry.max_attempts == 0 {
            warnings.push("retry.max_attempts of 0 is treated as 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.interview.keyword_density) {
            warnings.push(format!(
                "Invalid keyword_density {}: should be between 0.0 and 1.0",
                self.interview.keyword_density
            ));
        }
        if self.interview.min_reply_chars == 0 {
            warnings.push("min_reply_chars of 0 counts any reply as an answer".to_string());
        }

        for link in &self.links {
            if link.phrase.trim().is_empty() {
                warnings.push(format!("Link to '{}' has an empty phrase", link.url));
            }
            if !link.url.starts_with("http://") && !link.url.starts_with("https://") {
                warnings.push(format!(
                    "Link for '{}' has an invalid url '{}'",
                    link.phrase, link.url
                ));
            }
        }

        warnings
    }
}

/// Runtime configuration merged from file, environment and CLI flags.
#[derive(Debug, Clone)]
pub struct InterviewerConfig {
    pub project_dir: PathBuf,
    /// Path to the `.interviewer` directory
    pub config_dir: PathBuf,
    pub toml: InterviewerToml,
    /// CLI override for the store directory
    pub cli_store_dir: Option<PathBuf>,
}

impl InterviewerConfig {
    /// Load the configuration for a project directory.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = InterviewerToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            cli_store_dir: None,
        })
    }

    /// Create the configuration with CLI overrides.
    pub fn with_cli_args(project_dir: PathBuf, store_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_store_dir = store_dir;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Interview store directory (CLI, then env, then file, then default).
    pub fn store_dir(&self) -> PathBuf {
        let configured = self
            .cli_store_dir
            .clone()
            .or_else(|| std::env::var_os(ENV_STORE_DIR).map(PathBuf::from))
            .or_else(|| self.toml.store.dir.clone());
        match configured {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => self.project_dir.join(dir),
            None => self.config_dir.join("interviews"),
        }
    }

    /// Directory for log files, if file logging is enabled.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.toml.logging.dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.project_dir.join(dir)
            }
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        self.toml.controller_settings()
    }

    /// Build the assistant client, failing when the key or assistant id is missing.
    pub fn assistant(&self) -> Result<OpenAiAssistant> {
        let api_key = self.toml.api_key().with_context(|| {
            format!(
                "No API key found. Set {} in the environment or a .env file.",
                self.toml.assistant.api_key_env
            )
        })?;
        let assistant_id = self.toml.assistant_id().with_context(|| {
            format!(
                "No assistant id configured. Set [assistant] assistant_id in {} or {}.",
                self.config_file().display(),
                ENV_ASSISTANT_ID
            )
        })?;
        OpenAiAssistant::new(
            self.toml.api_base(),
            api_key,
            assistant_id,
            Duration::from_secs(self.toml.assistant.request_timeout_secs),
        )
        .context("Failed to build assistant client")
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.toml.assistant_id().is_none() {
            warnings.push(format!(
                "No assistant id configured ([assistant] assistant_id or {})",
                ENV_ASSISTANT_ID
            ));
        }
        if self.toml.api_key().is_none() {
            warnings.push(format!(
                "{} is not set; the assistant cannot be reached",
                self.toml.assistant.api_key_env
            ));
        }
        warnings
    }
}
