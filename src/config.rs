use crate::core::{DbError, Result};

/// Environment variable that forces every write through the direct-insert path.
pub const FORCE_SYNC_ENV: &str = "ASYNC_INSERT_FORCE_SYNC";

/// Environment variable overriding the deferred retry ceiling.
pub const RETRY_TIMES_ENV: &str = "ASYNC_INSERT_RETRY_TIMES";

/// Environment variable silencing consumer success/duplicate logs.
pub const QUIET_LOGS_ENV: &str = "ASYNC_INSERT_QUIET_LOGS";

pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Source of the "bypass the queue" switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForceSync {
    Enabled,
    Disabled,
    /// Re-read from the named environment variable on every enqueue call.
    Env(String),
}

impl ForceSync {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Enabled => true,
            Self::Disabled => false,
            Self::Env(var) => std::env::var(var).map(|v| is_truthy(&v)).unwrap_or(false),
        }
    }
}

impl Default for ForceSync {
    fn default() -> Self {
        Self::Env(FORCE_SYNC_ENV.to_string())
    }
}

/// Deferred insert configuration
#[derive(Debug, Clone)]
pub struct AsyncInsertConfig {
    /// Bypass the queue and write directly
    pub force_sync: ForceSync,

    /// Flush passes a deferred row may fail before it is dropped
    pub max_retries: u32,

    /// Silence consumer success and duplicate logs (tests)
    pub quiet_logging: bool,

    /// Column whose explicit value is returned as the generated id
    pub primary_key_column: String,
}

impl AsyncInsertConfig {
    pub fn new() -> Self {
        Self {
            force_sync: ForceSync::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            quiet_logging: false,
            primary_key_column: "id".to_string(),
        }
    }

    /// Build from `ASYNC_INSERT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(raw) = std::env::var(RETRY_TIMES_ENV) {
            config.max_retries = raw.trim().parse().map_err(|_| {
                DbError::Config(format!("{} must be a non-negative integer, got '{}'", RETRY_TIMES_ENV, raw))
            })?;
        }

        if let Ok(raw) = std::env::var(QUIET_LOGS_ENV) {
            config.quiet_logging = is_truthy(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn force_sync(mut self, force_sync: ForceSync) -> Self {
        self.force_sync = force_sync;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn quiet_logging(mut self, quiet: bool) -> Self {
        self.quiet_logging = quiet;
        self
    }

    pub fn primary_key_column(mut self, column: &str) -> Self {
        self.primary_key_column = column.to_string();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.primary_key_column.trim().is_empty() {
            return Err(DbError::Config("primary_key_column cannot be empty".to_string()));
        }

        if let ForceSync::Env(var) = &self.force_sync
            && var.trim().is_empty()
        {
            return Err(DbError::Config("force_sync environment variable name cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for AsyncInsertConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
