//! Node configuration.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use spell_runtime::RuntimeConfig;

/// Settings for one `spellcast` process.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub runtime: RuntimeConfig,
    /// Spellbook to load instead of the embedded one.
    pub spellbook: Option<PathBuf>,
    /// Directory for the log file. Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// How long after startup the physics stub comes online.
    pub physics_delay: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            spellbook: None,
            log_dir: default_log_dir(),
            physics_delay: Duration::ZERO,
        }
    }
}

impl NodeConfig {
    /// Construct node configuration from environment variables.
    ///
    /// Environment variables (in addition to [`RuntimeConfig::from_env`]):
    /// - `SPELL_SPELLBOOK` - Path to a RON spellbook (default: embedded)
    /// - `SPELL_LOG_DIR` - Log directory, `-` for stderr (default: platform cache dir)
    /// - `SPELL_PHYSICS_DELAY_MS` - Delay before physics is provided (default: 0)
    pub fn from_env() -> Self {
        let mut config = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };

        if let Some(path) = read_env::<PathBuf>("SPELL_SPELLBOOK") {
            config.spellbook = Some(path);
        }
        if let Some(dir) = read_env::<String>("SPELL_LOG_DIR") {
            config.log_dir = (dir != "-").then(|| PathBuf::from(dir));
        }
        if let Some(ms) = read_env::<u64>("SPELL_PHYSICS_DELAY_MS") {
            config.physics_delay = Duration::from_millis(ms);
        }

        config
    }

    /// Visual tick period for channel progress sampling.
    pub fn tick(&self) -> Duration {
        Duration::from_secs_f64(self.runtime.cast.channel_tick_seconds)
    }
}

fn default_log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "spellcast").map(|dirs| dirs.cache_dir().join("logs"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
