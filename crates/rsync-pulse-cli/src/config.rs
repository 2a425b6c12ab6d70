use crate::commands::SyncArgs;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use rsync_pulse_core::command::DEFAULT_PROGRAM;
use rsync_pulse_core::{Error, SyncCommand, SyncOptions};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rsync_binary: String,
    pub source_path: Option<String>,
    pub dest_path: Option<String>,
    pub dry_run: bool,
    pub delete: bool,
    pub pulse_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rsync_binary: DEFAULT_PROGRAM.to_string(),
            source_path: None,
            dest_path: None,
            dry_run: false,
            delete: false,
            pulse_interval_ms: 100,
        }
    }
}

/// Load `RsyncPulse.{toml,yaml,json,...}` if present, then `RSYNC_PULSE_*`
/// environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("RsyncPulse").required(false))
        .add_source(Environment::with_prefix("RSYNC_PULSE").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

impl AppConfig {
    /// Command-line values win; flags are switched on by either side.
    pub fn sync_options(&self, args: &SyncArgs) -> Result<SyncOptions, Error> {
        let source = args.source.as_ref().or(self.source_path.as_ref());
        let dest = args.dest.as_ref().or(self.dest_path.as_ref());

        SyncOptions::new(
            source.cloned().unwrap_or_default(),
            dest.cloned().unwrap_or_default(),
            args.dry_run || self.dry_run,
            args.delete || self.delete,
        )
    }

    pub fn sync_command(&self, args: &SyncArgs, options: &SyncOptions) -> SyncCommand {
        let program = args.rsync.as_deref().unwrap_or(&self.rsync_binary);
        SyncCommand::new(options).with_program(program)
    }

    pub fn pulse_interval(&self) -> Duration {
        Duration::from_millis(self.pulse_interval_ms.max(10))
    }
}
