use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "voicepilot", about = "VoicePilot - voice command engine")]
pub struct CliArgs {
    /// Config file to load (created with defaults if missing)
    #[arg(long, env = "VOICEPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the HTTP API binds to
    #[arg(long, env = "VOICEPILOT_BIND")]
    pub bind: Option<String>,

    /// Port the HTTP API listens on
    #[arg(long, env = "VOICEPILOT_PORT")]
    pub port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "VOICEPILOT_LOG", default_value = "voicepilot=info")]
    pub log: String,

    /// Run a single command, print the response as JSON and exit
    #[arg(long)]
    pub command: Option<String>,
}

impl CliArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::config_file_path)
    }

    /// Flags take precedence over the config file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}
