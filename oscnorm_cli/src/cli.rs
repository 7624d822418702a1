//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "oscnorm", version, about = "OSC sample normalizer")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/oscnorm.toml")]
    pub config: PathBuf,

    /// Print events and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bind the UDP port and print normalized events until Ctrl-C
    Listen {
        /// Override server.ip
        #[arg(long)]
        ip: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
        /// Stop after this many milliseconds
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },
    /// Feed a script of `<address> [value]` lines through the configured channels
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Encode and send one OSC message
    Send {
        /// Destination, e.g. 127.0.0.1:3333
        #[arg(long, value_name = "HOST:PORT")]
        target: String,
        #[arg(value_name = "ADDRESS")]
        address: String,
        /// Integer, float or string argument
        #[arg(value_name = "VALUE", allow_hyphen_values = true)]
        value: Option<String>,
    },
    /// Load and validate the config, then list the resulting channels
    CheckConfig,
    /// Print the discovered local IP address
    LocalIp,
}
