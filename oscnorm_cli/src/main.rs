#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! `oscnorm` command-line front end.

mod cli;
mod error_fmt;
mod logging;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: failed to install error report hook: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "command failed");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> oscnorm_core::Result<()> {
    let needs_config = matches!(
        cli.cmd,
        Commands::Listen { .. } | Commands::Replay { .. } | Commands::CheckConfig
    );
    let cfg = if needs_config {
        match run::load_config(&cli.config) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                logging::init(cli.json, &cli.log_level, None);
                return Err(e);
            }
        }
    } else {
        None
    };
    logging::init(cli.json, &cli.log_level, cfg.as_ref().map(|c| &c.logging));

    match (cli.cmd, cfg) {
        (
            Commands::Listen {
                ip,
                port,
                duration_ms,
            },
            Some(cfg),
        ) => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            run::run_listen(&cfg, &cli.config, ip, port, duration_ms, cli.json, &shutdown)?;
        }
        (Commands::Replay { script }, Some(cfg)) => {
            run::run_replay(&cfg, &cli.config, &script, cli.json)?;
        }
        (Commands::CheckConfig, Some(cfg)) => {
            run::run_check_config(&cfg, &cli.config, cli.json)?;
        }
        (
            Commands::Send {
                target,
                address,
                value,
            },
            _,
        ) => {
            let sent = run::run_send(&target, &address, value.as_deref())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "sent_bytes": sent, "target": target, "address": address })
                );
            } else {
                println!("sent {sent} bytes to {target}");
            }
        }
        (Commands::LocalIp, _) => run::run_local_ip(cli.json)?,
        (_, None) => {
            return Err(oscnorm_core::OscNormError::State("config was not loaded".into()).into());
        }
    }
    Ok(())
}
