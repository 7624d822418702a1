//! Human-readable error descriptions and structured JSON error formatting.

use oscnorm_core::error::{BuildError, OscNormError};
use oscnorm_transport::TransportError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::ZeroWindow => {
                "What happened: The sample window size is zero.\nLikely causes: server.num_samples = 0 in the config.\nHow to fix: Set server.num_samples to 1 or more (default 10).".to_string()
            }
            BuildError::ZeroQueue => {
                "What happened: The inbound queue has no capacity.\nLikely causes: server.queue_depth = 0 in the config.\nHow to fix: Set server.queue_depth to 1 or more (default 256).".to_string()
            }
        };
    }

    if let Some(oe) = err.downcast_ref::<OscNormError>() {
        return match oe {
            OscNormError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("must have headers") {
                    format!(
                        "What happened: A data table CSV has the wrong header.\nLikely causes: Columns renamed, reordered or missing.\nHow to fix: Use exactly '{}' as the first line. Original: {msg}",
                        oscnorm_config::CSV_HEADERS.join(",")
                    )
                } else if lower.contains("read config") {
                    format!(
                        "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file. Original: {msg}"
                    )
                } else {
                    format!(
                        "What happened: Configuration is invalid.\nLikely causes: A typo in the TOML, an address without a leading '/', or out-of-range [server] values.\nHow to fix: Edit the config and run `oscnorm check-config`. Original: {msg}"
                    )
                }
            }
            OscNormError::Transport(msg) => format!(
                "What happened: Network transport failed ({msg}).\nLikely causes: No usable network interface.\nHow to fix: Set server.ip explicitly instead of relying on discovery."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TransportError>() {
        return match te {
            TransportError::Io(e) if e.kind() == std::io::ErrorKind::AddrInUse => format!(
                "What happened: The UDP port is already in use.\nLikely causes: Another listener is running on the same port.\nHow to fix: Stop the other process or pass --port. Original: {e}"
            ),
            TransportError::Io(e) if e.kind() == std::io::ErrorKind::AddrNotAvailable => format!(
                "What happened: The bind address is not available on this host.\nLikely causes: server.ip names an address of another machine.\nHow to fix: Use 0.0.0.0, 127.0.0.1 or `oscnorm local-ip`. Original: {e}"
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: Invalid target or address.\nHow to fix: Check the HOST:PORT and make sure the OSC address starts with '/'."
            ),
        };
    }

    let msg = err.to_string();

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes: 3 for configuration, 4 for transport, 1 otherwise.
/// Usage errors exit with 2 from clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<OscNormError>() {
        Some(OscNormError::Config(_)) => return 3,
        Some(OscNormError::Transport(_)) => return 4,
        _ => {}
    }
    if err.downcast_ref::<TransportError>().is_some() {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "BuildError";
    }
    match err.downcast_ref::<OscNormError>() {
        Some(OscNormError::Config(_)) => return "ConfigError",
        Some(OscNormError::Transport(_)) => return "TransportError",
        _ => {}
    }
    if err.downcast_ref::<TransportError>().is_some() {
        return "TransportError";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
