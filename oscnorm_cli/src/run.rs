//! Subcommand implementations: config loading, router assembly, event output.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use oscnorm_core::error::{OscNormError, Result};
use oscnorm_core::{ListenerCfg, MessageRouter, ServerBuilder};
use oscnorm_traits::{OscArg, OscEvent, OscMessage};
use oscnorm_transport::{SimulatedSource, UdpSource};

/// Read and validate the config; every failure is reported as a config error.
pub fn load_config(path: &Path) -> Result<oscnorm_config::Config> {
    oscnorm_config::load_file(path)
        .map_err(|e| OscNormError::Config(format!("{e:#}")).into())
}

/// Build the router from the config's datasets. Relative CSV table paths are
/// resolved next to the config file.
pub fn build_router(cfg: &oscnorm_config::Config, config_path: &Path) -> Result<MessageRouter> {
    let base_dir = config_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let router = oscnorm_core::router_from_config(cfg, &base_dir).map_err(|e| {
        if e.downcast_ref::<oscnorm_core::BuildError>().is_some() {
            e
        } else {
            OscNormError::Config(format!("{e:#}")).into()
        }
    })?;
    let report = router.load_report();
    tracing::info!(
        channels = router.registry().len(),
        skipped = report.skipped.len(),
        replaced = report.replaced.len(),
        "router ready"
    );
    Ok(router)
}

/// One line per event on stdout, as text or JSON.
pub fn format_event(event: &OscEvent, json: bool) -> String {
    if json {
        let mut obj = serde_json::json!({ "event": event.kind() });
        if let Some(command) = event.command() {
            obj["command"] = command.into();
        }
        if let Some(value) = event.value() {
            obj["value"] = value.into();
        }
        return obj.to_string();
    }
    match (event.command(), event.value()) {
        (Some(command), Some(value)) => format!("{} {command} {value:.3}", event.kind()),
        _ => event.kind().to_string(),
    }
}

fn printer(json: bool) -> impl FnMut(&OscEvent) + Send + 'static {
    move |event: &OscEvent| println!("{}", format_event(event, json))
}

/// Parse one OSC argument: integer, then float, then string.
pub fn parse_arg(token: &str) -> OscArg {
    if let Ok(i) = token.parse::<i32>() {
        OscArg::Int(i)
    } else if let Ok(f) = token.parse::<f32>() {
        OscArg::Float(f)
    } else {
        OscArg::Str(token.to_string())
    }
}

/// Parse a replay script: `<address> [value ...]` per line, `#` starts a comment.
pub fn parse_script(text: &str) -> Result<Vec<OscMessage>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(address) = tokens.next() else {
            continue;
        };
        if !address.starts_with('/') {
            eyre::bail!(
                "script line {}: address {address:?} must start with '/'",
                idx + 1
            );
        }
        out.push(OscMessage::new(address, tokens.map(parse_arg).collect()));
    }
    Ok(out)
}

pub fn run_replay(
    cfg: &oscnorm_config::Config,
    config_path: &Path,
    script: &Path,
    json: bool,
) -> Result<usize> {
    let text = std::fs::read_to_string(script)
        .map_err(|e| OscNormError::Io(format!("read script {}: {e}", script.display())))?;
    let messages = parse_script(&text)?;

    let mut router = build_router(cfg, config_path)?;
    router.subscribe(printer(json));

    let mut source = SimulatedSource::new();
    for msg in &messages {
        source
            .push(msg)
            .wrap_err_with(|| format!("encode {}", msg.address))?;
    }

    let listener = ListenerCfg {
        autoplay: true,
        ..ListenerCfg::from(&cfg.server)
    };
    let mut server = ServerBuilder::new()
        .with_source(source)
        .with_router(router)
        .with_listener(listener)
        .with_name(cfg.server.name.clone())
        .build()?;

    let expected = messages.len();
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut routed = 0;
    while routed < expected && Instant::now() < deadline {
        routed += server.pump(Duration::from_millis(50));
    }
    server.stop_listening();
    tracing::info!(messages = expected, "replay finished");
    Ok(expected)
}

/// Resolve the bind address: CLI flags, then auto-discovery, then config.
fn bind_addr(
    cfg: &oscnorm_config::ServerCfg,
    ip: Option<String>,
    port: Option<u16>,
) -> Result<SocketAddr> {
    let ip = match ip {
        Some(ip) => ip,
        None if cfg.auto_init_ip => oscnorm_transport::local_ip_address()
            .ok_or_else(|| OscNormError::Transport("could not determine local IP address".into()))?
            .to_string(),
        None => cfg.ip.clone(),
    };
    let port = port.unwrap_or(cfg.port);
    format!("{ip}:{port}")
        .parse::<SocketAddr>()
        .map_err(|e| OscNormError::Config(format!("invalid bind address {ip}:{port}: {e}")).into())
}

pub fn run_listen(
    cfg: &oscnorm_config::Config,
    config_path: &Path,
    ip: Option<String>,
    port: Option<u16>,
    duration_ms: Option<u64>,
    json: bool,
    shutdown: &Arc<AtomicBool>,
) -> Result<u64> {
    let addr = bind_addr(&cfg.server, ip, port)?;
    let source = UdpSource::bind(addr)?;
    let local = source.local_addr()?;

    let mut router = build_router(cfg, config_path)?;
    router.subscribe(printer(json));

    let mut server = ServerBuilder::new()
        .with_source(source)
        .with_router(router)
        .with_listener(ListenerCfg::from(&cfg.server))
        .with_name(cfg.server.name.clone())
        .build()?;
    server.start_listening()?;
    tracing::info!(server = %cfg.server.name, %local, "listening for OSC messages");

    let deadline = duration_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
    let tick = Duration::from_millis(cfg.server.recv_timeout_ms.max(1));
    while !shutdown.load(Ordering::Relaxed) && deadline.is_none_or(|d| Instant::now() < d) {
        server.pump(tick);
    }
    let received = server.received();
    server.stop_listening();
    tracing::info!(received, "listener stopped");
    Ok(received)
}

pub fn run_send(target: &str, address: &str, value: Option<&str>) -> Result<usize> {
    let args = value.map(parse_arg).into_iter().collect();
    let msg = OscMessage::new(address, args);
    let sent = oscnorm_transport::send_message(target, &msg)?;
    Ok(sent)
}

pub fn run_check_config(
    cfg: &oscnorm_config::Config,
    config_path: &Path,
    json: bool,
) -> Result<()> {
    let router = build_router(cfg, config_path)?;
    let registry = router.registry();
    let report = router.load_report();

    if json {
        let channels: Vec<_> = registry
            .iter()
            .map(|ch| {
                let c = ch.config();
                serde_json::json!({
                    "command": c.command,
                    "data_address": c.data_address,
                    "min_address": c.min_address,
                    "max_address": c.max_address,
                    "min_value": c.static_min,
                    "max_value": c.static_max,
                })
            })
            .collect();
        let skipped: Vec<_> = report
            .skipped
            .iter()
            .map(|s| serde_json::json!({ "index": s.index, "reason": s.reason.to_string() }))
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "window": registry.window_capacity(),
                "channels": channels,
                "skipped": skipped,
                "replaced": report.replaced,
            })
        );
        return Ok(());
    }

    println!(
        "config ok: {} channel(s), window {}",
        registry.len(),
        registry.window_capacity()
    );
    for ch in registry.iter() {
        let c = ch.config();
        println!(
            "  {} data={} min={} max={} range=[{}, {}]",
            c.command, c.data_address, c.min_address, c.max_address, c.static_min, c.static_max
        );
    }
    for s in &report.skipped {
        println!("  skipped dataset #{}: {}", s.index, s.reason);
    }
    for cmd in &report.replaced {
        println!("  replaced earlier definition of {cmd}");
    }
    Ok(())
}

pub fn run_local_ip(json: bool) -> Result<()> {
    let ip = oscnorm_transport::local_ip_address()
        .ok_or_else(|| OscNormError::Transport("could not determine local IP address".into()))?;
    if json {
        println!("{}", serde_json::json!({ "ip": ip.to_string() }));
    } else {
        println!("{ip}");
    }
    Ok(())
}
