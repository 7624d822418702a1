//! Tracing subscriber setup.
//!
//! Console output always goes to stderr so stdout carries only events.
//! `RUST_LOG` overrides `--log-level` for the console. The optional file layer
//! writes JSON lines at the `[logging]` level through a non-blocking appender.

use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init(json: bool, level: &str, logging: Option<&oscnorm_config::Logging>) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    layers.push(console);

    if let Some(file_layer) = logging.and_then(file_layer) {
        layers.push(file_layer);
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn file_layer(logging: &oscnorm_config::Logging) -> Option<BoxedLayer> {
    let file = logging.file.as_deref()?;
    let path = std::path::Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let prefix = path.file_name()?.to_string_lossy().into_owned();
    let rotation = match logging.rotation.as_deref() {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    };

    let appender = match RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .build(dir)
    {
        Ok(a) => a,
        Err(e) => {
            eprintln!("warning: cannot open log file {file}: {e}");
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let level = logging.level.as_deref().unwrap_or("info");
    Some(
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(EnvFilter::new(level))
            .boxed(),
    )
}
