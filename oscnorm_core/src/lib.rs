#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! OSC normalizer core (transport-agnostic).
//!
//! Incoming OSC messages are matched against a registry of channels. Each
//! channel keeps a sliding window of integer samples, a dynamic input range
//! captured on demand from the window mean, and a static output range the
//! mean is remapped into. Messages arrive through `oscnorm_traits::MessageSource`
//! and results leave through `oscnorm_traits::EventSink`.
//!
//! ## Architecture
//!
//! - **Window**: bounded FIFO of samples and its mean (`window`)
//! - **Registry**: ordered channel table with last-write-wins on duplicate
//!   commands (`registry`)
//! - **Calibration**: dynamic min/max capture (`calibration`)
//! - **Normalization**: clamped linear remap (`normalize`)
//! - **Routing**: address matching and event emission (`router`)
//! - **Server**: listener thread plus start/stop lifecycle (`server`)

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod listener;
pub mod mocks;
pub mod normalize;
pub mod registry;
pub mod router;
pub mod server;
pub mod window;

pub use builder::{Missing, RouterBuilder, ServerBuilder};
pub use calibration::{
    DEFAULT_DYNAMIC_MAX, DEFAULT_DYNAMIC_MIN, DynamicRange, UNKNOWN_CHANNEL_SENTINEL,
};
pub use config::{ListenerCfg, RouterCfg};
pub use conversions::dataset_refs;
pub use error::{BuildError, OscNormError, Result, SkipReason};
pub use normalize::map_range_clamped;
pub use registry::{
    Channel, ChannelConfig, ChannelRegistry, LoadReport, RowRef, RowSource, SkippedEntry,
};
pub use router::{MessageRouter, RouteAction};
pub use server::OscServer;
pub use window::{DEFAULT_WINDOW, SampleWindow};

/// Build a router from a loaded configuration.
///
/// Channel rows come from the inline tables plus any CSV `table_files`,
/// resolved relative to `base_dir`.
pub fn router_from_config(
    cfg: &oscnorm_config::Config,
    base_dir: &std::path::Path,
) -> Result<MessageRouter> {
    use eyre::WrapErr;

    let tables = cfg
        .load_tables(base_dir)
        .wrap_err("failed to load data tables")?;
    MessageRouter::builder()
        .with_cfg(RouterCfg::from(&cfg.server))
        .with_datasets(dataset_refs(cfg), tables)
        .try_build()
}
