//! `From` implementations bridging `oscnorm_config` types to core types.

use crate::config::{ListenerCfg, RouterCfg};
use crate::registry::{ChannelConfig, RowRef, RowSource};

// ── RouterCfg / ListenerCfg ─────────────────────────────────────────────────

impl From<&oscnorm_config::ServerCfg> for RouterCfg {
    fn from(c: &oscnorm_config::ServerCfg) -> Self {
        Self {
            window: c.num_samples,
        }
    }
}

impl From<&oscnorm_config::ServerCfg> for ListenerCfg {
    fn from(c: &oscnorm_config::ServerCfg) -> Self {
        Self {
            recv_timeout_ms: c.recv_timeout_ms,
            queue_depth: c.queue_depth,
            autoplay: c.autoplay,
        }
    }
}

// ── Channel rows ────────────────────────────────────────────────────────────

impl From<&oscnorm_config::ChannelRow> for ChannelConfig {
    fn from(r: &oscnorm_config::ChannelRow) -> Self {
        Self {
            command: r.command.clone(),
            data_address: r.data_address.clone(),
            min_address: r.min_value_message_address.clone(),
            max_address: r.max_value_message_address.clone(),
            static_min: r.min_value,
            static_max: r.max_value,
        }
    }
}

impl From<&oscnorm_config::DatasetRef> for RowRef {
    fn from(r: &oscnorm_config::DatasetRef) -> Self {
        Self {
            table: r.table.clone(),
            row: r.row.clone(),
        }
    }
}

impl RowSource for oscnorm_config::DataTables {
    fn find_row(&self, table: &str, row: &str) -> Option<ChannelConfig> {
        oscnorm_config::DataTables::find_row(self, table, row).map(ChannelConfig::from)
    }
}

/// Row references of a config, in declaration order.
pub fn dataset_refs(cfg: &oscnorm_config::Config) -> Vec<RowRef> {
    cfg.datasets.iter().map(RowRef::from).collect()
}
