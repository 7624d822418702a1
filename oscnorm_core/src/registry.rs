//! Channel registry: per-command configuration plus the runtime state that
//! travels with it.
//!
//! Each registered command owns exactly one [`Channel`], which bundles its
//! configuration, sample window and dynamic range. Keeping them in one record
//! means the three can never drift apart.

use std::collections::HashMap;

use crate::calibration::DynamicRange;
use crate::error::SkipReason;
use crate::window::{DEFAULT_WINDOW, SampleWindow};

/// Immutable per-command configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub command: String,
    pub data_address: String,
    pub min_address: String,
    pub max_address: String,
    /// Lower bound of the normalized output range.
    pub static_min: f32,
    /// Upper bound of the normalized output range.
    pub static_max: f32,
}

impl ChannelConfig {
    pub fn new(
        command: impl Into<String>,
        data_address: impl Into<String>,
        min_address: impl Into<String>,
        max_address: impl Into<String>,
        static_min: f32,
        static_max: f32,
    ) -> Self {
        Self {
            command: command.into(),
            data_address: data_address.into(),
            min_address: min_address.into(),
            max_address: max_address.into(),
            static_min,
            static_max,
        }
    }
}

/// A registered command with its live state.
#[derive(Debug, Clone)]
pub struct Channel {
    pub(crate) config: ChannelConfig,
    pub(crate) window: SampleWindow,
    pub(crate) range: DynamicRange,
}

impl Channel {
    fn new(config: ChannelConfig, capacity: usize) -> Self {
        Self {
            config,
            window: SampleWindow::new(capacity),
            range: DynamicRange::default(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn range(&self) -> DynamicRange {
        self.range
    }

    pub fn command(&self) -> &str {
        &self.config.command
    }
}

/// Reference to a configuration row. A missing or blank part makes it null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRef {
    pub table: Option<String>,
    pub row: Option<String>,
}

impl RowRef {
    pub fn new(table: &str, row: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            row: Some(row.to_string()),
        }
    }

    pub fn null() -> Self {
        Self::default()
    }

    fn parts(&self) -> Option<(&str, &str)> {
        let table = self.table.as_deref().filter(|s| !s.trim().is_empty())?;
        let row = self.row.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((table, row))
    }
}

/// Lookup of channel rows by `(table, row)`.
pub trait RowSource {
    fn find_row(&self, table: &str, row: &str) -> Option<ChannelConfig>;
}

impl RowSource for HashMap<(String, String), ChannelConfig> {
    fn find_row(&self, table: &str, row: &str) -> Option<ChannelConfig> {
        self.get(&(table.to_string(), row.to_string())).cloned()
    }
}

fn command_key(command: &str) -> String {
    command.to_ascii_lowercase()
}

/// A configuration entry that did not become a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Position of the entry in the input list.
    pub index: usize,
    pub reason: SkipReason,
}

/// Outcome of [`ChannelRegistry::load`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of entries registered (duplicates counted each time).
    pub accepted: usize,
    /// Commands whose earlier definition was replaced by a later entry.
    pub replaced: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

/// Channels keyed by command, iterated in first-registration order.
///
/// Command lookups ignore ASCII case: `Volume` and `VOLUME` name the same
/// channel, and events carry the spelling of the most recent definition.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
    index: HashMap<String, usize>,
    window_capacity: usize,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ChannelRegistry {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            channels: Vec::new(),
            index: HashMap::new(),
            window_capacity: window_capacity.max(1),
        }
    }

    /// Register a channel with fresh runtime state.
    ///
    /// A command that is already present keeps its position but has its
    /// configuration, window and dynamic range replaced. Returns `true` in that case.
    pub fn insert(&mut self, config: ChannelConfig) -> bool {
        let channel = Channel::new(config, self.window_capacity);
        let key = command_key(channel.command());
        if let Some(&idx) = self.index.get(&key) {
            self.channels[idx] = channel;
            true
        } else {
            self.index.insert(key, self.channels.len());
            self.channels.push(channel);
            false
        }
    }

    /// Resolve `entries` against `rows` and register every row that resolves.
    ///
    /// Null references and rows that cannot be found are skipped and reported;
    /// they never abort the load.
    pub fn load<'a, I, S>(&mut self, entries: I, rows: &S) -> LoadReport
    where
        I: IntoIterator<Item = &'a RowRef>,
        S: RowSource + ?Sized,
    {
        let mut report = LoadReport::default();
        for (index, entry) in entries.into_iter().enumerate() {
            let Some((table, row)) = entry.parts() else {
                tracing::warn!(index, "skipping null dataset reference");
                report.skipped.push(SkippedEntry {
                    index,
                    reason: SkipReason::NullReference,
                });
                continue;
            };
            let Some(config) = rows.find_row(table, row) else {
                tracing::warn!(index, table, row, "skipping unresolved dataset reference");
                report.skipped.push(SkippedEntry {
                    index,
                    reason: SkipReason::RowNotFound {
                        table: table.to_string(),
                        row: row.to_string(),
                    },
                });
                continue;
            };
            let command = config.command.clone();
            if self.insert(config) {
                tracing::debug!(command = %command, "dataset replaces earlier definition");
                report.replaced.push(command);
            }
            report.accepted += 1;
        }
        tracing::info!(
            channels = self.len(),
            skipped = report.skipped.len(),
            "initialized datasets"
        );
        report
    }

    pub fn get(&self, command: &str) -> Option<&Channel> {
        self.index
            .get(&command_key(command))
            .map(|&i| &self.channels[i])
    }

    pub(crate) fn get_mut(&mut self, command: &str) -> Option<&mut Channel> {
        let idx = *self.index.get(&command_key(command))?;
        self.channels.get_mut(idx)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.index.contains_key(&command_key(command))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    /// Channels in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(Channel::command)
    }

    /// Append a sample to `command`'s window. Unknown commands are ignored.
    pub fn push_sample(&mut self, command: &str, value: i32) -> bool {
        match self.get_mut(command) {
            Some(ch) => {
                ch.window.push(value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(cmd: &str, data: &str) -> ChannelConfig {
        ChannelConfig::new(cmd, data, "/min", "/max", 0.0, 100.0)
    }

    #[test]
    fn duplicate_command_replaces_in_place() {
        let mut reg = ChannelRegistry::new(4);
        assert!(!reg.insert(cfg("A", "/a")));
        assert!(!reg.insert(cfg("B", "/b")));
        reg.push_sample("A", 5);
        assert!(reg.insert(cfg("A", "/a2")));

        assert_eq!(reg.commands().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = reg.get("A").unwrap();
        assert_eq!(a.config().data_address, "/a2");
        assert!(a.window().is_empty());
    }

    #[test]
    fn commands_differing_in_case_are_one_channel() {
        let mut reg = ChannelRegistry::new(4);
        assert!(!reg.insert(cfg("Volume", "/vol")));
        assert!(reg.insert(cfg("VOLUME", "/vol2")));

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.commands().collect::<Vec<_>>(), vec!["VOLUME"]);
        assert!(reg.contains("volume"));
        assert!(reg.push_sample("vOlUmE", 7));
        assert_eq!(reg.get("Volume").unwrap().config().data_address, "/vol2");
        assert_eq!(reg.get("volume").unwrap().window().len(), 1);
    }

    #[test]
    fn push_to_unknown_is_noop() {
        let mut reg = ChannelRegistry::default();
        assert!(!reg.push_sample("nope", 1));
        assert!(reg.is_empty());
    }

    #[test]
    fn load_skips_null_and_missing() {
        let mut rows = HashMap::new();
        rows.insert(("t".to_string(), "a".to_string()), cfg("A", "/a"));

        let entries = vec![
            RowRef::null(),
            RowRef::new("t", "a"),
            RowRef::new("t", "missing"),
            RowRef {
                table: Some("t".into()),
                row: Some("".into()),
            },
        ];
        let mut reg = ChannelRegistry::new(10);
        let report = reg.load(&entries, &rows);

        assert_eq!(report.accepted, 1);
        assert_eq!(reg.len(), 1);
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.index).collect();
        assert_eq!(reasons, vec![0, 2, 3]);
        assert_eq!(
            report.skipped[1].reason,
            SkipReason::RowNotFound {
                table: "t".into(),
                row: "missing".into()
            }
        );
    }
}
