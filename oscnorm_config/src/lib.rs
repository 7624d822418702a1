#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and data-table loading for the OSC normalizer.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Channel rows live in named data tables, either inline in the TOML
//!   (`[tables.<table>.<row>]`) or in CSV files listed under `[table_files]`.
//! - `[[datasets]]` is the ordered list of row references the core turns into
//!   channels. References are resolved later; a dangling one is not an error here.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One channel definition row.
///
/// Every field falls back to the defaults below when absent.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChannelRow {
    pub command: String,
    #[serde(alias = "data_message_address")]
    pub data_address: String,
    pub min_value_message_address: String,
    pub max_value_message_address: String,
    /// Lower bound of the normalized output.
    pub min_value: f32,
    /// Upper bound of the normalized output.
    pub max_value: f32,
    pub notes: String,
}

impl Default for ChannelRow {
    fn default() -> Self {
        Self {
            command: "DoSomething".to_string(),
            data_address: "/default/data".to_string(),
            min_value_message_address: "/default/minvalue".to_string(),
            max_value_message_address: "/default/maxvalue".to_string(),
            min_value: 0.0,
            max_value: 100.0,
            notes: String::new(),
        }
    }
}

impl ChannelRow {
    fn validate(&self, table: &str, row: &str) -> eyre::Result<()> {
        for (field, addr) in [
            ("data_address", &self.data_address),
            ("min_value_message_address", &self.min_value_message_address),
            ("max_value_message_address", &self.max_value_message_address),
        ] {
            if !addr.starts_with('/') {
                eyre::bail!("tables.{table}.{row}.{field} must start with '/', got {addr:?}");
            }
        }
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            eyre::bail!("tables.{table}.{row}: min_value and max_value must be finite");
        }
        Ok(())
    }
}

/// Named data tables: table name -> row name -> row.
///
/// Table and row names are matched without regard to ASCII case; tables
/// whose names differ only in case are merged, later rows winning.
#[derive(Debug, Default, Clone)]
pub struct DataTables {
    tables: BTreeMap<String, BTreeMap<String, ChannelRow>>,
}

impl DataTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: &str, rows: BTreeMap<String, ChannelRow>) {
        self.tables
            .entry(table.to_ascii_lowercase())
            .or_default()
            .extend(rows.into_iter().map(|(row, data)| (row.to_ascii_lowercase(), data)));
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_ascii_lowercase())
    }

    pub fn find_row(&self, table: &str, row: &str) -> Option<&ChannelRow> {
        self.tables
            .get(&table.to_ascii_lowercase())?
            .get(&row.to_ascii_lowercase())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        for (table, rows) in &self.tables {
            for (row, data) in rows {
                data.validate(table, row)?;
            }
        }
        Ok(())
    }
}

/// Reference to a row in a data table. Missing or empty parts make it a null reference.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetRef {
    pub table: Option<String>,
    pub row: Option<String>,
}

impl DatasetRef {
    pub fn new(table: &str, row: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            row: Some(row.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerCfg {
    /// Address to bind the UDP listener to.
    pub ip: String,
    pub port: u16,
    /// Informational name used in logs.
    pub name: String,
    /// Capacity of each channel's sample window.
    pub num_samples: usize,
    /// Start listening as soon as the server is constructed.
    pub autoplay: bool,
    /// Replace `ip` with the discovered local address at startup.
    pub auto_init_ip: bool,
    /// Transport poll period (ms); also bounds how long a stop request waits.
    pub recv_timeout_ms: u64,
    /// Capacity of the queue between the listener thread and the router.
    pub queue_depth: usize,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 3333,
            name: "Default Server".to_string(),
            num_samples: 10,
            autoplay: true,
            auto_init_ip: false,
            recv_timeout_ms: 100,
            queue_depth: 256,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerCfg,
    pub logging: Logging,
    /// Inline data tables.
    pub tables: BTreeMap<String, BTreeMap<String, ChannelRow>>,
    /// CSV-backed data tables, table name -> file path (relative to the config file).
    pub table_files: BTreeMap<String, PathBuf>,
    /// Ordered row references that become channels.
    pub datasets: Vec<DatasetRef>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg =
        load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Server
        if self.server.num_samples == 0 {
            eyre::bail!("server.num_samples must be >= 1");
        }
        if self.server.num_samples > 65_536 {
            eyre::bail!("server.num_samples is unreasonably large (>65536)");
        }
        if self.server.recv_timeout_ms == 0 {
            eyre::bail!("server.recv_timeout_ms must be >= 1");
        }
        if self.server.queue_depth == 0 {
            eyre::bail!("server.queue_depth must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Tables
        for (table, rows) in &self.tables {
            if self.table_files.contains_key(table) {
                eyre::bail!("table {table:?} is defined both inline and in table_files");
            }
            for (row, data) in rows {
                data.validate(table, row)?;
            }
        }

        Ok(())
    }

    /// Collect inline tables and load CSV tables, resolving relative paths
    /// against `base_dir`.
    pub fn load_tables(&self, base_dir: &Path) -> eyre::Result<DataTables> {
        let mut out = DataTables::new();
        for (name, rows) in &self.tables {
            out.insert_table(name, rows.clone());
        }
        for (name, path) in &self.table_files {
            if out.has_table(name) {
                eyre::bail!("table {name:?} is defined both inline and in table_files");
            }
            let full = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            out.insert_table(name, load_channel_table_csv(&full)?);
        }
        out.validate()?;
        Ok(out)
    }
}

/// Expected header of a CSV data table.
pub const CSV_HEADERS: [&str; 8] = [
    "row",
    "command",
    "data_address",
    "min_value_message_address",
    "max_value_message_address",
    "min_value",
    "max_value",
    "notes",
];

/// Raw CSV record; empty cells fall back to the `ChannelRow` defaults.
#[derive(Debug, Deserialize)]
struct CsvChannelRow {
    row: String,
    command: Option<String>,
    data_address: Option<String>,
    min_value_message_address: Option<String>,
    max_value_message_address: Option<String>,
    min_value: Option<f32>,
    max_value: Option<f32>,
    notes: Option<String>,
}

impl From<CsvChannelRow> for ChannelRow {
    fn from(r: CsvChannelRow) -> Self {
        let d = ChannelRow::default();
        Self {
            command: r.command.unwrap_or(d.command),
            data_address: r.data_address.unwrap_or(d.data_address),
            min_value_message_address: r
                .min_value_message_address
                .unwrap_or(d.min_value_message_address),
            max_value_message_address: r
                .max_value_message_address
                .unwrap_or(d.max_value_message_address),
            min_value: r.min_value.unwrap_or(d.min_value),
            max_value: r.max_value.unwrap_or(d.max_value),
            notes: r.notes.unwrap_or(d.notes),
        }
    }
}

pub fn load_channel_table_csv(path: &Path) -> eyre::Result<BTreeMap<String, ChannelRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open data table CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != CSV_HEADERS {
        eyre::bail!(
            "data table CSV must have headers '{}', got: {}",
            CSV_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = BTreeMap::new();
    for (idx, rec) in rdr.deserialize::<CsvChannelRow>().enumerate() {
        match rec {
            Ok(r) => {
                if r.row.is_empty() {
                    eyre::bail!("CSV row {}: empty row name", idx + 2);
                }
                let name = r.row.clone();
                rows.insert(name, ChannelRow::from(r));
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_toml("").expect("parse");
        assert_eq!(cfg.server.port, 3333);
        assert_eq!(cfg.server.num_samples, 10);
        assert!(cfg.server.autoplay);
        assert!(cfg.datasets.is_empty());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn row_defaults_fill_missing_fields() {
        let cfg = load_toml(
            r#"
[tables.main.vol]
command = "Volume"
"#,
        )
        .expect("parse");
        let row = &cfg.tables["main"]["vol"];
        assert_eq!(row.command, "Volume");
        assert_eq!(row.data_address, "/default/data");
        assert_eq!(row.min_value_message_address, "/default/minvalue");
        assert_eq!(row.max_value_message_address, "/default/maxvalue");
        assert_eq!(row.min_value, 0.0);
        assert_eq!(row.max_value, 100.0);
    }

    #[test]
    fn dataset_ref_parts_are_optional() {
        let cfg: Config = toml::from_str(
            r#"
[[datasets]]

[[datasets]]
table = "main"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.datasets[0], DatasetRef::default());
        assert_eq!(cfg.datasets[1].table.as_deref(), Some("main"));
        assert_eq!(cfg.datasets[1].row, None);
    }
}
