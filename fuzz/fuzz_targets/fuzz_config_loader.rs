#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject the input but must never panic.
    let Ok(cfg) = toml::from_str::<oscnorm_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let mut tables = oscnorm_config::DataTables::new();
        for (name, rows) in &cfg.tables {
            tables.insert_table(name, rows.clone());
        }
        for d in &cfg.datasets {
            if let (Some(t), Some(r)) = (d.table.as_deref(), d.row.as_deref()) {
                let _ = tables.find_row(t, r);
            }
        }
    }
});
