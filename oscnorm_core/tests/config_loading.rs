use oscnorm_core::error::SkipReason;
use oscnorm_core::{ListenerCfg, RowRef, router_from_config};
use std::io::Write;

const TOML: &str = r#"
[server]
num_samples = 4
port = 9001

[tables.Main.Volume]
command = "Volume"
data_address = "/vol/data"
min_value_message_address = "/vol/min"
max_value_message_address = "/vol/max"
min_value = 0.0
max_value = 100.0

[tables.Main.Pan]
command = "Pan"
data_address = "/pan"
min_value_message_address = "/pan/min"
max_value_message_address = "/pan/max"
min_value = -1.0
max_value = 1.0

[tables.Alt.Volume]
command = "Volume"
data_address = "/alt/vol"
min_value_message_address = "/alt/min"
max_value_message_address = "/alt/max"
max_value = 10.0

[[datasets]]
table = "Main"
row = "Volume"

[[datasets]]
table = "Main"
row = "Missing"

[[datasets]]

[[datasets]]
table = "Main"
row = "Pan"

[[datasets]]
table = "Alt"
row = "Volume"
"#;

#[test]
fn datasets_resolve_in_order_with_skips_and_replacement() {
    let cfg = oscnorm_config::load_toml(TOML).unwrap();
    cfg.validate().unwrap();
    let r = router_from_config(&cfg, std::path::Path::new(".")).unwrap();

    let reg = r.registry();
    assert_eq!(reg.window_capacity(), 4);
    assert_eq!(reg.commands().collect::<Vec<_>>(), vec!["Volume", "Pan"]);

    // The later Alt.Volume entry fully replaced Main.Volume.
    let vol = reg.get("Volume").unwrap().config();
    assert_eq!(vol.data_address, "/alt/vol");
    assert_eq!(vol.static_max, 10.0);

    let report = r.load_report();
    assert_eq!(report.accepted, 3);
    assert_eq!(report.replaced, vec!["Volume".to_string()]);
    let reasons: Vec<_> = report.skipped.iter().map(|s| (s.index, s.reason.clone())).collect();
    assert_eq!(
        reasons,
        vec![
            (
                1,
                SkipReason::RowNotFound {
                    table: "Main".into(),
                    row: "Missing".into()
                }
            ),
            (2, SkipReason::NullReference),
        ]
    );
}

#[test]
fn replaced_channel_answers_only_on_new_addresses() {
    let cfg = oscnorm_config::load_toml(TOML).unwrap();
    let mut r = router_from_config(&cfg, std::path::Path::new(".")).unwrap();
    assert_eq!(r.route("/vol/data", 100), 0);
    assert_eq!(r.route("/alt/vol", 4096), 1);
    assert_eq!(r.get_normalized_computed_data("Volume"), 10.0);
}

#[test]
fn csv_tables_resolve_relative_to_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = std::fs::File::create(dir.path().join("channels.csv")).unwrap();
    writeln!(
        f,
        "row,command,data_address,min_value_message_address,max_value_message_address,min_value,max_value,notes"
    )
    .unwrap();
    writeln!(f, "fader1,Fader,/fader/1,/fader/1/min,/fader/1/max,0,1,first fader").unwrap();
    writeln!(f, "fader2,,,,,,,").unwrap();
    drop(f);

    let cfg = oscnorm_config::load_toml(
        r#"
[table_files]
Faders = "channels.csv"

[[datasets]]
table = "Faders"
row = "fader1"

[[datasets]]
table = "Faders"
row = "fader2"
"#,
    )
    .unwrap();
    let r = router_from_config(&cfg, dir.path()).unwrap();
    let reg = r.registry();
    assert_eq!(reg.commands().collect::<Vec<_>>(), vec!["Fader", "DoSomething"]);
    assert_eq!(reg.get("DoSomething").unwrap().config().data_address, "/default/data");
    assert_eq!(reg.get("Fader").unwrap().config().static_max, 1.0);
}

#[test]
fn missing_csv_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = oscnorm_config::load_toml("[table_files]\nT = \"nope.csv\"\n").unwrap();
    let err = router_from_config(&cfg, dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load data tables"));
}

#[test]
fn server_section_maps_to_listener_cfg() {
    let cfg = oscnorm_config::load_toml(
        "[server]\nrecv_timeout_ms = 25\nqueue_depth = 8\nautoplay = false\n",
    )
    .unwrap();
    let l = ListenerCfg::from(&cfg.server);
    assert_eq!(l.recv_timeout_ms, 25);
    assert_eq!(l.queue_depth, 8);
    assert!(!l.autoplay);
    assert_eq!(
        oscnorm_core::dataset_refs(&cfg),
        Vec::<RowRef>::new()
    );
}
