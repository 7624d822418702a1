use oscnorm_config::{DatasetRef, load_toml};
use rstest::rstest;

const VALID: &str = r#"
[server]
ip = "0.0.0.0"
port = 9000
num_samples = 5

[logging]
level = "debug"
rotation = "daily"

[tables.main.volume]
command = "Volume"
data_address = "/vol/data"
min_value_message_address = "/vol/min"
max_value_message_address = "/vol/max"
min_value = 0
max_value = 100

[[datasets]]
table = "main"
row = "volume"
"#;

#[test]
fn accepts_valid_config() {
    let cfg = load_toml(VALID).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.num_samples, 5);
    assert_eq!(cfg.datasets.len(), 1);
    assert_eq!(cfg.datasets[0], DatasetRef::new("main", "volume"));
    assert_eq!(cfg.tables["main"]["volume"].max_value, 100.0);
}

#[test]
fn accepts_legacy_data_message_address_alias() {
    let cfg = load_toml(
        r#"
[tables.t.r]
data_message_address = "/legacy/data"
"#,
    )
    .expect("parse TOML");
    assert_eq!(cfg.tables["t"]["r"].data_address, "/legacy/data");
}

#[rstest]
#[case("[server]\nnum_samples = 0\n", "num_samples must be >= 1")]
#[case("[server]\nnum_samples = 100000\n", "unreasonably large")]
#[case("[server]\nrecv_timeout_ms = 0\n", "recv_timeout_ms must be >= 1")]
#[case("[server]\nqueue_depth = 0\n", "queue_depth must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case(
    "[tables.main.vol]\ndata_address = \"vol/data\"\n",
    "data_address must start with '/'"
)]
#[case(
    "[tables.main.vol]\nmax_value_message_address = \"\"\n",
    "max_value_message_address must start with '/'"
)]
#[case(
    "[tables.main.vol]\ncommand = \"V\"\n[table_files]\nmain = \"main.csv\"\n",
    "defined both inline and in table_files"
)]
fn rejects_invalid_config(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err:?} should mention {needle:?}"
    );
}

#[test]
fn rejects_unknown_types() {
    let err = load_toml("[server]\nport = \"not a number\"\n").expect_err("type error");
    assert!(format!("{err}").contains("port"));
}
