//! Driving the engine from an on-disk `mvnet.toml`.

use mvnet_config::{load_config, ConfigError, InputOrder};
use mvnet_conformance::{init_logging, network_from_config, scenario};
use mvnet_dd::BddManager;
use mvnet_ir::NetError;
use mvnet_logic::Relation;
use mvnet_synth::{compute_global, run_passes, GlobalOptions};
use std::fs;
use tempfile::TempDir;

fn write_config(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mvnet.toml"), content).unwrap();
    dir
}

#[test]
fn config_drives_composition_and_passes() {
    init_logging();
    let dir = write_config(
        r#"
[network]
name = "top"
max_nodes = 64

[global]
reorder = true
input_order = "natural"
drop_intermediate = false

[passes]
sweep = true
minimum_base = false
"#,
    );
    let config = load_config(dir.path()).unwrap();

    let mut net = network_from_config(&config);
    assert_eq!(net.name(), "top");
    assert_eq!(net.capacity(), Some(64));
    let a = net.add_primary_input("a", 2).unwrap();
    let buf = net.add_internal(Some("buf"), 2, &[a], Relation::buffer(2)).unwrap();
    let inv = net
        .add_internal(Some("inv"), 2, &[buf], Relation::inverter())
        .unwrap();
    net.add_primary_output(inv, Some("o")).unwrap();

    assert!(run_passes(&mut net, &config.passes).unwrap());
    assert!(!net.contains(buf));
    net.check().unwrap();

    let options = GlobalOptions::from(&config.global);
    assert_eq!(options.input_order, InputOrder::Natural);
    let manager = BddManager::new();
    let global = compute_global(&mut net, &manager, &options).unwrap();
    assert!(global.get(inv).is_some());
    assert_eq!(manager.reorder_requests(), 1);
}

#[test]
fn timeout_from_config() {
    let dir = write_config("[global]\ntimeout_ms = 1\n");
    let config = load_config(dir.path()).unwrap();
    let mut options = GlobalOptions::from(&config.global);
    assert_eq!(options.timeout, Some(std::time::Duration::from_millis(1)));

    options.timeout = Some(std::time::Duration::ZERO);
    let mut s = scenario();
    let manager = BddManager::new();
    let result = compute_global(&mut s.net, &manager, &options);
    assert!(matches!(result, Err(NetError::Timeout { .. })));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let dir = write_config("[network]\nmax_nodes = 0\n");
    assert!(matches!(
        load_config(dir.path()),
        Err(ConfigError::ValidationError { ref field, .. }) if field == "network.max_nodes"
    ));
}
