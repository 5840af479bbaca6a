use std::collections::HashMap;

use crate::config::{DistributedConfig, TransportKind};
use crate::error::Error;
use crate::DistributedInterface;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = DistributedConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, DistributedConfig::default());
    assert_eq!(config.transport, TransportKind::Local);
    assert_eq!(config.world_size, 1);
    assert_eq!(config.name, None);
    assert!(config.manage_communicator);
}

#[test]
fn test_from_lookup_overrides() {
    let config = DistributedConfig::from_lookup(lookup(&[
        ("TESSERA_TRANSPORT", "local"),
        ("TESSERA_WORLD_SIZE", "4"),
        ("TESSERA_BACKEND_NAME", "Ring"),
        ("TESSERA_MANAGE_COMMUNICATOR", "false"),
    ]))
    .unwrap();
    assert_eq!(config.world_size, 4);
    assert_eq!(config.name.as_deref(), Some("Ring"));
    assert!(!config.manage_communicator);
}

#[test]
fn test_invalid_values() {
    let err = DistributedConfig::from_lookup(lookup(&[("TESSERA_WORLD_SIZE", "many")])).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { key: "TESSERA_WORLD_SIZE", .. }));

    let err = DistributedConfig::from_lookup(lookup(&[("TESSERA_TRANSPORT", "carrier-pigeon")])).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { key: "TESSERA_TRANSPORT", .. }));

    let err = DistributedConfig::from_lookup(lookup(&[("TESSERA_WORLD_SIZE", "0")])).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn test_launch_runs_every_rank() {
    let config = DistributedConfig::builder().world_size(3).name("Ring").build();
    let seen = config.launch(|backend| (backend.rank(), backend.size(), backend.name().to_string())).unwrap();
    assert_eq!(
        seen,
        vec![(0, 3, "Ring".to_string()), (1, 3, "Ring".to_string()), (2, 3, "Ring".to_string())]
    );
}

#[test]
fn test_launch_borrowing_without_communicator_fails() {
    let config = DistributedConfig::builder().world_size(2).manage_communicator(false).build();
    let result = config.launch(|backend| backend.rank());
    assert!(matches!(result, Err(Error::NotInitialized { .. })));
}
