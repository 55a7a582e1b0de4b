//! Generated configs: round-trips and replica boundaries.

use vbroute::{Config, ConfigError, DistributionType};

#[test]
fn generate_round_trip() {
    let cfg = Config::generate(4, 1, 1024).unwrap();
    let again = Config::from_json(cfg.to_json()).unwrap();
    assert_eq!(again.server_count(), 4);
    assert_eq!(again.replica_count(), 1);
    assert_eq!(again.dist_type(), DistributionType::Partitioned);
    assert_eq!(again.vbucket_count(), 1024);
    assert_eq!(again, cfg);
}

#[test]
fn replica_boundaries() {
    let cfg = Config::generate(4, 1, 2).unwrap();
    let row = cfg.vbucket_map().unwrap().row(0).unwrap();
    assert_eq!(cfg.vbmaster(0), row[0]);
    assert_eq!(cfg.vbreplica(0, 0), row[1]);
    assert_eq!(cfg.vbreplica(0, 1), None);
    assert_eq!(cfg.vbreplica(0, 9999), None);
    assert_eq!(cfg.vbmaster(2), None);

    let single = Config::generate(1, 0, 2).unwrap();
    assert!(single.vbmaster(0).is_some());
    assert_eq!(single.vbreplica(0, 0), None);
}

#[test]
fn get_server_bounds() {
    let cfg = Config::generate(3, 1, 8).unwrap();
    assert!(cfg.get_server(2).is_ok());
    assert_eq!(
        cfg.get_server(3).unwrap_err(),
        ConfigError::IndexOutOfRange {
            kind: vbroute::IndexKind::Server,
            index: 3,
            len: 3,
        }
    );
}

#[test]
fn ketama_round_trip_keeps_owners() {
    let mut cfg = Config::generate(5, 0, 16).unwrap();
    cfg.make_ketama();
    let again: Config = cfg.to_json().parse().unwrap();
    for i in 0..500 {
        let key = format!("session:{i}");
        assert_eq!(again.map_key(&key), cfg.map_key(&key), "key {key}");
    }
}

#[test]
fn ownership_is_balanced() {
    let cfg = Config::generate(4, 2, 1024).unwrap();
    let counts = cfg.primary_counts();
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|&n| n == 256), "{counts:?}");
    assert_eq!(cfg.vbuckets_for_server(1).len(), 256);
    assert!(cfg.vbuckets_for_server(1).iter().all(|vb| vb % 4 == 1));
}
