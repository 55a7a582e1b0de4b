//! Choosing alternatives after "not my vbucket".

use std::collections::BTreeSet;

use vbroute::Config;

use crate::helpers::load_fixture;

#[test]
fn alternative_mapping() {
    let cfg = Config::generate(4, 1, 64).unwrap();
    let vb = cfg.key_to_partition("Dummy Key");
    let master = cfg.vbmaster(vb).unwrap();

    let alt = cfg.remap(vb, master).expect("a replica should be offered");
    assert_ne!(alt, master);
    assert_eq!(cfg.remap(vb, master), Some(alt), "remap must be idempotent");
}

#[test]
fn remap_walk_covers_fixture_owners() {
    let cfg = load_fixture("terse_30.json");
    for vb in [0, 1, 511, 1023] {
        let master = cfg.vbmaster(vb).unwrap();
        let mut seen: BTreeSet<usize> = cfg.alternatives(vb, master).collect();
        seen.insert(master);
        let owners: BTreeSet<usize> = [master, cfg.vbreplica(vb, 0).unwrap()].into();
        assert_eq!(seen, owners, "vbucket {vb}");
    }
}

#[test]
fn remap_during_rebalance_offers_forward_owner() {
    let doc = r#"{
        "rev": 9,
        "nodesExt": [
            {"hostname": "10.1.0.1", "services": {"kv": 11210, "mgmt": 8091}},
            {"hostname": "10.1.0.2", "services": {"kv": 11210, "mgmt": 8091}},
            {"hostname": "10.1.0.3", "services": {"kv": 11210, "mgmt": 8091}},
            {"hostname": "10.1.0.4", "services": {"kv": 11210, "mgmt": 8091}}
        ],
        "vBucketServerMap": {
            "numReplicas": 1,
            "serverList": ["10.1.0.1:11210", "10.1.0.2:11210", "10.1.0.3:11210", "10.1.0.4:11210"],
            "vBucketMap": [[0, 1], [1, 2]],
            "vBucketMapForward": [[3, 0], [1, 2]]
        }
    }"#;
    let cfg = Config::from_json(doc).unwrap();
    assert_eq!(cfg.vbmaster_forward(0), Some(3));

    assert_eq!(cfg.remap(0, 0), Some(3));
    let walk: Vec<usize> = cfg.alternatives(0, 0).collect();
    assert_eq!(walk, [3, 1]);

    // forward map agrees with the current one for vbucket 1
    assert_eq!(cfg.alternatives(1, 1).collect::<Vec<_>>(), [2]);
}

#[test]
fn ketama_remap_walks_the_ring() {
    let cfg = load_fixture("memd_30.json");
    let owner = cfg.map_key("Hello").server.unwrap();
    let next = cfg.remap_key("Hello", owner).unwrap();
    assert_ne!(next, owner);
    assert!(next < cfg.data_server_count());

    let mut seen: BTreeSet<usize> = cfg.alternatives(0, owner).collect();
    seen.insert(owner);
    assert!(seen.len() >= 2, "walk visited {seen:?}");
    assert!(seen.iter().all(|&ix| ix < cfg.data_server_count()));
}
