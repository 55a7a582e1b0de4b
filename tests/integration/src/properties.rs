//! Invariants that hold for every config, checked over generated and
//! fixture configs.

use std::collections::BTreeSet;

use vbroute::{crc16, Config, DistributionType};

use crate::helpers::{load_fixture, numbered_keys};

fn corpus() -> Vec<(String, Config)> {
    let mut out = Vec::new();
    for (nsrv, nrepl, nvb) in [(1, 0, 2), (4, 1, 2), (4, 1, 64), (5, 2, 1024), (7, 3, 1000)] {
        let cfg = Config::generate(nsrv, nrepl, nvb).unwrap();
        out.push((format!("generate({nsrv}, {nrepl}, {nvb})"), cfg));
    }
    for name in [
        "full_25.json",
        "terse_25.json",
        "memd_25.json",
        "terse_30.json",
        "memd_30.json",
    ] {
        out.push((name.to_string(), load_fixture(name)));
    }
    for (nsrv, nrepl, nvb) in [(4, 0, 8), (4, 1, 64)] {
        let mut ketama = Config::generate(nsrv, nrepl, nvb).unwrap();
        ketama.make_ketama();
        out.push((format!("ketama from generate({nsrv}, {nrepl}, {nvb})"), ketama));
    }
    out
}

#[test]
fn owners_are_data_nodes() {
    for (label, cfg) in corpus() {
        let ndata = cfg.data_server_count();
        for vb in 0..cfg.vbucket_count() {
            if let Some(ix) = cfg.vbmaster(vb) {
                assert!(ix < ndata, "{label}: vbmaster({vb}) = {ix}");
            }
            for j in 0..cfg.replica_count() {
                if let Some(ix) = cfg.vbreplica(vb, j) {
                    assert!(ix < ndata, "{label}: vbreplica({vb}, {j}) = {ix}");
                }
            }
        }
    }
}

#[test]
fn partition_follows_crc16() {
    let keys = numbered_keys(512);
    for (label, cfg) in corpus() {
        for key in &keys {
            let vb = cfg.map_key(key).vbid;
            match cfg.dist_type() {
                DistributionType::Partitioned => {
                    let n = cfg.vbucket_count();
                    let crc = crc16(key.as_bytes()) as usize;
                    let expected = if n.is_power_of_two() { crc & (n - 1) } else { crc % n };
                    assert_eq!(vb, expected, "{label}: key {key}");
                }
                DistributionType::ConsistentHash => assert_eq!(vb, 0, "{label}: key {key}"),
            }
        }
    }
}

#[test]
fn emit_parse_round_trip() {
    for (label, cfg) in corpus() {
        let again = Config::from_json(cfg.to_json()).unwrap_or_else(|e| panic!("{label}: {e}"));
        assert_eq!(again.server_count(), cfg.server_count(), "{label}");
        assert_eq!(again.data_server_count(), cfg.data_server_count(), "{label}");
        assert_eq!(again.replica_count(), cfg.replica_count(), "{label}");
        assert_eq!(again.vbucket_count(), cfg.vbucket_count(), "{label}");
        assert_eq!(again.distribution(), cfg.distribution(), "{label}");
        let services = |c: &Config| c.servers().iter().map(|s| s.services).collect::<Vec<_>>();
        assert_eq!(services(&again), services(&cfg), "{label}");
    }
}

#[test]
fn remap_chain_covers_owners_exactly() {
    for (label, cfg) in corpus() {
        if cfg.dist_type() != DistributionType::Partitioned {
            continue;
        }
        for vb in 0..cfg.vbucket_count() {
            let Some(master) = cfg.vbmaster(vb) else { continue };

            let mut walked = vec![master];
            walked.extend(cfg.alternatives(vb, master));
            let distinct: BTreeSet<usize> = walked.iter().copied().collect();
            assert_eq!(distinct.len(), walked.len(), "{label}: vbucket {vb} repeated");

            let owners: BTreeSet<usize> = cfg
                .vbucket_map()
                .and_then(|m| m.row(vb))
                .unwrap_or_default()
                .iter()
                .flatten()
                .copied()
                .collect();
            assert_eq!(distinct, owners, "{label}: vbucket {vb}");
        }
    }
}

#[test]
fn remap_stays_within_data_nodes() {
    for (label, cfg) in corpus() {
        let nvb = cfg.vbucket_count().max(1);
        for vb in (0..nvb).step_by(7) {
            for rejected in 0..cfg.server_count() {
                if let Some(ix) = cfg.remap(vb, rejected) {
                    assert!(
                        ix < cfg.data_server_count(),
                        "{label}: remap({vb}, {rejected}) = {ix}"
                    );
                    assert_ne!(ix, rejected, "{label}: remap({vb}, {rejected})");
                }
            }
        }
    }
}
