//! Loading real-world shaped config documents.

use vbroute::{Config, ConfigError, DistributionType, ServiceKind, ServiceMode};

use crate::helpers::{fixture_bytes, load_fixture};

fn check_basic(name: &str, cfg: &Config) {
    assert!(cfg.server_count() > 0, "{name}: no servers");
    for (ix, s) in cfg.servers().iter().enumerate() {
        assert!(!s.hostname.is_empty(), "{name}: server {ix} has no hostname");
        assert!(!s.authority.is_empty(), "{name}: server {ix} has no authority");
        assert!(s.services.data > 0, "{name}: server {ix} has no data port");
        assert!(s.services.mgmt > 0, "{name}: server {ix} has no mgmt port");
        if cfg.dist_type() == DistributionType::Partitioned {
            assert!(s.services.views > 0, "{name}: server {ix} has no views port");
        }
    }

    let m = cfg.map_key("Hello");
    match cfg.dist_type() {
        DistributionType::Partitioned => {
            assert!(cfg.vbucket_count() > 0, "{name}: no vbuckets");
            assert_ne!(m.vbid, 0, "{name}: Hello should not land on vbucket 0");
        }
        DistributionType::ConsistentHash => assert_eq!(m.vbid, 0, "{name}"),
    }
    assert!(m.server.is_some(), "{name}: Hello has no owner");
}

fn check_newer(name: &str, cfg: &Config) {
    assert!(cfg.bucket_uuid().is_some(), "{name}: missing uuid");
    assert!(cfg.revision().is_some(), "{name}: missing rev");
    for (ix, s) in cfg.servers().iter().enumerate() {
        assert!(s.services_ssl.data > 0, "{name}: server {ix} has no tls data port");
        assert!(s.services_ssl.mgmt > 0, "{name}: server {ix} has no tls mgmt port");
        if cfg.dist_type() == DistributionType::Partitioned {
            assert!(s.services_ssl.views > 0, "{name}: server {ix} has no tls views port");
        }
    }
}

#[test]
fn basic_fixtures() {
    for name in ["full_25.json", "terse_25.json", "memd_25.json"] {
        let cfg = load_fixture(name);
        check_basic(name, &cfg);
    }
}

#[test]
fn newer_fixtures() {
    for name in ["terse_30.json", "memd_30.json"] {
        let cfg = load_fixture(name);
        check_basic(name, &cfg);
        check_newer(name, &cfg);
    }
}

#[test]
fn fixture_dimensions() {
    let full = load_fixture("full_25.json");
    assert_eq!(full.dist_type(), DistributionType::Partitioned);
    assert_eq!(full.server_count(), 4);
    assert_eq!(full.replica_count(), 1);
    assert_eq!(full.vbucket_count(), 1024);
    assert_eq!(full.map_key("Hello").vbid, 982);
    assert!(full.has_capability("couchapi"));

    let memd = load_fixture("memd_25.json");
    assert_eq!(memd.dist_type(), DistributionType::ConsistentHash);
    assert_eq!(memd.server_count(), 3);
    assert_eq!(memd.vbucket_count(), 0);
    assert_eq!(memd.ring().map(|r| r.len()), Some(3 * vbroute::KETAMA_POINTS_PER_SERVER));
}

#[test]
fn full_and_terse_agree() {
    let full = load_fixture("full_25.json");
    let terse = load_fixture("terse_25.json");
    assert_eq!(full.servers(), terse.servers());
    assert_eq!(full.vbucket_map(), terse.vbucket_map());
    for key in ["Hello", "World", "user:1", ""] {
        assert_eq!(full.map_key(key), terse.map_key(key), "key {key:?}");
    }
}

#[test]
fn nodes_ext_without_hostname_inherits_legacy_host() {
    let cfg = load_fixture("terse_30.json");
    assert_eq!(cfg.servers()[0].hostname, "192.168.4.101");
    assert_eq!(cfg.servers()[0].authority, "192.168.4.101:11210");
    assert_eq!(cfg.revision(), Some(1024));
    assert_eq!(
        cfg.hostport(1, ServiceKind::Data, ServiceMode::Tls).as_deref(),
        Some("192.168.4.102:11207")
    );
    assert_eq!(
        cfg.servers()[2]
            .rest_url(ServiceKind::Mgmt, ServiceMode::Tls)
            .as_deref(),
        Some("https://192.168.4.103:18091")
    );
}

#[test]
fn newer_fixture_is_newer() {
    let old = load_fixture("terse_25.json");
    let new = load_fixture("terse_30.json");
    assert!(new.is_newer_than(&old));
    assert!(!old.is_newer_than(&new));
    assert_eq!(old.diff(&new).vbuckets_moved, 0);
}

#[test]
fn bad_input_is_rejected() {
    for input in ["{}", "INVALIDJSON", "", "[1, 2]", "null"] {
        let err = Config::from_json(input).unwrap_err();
        assert!(err.is_parse_error(), "{input:?}: {err}");
    }

    assert!(matches!(
        Config::from_json("INVALIDJSON"),
        Err(ConfigError::MalformedJson(_))
    ));
    assert!(matches!(
        Config::from_json("{}"),
        Err(ConfigError::MalformedConfig(_))
    ));
    assert!(matches!(
        Config::from_json(fixture_bytes("bad.json")),
        Err(ConfigError::MalformedConfig(_))
    ));
}

#[test]
fn fixtures_round_trip_through_emit() {
    for name in [
        "full_25.json",
        "terse_25.json",
        "memd_25.json",
        "terse_30.json",
        "memd_30.json",
    ] {
        let cfg = load_fixture(name);
        let again = Config::from_json(cfg.to_json()).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(again, cfg, "{name}");
    }
}
