//! Test helpers for loading fixture documents and running the CLI.

use std::path::PathBuf;
use std::process::{Command, Output};

use vbroute::Config;

/// Directory holding the JSON fixtures.
pub fn confdata_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("confdata")
}

/// Path of a named fixture.
pub fn fixture_path(name: &str) -> PathBuf {
    confdata_dir().join(name)
}

/// Raw bytes of a named fixture.
pub fn fixture_bytes(name: &str) -> Vec<u8> {
    let path = fixture_path(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

/// Parses a named fixture, panicking with the fixture name on failure.
pub fn load_fixture(name: &str) -> Config {
    Config::from_json(fixture_bytes(name)).unwrap_or_else(|e| panic!("loading {name}: {e}"))
}

/// Keys `Key_0` through `Key_{n-1}`.
pub fn numbered_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Key_{i}")).collect()
}

/// Finds the vbroute-cli binary next to the test binary, if it was built.
pub fn cli_binary() -> Option<PathBuf> {
    // test binary is in target/<profile>/deps/, the cli in target/<profile>/
    let mut path = std::env::current_exe().ok()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(format!("vbroute-cli{}", std::env::consts::EXE_SUFFIX));
    path.exists().then_some(path)
}

/// Runs vbroute-cli with the given arguments and colors disabled.
///
/// Returns `None` when the binary has not been built (e.g. when only this
/// crate was compiled), so callers can skip.
pub fn run_cli(args: &[&str]) -> Option<Output> {
    let Some(binary) = cli_binary() else {
        eprintln!("vbroute-cli binary not found, skipping. run `cargo build` first.");
        return None;
    };
    let output = Command::new(binary)
        .args(args)
        .env("VBROUTE_COLOR", "never")
        .env_remove("VBROUTE_FORMAT")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run vbroute-cli");
    Some(output)
}
