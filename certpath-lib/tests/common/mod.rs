//! Shared helpers for the integration tests.
//!
//! Fixtures are PEM certificates generated by `testdata/gen.sh`; tests skip
//! gracefully when they have not been generated.

#![allow(dead_code)]

use certpath_lib::{Certificate, CertificateRef, DefaultPathBuilderDelegate};
use std::path::PathBuf;

/// 2030-01-01T00:00:00Z: inside every fixture's validity window except
/// `root_short.pem`.
pub const VERIFY_TIME: i64 = 1_893_456_000;

/// 2020-01-01T00:00:00Z: before any fixture was issued.
pub const BEFORE_ISSUANCE: i64 = 1_577_836_800;

/// 2200-01-01T00:00:00Z: after every fixture has expired.
pub const AFTER_EXPIRY: i64 = 7_258_118_400;

/// Root of the generated test fixtures.
pub fn testdata_dir() -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.pop(); // up from certpath-lib to workspace root
    p.push("testdata");
    p
}

pub fn testdata_available() -> bool {
    testdata_dir().join("root.pem").exists()
}

/// Load a fixture certificate by basename (e.g., "root" for root.pem).
pub fn load_cert(name: &str) -> CertificateRef {
    let path = testdata_dir().join(format!("{}.pem", name));
    let data = std::fs::read(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    Certificate::from_pem(&data)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
}

/// The stock delegate used throughout the tests.
pub fn delegate() -> DefaultPathBuilderDelegate {
    DefaultPathBuilderDelegate::new(2048)
}

/// DER sequences of a path, for order-sensitive comparisons.
pub fn ders(certs: &[CertificateRef]) -> Vec<Vec<u8>> {
    certs.iter().map(|c| c.der().to_vec()).collect()
}
