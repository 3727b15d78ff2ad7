#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Trust store and issuer source tests over the generated fixtures.
//!
//! To generate the fixtures:
//! ```sh
//! sh testdata/gen.sh
//! ```
//! Tests skip gracefully when the fixtures are not present.

mod common;

use certpath_lib::{
    CertIssuerSource, CertificateTrust, StaticCertIssuerSource, TrustStore, TrustStoreCollection,
    TrustStoreInMemory, TrustType,
};
use common::load_cert;

macro_rules! require_testdata {
    () => {
        if !common::testdata_available() {
            eprintln!("Skipping: testdata not generated. Run `sh testdata/gen.sh`.");
            return;
        }
    };
}

// ---------------------------------------------------------------------------
// TrustStoreInMemory
// ---------------------------------------------------------------------------

#[test]
fn get_trust_is_idempotent() {
    require_testdata!();
    let root = load_cert("root");
    let int = load_cert("int");
    let mut store = TrustStoreInMemory::new();
    store.add_trust_anchor(root.clone());

    let first = store.get_trust(&root);
    let second = store.get_trust(&root);
    assert_eq!(first, second);
    assert!(first.is_trust_anchor());
    assert!(store.get_trust(&int).has_unspecified_trust());
    assert!(store.contains(&root));
    assert!(!store.contains(&int));
}

#[test]
fn spki_distrust_overrides_certificate_records() {
    require_testdata!();
    let root = load_cert("root");
    let mut store = TrustStoreInMemory::new();
    store.add_trust_anchor(root.clone());
    assert!(store.get_trust(&root).is_trust_anchor());

    store.add_distrusted_spki(root.spki_raw());
    assert!(store.get_trust(&root).is_distrusted());
}

#[test]
fn same_subject_entries_resolve_by_exact_der() {
    require_testdata!();
    // rollover_v1 and rollover_v2 share a subject but differ in DER.
    let v1 = load_cert("rollover_v1");
    let v2 = load_cert("rollover_v2");
    let mut store = TrustStoreInMemory::new();
    store.add_trust_anchor(v1.clone());
    store.add_distrusted_certificate(v2.clone());

    assert!(store.get_trust(&v1).is_trust_anchor());
    assert!(store.get_trust(&v2).is_distrusted());
}

#[test]
fn duplicate_der_entries_first_record_wins() {
    require_testdata!();
    // Adding the same DER twice with different trust is a documented
    // non-guarantee: the first record is returned.
    let root = load_cert("root");
    let mut store = TrustStoreInMemory::new();
    store.add_trust_anchor(root.clone());
    store.add_distrusted_certificate(root.clone());
    assert!(store.get_trust(&root).is_trust_anchor());
}

#[test]
fn trust_store_serves_issuers_including_distrusted() {
    require_testdata!();
    let root = load_cert("root");
    let int = load_cert("int");
    let mut store = TrustStoreInMemory::new();
    store.add_distrusted_certificate(root.clone());

    let mut issuers = Vec::new();
    store.sync_get_issuers_of(&int, &mut issuers);
    assert_eq!(issuers.len(), 1);
    assert_eq!(issuers[0].der(), root.der());

    // Trust stores never answer asynchronously.
    assert!(store.async_get_issuers_of(&int).is_none());
}

#[test]
fn pem_loading_creates_anchors() {
    require_testdata!();
    let root_pem = std::fs::read(common::testdata_dir().join("root.pem")).unwrap();
    let root2_pem = std::fs::read(common::testdata_dir().join("root2.pem")).unwrap();

    let store = TrustStoreInMemory::from_pem(&root_pem).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get_trust(&load_cert("root")).is_trust_anchor());

    let mut bundle = root_pem.clone();
    bundle.extend_from_slice(&root2_pem);
    let mut store = TrustStoreInMemory::new();
    let added = store.add_pem_bundle(&bundle).unwrap();
    assert_eq!(added, 2);
    assert!(store.get_trust(&load_cert("root2")).is_trust_anchor());

    let certs = certpath_lib::Certificate::from_pem_chain(&bundle).unwrap();
    assert_eq!(certs.len(), 2);
    assert_eq!(certs[0].der(), load_cert("root").der());

    store.clear();
    assert!(store.is_empty());
    assert!(store.get_trust(&load_cert("root")).has_unspecified_trust());
}

// ---------------------------------------------------------------------------
// TrustStoreCollection
// ---------------------------------------------------------------------------

#[test]
fn collection_takes_last_non_unspecified_verdict() {
    require_testdata!();
    let root = load_cert("root");
    let mut first = TrustStoreInMemory::new();
    first.add_trust_anchor(root.clone());
    let mut second = TrustStoreInMemory::new();
    second.add_anchor_or_leaf(root.clone());
    let empty = TrustStoreInMemory::new();

    let mut collection = TrustStoreCollection::new();
    collection.add_trust_store(&first);
    collection.add_trust_store(&second);
    collection.add_trust_store(&empty);

    let trust = collection.get_trust(&root);
    assert_eq!(trust.trust_type, TrustType::AnchorOrLeaf);
}

#[test]
fn collection_distrust_wins_immediately() {
    require_testdata!();
    let root = load_cert("root");
    let mut distrusting = TrustStoreInMemory::new();
    distrusting.add_distrusted_certificate(root.clone());
    let mut anchoring = TrustStoreInMemory::new();
    anchoring.add_trust_anchor(root.clone());

    // Distrust wins regardless of store order.
    let mut collection = TrustStoreCollection::new();
    collection.add_trust_store(&distrusting);
    collection.add_trust_store(&anchoring);
    assert!(collection.get_trust(&root).is_distrusted());

    let mut collection = TrustStoreCollection::new();
    collection.add_trust_store(&anchoring);
    collection.add_trust_store(&distrusting);
    assert!(collection.get_trust(&root).is_distrusted());
}

#[test]
fn collection_concatenates_issuers_in_store_order() {
    require_testdata!();
    let int = load_cert("int");
    let int_other = load_cert("int_other");
    let leaf = load_cert("leaf");

    let mut first = TrustStoreInMemory::new();
    first.add_certificate_with_unspecified_trust(int.clone());
    let mut second = TrustStoreInMemory::new();
    second.add_certificate_with_unspecified_trust(int_other.clone());

    let mut collection = TrustStoreCollection::new();
    collection.add_trust_store(&first);
    collection.add_trust_store(&second);

    let mut issuers = Vec::new();
    collection.sync_get_issuers_of(&leaf, &mut issuers);
    assert_eq!(issuers.len(), 2);
    assert_eq!(issuers[0].der(), int.der());
    assert_eq!(issuers[1].der(), int_other.der());
}

// ---------------------------------------------------------------------------
// StaticCertIssuerSource
// ---------------------------------------------------------------------------

#[test]
fn static_source_appends_without_replacing() {
    require_testdata!();
    let int = load_cert("int");
    let leaf = load_cert("leaf");
    let source = StaticCertIssuerSource::from_certs([int.clone()]);

    let mut issuers = vec![load_cert("root")];
    source.sync_get_issuers_of(&leaf, &mut issuers);
    assert_eq!(issuers.len(), 2);
    assert_eq!(issuers[1].der(), int.der());

    // No match leaves the vector untouched.
    let mut unrelated = Vec::new();
    source.sync_get_issuers_of(&int, &mut unrelated);
    assert!(unrelated.is_empty());

    assert!(source.async_get_issuers_of(&leaf).is_none());
}

// ---------------------------------------------------------------------------
// CertificateTrust debug strings
// ---------------------------------------------------------------------------

#[test]
fn trust_debug_string_round_trips() {
    let samples = [
        CertificateTrust::unspecified(),
        CertificateTrust::distrusted(),
        CertificateTrust::anchor(),
        CertificateTrust::anchor().with_enforce_anchor_expiry(),
        CertificateTrust::anchor()
            .with_enforce_anchor_constraints()
            .with_require_anchor_basic_constraints(),
        CertificateTrust::anchor_or_leaf(),
        CertificateTrust::leaf().with_require_leaf_selfsigned(),
    ];
    for trust in samples {
        let rendered = trust.to_debug_string();
        let parsed = CertificateTrust::from_debug_string(&rendered)
            .unwrap_or_else(|| panic!("failed to parse {:?}", rendered));
        assert_eq!(parsed, trust);
    }
    assert!(CertificateTrust::from_debug_string("NONSENSE").is_none());
    assert!(CertificateTrust::from_debug_string("TRUSTED_ANCHOR+bogus_flag").is_none());
}
