#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Chain-verifier tests over the generated fixtures.
//!
//! To generate the fixtures:
//! ```sh
//! sh testdata/gen.sh
//! ```
//! Tests skip gracefully when the fixtures are not present.

mod common;

use certpath_lib::{
    verify_certificate_chain, verify_certificate_is_self_signed, Certificate, CertErrors,
    CertificateRef, CertificateTrust, ErrorCode, InMemoryVerifyCache, KeyPurpose, VerifyCache,
    VerifyChainDelegate, VerifyPolicyInputs,
};
use common::{load_cert, AFTER_EXPIRY, BEFORE_ISSUANCE, VERIFY_TIME};

macro_rules! require_testdata {
    () => {
        if !common::testdata_available() {
            eprintln!("Skipping: testdata not generated. Run `sh testdata/gen.sh`.");
            return;
        }
    };
}

fn chain(names: &[&str]) -> Vec<CertificateRef> {
    names.iter().map(|n| load_cert(n)).collect()
}

fn has_error_at(
    errors: &certpath_lib::CertPathErrors,
    index: usize,
    code: ErrorCode,
) -> bool {
    errors
        .errors_for_cert(index)
        .is_some_and(|bucket| bucket.contains(code))
}

// ---------------------------------------------------------------------------
// Basic structure and temporal checks
// ---------------------------------------------------------------------------

#[test]
fn valid_chain_verifies() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let (policies, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::ServerAuth,
        &VerifyPolicyInputs::default(),
    );
    assert!(
        !errors.contains_high_severity_errors(),
        "unexpected errors: {:?}",
        errors
    );
    // No certificatePolicies anywhere in this chain.
    assert!(policies.is_empty());
}

#[test]
fn expired_chain_fails_per_certificate() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        AFTER_EXPIRY,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::ValidityFailedNotAfter));
    assert!(has_error_at(&errors, 1, ErrorCode::ValidityFailedNotAfter));
    // Anchor expiry is not checked unless enforce_anchor_expiry is set.
    assert!(!has_error_at(&errors, 2, ErrorCode::ValidityFailedNotAfter));
}

#[test]
fn not_yet_valid_chain_fails() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        BEFORE_ISSUANCE,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::ValidityFailedNotBefore));
}

#[test]
fn anchor_expiry_enforced_only_by_flag() {
    require_testdata!();
    // root_short expired in 2027; its leaf is valid until 2126.
    let certs = chain(&["sl_leaf", "root_short"]);

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor().with_enforce_anchor_expiry(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 1, ErrorCode::ValidityFailedNotAfter));
}

#[test]
fn issuer_name_mismatch_fails() {
    require_testdata!();
    // Skipping the intermediate: leaf's issuer is not the root's subject.
    let certs = chain(&["leaf", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::SubjectDoesNotMatchIssuer));
}

#[test]
fn wrong_issuer_key_fails_signature() {
    require_testdata!();
    // int_other shares the intermediate's subject but not its key.
    let certs = chain(&["leaf", "int_other", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::SignatureVerificationFailed));
}

#[test]
fn untrusted_last_cert_is_flagged() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::unspecified(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 2, ErrorCode::CertIsNotTrustAnchor));
}

#[test]
fn empty_chain_is_an_error() {
    require_testdata!();
    let (_, errors) = verify_certificate_chain(
        &[],
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(errors.other_errors().contains(ErrorCode::ChainIsEmpty));
    assert!(errors.contains_high_severity_errors());
}

// ---------------------------------------------------------------------------
// Constraint checks
// ---------------------------------------------------------------------------

#[test]
fn non_ca_issuer_fails_basic_constraints() {
    require_testdata!();
    let certs = chain(&["notca_leaf", "notca_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 1, ErrorCode::BasicConstraintsIndicatesNotCa));
}

#[test]
fn issuer_without_key_cert_sign_fails() {
    require_testdata!();
    let certs = chain(&["noku_leaf", "noku_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 1, ErrorCode::KeyCertSignBitNotSet));
}

#[test]
fn path_len_constraint_is_enforced() {
    require_testdata!();
    // pl_int has pathlen:0, so pl_sub may not issue further CAs below it.
    let certs = chain(&["pl_leaf", "pl_sub", "pl_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 1, ErrorCode::MaxPathLengthViolated));
}

#[test]
fn eku_on_intermediate_restricts_chain() {
    require_testdata!();
    // eku_int asserts only clientAuth; the leaf asserts serverAuth.
    let certs = chain(&["eku_leaf", "eku_int", "root"]);

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::ServerAuth,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 1, ErrorCode::EkuLacksPurpose));

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::ClientAuth,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::EkuLacksPurpose));

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());
}

#[test]
fn strict_purpose_requires_target_eku() {
    require_testdata!();
    let certs = chain(&["leaf_noeku", "int", "root"]);

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::ServerAuth,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::ServerAuthStrict,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::EkuNotPresent));
}

#[test]
fn dns_name_constraints_apply_down_the_chain() {
    require_testdata!();
    let good = chain(&["nc_leaf_ok", "nc_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &good,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());

    let bad = chain(&["nc_leaf_bad", "nc_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &bad,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::NameConstraintViolation));
}

#[test]
fn directory_name_constraints_apply_to_subject() {
    require_testdata!();
    let good = chain(&["dirnc_leaf_ok", "dirnc_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &good,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());

    let bad = chain(&["dirnc_leaf_bad", "dirnc_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &bad,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::NameConstraintViolation));
}

#[test]
fn anchor_constraints_enforced_only_by_flag() {
    require_testdata!();
    // nc_int carries the name constraints itself and acts as the anchor.
    let certs = chain(&["nc_leaf_bad", "nc_int"]);

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor().with_enforce_anchor_constraints(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::NameConstraintViolation));
}

#[test]
fn unknown_critical_extension_fails() {
    require_testdata!();
    let certs = chain(&["critext_leaf", "int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::UnconsumedCriticalExtension));
}

#[test]
fn precertificate_needs_delegate_opt_in() {
    require_testdata!();
    let certs = chain(&["precert_leaf", "int", "root"]);

    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::PreCertificate));

    let mut accepting = common::delegate();
    accepting.set_accept_pre_certificates(true);
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &accepting,
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());
}

// ---------------------------------------------------------------------------
// Certificate policies
// ---------------------------------------------------------------------------

#[test]
fn require_explicit_policy_from_intermediate() {
    require_testdata!();
    // pol_int sets requireExplicitPolicy:0 and asserts 1.2.3.4.
    let ok = chain(&["pol_leaf_ok", "pol_int", "root"]);
    let (policies, errors) = verify_certificate_chain(
        &ok,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());
    assert_eq!(policies, vec!["1.2.3.4".to_string()]);

    let none = chain(&["pol_leaf_none", "pol_int", "root"]);
    let (_, errors) = verify_certificate_chain(
        &none,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::NoValidPolicy));
}

#[test]
fn policy_mapping_translates_user_policy() {
    require_testdata!();
    // pm_int maps 1.2.3.4 to 1.5.6.7; the leaf asserts 1.5.6.7. A caller
    // asking for 1.2.3.4 must still be satisfied.
    let certs = chain(&["pm_leaf", "pm_int", "root"]);
    let inputs = VerifyPolicyInputs {
        initial_explicit_policy: true,
        user_initial_policy_set: vec!["1.2.3.4".to_string()],
        ..VerifyPolicyInputs::default()
    };
    let (policies, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &inputs,
    );
    assert!(
        !errors.contains_high_severity_errors(),
        "unexpected errors: {:?}",
        errors
    );
    assert_eq!(policies, vec!["1.2.3.4".to_string()]);

    let inhibited = VerifyPolicyInputs {
        initial_policy_mapping_inhibit: true,
        ..inputs
    };
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &inhibited,
    );
    assert!(errors.contains_error(ErrorCode::NoValidPolicy));
}

#[test]
fn inhibit_any_policy_blocks_any_policy_assertion() {
    require_testdata!();
    // any_int asserts anyPolicy; the leaf asserts 1.2.3.4.
    let certs = chain(&["any_leaf", "any_int", "root"]);

    let (policies, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!errors.contains_high_severity_errors());
    assert_eq!(policies, vec!["1.2.3.4".to_string()]);

    let inputs = VerifyPolicyInputs {
        initial_any_policy_inhibit: true,
        initial_explicit_policy: true,
        ..VerifyPolicyInputs::default()
    };
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &common::delegate(),
        VERIFY_TIME,
        KeyPurpose::Any,
        &inputs,
    );
    assert!(errors.contains_error(ErrorCode::NoValidPolicy));
}

// ---------------------------------------------------------------------------
// Delegate gates and caching
// ---------------------------------------------------------------------------

struct PickyDelegate {
    reject_algorithm: Option<&'static str>,
    reject_ec_keys: bool,
}

impl VerifyChainDelegate for PickyDelegate {
    fn is_signature_algorithm_acceptable(
        &self,
        algorithm_oid: &str,
        _errors: &mut CertErrors,
    ) -> bool {
        self.reject_algorithm != Some(algorithm_oid)
    }

    fn is_public_key_acceptable(&self, cert: &Certificate, _errors: &mut CertErrors) -> bool {
        !(self.reject_ec_keys
            && cert.public_key_algorithm_oid() == certpath_lib::oid::EC_PUBLIC_KEY)
    }
}

#[test]
fn delegate_rejects_signature_algorithm() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let delegate = PickyDelegate {
        reject_algorithm: Some(certpath_lib::oid::ECDSA_WITH_SHA256),
        reject_ec_keys: false,
    };
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &delegate,
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::UnacceptableSignatureAlgorithm));
    assert!(has_error_at(&errors, 1, ErrorCode::UnacceptableSignatureAlgorithm));
}

#[test]
fn delegate_rejects_public_keys_including_anchor() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let delegate = PickyDelegate {
        reject_algorithm: None,
        reject_ec_keys: true,
    };
    let (_, errors) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &delegate,
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(has_error_at(&errors, 0, ErrorCode::UnacceptablePublicKey));
    assert!(has_error_at(&errors, 2, ErrorCode::UnacceptablePublicKey));
}

struct CachingDelegate<'a> {
    cache: &'a InMemoryVerifyCache,
}

impl VerifyChainDelegate for CachingDelegate<'_> {
    fn is_signature_algorithm_acceptable(&self, _oid: &str, _errors: &mut CertErrors) -> bool {
        true
    }

    fn is_public_key_acceptable(&self, _cert: &Certificate, _errors: &mut CertErrors) -> bool {
        true
    }

    fn verify_cache(&self) -> Option<&dyn VerifyCache> {
        Some(self.cache)
    }
}

#[test]
fn verify_cache_collects_signature_outcomes() {
    require_testdata!();
    let certs = chain(&["leaf", "int", "root"]);
    let cache = InMemoryVerifyCache::new();
    let delegate = CachingDelegate { cache: &cache };

    let (_, first) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &delegate,
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!first.contains_high_severity_errors());
    // Two signature checks: leaf-by-int and int-by-root.
    assert_eq!(cache.len(), 2);

    let (_, second) = verify_certificate_chain(
        &certs,
        &CertificateTrust::anchor(),
        &delegate,
        VERIFY_TIME,
        KeyPurpose::Any,
        &VerifyPolicyInputs::default(),
    );
    assert!(!second.contains_high_severity_errors());
    assert_eq!(cache.len(), 2);
}

// ---------------------------------------------------------------------------
// Self-signed detection
// ---------------------------------------------------------------------------

#[test]
fn self_signed_round_trip() {
    require_testdata!();
    let selfsigned = load_cert("selfsigned");
    assert!(verify_certificate_is_self_signed(&selfsigned, None, None));

    // wrongkey is self-issued but signed by a different key.
    let wrongkey = load_cert("wrongkey");
    let mut errors = CertErrors::new();
    assert!(!verify_certificate_is_self_signed(
        &wrongkey,
        None,
        Some(&mut errors)
    ));
    assert!(errors.contains(ErrorCode::SignatureVerificationFailed));

    // A certificate that is not even self-issued records nothing.
    let leaf = load_cert("leaf");
    let mut errors = CertErrors::new();
    assert!(!verify_certificate_is_self_signed(&leaf, None, Some(&mut errors)));
    assert!(errors.is_empty());
}
