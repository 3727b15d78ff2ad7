//! Individual verification check functions.
//!
//! Helper checks shared by the chain verifier: validity windows, signature
//! verification (with optional caching), extension recognition, and the
//! advisory RFC 5280 profile warnings.

use super::VerifyCache;
use crate::cert::Certificate;
use crate::errors::{CertPathErrors, ErrorCode};
use crate::oid;
use sha2::{Digest, Sha256};

/// Check a certificate's validity window against the verification time.
pub(crate) fn check_validity(
    cert: &Certificate,
    cert_index: usize,
    time: i64,
    errors: &mut CertPathErrors,
) {
    if time < cert.not_before() {
        errors.add_error(cert_index, ErrorCode::ValidityFailedNotBefore);
    }
    if time > cert.not_after() {
        errors.add_error(cert_index, ErrorCode::ValidityFailedNotAfter);
    }
}

/// Cache key for one signature verification: the certificate's full DER
/// (covering both the signed data and the signature) plus the verifying key.
fn cache_key(cert: &Certificate, issuer_spki: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cert.der());
    hasher.update(issuer_spki);
    hex::encode(hasher.finalize())
}

/// Verify `cert`'s signature against `issuer`'s public key, consulting the
/// cache when one is supplied so repeated verification of the same signature
/// across candidate paths costs O(1) after the first.
pub(crate) fn verify_signed_by(
    cert: &Certificate,
    issuer: &Certificate,
    cache: Option<&dyn VerifyCache>,
) -> bool {
    let key = cache.map(|_| cache_key(cert, issuer.spki_raw()));
    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        if let Some(cached) = cache.check(key) {
            return cached;
        }
    }

    let ok = match (cert.x509(), issuer.x509()) {
        (Ok(child), Ok(parent)) => child.verify_signature(Some(parent.public_key())).is_ok(),
        _ => false,
    };

    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        cache.store(key, ok);
    }
    ok
}

/// Verify a certificate's signature against its own public key.
pub(crate) fn verify_self_signature(cert: &Certificate, cache: Option<&dyn VerifyCache>) -> bool {
    verify_signed_by(cert, cert, cache)
}

/// Check if an extension OID is one the verifier processes. RFC 5280
/// Section 4.2 requires rejecting certificates containing unrecognized
/// critical extensions.
pub(crate) fn is_processed_extension(ext_oid: &str) -> bool {
    matches!(
        ext_oid,
        // RFC 5280 standard extensions
        oid::EXT_SUBJECT_KEY_ID
        | oid::EXT_KEY_USAGE
        | oid::EXT_SUBJECT_ALT_NAME
        | oid::EXT_ISSUER_ALT_NAME
        | oid::EXT_BASIC_CONSTRAINTS
        | oid::EXT_NAME_CONSTRAINTS
        | oid::EXT_CRL_DISTRIBUTION_POINTS
        | oid::EXT_CERTIFICATE_POLICIES
        | oid::EXT_POLICY_MAPPINGS
        | oid::EXT_AUTHORITY_KEY_ID
        | oid::EXT_POLICY_CONSTRAINTS
        | oid::EXT_EXTENDED_KEY_USAGE
        | oid::EXT_FRESHEST_CRL
        | oid::EXT_INHIBIT_ANY_POLICY
        // Common extensions in practice
        | oid::EXT_AUTHORITY_INFO_ACCESS
        | oid::EXT_SUBJECT_INFO_ACCESS
        | oid::EXT_TLS_FEATURE
        | oid::EXT_SCT_LIST
        | oid::EXT_CT_POISON
        // Netscape extensions (legacy, but still seen)
        | oid::EXT_NETSCAPE_CERT_TYPE
    )
}

/// Flag critical extensions the verifier does not process.
pub(crate) fn check_critical_extensions(
    cert: &Certificate,
    cert_index: usize,
    errors: &mut CertPathErrors,
) {
    for ext_oid in cert.critical_extension_oids() {
        if !is_processed_extension(ext_oid) {
            errors.add_error(cert_index, ErrorCode::UnconsumedCriticalExtension);
        }
    }
}

/// Advisory RFC 5280 profile checks. These never affect path validity: real
/// chains routinely violate them, but surfacing them helps diagnostics.
pub(crate) fn add_profile_warnings(
    cert: &Certificate,
    cert_index: usize,
    is_target: bool,
    errors: &mut CertPathErrors,
) {
    // RFC 5280 Section 4.2.1.1: AKI should be present in all certificates
    // except self-signed roots.
    if !cert.is_self_issued() && cert.authority_key_id().is_none() {
        errors.add_warning(cert_index, ErrorCode::MissingAuthorityKeyId);
    }

    // RFC 5280 Section 4.2.1.2: SKI should appear in all CA certificates.
    if !is_target && cert.subject_key_id().is_none() {
        errors.add_warning(cert_index, ErrorCode::MissingSubjectKeyId);
    }

    // RFC 5280 Section 4.1.2.2: serial numbers are positive and at most
    // 20 octets. serial_display strips leading zeros, so 20 octets render
    // as at most 59 characters of colon-separated hex.
    let serial = cert.serial_display();
    if serial.len() > 59 || serial.bytes().all(|b| b == b'0' || b == b':') {
        errors.add_warning(cert_index, ErrorCode::SerialNumberOutOfRange);
    }
}
