//! RFC 5280 Section 6 certificate chain verification.
//!
//! [`verify_certificate_chain`] checks a fully ordered candidate chain
//! (`certs[0]` = target, `certs.last()` = root) for structural and policy
//! validity: validity periods, signatures, basic constraints, key usage,
//! extended key usage, name constraints, and certificate policies. Trust in
//! the final certificate is an input ([`CertificateTrust`]), not something
//! this module decides; revocation is explicitly not checked here.
//!
//! Policy questions (acceptable algorithms and keys, signature-verification
//! caching, precertificate handling) are delegated through
//! [`VerifyChainDelegate`].

mod checks;
mod constraints;
mod policy;

use crate::cert::{Certificate, CertificateRef};
use crate::errors::{CertErrors, CertPathErrors, ErrorCode};
use crate::oid;
use crate::trust::CertificateTrust;
use constraints::ConstraintCheck;
use policy::PolicyTree;
use std::cell::RefCell;
use std::collections::HashMap;

/// The key purpose a chain must satisfy.
///
/// `ServerAuth`/`ClientAuth` accept the anyExtendedKeyUsage escape and
/// tolerate a missing EKU extension on the target. The `Strict` variants
/// require the target to carry an EKU naming the purpose itself; the
/// `StrictLeaf` variants additionally restrict enforcement to the target
/// (intermediate EKUs are ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPurpose {
    /// No key purpose requirement.
    #[default]
    Any,
    ServerAuth,
    ClientAuth,
    ServerAuthStrict,
    ClientAuthStrict,
    ServerAuthStrictLeaf,
    ClientAuthStrictLeaf,
}

impl KeyPurpose {
    fn required_oid(&self) -> Option<&'static str> {
        match self {
            KeyPurpose::Any => None,
            KeyPurpose::ServerAuth
            | KeyPurpose::ServerAuthStrict
            | KeyPurpose::ServerAuthStrictLeaf => Some(oid::EKU_SERVER_AUTH),
            KeyPurpose::ClientAuth
            | KeyPurpose::ClientAuthStrict
            | KeyPurpose::ClientAuthStrictLeaf => Some(oid::EKU_CLIENT_AUTH),
        }
    }

    fn accepts_any_eku(&self) -> bool {
        matches!(
            self,
            KeyPurpose::Any | KeyPurpose::ServerAuth | KeyPurpose::ClientAuth
        )
    }

    fn requires_target_eku(&self) -> bool {
        !matches!(
            self,
            KeyPurpose::Any | KeyPurpose::ServerAuth | KeyPurpose::ClientAuth
        )
    }

    fn leaf_only(&self) -> bool {
        matches!(
            self,
            KeyPurpose::ServerAuthStrictLeaf | KeyPurpose::ClientAuthStrictLeaf
        )
    }
}

/// RFC 5280 Section 6.1.1 policy-processing inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPolicyInputs {
    /// Require the chain to be valid for at least one policy in
    /// `user_initial_policy_set`.
    pub initial_explicit_policy: bool,
    /// Policies acceptable to the caller; defaults to `[anyPolicy]`.
    pub user_initial_policy_set: Vec<String>,
    /// Inhibit policy mapping from the start.
    pub initial_policy_mapping_inhibit: bool,
    /// Inhibit anyPolicy processing from the start.
    pub initial_any_policy_inhibit: bool,
}

impl Default for VerifyPolicyInputs {
    fn default() -> Self {
        VerifyPolicyInputs {
            initial_explicit_policy: false,
            user_initial_policy_set: vec![oid::ANY_POLICY.to_string()],
            initial_policy_mapping_inhibit: false,
            initial_any_policy_inhibit: false,
        }
    }
}

/// Cache of signature-verification outcomes, keyed by a stable string
/// derived from the signed data, the signature, and the verifying key.
pub trait VerifyCache {
    fn check(&self, key: &str) -> Option<bool>;
    fn store(&self, key: &str, ok: bool);
}

/// In-memory [`VerifyCache`]. Not thread-safe; intended for a single
/// (externally synchronized) path-builder run.
#[derive(Default)]
pub struct InMemoryVerifyCache {
    entries: RefCell<HashMap<String, bool>>,
}

impl InMemoryVerifyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl VerifyCache for InMemoryVerifyCache {
    fn check(&self, key: &str) -> Option<bool> {
        self.entries.borrow().get(key).copied()
    }

    fn store(&self, key: &str, ok: bool) {
        self.entries.borrow_mut().insert(key.to_string(), ok);
    }
}

/// Answers the policy questions chain verification cannot decide on its own.
///
/// The default methods match the common case: no cache, no precertificates.
/// Returning `false` from the acceptability gates fails the certificate
/// under check with a high-severity error; implementations may add further
/// context to `errors` but need not.
pub trait VerifyChainDelegate {
    fn is_signature_algorithm_acceptable(
        &self,
        algorithm_oid: &str,
        errors: &mut CertErrors,
    ) -> bool;

    fn is_public_key_acceptable(&self, cert: &Certificate, errors: &mut CertErrors) -> bool;

    fn verify_cache(&self) -> Option<&dyn VerifyCache> {
        None
    }

    fn accept_pre_certificates(&self) -> bool {
        false
    }
}

/// Verify an ordered certificate chain.
///
/// `certs[0]` is the target and `certs.last()` is trusted per
/// `last_cert_trust`. Returns the user-constrained policy set and every
/// error found; the chain is valid iff the returned errors contain nothing
/// of high severity.
///
/// Checks run from the root down to the target so error attribution matches
/// the RFC 5280 processing order. Unless `enforce_anchor_constraints` is
/// set, the anchor contributes only its name and public key; its own
/// extensions and validity go unexamined (expiry separately gated by
/// `enforce_anchor_expiry`).
pub fn verify_certificate_chain(
    certs: &[CertificateRef],
    last_cert_trust: &CertificateTrust,
    delegate: &dyn VerifyChainDelegate,
    time: i64,
    required_key_purpose: KeyPurpose,
    policy: &VerifyPolicyInputs,
) -> (Vec<String>, CertPathErrors) {
    let mut errors = CertPathErrors::new();

    if certs.is_empty() {
        errors.add_other_error(ErrorCode::ChainIsEmpty);
        return (Vec::new(), errors);
    }

    if certs.len() == 1 {
        let set = verify_trusted_leaf(
            &certs[0],
            last_cert_trust,
            delegate,
            time,
            required_key_purpose,
            policy,
            &mut errors,
        );
        return (set, errors);
    }

    let cache = delegate.verify_cache();
    let last = certs.len() - 1;
    let anchor = &certs[last];

    if last_cert_trust.is_distrusted() {
        errors.add_error(last, ErrorCode::DistrustedByTrustStore);
    } else if !last_cert_trust.is_trust_anchor() {
        errors.add_error(last, ErrorCode::CertIsNotTrustAnchor);
    }

    // RFC 5280 Section 6.1.2 state. `n` counts the certificates below the
    // anchor.
    let n = last;
    let mut explicit_policy = if policy.initial_explicit_policy { 0 } else { n + 1 };
    let mut policy_mapping = if policy.initial_policy_mapping_inhibit {
        0
    } else {
        n + 1
    };
    let mut inhibit_any_policy = if policy.initial_any_policy_inhibit {
        0
    } else {
        n + 1
    };
    let mut tree = PolicyTree::new();
    let mut max_path_length = n;
    let mut constraint_sets = Vec::new();

    // The anchor key verifies the first signature, so it is always subject
    // to the delegate's key policy.
    if !delegate.is_public_key_acceptable(anchor, errors.errors_for_cert_mut(last)) {
        errors.add_error(last, ErrorCode::UnacceptablePublicKey);
    }
    if last_cert_trust.enforce_anchor_expiry {
        checks::check_validity(anchor, last, time, &mut errors);
    }
    if last_cert_trust.enforce_anchor_constraints {
        if last_cert_trust.require_anchor_basic_constraints && anchor.basic_constraints().is_none()
        {
            errors.add_error(last, ErrorCode::MissingBasicConstraints);
        }
        if let Some(bc) = anchor.basic_constraints() {
            if !bc.ca {
                errors.add_error(last, ErrorCode::BasicConstraintsIndicatesNotCa);
            }
            if let Some(path_len) = bc.path_len {
                max_path_length = max_path_length.min(path_len as usize);
            }
        }
        if let Some(ku) = anchor.key_usage() {
            if !ku.key_cert_sign {
                errors.add_error(last, ErrorCode::KeyCertSignBitNotSet);
            }
        }
        if let Some(nc) = anchor.name_constraints() {
            constraint_sets.push(nc);
        }

        // The anchor's policy extensions participate as if it were one more
        // intermediate above the chain. An anchor without certificatePolicies
        // leaves the tree alone, and the anchor never consumes a counter
        // step: RFC 5280 processing proper starts below it.
        if anchor.policies().is_some() {
            tree.process_policies(
                anchor.policies(),
                inhibit_any_policy > 0 || anchor.is_self_issued(),
            );
        }
        if let Some(mappings) = anchor.policy_mappings() {
            if !tree.map_policies(mappings, policy_mapping > 0) {
                errors.add_error(last, ErrorCode::PolicyMappingAnyPolicy);
            }
        }
        if let Some(pc) = anchor.policy_constraints() {
            if let Some(v) = pc.require_explicit_policy {
                explicit_policy = explicit_policy.min(v as usize);
            }
            if let Some(v) = pc.inhibit_policy_mapping {
                policy_mapping = policy_mapping.min(v as usize);
            }
        }
        if let Some(v) = anchor.inhibit_any_policy() {
            inhibit_any_policy = inhibit_any_policy.min(v as usize);
        }

        checks::check_critical_extensions(anchor, last, &mut errors);
    }
    checks::add_profile_warnings(anchor, last, false, &mut errors);

    for i in (0..last).rev() {
        let cert = &certs[i];
        let is_target = i == 0;
        let issuer = &certs[i + 1];

        // Issuer linkage and signature.
        if cert.normalized_issuer() != issuer.normalized_subject() {
            errors.add_error(i, ErrorCode::SubjectDoesNotMatchIssuer);
        } else if !delegate.is_signature_algorithm_acceptable(
            cert.signature_algorithm_oid(),
            errors.errors_for_cert_mut(i),
        ) {
            errors.add_error(i, ErrorCode::UnacceptableSignatureAlgorithm);
        } else if !checks::verify_signed_by(cert, issuer, cache) {
            errors.add_error(i, ErrorCode::SignatureVerificationFailed);
        }
        if !delegate.is_public_key_acceptable(cert, errors.errors_for_cert_mut(i)) {
            errors.add_error(i, ErrorCode::UnacceptablePublicKey);
        }

        checks::check_validity(cert, i, time, &mut errors);

        // Name constraints; self-issued intermediates are exempt
        // (RFC 5280 Section 6.1.4 (b)).
        if is_target || !cert.is_self_issued() {
            for nc in &constraint_sets {
                match constraints::check_name_constraints(cert, nc) {
                    ConstraintCheck::Ok => {}
                    ConstraintCheck::Violation => {
                        errors.add_error(i, ErrorCode::NameConstraintViolation);
                    }
                    ConstraintCheck::TooMuchWork => {
                        errors.add_error(i, ErrorCode::TooManyNameConstraintChecks);
                    }
                }
            }
        }

        // Certificate policies (RFC 5280 Section 6.1.3 (d)-(f)).
        let any_policy_allowed = inhibit_any_policy > 0 || (!is_target && cert.is_self_issued());
        tree.process_policies(cert.policies(), any_policy_allowed);
        if tree.is_null() && explicit_policy == 0 {
            errors.add_error(i, ErrorCode::NoValidPolicy);
        }

        if !is_target {
            // Prepare for the next certificate (RFC 5280 Section 6.1.4).
            if let Some(mappings) = cert.policy_mappings() {
                if !tree.map_policies(mappings, policy_mapping > 0) {
                    errors.add_error(i, ErrorCode::PolicyMappingAnyPolicy);
                }
            }
            if !cert.is_self_issued() {
                explicit_policy = explicit_policy.saturating_sub(1);
                policy_mapping = policy_mapping.saturating_sub(1);
                inhibit_any_policy = inhibit_any_policy.saturating_sub(1);
            }
            if let Some(pc) = cert.policy_constraints() {
                if let Some(v) = pc.require_explicit_policy {
                    explicit_policy = explicit_policy.min(v as usize);
                }
                if let Some(v) = pc.inhibit_policy_mapping {
                    policy_mapping = policy_mapping.min(v as usize);
                }
            }
            if let Some(v) = cert.inhibit_any_policy() {
                inhibit_any_policy = inhibit_any_policy.min(v as usize);
            }

            if let Some(nc) = cert.name_constraints() {
                constraint_sets.push(nc);
            }

            // Basic constraints: every issuing certificate must be a CA.
            // Missing basicConstraints is tolerated for v1/v2 certificates
            // (legacy rule); v3 certificates must carry it.
            match cert.basic_constraints() {
                Some(bc) if !bc.ca => {
                    errors.add_error(i, ErrorCode::BasicConstraintsIndicatesNotCa);
                }
                None if cert.version() >= 2 => {
                    errors.add_error(i, ErrorCode::MissingBasicConstraints);
                }
                _ => {}
            }

            // pathLenConstraint; self-issued intermediates do not consume
            // path length (RFC 5280 Section 6.1.4 (h), (l)).
            if !cert.is_self_issued() {
                if max_path_length == 0 {
                    errors.add_error(i, ErrorCode::MaxPathLengthViolated);
                } else {
                    max_path_length -= 1;
                }
            }
            if let Some(bc) = cert.basic_constraints() {
                if let Some(path_len) = bc.path_len {
                    max_path_length = max_path_length.min(path_len as usize);
                }
            }

            // keyUsage: a CA asserting keyUsage must include keyCertSign;
            // a missing keyUsage extension is tolerated.
            if let Some(ku) = cert.key_usage() {
                if !ku.key_cert_sign {
                    errors.add_error(i, ErrorCode::KeyCertSignBitNotSet);
                }
            }

            // EKU on an intermediate restricts the purposes the chain below
            // may assert. A deliberate deviation from strict RFC 5280, which
            // leaves CA EKU semantics undefined.
            check_intermediate_eku(cert, i, required_key_purpose, &mut errors);

            // A precertificate can never be an issuer.
            if cert.has_ct_poison() {
                errors.add_error(i, ErrorCode::PreCertificate);
            }
        } else {
            // Wrap-up (RFC 5280 Section 6.1.5 (a)-(b)).
            explicit_policy = explicit_policy.saturating_sub(1);
            if let Some(pc) = cert.policy_constraints() {
                if pc.require_explicit_policy == Some(0) {
                    explicit_policy = 0;
                }
            }

            check_target_eku(cert, i, required_key_purpose, &mut errors);

            if cert.has_ct_poison() && !delegate.accept_pre_certificates() {
                errors.add_error(i, ErrorCode::PreCertificate);
            }
        }

        checks::check_critical_extensions(cert, i, &mut errors);
        checks::add_profile_warnings(cert, i, is_target, &mut errors);
    }

    // Final policy determination (RFC 5280 Section 6.1.5 (g)).
    let user_constrained = tree.user_constrained_policy_set(&policy.user_initial_policy_set);
    if explicit_policy == 0
        && user_constrained.is_empty()
        && !errors.contains_error(ErrorCode::NoValidPolicy)
    {
        errors.add_error(0, ErrorCode::NoValidPolicy);
    }

    (user_constrained, errors)
}

/// Single-certificate chain: the target must itself be directly trusted.
///
/// The policy-tree machinery does not run for a directly trusted leaf; the
/// caller's initial policy set is returned unchanged.
fn verify_trusted_leaf(
    target: &CertificateRef,
    trust: &CertificateTrust,
    delegate: &dyn VerifyChainDelegate,
    time: i64,
    required_key_purpose: KeyPurpose,
    policy: &VerifyPolicyInputs,
    errors: &mut CertPathErrors,
) -> Vec<String> {
    let cache = delegate.verify_cache();

    if trust.is_trust_leaf() {
        if trust.require_leaf_selfsigned && !verify_certificate_is_self_signed(target, cache, None)
        {
            errors.add_error(0, ErrorCode::LeafNotSelfSigned);
        }
    } else if trust.is_distrusted() {
        errors.add_error(0, ErrorCode::DistrustedByTrustStore);
    } else {
        errors.add_error(0, ErrorCode::CertIsNotTrustAnchor);
    }

    if !delegate.is_public_key_acceptable(target, errors.errors_for_cert_mut(0)) {
        errors.add_error(0, ErrorCode::UnacceptablePublicKey);
    }
    checks::check_validity(target, 0, time, errors);
    check_target_eku(target, 0, required_key_purpose, errors);
    if target.has_ct_poison() && !delegate.accept_pre_certificates() {
        errors.add_error(0, ErrorCode::PreCertificate);
    }
    checks::check_critical_extensions(target, 0, errors);
    checks::add_profile_warnings(target, 0, true, errors);

    policy.user_initial_policy_set.clone()
}

fn eku_satisfies(ekus: &[String], required: &str, accepts_any: bool) -> bool {
    ekus.iter().any(|e| e == required) || (accepts_any && ekus.iter().any(|e| e == oid::EKU_ANY))
}

fn check_target_eku(
    cert: &Certificate,
    cert_index: usize,
    purpose: KeyPurpose,
    errors: &mut CertPathErrors,
) {
    let Some(required) = purpose.required_oid() else {
        return;
    };
    match cert.extended_key_usage() {
        None => {
            if purpose.requires_target_eku() {
                errors.add_error(cert_index, ErrorCode::EkuNotPresent);
            }
        }
        Some(ekus) => {
            if !eku_satisfies(ekus, required, purpose.accepts_any_eku()) {
                errors.add_error(cert_index, ErrorCode::EkuLacksPurpose);
            }
        }
    }
}

fn check_intermediate_eku(
    cert: &Certificate,
    cert_index: usize,
    purpose: KeyPurpose,
    errors: &mut CertPathErrors,
) {
    let Some(required) = purpose.required_oid() else {
        return;
    };
    if purpose.leaf_only() {
        return;
    }
    if let Some(ekus) = cert.extended_key_usage() {
        if !eku_satisfies(ekus, required, purpose.accepts_any_eku()) {
            errors.add_error(cert_index, ErrorCode::EkuLacksPurpose);
        }
    }
}

/// True iff the certificate's issuer equals its subject (after
/// normalization) and its signature verifies against its own public key.
///
/// A name mismatch returns `false` without recording anything; a signature
/// failure on a self-issued certificate records a verification error in
/// `errors` when supplied.
pub fn verify_certificate_is_self_signed(
    cert: &Certificate,
    cache: Option<&dyn VerifyCache>,
    errors: Option<&mut CertErrors>,
) -> bool {
    if cert.normalized_subject() != cert.normalized_issuer() {
        return false;
    }
    if checks::verify_self_signature(cert, cache) {
        return true;
    }
    if let Some(errors) = errors {
        errors.add_error(ErrorCode::SignatureVerificationFailed);
    }
    false
}
