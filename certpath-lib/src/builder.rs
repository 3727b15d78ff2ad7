//! Certificate path building.
//!
//! [`CertPathBuilder`] searches for certificate chains from a target
//! certificate to a trust anchor: a depth-first search over candidate
//! issuers pulled from a [`TrustStore`] and any number of additional
//! [`CertIssuerSource`]s, with priority-ordered candidates, loop
//! prevention, and explicit backtracking over a frame stack (no recursion,
//! so adversarial certificate graphs cannot exhaust the call stack).
//!
//! Every explored candidate chain is verified with
//! [`verify_certificate_chain`] and recorded in the [`PathBuilderResult`],
//! valid or not, so the most informative failure can be surfaced when no
//! valid path exists.

use crate::cert::{Certificate, CertificateRef};
use crate::errors::{CertErrors, CertPathErrors, ErrorCode};
use crate::oid;
use crate::source::CertIssuerSource;
use crate::trust::CertificateTrust;
use crate::trust_store::TrustStore;
use crate::verify::{
    verify_certificate_chain, InMemoryVerifyCache, KeyPurpose, VerifyCache, VerifyChainDelegate,
    VerifyPolicyInputs,
};
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::time::Instant;

/// Path-building policy hooks, extending the chain-verification delegate.
pub trait PathBuilderDelegate: VerifyChainDelegate {
    /// Called exactly once per completed candidate path (valid or invalid),
    /// after the builder's own checks. May add further errors or warnings
    /// (e.g., revocation results) and attach opaque per-path data; it cannot
    /// clear errors the builder already recorded.
    fn check_path_after_verification(&self, path: &mut ResultPath) {
        let _ = path;
    }

    /// Polled before each extension attempt and after each asynchronous
    /// batch; returning `true` aborts the search at the next check point.
    fn is_deadline_expired(&self) -> bool {
        false
    }
}

/// Stock delegate: accepts SHA-2 family signature algorithms, requires a
/// minimum RSA modulus size, caches signature verifications, and supports an
/// optional wall-clock deadline.
pub struct DefaultPathBuilderDelegate {
    min_rsa_modulus_bits: u32,
    accept_pre_certificates: bool,
    deadline: Option<Instant>,
    cache: InMemoryVerifyCache,
}

impl DefaultPathBuilderDelegate {
    pub fn new(min_rsa_modulus_bits: u32) -> Self {
        DefaultPathBuilderDelegate {
            min_rsa_modulus_bits,
            accept_pre_certificates: false,
            deadline: None,
            cache: InMemoryVerifyCache::new(),
        }
    }

    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn set_accept_pre_certificates(&mut self, accept: bool) {
        self.accept_pre_certificates = accept;
    }
}

impl Default for DefaultPathBuilderDelegate {
    fn default() -> Self {
        Self::new(2048)
    }
}

impl VerifyChainDelegate for DefaultPathBuilderDelegate {
    fn is_signature_algorithm_acceptable(
        &self,
        algorithm_oid: &str,
        _errors: &mut CertErrors,
    ) -> bool {
        matches!(
            algorithm_oid,
            oid::SHA256_WITH_RSA
                | oid::SHA384_WITH_RSA
                | oid::SHA512_WITH_RSA
                | oid::ECDSA_WITH_SHA256
                | oid::ECDSA_WITH_SHA384
                | oid::ECDSA_WITH_SHA512
                | oid::ED25519
                | oid::ED448
        )
    }

    fn is_public_key_acceptable(&self, cert: &Certificate, _errors: &mut CertErrors) -> bool {
        match cert.public_key_algorithm_oid() {
            oid::RSA_ENCRYPTION => cert
                .rsa_modulus_bits()
                .is_some_and(|bits| bits >= self.min_rsa_modulus_bits),
            oid::EC_PUBLIC_KEY | oid::ED25519 | oid::ED448 => true,
            _ => false,
        }
    }

    fn verify_cache(&self) -> Option<&dyn VerifyCache> {
        Some(&self.cache)
    }

    fn accept_pre_certificates(&self) -> bool {
        self.accept_pre_certificates
    }
}

impl PathBuilderDelegate for DefaultPathBuilderDelegate {
    fn is_deadline_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// One explored candidate chain: `certs[0]` is the target, `certs.last()`
/// the certificate the branch ended at (an anchor when one was reached).
pub struct ResultPath {
    pub certs: Vec<CertificateRef>,
    pub last_cert_trust: CertificateTrust,
    pub errors: CertPathErrors,
    pub user_constrained_policy_set: Vec<String>,
    /// Opaque data attached by the delegate's post-verification hook.
    pub delegate_data: Option<Box<dyn Any>>,
}

impl ResultPath {
    /// Valid means the chain ends at a trusted certificate and nothing of
    /// high severity was recorded against it.
    pub fn is_valid(&self) -> bool {
        let trusted = self.last_cert_trust.is_trust_anchor()
            || (self.certs.len() == 1 && self.last_cert_trust.is_trust_leaf());
        trusted && !self.errors.contains_high_severity_errors()
    }

    /// Subjects of the chain, for error rendering.
    pub fn subjects(&self) -> Vec<String> {
        self.certs
            .iter()
            .map(|c| c.subject_display().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ResultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPath")
            .field("certs", &self.subjects())
            .field("last_cert_trust", &self.last_cert_trust.to_debug_string())
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Externally visible summary of the dominant failure on the best path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    PathVerified,
    PathNotFound,
    CertificateExpired,
    CertificateNotYetValid,
    CertificateInvalid,
    CertificateRevoked,
    NoRevocationMechanism,
    UnableToCheckRevocation,
    UnsupportedSignatureAlgorithm,
    UnsupportedKey,
    IterationLimitExceeded,
    DepthLimitExceeded,
    DeadlineExceeded,
    MultipleErrors,
    InternalError,
}

impl std::fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            VerifyStatus::PathVerified => "path verified",
            VerifyStatus::PathNotFound => "no valid path found",
            VerifyStatus::CertificateExpired => "certificate has expired",
            VerifyStatus::CertificateNotYetValid => "certificate is not yet valid",
            VerifyStatus::CertificateInvalid => "certificate is invalid",
            VerifyStatus::CertificateRevoked => "certificate has been revoked",
            VerifyStatus::NoRevocationMechanism => "no revocation mechanism available",
            VerifyStatus::UnableToCheckRevocation => "unable to check revocation",
            VerifyStatus::UnsupportedSignatureAlgorithm => "unsupported signature algorithm",
            VerifyStatus::UnsupportedKey => "unsupported public key",
            VerifyStatus::IterationLimitExceeded => "iteration limit exceeded",
            VerifyStatus::DepthLimitExceeded => "depth limit exceeded",
            VerifyStatus::DeadlineExceeded => "deadline exceeded",
            VerifyStatus::MultipleErrors => "multiple errors",
            VerifyStatus::InternalError => "internal error",
        };
        f.write_str(text)
    }
}

fn status_for_code(code: ErrorCode) -> VerifyStatus {
    match code {
        ErrorCode::ValidityFailedNotAfter => VerifyStatus::CertificateExpired,
        ErrorCode::ValidityFailedNotBefore => VerifyStatus::CertificateNotYetValid,
        ErrorCode::DistrustedByTrustStore
        | ErrorCode::CertIsNotTrustAnchor
        | ErrorCode::NoIssuersFound
        | ErrorCode::SubjectDoesNotMatchIssuer => VerifyStatus::PathNotFound,
        ErrorCode::IterationLimitExceeded => VerifyStatus::IterationLimitExceeded,
        ErrorCode::DepthLimitExceeded => VerifyStatus::DepthLimitExceeded,
        ErrorCode::DeadlineExceeded => VerifyStatus::DeadlineExceeded,
        ErrorCode::UnacceptableSignatureAlgorithm => VerifyStatus::UnsupportedSignatureAlgorithm,
        ErrorCode::UnacceptablePublicKey => VerifyStatus::UnsupportedKey,
        ErrorCode::CertificateRevoked => VerifyStatus::CertificateRevoked,
        ErrorCode::NoRevocationMechanism => VerifyStatus::NoRevocationMechanism,
        ErrorCode::UnableToCheckRevocation => VerifyStatus::UnableToCheckRevocation,
        ErrorCode::Internal => VerifyStatus::InternalError,
        _ => VerifyStatus::CertificateInvalid,
    }
}

/// Aggregate outcome of a path-building run.
#[derive(Debug, Default)]
pub struct PathBuilderResult {
    /// Every candidate path explored, in discovery order.
    pub paths: Vec<ResultPath>,
    /// Index of the best path: the first valid one, or the most informative
    /// invalid one.
    pub best_result_index: usize,
    /// Extension attempts made across the whole search.
    pub iteration_count: u32,
    /// Deepest candidate chain length reached.
    pub max_depth_seen: u32,
    pub exceeded_iteration_limit: bool,
    pub exceeded_deadline: bool,
}

impl PathBuilderResult {
    pub fn has_valid_path(&self) -> bool {
        self.paths
            .get(self.best_result_index)
            .is_some_and(|p| p.is_valid())
    }

    pub fn best_path(&self) -> Option<&ResultPath> {
        self.paths.get(self.best_result_index)
    }

    /// Map the dominant failure on the best path to one status code.
    ///
    /// The not-reached markers (no anchor, no issuers) accompany most other
    /// failures and count as plain [`VerifyStatus::PathNotFound`] only when
    /// nothing more specific was recorded. When the best path carries more
    /// than one distinct failure kind, [`VerifyStatus::MultipleErrors`] is
    /// returned rather than picking one arbitrarily.
    pub fn best_path_verify_status(&self) -> VerifyStatus {
        if self.has_valid_path() {
            return VerifyStatus::PathVerified;
        }
        let Some(best) = self.best_path() else {
            return VerifyStatus::PathNotFound;
        };
        let specific: Vec<VerifyStatus> = {
            let mut statuses = Vec::new();
            for code in best.errors.distinct_high_severity_codes() {
                if matches!(
                    code,
                    ErrorCode::CertIsNotTrustAnchor | ErrorCode::NoIssuersFound
                ) {
                    continue;
                }
                let status = status_for_code(code);
                if !statuses.contains(&status) {
                    statuses.push(status);
                }
            }
            statuses
        };
        match specific.as_slice() {
            [] => VerifyStatus::PathNotFound,
            [single] => *single,
            _ => VerifyStatus::MultipleErrors,
        }
    }
}

/// A discovered candidate issuer, with the trust verdict and discovery
/// order it was collected under.
#[derive(Clone)]
struct IssuerEntry {
    cert: CertificateRef,
    trust: CertificateTrust,
    order: usize,
}

fn trust_rank(trust: &CertificateTrust) -> u8 {
    if trust.is_trust_anchor() {
        0
    } else if trust.is_distrusted() {
        2
    } else {
        1
    }
}

/// Iterates the candidate issuers of one certificate in priority order.
///
/// Synchronous sources are collected up front; asynchronous requests are
/// issued to every source before any result is consumed, then polled in
/// rounds until exhausted, so no source is starved by another's slowness.
struct CertIssuersIter {
    issuers: Vec<IssuerEntry>,
    next_index: usize,
    seen_der: HashSet<Vec<u8>>,
    did_async: bool,
    next_order: usize,
}

enum NextIssuer {
    Candidate(IssuerEntry),
    Exhausted,
    DeadlineExpired,
}

impl CertIssuersIter {
    fn new(
        tail: &Certificate,
        trust_store: &dyn TrustStore,
        sources: &[&dyn CertIssuerSource],
    ) -> Self {
        let mut iter = CertIssuersIter {
            issuers: Vec::new(),
            next_index: 0,
            seen_der: HashSet::new(),
            did_async: false,
            next_order: 0,
        };

        // The trust store is itself an issuer source, queried first.
        let mut found = Vec::new();
        trust_store.sync_get_issuers_of(tail, &mut found);
        for source in sources {
            source.sync_get_issuers_of(tail, &mut found);
        }
        for cert in found {
            iter.add_candidate(cert, trust_store);
        }
        iter.sort_unconsumed(tail);
        iter
    }

    fn add_candidate(&mut self, cert: CertificateRef, trust_store: &dyn TrustStore) {
        // De-duplicate by exact DER. Cross-signed variants of one
        // intermediate (same subject and key, different issuer) are distinct
        // candidates; identical copies from overlapping sources are not.
        if !self.seen_der.insert(cert.der().to_vec()) {
            return;
        }
        let trust = trust_store.get_trust(&cert);
        let order = self.next_order;
        self.next_order += 1;
        self.issuers.push(IssuerEntry { cert, trust, order });
    }

    /// Stable-sort the not-yet-consumed candidates by the fixed priority
    /// order: self-issued first, then by trust, then exact SKI/AKI match,
    /// then newer notBefore, with discovery order as the final tie-break.
    fn sort_unconsumed(&mut self, tail: &Certificate) {
        let tail_subject = tail.normalized_subject().to_vec();
        let tail_aki = tail.authority_key_id().map(|k| k.to_vec());
        self.issuers[self.next_index..].sort_by(|a, b| {
            let key = |e: &IssuerEntry| {
                let self_issued = e.cert.normalized_subject() == tail_subject.as_slice();
                let ski_match = match (&tail_aki, e.cert.subject_key_id()) {
                    (Some(aki), Some(ski)) => aki.as_slice() == ski,
                    _ => false,
                };
                (!self_issued, trust_rank(&e.trust), !ski_match)
            };
            key(a)
                .cmp(&key(b))
                .then(b.cert.not_before().cmp(&a.cert.not_before()))
                .then(a.order.cmp(&b.order))
        });
    }

    /// Issue asynchronous requests to every source, then poll them in
    /// rounds until all are exhausted. Returns `true` if the deadline
    /// expired mid-drain.
    fn drain_async(
        &mut self,
        tail: &Certificate,
        trust_store: &dyn TrustStore,
        sources: &[&dyn CertIssuerSource],
        delegate: &dyn PathBuilderDelegate,
    ) -> bool {
        self.did_async = true;

        // Register interest with every source before consuming any result.
        // Trust stores never produce async results, but are queried for
        // uniformity.
        let mut requests = Vec::new();
        if let Some(request) = trust_store.async_get_issuers_of(tail) {
            requests.push(request);
        }
        for source in sources {
            if let Some(request) = source.async_get_issuers_of(tail) {
                requests.push(request);
            }
        }

        while !requests.is_empty() {
            let mut still_pending = Vec::new();
            for mut request in requests {
                let mut batch = Vec::new();
                request.get_next(&mut batch);
                if batch.is_empty() {
                    // Exhausted; dropping the request cancels it.
                    continue;
                }
                for cert in batch {
                    self.add_candidate(cert, trust_store);
                }
                still_pending.push(request);
            }
            requests = still_pending;
            if delegate.is_deadline_expired() {
                return true;
            }
        }

        self.sort_unconsumed(tail);
        false
    }

    fn next(
        &mut self,
        tail: &Certificate,
        trust_store: &dyn TrustStore,
        sources: &[&dyn CertIssuerSource],
        delegate: &dyn PathBuilderDelegate,
    ) -> NextIssuer {
        if self.next_index >= self.issuers.len() && !self.did_async {
            // Synchronous candidates exhausted; fall back to async sources.
            if self.drain_async(tail, trust_store, sources, delegate) {
                return NextIssuer::DeadlineExpired;
            }
        }
        if self.next_index < self.issuers.len() {
            let entry = self.issuers[self.next_index].clone();
            self.next_index += 1;
            NextIssuer::Candidate(entry)
        } else {
            NextIssuer::Exhausted
        }
    }
}

/// One element of the current partial path.
struct PathFrame {
    cert: CertificateRef,
    trust: CertificateTrust,
    /// Name+SAN+SPKI identity, for loop prevention.
    identity: Vec<u8>,
    iter: Option<CertIssuersIter>,
    /// Whether any extension was pushed from this frame; a frame that
    /// exhausts without one is a dead end worth recording.
    pushed_any: bool,
}

/// Searches for certificate paths from a target to a trust anchor.
///
/// Construct with the target and policy inputs, attach issuer sources, and
/// call [`CertPathBuilder::run`]. Additional sources are consulted in
/// registration order; candidates that tie on every priority rule keep
/// their source-registration discovery order (implementation-defined, not
/// semantically load-bearing).
pub struct CertPathBuilder<'a> {
    target: CertificateRef,
    trust_store: &'a dyn TrustStore,
    delegate: &'a dyn PathBuilderDelegate,
    sources: Vec<&'a dyn CertIssuerSource>,
    time: i64,
    key_purpose: KeyPurpose,
    policy: VerifyPolicyInputs,
    iteration_limit: u32,
    depth_limit: u32,
    valid_path_limit: usize,
}

impl<'a> CertPathBuilder<'a> {
    pub fn new(
        target: CertificateRef,
        trust_store: &'a dyn TrustStore,
        delegate: &'a dyn PathBuilderDelegate,
        time: i64,
        key_purpose: KeyPurpose,
        policy: VerifyPolicyInputs,
    ) -> Self {
        CertPathBuilder {
            target,
            trust_store,
            delegate,
            sources: Vec::new(),
            time,
            key_purpose,
            policy,
            iteration_limit: 0,
            depth_limit: 0,
            valid_path_limit: 1,
        }
    }

    /// Attach an additional issuer source. Sources are queried after the
    /// trust store, in the order added.
    pub fn add_cert_issuer_source(&mut self, source: &'a dyn CertIssuerSource) {
        self.sources.push(source);
    }

    /// Bound the number of extension attempts across the whole search.
    /// Zero means unlimited.
    pub fn set_iteration_limit(&mut self, limit: u32) {
        self.iteration_limit = limit;
    }

    /// Bound candidate chain length, target inclusive. Zero means unlimited.
    pub fn set_depth_limit(&mut self, limit: u32) {
        self.depth_limit = limit;
    }

    /// Stop after this many valid paths have been found. Zero means explore
    /// everything; the default is one.
    pub fn set_valid_path_limit(&mut self, limit: usize) {
        self.valid_path_limit = limit;
    }

    /// Convenience for [`CertPathBuilder::set_valid_path_limit`]: `true`
    /// explores all paths, `false` stops at the first valid one.
    pub fn set_explore_all_paths(&mut self, explore_all: bool) {
        self.valid_path_limit = if explore_all { 0 } else { 1 };
    }

    /// Run the search to completion and return every explored path.
    pub fn run(self) -> PathBuilderResult {
        let mut result = PathBuilderResult::default();
        let mut valid_paths_found = 0usize;

        let target_trust = self.trust_store.get_trust(&self.target);

        if target_trust.is_distrusted() {
            // Nothing rooted in a distrusted target can become valid; record
            // the diagnostic path and stop.
            self.record_path(
                vec![self.target.clone()],
                target_trust,
                &[],
                &mut result,
                &mut valid_paths_found,
            );
            result.max_depth_seen = 1;
            finalize_best(&mut result);
            return result;
        }

        // A directly trusted target is itself a complete candidate, tried
        // before any issuer chain.
        if target_trust.is_trust_leaf() {
            result.max_depth_seen = 1;
            let done = self.record_path(
                vec![self.target.clone()],
                target_trust,
                &[],
                &mut result,
                &mut valid_paths_found,
            );
            if done {
                finalize_best(&mut result);
                return result;
            }
        }

        let mut stack = vec![PathFrame {
            identity: self.target.identity_key(),
            cert: self.target.clone(),
            trust: target_trust,
            iter: None,
            pushed_any: false,
        }];

        while !stack.is_empty() {
            result.max_depth_seen = result.max_depth_seen.max(stack.len() as u32);
            let tail_trust = stack.last().map(|f| f.trust).unwrap_or_else(
                CertificateTrust::unspecified,
            );

            // A trusted or distrusted tail terminates this branch: verify
            // and record, then backtrack to the parent's next candidate.
            if stack.len() > 1 && (tail_trust.is_trust_anchor() || tail_trust.is_distrusted()) {
                let done = self.record_path(
                    current_certs(&stack),
                    tail_trust,
                    &[],
                    &mut result,
                    &mut valid_paths_found,
                );
                if done {
                    break;
                }
                stack.pop();
                continue;
            }

            // A branch at the depth limit cannot be extended; record it and
            // backtrack to try shorter alternatives.
            if self.depth_limit > 0 && stack.len() >= self.depth_limit as usize {
                let done = self.record_path(
                    current_certs(&stack),
                    tail_trust,
                    &[ErrorCode::DepthLimitExceeded],
                    &mut result,
                    &mut valid_paths_found,
                );
                if done {
                    break;
                }
                stack.pop();
                continue;
            }

            if self.delegate.is_deadline_expired() {
                result.exceeded_deadline = true;
                self.record_path(
                    current_certs(&stack),
                    tail_trust,
                    &[ErrorCode::DeadlineExceeded],
                    &mut result,
                    &mut valid_paths_found,
                );
                break;
            }

            let tail_cert = match stack.last() {
                Some(frame) => frame.cert.clone(),
                None => break,
            };
            if let Some(frame) = stack.last_mut() {
                if frame.iter.is_none() {
                    frame.iter = Some(CertIssuersIter::new(
                        &tail_cert,
                        self.trust_store,
                        &self.sources,
                    ));
                }
            }
            let outcome = match stack.last_mut().and_then(|f| f.iter.as_mut()) {
                Some(iter) => iter.next(&tail_cert, self.trust_store, &self.sources, self.delegate),
                None => break,
            };

            match outcome {
                NextIssuer::DeadlineExpired => {
                    result.exceeded_deadline = true;
                    self.record_path(
                        current_certs(&stack),
                        tail_trust,
                        &[ErrorCode::DeadlineExceeded],
                        &mut result,
                        &mut valid_paths_found,
                    );
                    break;
                }
                NextIssuer::Candidate(entry) => {
                    result.iteration_count += 1;
                    if self.iteration_limit > 0 && result.iteration_count > self.iteration_limit {
                        result.exceeded_iteration_limit = true;
                        self.record_path(
                            current_certs(&stack),
                            tail_trust,
                            &[ErrorCode::IterationLimitExceeded],
                            &mut result,
                            &mut valid_paths_found,
                        );
                        break;
                    }

                    // Loop prevention: reject a candidate whose
                    // Name+SAN+SPKI identity already occurs in this path.
                    let identity = entry.cert.identity_key();
                    if stack.iter().any(|f| f.identity == identity) {
                        continue;
                    }

                    if let Some(frame) = stack.last_mut() {
                        frame.pushed_any = true;
                    }
                    stack.push(PathFrame {
                        identity,
                        cert: entry.cert,
                        trust: entry.trust,
                        iter: None,
                        pushed_any: false,
                    });
                }
                NextIssuer::Exhausted => {
                    let dead_end = stack.last().is_some_and(|f| !f.pushed_any);
                    if dead_end {
                        let done = self.record_path(
                            current_certs(&stack),
                            tail_trust,
                            &[ErrorCode::NoIssuersFound],
                            &mut result,
                            &mut valid_paths_found,
                        );
                        if done {
                            break;
                        }
                    }
                    stack.pop();
                }
            }
        }

        finalize_best(&mut result);
        result
    }

    /// Verify one completed candidate, run the delegate's hook, and record
    /// it. Returns `true` when the valid-path limit has been reached.
    fn record_path(
        &self,
        certs: Vec<CertificateRef>,
        last_cert_trust: CertificateTrust,
        extra_other_errors: &[ErrorCode],
        result: &mut PathBuilderResult,
        valid_paths_found: &mut usize,
    ) -> bool {
        let (policy_set, mut errors) = verify_certificate_chain(
            &certs,
            &last_cert_trust,
            self.delegate,
            self.time,
            self.key_purpose,
            &self.policy,
        );
        for code in extra_other_errors {
            errors.add_other_error(*code);
        }

        let mut path = ResultPath {
            certs,
            last_cert_trust,
            errors,
            user_constrained_policy_set: policy_set,
            delegate_data: None,
        };
        self.delegate.check_path_after_verification(&mut path);

        let valid = path.is_valid();
        result.paths.push(path);
        if valid {
            *valid_paths_found += 1;
            if self.valid_path_limit > 0 && *valid_paths_found >= self.valid_path_limit {
                return true;
            }
        }
        false
    }
}

fn current_certs(stack: &[PathFrame]) -> Vec<CertificateRef> {
    stack.iter().map(|f| f.cert.clone()).collect()
}

/// Pick the best path: the first valid one; otherwise the invalid path with
/// the fewest high-severity errors, preferring paths that at least reached a
/// trust-anchor-classified certificate (even a distrusted one) over purely
/// partial paths.
fn finalize_best(result: &mut PathBuilderResult) {
    if let Some(index) = result.paths.iter().position(|p| p.is_valid()) {
        result.best_result_index = index;
        return;
    }
    let score = |p: &ResultPath| {
        let reached_anchor = p.last_cert_trust.is_trust_anchor() || p.last_cert_trust.is_distrusted();
        (usize::from(!reached_anchor), p.errors.high_severity_count())
    };
    let mut best = 0;
    for index in 1..result.paths.len() {
        if score(&result.paths[index]) < score(&result.paths[best]) {
            best = index;
        }
    }
    result.best_result_index = best;
}
