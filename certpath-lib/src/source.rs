//! Issuer certificate sources.
//!
//! A [`CertIssuerSource`] produces candidate issuers for a certificate:
//! certificates whose subject matches the certificate's issuer name. Sources
//! may answer synchronously (in-memory pools, trust stores) and/or
//! asynchronously (e.g., a caller-managed network fetcher); asynchronous
//! answers are delivered through polled [`IssuerSourceRequest`] objects so
//! the path builder can multiplex several sources cooperatively without
//! threads.

use crate::cert::{Certificate, CertificateRef};
use std::collections::HashMap;

/// An in-flight asynchronous issuer lookup.
///
/// Dropping the request cancels it.
pub trait IssuerSourceRequest {
    /// Appends a batch of newly available issuers to `issuers`. Leaves
    /// `issuers` unchanged once the request is exhausted.
    fn get_next(&mut self, issuers: &mut Vec<CertificateRef>);
}

/// Produces candidate issuer certificates for a given certificate.
///
/// Implementations may return overlapping or duplicate certificates; the
/// consumer de-duplicates.
pub trait CertIssuerSource {
    /// Appends (never replaces) every issuer this source can produce
    /// synchronously. Must not block on I/O.
    fn sync_get_issuers_of(&self, cert: &Certificate, issuers: &mut Vec<CertificateRef>);

    /// Registers interest in asynchronous results and returns immediately.
    /// `None` means this source has no asynchronous results for `cert`
    /// (or produces everything synchronously).
    fn async_get_issuers_of(&self, cert: &Certificate) -> Option<Box<dyn IssuerSourceRequest>>;
}

/// A fixed in-memory pool of certificates, indexed by normalized subject.
///
/// Purely synchronous; `async_get_issuers_of` always returns `None`.
#[derive(Default)]
pub struct StaticCertIssuerSource {
    by_subject: HashMap<Vec<u8>, Vec<CertificateRef>>,
}

impl StaticCertIssuerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_certs<I: IntoIterator<Item = CertificateRef>>(certs: I) -> Self {
        let mut source = Self::new();
        for cert in certs {
            source.add_cert(cert);
        }
        source
    }

    pub fn add_cert(&mut self, cert: CertificateRef) {
        self.by_subject
            .entry(cert.normalized_subject().to_vec())
            .or_default()
            .push(cert);
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty()
    }
}

impl CertIssuerSource for StaticCertIssuerSource {
    fn sync_get_issuers_of(&self, cert: &Certificate, issuers: &mut Vec<CertificateRef>) {
        if let Some(matches) = self.by_subject.get(cert.normalized_issuer()) {
            issuers.extend(matches.iter().cloned());
        }
    }

    fn async_get_issuers_of(&self, _cert: &Certificate) -> Option<Box<dyn IssuerSourceRequest>> {
        None
    }
}
