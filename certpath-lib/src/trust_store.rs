//! Trust stores: issuer sources that can also classify certificates.
//!
//! [`TrustStoreInMemory`] is the standard implementation, loadable from the
//! system CA bundle (discovered via `openssl-probe` and environment
//! variables, matching OpenSSL's lookup behavior), from PEM bundles and
//! directories, or populated programmatically with per-certificate trust
//! records. [`TrustStoreCollection`] aggregates several stores.

use crate::cert::{parse_pem_chain, Certificate, CertificateRef};
use crate::source::{CertIssuerSource, IssuerSourceRequest};
use crate::trust::CertificateTrust;
use crate::CertPathError;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// A [`CertIssuerSource`] that additionally records how trusted each
/// certificate is.
///
/// Trust anchors are expected to be available synchronously, so
/// `async_get_issuers_of` always yields no request.
pub trait TrustStore: CertIssuerSource {
    /// Classify `cert`. A pure function of the store's configuration and the
    /// certificate's content: equal DER content and equal trust records give
    /// a deterministic result regardless of call order.
    fn get_trust(&self, cert: &Certificate) -> CertificateTrust;
}

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Check if a file looks like a PEM certificate file for trust store loading.
///
/// Matches `.pem`, `.crt`, `.cer` extensions and OpenSSL hash-linked files
/// (`XXXXXXXX.N` where the extension is a single digit).
fn is_pem_cert_file(path: &std::path::Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

struct TrustEntry {
    cert: CertificateRef,
    trust: CertificateTrust,
}

/// In-memory trust store: a multimap from normalized subject to trust
/// records, plus a set of distrusted SPKIs.
#[derive(Default)]
pub struct TrustStoreInMemory {
    entries: HashMap<Vec<u8>, Vec<TrustEntry>>,
    distrusted_spkis: HashSet<Vec<u8>>,
    count: usize,
}

impl std::fmt::Debug for TrustStoreInMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStoreInMemory")
            .field("count", &self.count)
            .field("distrusted_spkis", &self.distrusted_spkis.len())
            .finish()
    }
}

impl TrustStoreInMemory {
    /// Create an empty trust store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the system trust store as anchors.
    ///
    /// Uses `openssl-probe` and environment variables to find the CA bundle,
    /// matching the same locations OpenSSL searches:
    /// 1. `SSL_CERT_FILE` environment variable
    /// 2. Path discovered by `openssl-probe`
    /// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
    /// 4. `SSL_CERT_DIR` environment variable
    /// 5. Directory discovered by `openssl-probe`
    /// 6. Well-known certificate directories ([`KNOWN_CA_DIR_PATHS`])
    pub fn system() -> Result<Self, CertPathError> {
        let mut store = TrustStoreInMemory::new();

        if let Some(bundle_path) = find_system_ca_bundle() {
            if let Ok(data) = std::fs::read(&bundle_path) {
                let added = store.add_pem_bundle(&data)?;
                if added > 0 {
                    return Ok(store);
                }
            }
        }

        let probe = openssl_probe::probe();
        let dir_candidates = std::env::var("SSL_CERT_DIR")
            .ok()
            .into_iter()
            .chain(
                probe
                    .cert_dir
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            )
            .chain(KNOWN_CA_DIR_PATHS.iter().map(|s| (*s).to_string()));

        for dir in dir_candidates {
            let dir_path = std::path::Path::new(&dir);
            if let Ok(added) = store.add_pem_directory(dir_path) {
                if added > 0 {
                    return Ok(store);
                }
            }
        }

        if store.is_empty() {
            return Err(CertPathError::VerifyError(
                "no system trust store found".into(),
            ));
        }

        Ok(store)
    }

    /// Create a trust store from a PEM bundle; every certificate becomes an
    /// anchor.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, CertPathError> {
        let mut store = TrustStoreInMemory::new();
        store.add_pem_bundle(pem_data)?;
        Ok(store)
    }

    /// Create a trust store from a PEM file path.
    pub fn from_pem_file(path: &std::path::Path) -> Result<Self, CertPathError> {
        let data = std::fs::read(path).map_err(|e| {
            CertPathError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_pem(&data)
    }

    /// Add all certificates from a PEM bundle as anchors. Returns the number
    /// actually added (entries that fail to parse are skipped).
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, CertPathError> {
        let certs = parse_pem_chain(pem_data)?;
        let mut added = 0;
        for cert_der in certs {
            if let Ok(cert) = Certificate::from_der(&cert_der) {
                self.add_trust_anchor(cert);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Load anchors from a directory of PEM files (like OpenSSL's -CApath).
    ///
    /// Reads all `.pem`, `.crt`, `.cer`, and OpenSSL hash-linked files in
    /// the directory.
    pub fn add_pem_directory(&mut self, dir: &std::path::Path) -> Result<usize, CertPathError> {
        let mut total = 0;
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CertPathError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", dir.display(), e),
            ))
        })?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_pem_cert_file(&path) {
                if let Ok(data) = std::fs::read(&path) {
                    if let Ok(added) = self.add_pem_bundle(&data) {
                        total += added;
                    }
                }
            }
        }
        Ok(total)
    }

    /// Record `cert` with an explicit trust value.
    pub fn add_certificate(&mut self, cert: CertificateRef, trust: CertificateTrust) {
        self.entries
            .entry(cert.normalized_subject().to_vec())
            .or_default()
            .push(TrustEntry { cert, trust });
        self.count += 1;
    }

    pub fn add_trust_anchor(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::anchor());
    }

    pub fn add_trust_anchor_with_expiration(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::anchor().with_enforce_anchor_expiry());
    }

    pub fn add_trust_anchor_with_constraints(&mut self, cert: CertificateRef) {
        self.add_certificate(
            cert,
            CertificateTrust::anchor().with_enforce_anchor_constraints(),
        );
    }

    pub fn add_anchor_or_leaf(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::anchor_or_leaf());
    }

    pub fn add_trusted_leaf(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::leaf());
    }

    pub fn add_distrusted_certificate(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::distrusted());
    }

    /// Distrust every certificate carrying this subjectPublicKeyInfo,
    /// overriding any per-certificate trust record.
    pub fn add_distrusted_spki(&mut self, spki_der: &[u8]) {
        self.distrusted_spkis.insert(spki_der.to_vec());
    }

    pub fn add_certificate_with_unspecified_trust(&mut self, cert: CertificateRef) {
        self.add_certificate(cert, CertificateTrust::unspecified());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.distrusted_spkis.clear();
        self.count = 0;
    }

    /// Number of certificate records (SPKI distrust entries not included).
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.distrusted_spkis.is_empty()
    }

    /// Whether a record exists for this exact certificate.
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.entries
            .get(cert.normalized_subject())
            .is_some_and(|entries| entries.iter().any(|e| e.cert.der() == cert.der()))
    }
}

impl CertIssuerSource for TrustStoreInMemory {
    fn sync_get_issuers_of(&self, cert: &Certificate, issuers: &mut Vec<CertificateRef>) {
        // Distrusted entries are returned too, so the builder can surface a
        // diagnostic path ending at them.
        if let Some(matches) = self.entries.get(cert.normalized_issuer()) {
            issuers.extend(matches.iter().map(|e| e.cert.clone()));
        }
    }

    fn async_get_issuers_of(&self, _cert: &Certificate) -> Option<Box<dyn IssuerSourceRequest>> {
        None
    }
}

impl TrustStore for TrustStoreInMemory {
    /// SPKI distrust wins over any per-certificate record. Otherwise the
    /// first record matching this exact DER wins; when duplicate DER entries
    /// share a subject, which record is "first" is a non-guarantee of this
    /// implementation.
    fn get_trust(&self, cert: &Certificate) -> CertificateTrust {
        if self.distrusted_spkis.contains(cert.spki_raw()) {
            return CertificateTrust::distrusted();
        }
        if let Some(entries) = self.entries.get(cert.normalized_subject()) {
            for entry in entries {
                if entry.cert.der() == cert.der() {
                    return entry.trust;
                }
            }
        }
        CertificateTrust::unspecified()
    }
}

/// Aggregates several trust stores.
///
/// Issuer lookups concatenate results in store-addition order. Trust lookups
/// take the last non-unspecified verdict, except that any distrust verdict
/// wins immediately.
#[derive(Default)]
pub struct TrustStoreCollection<'a> {
    stores: Vec<&'a dyn TrustStore>,
}

impl<'a> TrustStoreCollection<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trust_store(&mut self, store: &'a dyn TrustStore) {
        self.stores.push(store);
    }
}

impl CertIssuerSource for TrustStoreCollection<'_> {
    fn sync_get_issuers_of(&self, cert: &Certificate, issuers: &mut Vec<CertificateRef>) {
        for store in &self.stores {
            store.sync_get_issuers_of(cert, issuers);
        }
    }

    fn async_get_issuers_of(&self, _cert: &Certificate) -> Option<Box<dyn IssuerSourceRequest>> {
        None
    }
}

impl TrustStore for TrustStoreCollection<'_> {
    fn get_trust(&self, cert: &Certificate) -> CertificateTrust {
        let mut result = CertificateTrust::unspecified();
        for store in &self.stores {
            let trust = store.get_trust(cert);
            if trust.is_distrusted() {
                return trust;
            }
            if !trust.has_unspecified_trust() {
                result = trust;
            }
        }
        result
    }
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let probe = openssl_probe::probe();
    if let Some(file) = probe.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    for candidate in KNOWN_CA_BUNDLE_PATHS {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return Some(p);
        }
    }
    None
}
