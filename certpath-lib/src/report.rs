//! High-level chain verification API.
//!
//! Wraps parsing, trust-store setup, and path building behind one call
//! taking raw DER (or PEM) certificates, returning a serializable
//! [`ChainVerifyReport`] with the best chain found, a summary status, and
//! rendered diagnostics for every error on the best path.

use crate::builder::{CertPathBuilder, DefaultPathBuilderDelegate, VerifyStatus};
use crate::cert::Certificate;
use crate::source::StaticCertIssuerSource;
use crate::trust_store::TrustStoreInMemory;
use crate::verify::{KeyPurpose, VerifyPolicyInputs};
use crate::CertPathError;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Options controlling high-level verification behavior.
#[derive(Debug, Clone)]
pub struct VerifyChainOptions {
    /// Verify at a specific Unix timestamp instead of the current time.
    pub at_time: Option<i64>,
    /// Key purpose the chain must satisfy.
    pub key_purpose: KeyPurpose,
    /// RFC 5280 policy-processing inputs.
    pub policy: VerifyPolicyInputs,
    /// Search iteration limit; zero means unlimited.
    pub iteration_limit: u32,
    /// Chain depth limit, target inclusive; zero means unlimited.
    pub depth_limit: u32,
    /// Keep exploring after the first valid path, collecting all of them.
    pub explore_all_paths: bool,
    /// Minimum acceptable RSA modulus size.
    pub min_rsa_modulus_bits: u32,
}

impl Default for VerifyChainOptions {
    fn default() -> Self {
        VerifyChainOptions {
            at_time: None,
            key_purpose: KeyPurpose::Any,
            policy: VerifyPolicyInputs::default(),
            iteration_limit: 0,
            depth_limit: 0,
            explore_all_paths: false,
            min_rsa_modulus_bits: 2048,
        }
    }
}

/// Information about a certificate in the best chain found.
#[derive(Debug, Clone, Serialize)]
pub struct ChainCertInfo {
    /// Position in chain (0 = target).
    pub depth: usize,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// Validity start, ISO 8601.
    pub not_before: String,
    /// Validity end, ISO 8601.
    pub not_after: String,
}

/// Result of high-level chain verification.
#[derive(Debug, Serialize)]
pub struct ChainVerifyReport {
    /// Whether a valid path to a trust anchor was found.
    pub is_valid: bool,
    /// Summary status for the best path.
    pub status: VerifyStatus,
    /// The best path found (target first), valid or not.
    pub chain: Vec<ChainCertInfo>,
    /// Rendered errors and warnings on the best path (empty when valid and
    /// clean).
    pub errors: Vec<String>,
    /// Number of candidate paths the search explored.
    pub paths_explored: usize,
    /// Number of valid paths found (more than one only with
    /// `explore_all_paths`).
    pub valid_chain_count: usize,
    /// DER certificates of the best path.
    #[serde(skip)]
    pub best_chain_der: Vec<Vec<u8>>,
    /// DER certificates of every valid path found.
    #[serde(skip)]
    pub all_valid_chains_der: Vec<Vec<Vec<u8>>>,
}

impl ChainVerifyReport {
    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CertPathError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for ChainVerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [target subject], [OK/FAIL], [optional status + reasons]
        if let Some(target) = self.chain.first() {
            write!(f, "{}, ", target.subject)?;
        }
        if self.is_valid {
            write!(f, "OK")?;
        } else {
            write!(f, "FAIL, {}", self.status)?;
            if !self.errors.is_empty() {
                write!(f, ", {}", self.errors.join("; "))?;
            }
        }
        Ok(())
    }
}

/// Verify a chain given raw DER certificates.
///
/// `anchors` become trust anchors in a fresh in-memory store;
/// `intermediates` form the untrusted issuer pool. The path builder runs
/// with the default delegate and the supplied options.
pub fn verify_chain_from_der(
    leaf: &[u8],
    intermediates: &[Vec<u8>],
    anchors: &[Vec<u8>],
    options: &VerifyChainOptions,
) -> Result<ChainVerifyReport, CertPathError> {
    let target = Certificate::from_der(leaf)?;

    let mut trust_store = TrustStoreInMemory::new();
    for anchor_der in anchors {
        trust_store.add_trust_anchor(Certificate::from_der(anchor_der)?);
    }

    let mut pool = StaticCertIssuerSource::new();
    for intermediate_der in intermediates {
        pool.add_cert(Certificate::from_der(intermediate_der)?);
    }

    let time = options.at_time.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    });

    let delegate = DefaultPathBuilderDelegate::new(options.min_rsa_modulus_bits);
    let mut builder = CertPathBuilder::new(
        target,
        &trust_store,
        &delegate,
        time,
        options.key_purpose,
        options.policy.clone(),
    );
    builder.add_cert_issuer_source(&pool);
    builder.set_iteration_limit(options.iteration_limit);
    builder.set_depth_limit(options.depth_limit);
    builder.set_explore_all_paths(options.explore_all_paths);

    let result = builder.run();
    let status = result.best_path_verify_status();

    let mut report = ChainVerifyReport {
        is_valid: result.has_valid_path(),
        status,
        chain: Vec::new(),
        errors: Vec::new(),
        paths_explored: result.paths.len(),
        valid_chain_count: result.paths.iter().filter(|p| p.is_valid()).count(),
        best_chain_der: Vec::new(),
        all_valid_chains_der: Vec::new(),
    };

    if let Some(best) = result.best_path() {
        report.chain = best
            .certs
            .iter()
            .enumerate()
            .map(|(depth, cert)| ChainCertInfo {
                depth,
                subject: cert.subject_display().to_string(),
                issuer: cert.issuer_display().to_string(),
                serial: cert.serial_display().to_string(),
                not_before: format_timestamp(cert.not_before()),
                not_after: format_timestamp(cert.not_after()),
            })
            .collect();
        report.errors = best.errors.render(&best.subjects());
        report.best_chain_der = best.certs.iter().map(|c| c.der().to_vec()).collect();
    }
    for path in result.paths.iter().filter(|p| p.is_valid()) {
        report
            .all_valid_chains_der
            .push(path.certs.iter().map(|c| c.der().to_vec()).collect());
    }

    Ok(report)
}

/// Verify a PEM bundle against PEM trust anchors.
///
/// The first certificate in `pem_data` is the target; the rest form the
/// untrusted issuer pool.
pub fn verify_pem_chain(
    pem_data: &[u8],
    anchors_pem: &[u8],
    options: &VerifyChainOptions,
) -> Result<ChainVerifyReport, CertPathError> {
    let ders = crate::cert::parse_pem_chain(pem_data)?;
    let anchors = crate::cert::parse_pem_chain(anchors_pem)?;
    let (leaf, intermediates) = ders
        .split_first()
        .ok_or_else(|| CertPathError::VerifyError("empty certificate chain".into()))?;
    verify_chain_from_der(leaf, intermediates, &anchors, options)
}

/// Render a Unix timestamp as ISO 8601.
fn format_timestamp(ts: i64) -> String {
    match time::OffsetDateTime::from_unix_timestamp(ts) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => format!("{}", ts),
    }
}
