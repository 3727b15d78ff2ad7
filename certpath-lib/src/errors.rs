//! Structured verification errors.
//!
//! Errors found while verifying a candidate path are attached to the index
//! of the certificate they concern; errors not attributable to one
//! certificate go in a chain-wide bucket. Only high-severity errors make a
//! path invalid; warnings are advisory.

use serde::Serialize;

/// What went wrong, independent of where in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Temporal
    ValidityFailedNotBefore,
    ValidityFailedNotAfter,

    // Trust
    DistrustedByTrustStore,
    CertIsNotTrustAnchor,
    NoIssuersFound,
    IterationLimitExceeded,
    DepthLimitExceeded,
    DeadlineExceeded,

    // Structural policy
    ChainIsEmpty,
    SubjectDoesNotMatchIssuer,
    MissingBasicConstraints,
    BasicConstraintsIndicatesNotCa,
    MaxPathLengthViolated,
    KeyCertSignBitNotSet,
    EkuNotPresent,
    EkuLacksPurpose,
    NameConstraintViolation,
    TooManyNameConstraintChecks,
    UnconsumedCriticalExtension,
    NoValidPolicy,
    PolicyMappingAnyPolicy,
    PreCertificate,
    LeafNotSelfSigned,

    // Cryptographic
    SignatureVerificationFailed,
    UnacceptableSignatureAlgorithm,
    UnacceptablePublicKey,

    // Revocation (populated only by the post-verification delegate hook)
    CertificateRevoked,
    NoRevocationMechanism,
    UnableToCheckRevocation,

    // Profile advisories (never more than warnings)
    MissingAuthorityKeyId,
    MissingSubjectKeyId,
    SerialNumberOutOfRange,

    // Generic
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidityFailedNotBefore => "certificate is not yet valid",
            ErrorCode::ValidityFailedNotAfter => "certificate has expired",
            ErrorCode::DistrustedByTrustStore => "certificate is distrusted",
            ErrorCode::CertIsNotTrustAnchor => "certificate is not a trust anchor",
            ErrorCode::NoIssuersFound => "no issuer certificates found",
            ErrorCode::IterationLimitExceeded => "iteration limit exceeded",
            ErrorCode::DepthLimitExceeded => "depth limit exceeded",
            ErrorCode::DeadlineExceeded => "deadline exceeded",
            ErrorCode::ChainIsEmpty => "certificate chain is empty",
            ErrorCode::SubjectDoesNotMatchIssuer => "issuer name does not match issuing certificate",
            ErrorCode::MissingBasicConstraints => "missing Basic Constraints extension",
            ErrorCode::BasicConstraintsIndicatesNotCa => "Basic Constraints indicates not a CA",
            ErrorCode::MaxPathLengthViolated => "path length constraint violated",
            ErrorCode::KeyCertSignBitNotSet => "Key Usage does not include keyCertSign",
            ErrorCode::EkuNotPresent => "Extended Key Usage extension is required but absent",
            ErrorCode::EkuLacksPurpose => "Extended Key Usage lacks the required purpose",
            ErrorCode::NameConstraintViolation => "name not permitted by Name Constraints",
            ErrorCode::TooManyNameConstraintChecks => {
                "name constraints check exceeds resource limits"
            }
            ErrorCode::UnconsumedCriticalExtension => "unrecognized critical extension",
            ErrorCode::NoValidPolicy => "no valid certificate policy",
            ErrorCode::PolicyMappingAnyPolicy => "policy mapping to or from anyPolicy",
            ErrorCode::PreCertificate => "certificate is a precertificate",
            ErrorCode::LeafNotSelfSigned => "trusted leaf is required to be self-signed",
            ErrorCode::SignatureVerificationFailed => "signature verification failed",
            ErrorCode::UnacceptableSignatureAlgorithm => "unacceptable signature algorithm",
            ErrorCode::UnacceptablePublicKey => "unacceptable public key",
            ErrorCode::CertificateRevoked => "certificate has been revoked",
            ErrorCode::NoRevocationMechanism => "no revocation mechanism available",
            ErrorCode::UnableToCheckRevocation => "unable to check revocation status",
            ErrorCode::MissingAuthorityKeyId => "missing Authority Key Identifier",
            ErrorCode::MissingSubjectKeyId => "missing Subject Key Identifier",
            ErrorCode::SerialNumberOutOfRange => "serial number is zero or exceeds 20 octets",
            ErrorCode::Internal => "internal error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an entry invalidates the path or is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    High,
}

/// One error or warning about one certificate (or the chain as a whole).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CertError {
    pub severity: Severity,
    pub code: ErrorCode,
}

/// Errors accumulated against a single certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertErrors {
    entries: Vec<CertError>,
}

impl CertErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, code: ErrorCode) {
        self.entries.push(CertError {
            severity: Severity::High,
            code,
        });
    }

    pub fn add_warning(&mut self, code: ErrorCode) {
        self.entries.push(CertError {
            severity: Severity::Warning,
            code,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    pub fn contains_high_severity(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::High)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertError> {
        self.entries.iter()
    }
}

/// Errors for a whole candidate path: one bucket per certificate index
/// (0 = target) plus a bucket for errors not tied to one certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertPathErrors {
    cert_errors: Vec<CertErrors>,
    other_errors: CertErrors,
}

impl CertPathErrors {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, cert_index: usize) -> &mut CertErrors {
        if self.cert_errors.len() <= cert_index {
            self.cert_errors.resize_with(cert_index + 1, CertErrors::new);
        }
        &mut self.cert_errors[cert_index]
    }

    pub fn add_error(&mut self, cert_index: usize, code: ErrorCode) {
        self.bucket_mut(cert_index).add_error(code);
    }

    pub fn add_warning(&mut self, cert_index: usize, code: ErrorCode) {
        self.bucket_mut(cert_index).add_warning(code);
    }

    pub fn add_other_error(&mut self, code: ErrorCode) {
        self.other_errors.add_error(code);
    }

    pub fn errors_for_cert(&self, cert_index: usize) -> Option<&CertErrors> {
        self.cert_errors.get(cert_index)
    }

    pub fn errors_for_cert_mut(&mut self, cert_index: usize) -> &mut CertErrors {
        self.bucket_mut(cert_index)
    }

    pub fn other_errors(&self) -> &CertErrors {
        &self.other_errors
    }

    pub fn contains_high_severity_errors(&self) -> bool {
        self.other_errors.contains_high_severity()
            || self.cert_errors.iter().any(|e| e.contains_high_severity())
    }

    /// Whether `code` appears anywhere, at any severity.
    pub fn contains_error(&self, code: ErrorCode) -> bool {
        self.other_errors.contains(code) || self.cert_errors.iter().any(|e| e.contains(code))
    }

    /// Total number of high-severity entries across all buckets.
    pub fn high_severity_count(&self) -> usize {
        self.cert_errors
            .iter()
            .chain(std::iter::once(&self.other_errors))
            .flat_map(|bucket| bucket.iter())
            .filter(|e| e.severity == Severity::High)
            .count()
    }

    /// Distinct high-severity codes across all buckets, in first-seen order.
    pub fn distinct_high_severity_codes(&self) -> Vec<ErrorCode> {
        let mut codes = Vec::new();
        let buckets = self
            .cert_errors
            .iter()
            .chain(std::iter::once(&self.other_errors));
        for bucket in buckets {
            for entry in bucket.iter() {
                if entry.severity == Severity::High && !codes.contains(&entry.code) {
                    codes.push(entry.code);
                }
            }
        }
        codes
    }

    /// Render every entry as a human-readable line, e.g.
    /// `certificate at depth 2 (CN=Root): certificate has expired`.
    pub fn render(&self, subjects: &[String]) -> Vec<String> {
        let mut lines = Vec::new();
        for (i, bucket) in self.cert_errors.iter().enumerate() {
            let subject = subjects.get(i).map(String::as_str).unwrap_or("?");
            for entry in bucket.iter() {
                let prefix = match entry.severity {
                    Severity::High => "",
                    Severity::Warning => "warning: ",
                };
                lines.push(format!(
                    "{}certificate at depth {} ({}): {}",
                    prefix, i, subject, entry.code
                ));
            }
        }
        for entry in self.other_errors.iter() {
            let prefix = match entry.severity {
                Severity::High => "",
                Severity::Warning => "warning: ",
            };
            lines.push(format!("{}chain: {}", prefix, entry.code));
        }
        lines
    }
}
