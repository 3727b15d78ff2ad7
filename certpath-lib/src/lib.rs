//! certpath-lib: X.509 certificate path building and chain verification.
//!
//! Provides an RFC 5280-style chain verifier ([`verify_certificate_chain`])
//! and a path-building search engine ([`CertPathBuilder`]) that discovers
//! candidate chains from a target certificate to a trust anchor through
//! pluggable trust stores and issuer sources, plus a high-level API
//! ([`verify_chain_from_der`]) taking raw DER certificates.
//!
//! Revocation checking is deliberately out of scope: the
//! [`PathBuilderDelegate::check_path_after_verification`] hook is the seam
//! where a caller adds CRL/OCSP results.

mod builder;
mod cert;
mod errors;
mod name;
pub mod oid;
mod report;
mod source;
mod trust;
mod trust_store;
mod util;
mod verify;

pub use builder::{
    CertPathBuilder, DefaultPathBuilderDelegate, PathBuilderDelegate, PathBuilderResult,
    ResultPath, VerifyStatus,
};
pub use cert::{
    parse_pem_chain, BasicConstraintsInfo, Certificate, CertificateRef, KeyUsageInfo,
    NameConstraintsInfo, NameSubtree, PolicyConstraintsInfo, SubjectNames,
};
pub use errors::{CertError, CertErrors, CertPathErrors, ErrorCode, Severity};
pub use report::{
    verify_chain_from_der, verify_pem_chain, ChainCertInfo, ChainVerifyReport, VerifyChainOptions,
};
pub use source::{CertIssuerSource, IssuerSourceRequest, StaticCertIssuerSource};
pub use trust::{CertificateTrust, TrustType};
pub use trust_store::{
    find_system_ca_bundle, TrustStore, TrustStoreCollection, TrustStoreInMemory,
};
pub use util::{base64_wrap, der_to_pem, hex_colon_upper};
pub use verify::{
    verify_certificate_chain, verify_certificate_is_self_signed, InMemoryVerifyCache, KeyPurpose,
    VerifyCache, VerifyChainDelegate, VerifyPolicyInputs,
};

/// Errors returned by certpath-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertPathError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Verification error: {0}")]
    VerifyError(String),
}
