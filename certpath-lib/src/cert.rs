//! Owned, immutable certificate model.
//!
//! [`Certificate`] wraps the DER encoding of an X.509 certificate together
//! with the decoded fields the path builder and chain verifier consume. All
//! decoding happens once, at construction; afterwards field access is
//! infallible and the value is safely shared across concurrent path-building
//! attempts via [`CertificateRef`].
//!
//! DER decoding itself is delegated to `x509-parser`; this module only
//! extracts and owns what chain building needs.

use crate::name;
use crate::oid;
use crate::util;
use crate::CertPathError;
use std::sync::Arc;
use x509_parser::prelude::*;

/// Shared handle to an immutable [`Certificate`].
pub type CertificateRef = Arc<Certificate>;

/// Decoded basicConstraints extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraintsInfo {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// Decoded keyUsage extension (only the bits chain verification consumes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsageInfo {
    pub key_cert_sign: bool,
}

/// Decoded policyConstraints extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConstraintsInfo {
    pub require_explicit_policy: Option<u32>,
    pub inhibit_policy_mapping: Option<u32>,
}

/// One permitted/excluded subtree from a nameConstraints extension.
///
/// URI and otherName subtrees are carried as [`NameSubtree::Unsupported`]
/// and are not validated against; this matches the verifier's documented
/// name-constraint coverage (DNS, IP, directoryName, email).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSubtree {
    Dns(String),
    Email(String),
    /// Address + netmask bytes, as encoded in the constraint.
    Ip(Vec<u8>),
    /// Normalized per-RDN keys of the base name.
    DirectoryName(Vec<Vec<u8>>),
    Unsupported,
}

/// Decoded nameConstraints extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameConstraintsInfo {
    pub permitted: Vec<NameSubtree>,
    pub excluded: Vec<NameSubtree>,
}

/// Names a certificate asserts, for name-constraint checking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectNames {
    /// SAN dNSName entries, lowercased.
    pub dns: Vec<String>,
    /// SAN iPAddress entries (4 or 16 bytes).
    pub ips: Vec<Vec<u8>>,
    /// SAN rfc822Name entries plus subject emailAddress attributes, lowercased.
    pub emails: Vec<String>,
    /// SAN directoryName entries, as normalized RDN keys.
    pub dir_names: Vec<Vec<Vec<u8>>>,
}

/// An immutable decoded X.509 certificate.
///
/// Equality and hashing are by exact DER content.
pub struct Certificate {
    der: Vec<u8>,
    serial_display: String,
    version: u32,
    signature_algorithm_oid: String,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    normalized_subject: Vec<u8>,
    normalized_issuer: Vec<u8>,
    subject_rdn_keys: Vec<Vec<u8>>,
    subject_display: String,
    issuer_display: String,
    not_before: i64,
    not_after: i64,
    spki_raw: Vec<u8>,
    public_key_algorithm_oid: String,
    rsa_modulus_bits: Option<u32>,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    san_raw: Option<Vec<u8>>,
    subject_names: SubjectNames,
    basic_constraints: Option<BasicConstraintsInfo>,
    key_usage: Option<KeyUsageInfo>,
    extended_key_usage: Option<Vec<String>>,
    policies: Option<Vec<String>>,
    policy_constraints: Option<PolicyConstraintsInfo>,
    policy_mappings: Option<Vec<(String, String)>>,
    inhibit_any_policy: Option<u32>,
    name_constraints: Option<NameConstraintsInfo>,
    has_ct_poison: bool,
    critical_extension_oids: Vec<String>,
}

impl Certificate {
    /// Decode a certificate from DER bytes.
    ///
    /// Trailing data after the certificate is rejected.
    pub fn from_der(input: &[u8]) -> Result<CertificateRef, CertPathError> {
        let (remaining, x509) = X509Certificate::from_der(input)
            .map_err(|e| CertPathError::DerError(format!("{}", e)))?;
        if !remaining.is_empty() {
            return Err(CertPathError::DerError(format!(
                "{} bytes of trailing data after certificate",
                remaining.len()
            )));
        }

        let subject = x509.subject();
        let issuer = x509.issuer();

        let mut cert = Certificate {
            der: input.to_vec(),
            serial_display: format_serial(x509.raw_serial()),
            version: x509.version().0,
            signature_algorithm_oid: x509.signature_algorithm.algorithm.to_id_string(),
            subject_raw: subject.as_raw().to_vec(),
            issuer_raw: issuer.as_raw().to_vec(),
            normalized_subject: name::normalized_name_key(subject),
            normalized_issuer: name::normalized_name_key(issuer),
            subject_rdn_keys: name::rdn_keys(subject),
            subject_display: name::display_name(subject),
            issuer_display: name::display_name(issuer),
            not_before: x509.validity().not_before.timestamp(),
            not_after: x509.validity().not_after.timestamp(),
            spki_raw: x509.public_key().raw.to_vec(),
            public_key_algorithm_oid: x509.public_key().algorithm.algorithm.to_id_string(),
            rsa_modulus_bits: extract_rsa_modulus_bits(x509.public_key()),
            subject_key_id: None,
            authority_key_id: None,
            san_raw: None,
            subject_names: SubjectNames::default(),
            basic_constraints: None,
            key_usage: None,
            extended_key_usage: None,
            policies: None,
            policy_constraints: None,
            policy_mappings: None,
            inhibit_any_policy: None,
            name_constraints: None,
            has_ct_poison: false,
            critical_extension_oids: Vec::new(),
        };

        extract_extensions(&x509, &mut cert)?;
        extract_subject_emails(subject, &mut cert.subject_names);

        Ok(Arc::new(cert))
    }

    /// Decode a single certificate from PEM bytes.
    pub fn from_pem(input: &[u8]) -> Result<CertificateRef, CertPathError> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(input)
            .map_err(|e| CertPathError::PemError(format!("{}", e)))?;
        if pem.label != "CERTIFICATE"
            && pem.label != "TRUSTED CERTIFICATE"
            && pem.label != "X509 CERTIFICATE"
        {
            return Err(CertPathError::PemError(format!(
                "expected CERTIFICATE, got {}",
                pem.label
            )));
        }
        Self::from_der(&pem.contents)
    }

    /// Decode every certificate in a PEM bundle.
    pub fn from_pem_chain(input: &[u8]) -> Result<Vec<CertificateRef>, CertPathError> {
        parse_pem_chain(input)?
            .iter()
            .map(|der| Self::from_der(der))
            .collect()
    }

    /// The exact DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Serial number as colon-separated hex.
    pub fn serial_display(&self) -> &str {
        &self.serial_display
    }

    /// Raw X.509 version field (0 = v1, 1 = v2, 2 = v3).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// OID of the certificate's signature algorithm, in dotted-decimal form.
    pub fn signature_algorithm_oid(&self) -> &str {
        &self.signature_algorithm_oid
    }

    /// Raw DER encoding of the subject name.
    pub fn subject_raw(&self) -> &[u8] {
        &self.subject_raw
    }

    /// Raw DER encoding of the issuer name.
    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    /// Normalized lookup key for the subject name.
    pub fn normalized_subject(&self) -> &[u8] {
        &self.normalized_subject
    }

    /// Normalized lookup key for the issuer name.
    pub fn normalized_issuer(&self) -> &[u8] {
        &self.normalized_issuer
    }

    /// One-line subject for diagnostics.
    pub fn subject_display(&self) -> &str {
        &self.subject_display
    }

    /// One-line issuer for diagnostics.
    pub fn issuer_display(&self) -> &str {
        &self.issuer_display
    }

    /// notBefore as a Unix timestamp.
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// notAfter as a Unix timestamp.
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Raw DER encoding of the subjectPublicKeyInfo.
    pub fn spki_raw(&self) -> &[u8] {
        &self.spki_raw
    }

    /// OID of the subject public key algorithm, in dotted-decimal form.
    pub fn public_key_algorithm_oid(&self) -> &str {
        &self.public_key_algorithm_oid
    }

    /// Modulus size in bits, when the subject key is RSA.
    pub fn rsa_modulus_bits(&self) -> Option<u32> {
        self.rsa_modulus_bits
    }

    /// subjectKeyIdentifier, when present.
    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    /// authorityKeyIdentifier keyIdentifier field, when present.
    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraintsInfo> {
        self.basic_constraints.as_ref()
    }

    pub fn key_usage(&self) -> Option<&KeyUsageInfo> {
        self.key_usage.as_ref()
    }

    /// Extended key usage OIDs, when the extension is present.
    pub fn extended_key_usage(&self) -> Option<&[String]> {
        self.extended_key_usage.as_deref()
    }

    /// Certificate policy OIDs, when the extension is present.
    pub fn policies(&self) -> Option<&[String]> {
        self.policies.as_deref()
    }

    pub fn policy_constraints(&self) -> Option<&PolicyConstraintsInfo> {
        self.policy_constraints.as_ref()
    }

    /// (issuerDomainPolicy, subjectDomainPolicy) pairs, when present.
    pub fn policy_mappings(&self) -> Option<&[(String, String)]> {
        self.policy_mappings.as_deref()
    }

    /// inhibitAnyPolicy skipCerts value, when present.
    pub fn inhibit_any_policy(&self) -> Option<u32> {
        self.inhibit_any_policy
    }

    pub fn name_constraints(&self) -> Option<&NameConstraintsInfo> {
        self.name_constraints.as_ref()
    }

    /// Names this certificate asserts, for name-constraint checking.
    pub fn subject_names(&self) -> &SubjectNames {
        &self.subject_names
    }

    /// Normalized per-RDN keys of the subject, for directoryName subtree
    /// matching. Empty for an empty subject.
    pub(crate) fn subject_rdn_keys(&self) -> &[Vec<u8>] {
        &self.subject_rdn_keys
    }

    /// Whether the certificate carries the CT precertificate poison extension.
    pub fn has_ct_poison(&self) -> bool {
        self.has_ct_poison
    }

    /// OIDs of all critical extensions, in certificate order.
    pub fn critical_extension_oids(&self) -> &[String] {
        &self.critical_extension_oids
    }

    /// Whether subject and issuer name are the same entity (self-issued).
    pub fn is_self_issued(&self) -> bool {
        self.normalized_subject == self.normalized_issuer
    }

    /// Identity key used for candidate de-duplication and loop prevention:
    /// normalized subject + raw SAN extension + SPKI. Two certificates with
    /// the same key name the same entity with the same key (e.g., rollover
    /// re-issues of one intermediate).
    pub(crate) fn identity_key(&self) -> Vec<u8> {
        let san = self.san_raw.as_deref().unwrap_or(&[]);
        let mut key = Vec::with_capacity(
            self.normalized_subject.len() + san.len() + self.spki_raw.len() + 12,
        );
        for part in [self.normalized_subject.as_slice(), san, self.spki_raw.as_slice()] {
            key.extend_from_slice(&(part.len() as u32).to_be_bytes());
            key.extend_from_slice(part);
        }
        key
    }

    /// Re-parse the DER for operations needing the full `x509-parser` view
    /// (signature verification). Cannot fail for a value built by
    /// [`Certificate::from_der`], but the error is propagated rather than
    /// unwrapped.
    pub(crate) fn x509(&self) -> Result<X509Certificate<'_>, CertPathError> {
        X509Certificate::from_der(&self.der)
            .map(|(_, x509)| x509)
            .map_err(|e| CertPathError::DerError(format!("{}", e)))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl std::hash::Hash for Certificate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_display)
            .field("issuer", &self.issuer_display)
            .field("serial", &self.serial_display)
            .finish()
    }
}

/// Parse a PEM-encoded buffer containing one or more certificates into
/// individual DER-encoded certificates.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Vec<u8>>, CertPathError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
                    certs.push(pem.contents);
                }
            }
            Err(e) => {
                // If we already have some certs, stop at first error (trailing garbage)
                if !certs.is_empty() {
                    break;
                }
                return Err(CertPathError::PemError(format!(
                    "failed to parse PEM: {}",
                    e
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertPathError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

/// Format a serial number as colon-separated uppercase hex, stripping
/// leading zero bytes but keeping at least one byte.
fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    util::hex_colon_upper(stripped)
}

/// Extract the RSA modulus size from raw public key DER, if the key is RSA.
fn extract_rsa_modulus_bits(spki: &SubjectPublicKeyInfo) -> Option<u32> {
    if spki.algorithm.algorithm.to_id_string() != oid::RSA_ENCRYPTION {
        return None;
    }
    let (_, parsed) = x509_parser::der_parser::parse_der(&spki.subject_public_key.data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let bigint = seq.first().and_then(|m| m.as_bigint().ok())?;
    let bytes = bigint.to_bytes_be().1;
    // Skip leading zero byte used for DER positive integer encoding
    let significant = match bytes.split_first() {
        Some((&0, rest)) if !rest.is_empty() => rest,
        _ => &bytes,
    };
    Some((significant.len() as u32) * 8)
}

fn extract_extensions(
    x509: &X509Certificate,
    cert: &mut Certificate,
) -> Result<(), CertPathError> {
    for ext in x509.extensions() {
        let ext_oid = ext.oid.to_id_string();
        if ext.critical {
            cert.critical_extension_oids.push(ext_oid.clone());
        }
        match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => {
                cert.basic_constraints = Some(BasicConstraintsInfo {
                    ca: bc.ca,
                    path_len: bc.path_len_constraint,
                });
            }
            ParsedExtension::KeyUsage(ku) => {
                cert.key_usage = Some(KeyUsageInfo {
                    key_cert_sign: ku.key_cert_sign(),
                });
            }
            ParsedExtension::ExtendedKeyUsage(eku) => {
                let mut purposes = Vec::new();
                if eku.any {
                    purposes.push(oid::EKU_ANY.to_string());
                }
                if eku.server_auth {
                    purposes.push(oid::EKU_SERVER_AUTH.to_string());
                }
                if eku.client_auth {
                    purposes.push(oid::EKU_CLIENT_AUTH.to_string());
                }
                if eku.code_signing {
                    purposes.push(oid::EKU_CODE_SIGNING.to_string());
                }
                if eku.email_protection {
                    purposes.push(oid::EKU_EMAIL_PROTECTION.to_string());
                }
                if eku.time_stamping {
                    purposes.push(oid::EKU_TIME_STAMPING.to_string());
                }
                if eku.ocsp_signing {
                    purposes.push(oid::EKU_OCSP_SIGNING.to_string());
                }
                for other in &eku.other {
                    purposes.push(other.to_id_string());
                }
                cert.extended_key_usage = Some(purposes);
            }
            ParsedExtension::SubjectAlternativeName(san) => {
                cert.san_raw = Some(ext.value.to_vec());
                for gn in &san.general_names {
                    match gn {
                        GeneralName::DNSName(dns) => {
                            cert.subject_names.dns.push(dns.to_ascii_lowercase());
                        }
                        GeneralName::IPAddress(ip) => {
                            cert.subject_names.ips.push(ip.to_vec());
                        }
                        GeneralName::RFC822Name(email) => {
                            cert.subject_names.emails.push(email.to_ascii_lowercase());
                        }
                        GeneralName::DirectoryName(dn) => {
                            cert.subject_names.dir_names.push(name::rdn_keys(dn));
                        }
                        _ => {}
                    }
                }
            }
            ParsedExtension::SubjectKeyIdentifier(ski) => {
                cert.subject_key_id = Some(ski.0.to_vec());
            }
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                cert.authority_key_id = aki.key_identifier.as_ref().map(|ki| ki.0.to_vec());
            }
            ParsedExtension::NameConstraints(nc) => {
                let mut info = NameConstraintsInfo::default();
                if let Some(permitted) = &nc.permitted_subtrees {
                    info.permitted = permitted.iter().map(|s| convert_subtree(&s.base)).collect();
                }
                if let Some(excluded) = &nc.excluded_subtrees {
                    info.excluded = excluded.iter().map(|s| convert_subtree(&s.base)).collect();
                }
                cert.name_constraints = Some(info);
            }
            ParsedExtension::CertificatePolicies(policies) => {
                cert.policies = Some(
                    policies
                        .iter()
                        .map(|p| p.policy_id.to_id_string())
                        .collect(),
                );
            }
            ParsedExtension::PolicyConstraints(pc) => {
                cert.policy_constraints = Some(PolicyConstraintsInfo {
                    require_explicit_policy: pc.require_explicit_policy,
                    inhibit_policy_mapping: pc.inhibit_policy_mapping,
                });
            }
            ParsedExtension::PolicyMappings(pm) => {
                cert.policy_mappings = Some(
                    pm.mappings
                        .iter()
                        .map(|m| {
                            (
                                m.issuer_domain_policy.to_id_string(),
                                m.subject_domain_policy.to_id_string(),
                            )
                        })
                        .collect(),
                );
            }
            ParsedExtension::InhibitAnyPolicy(iap) => {
                cert.inhibit_any_policy = Some(iap.skip_certs);
            }
            _ => {
                if ext_oid == oid::EXT_CT_POISON {
                    cert.has_ct_poison = true;
                }
            }
        }
    }
    Ok(())
}

fn convert_subtree(base: &GeneralName) -> NameSubtree {
    match base {
        GeneralName::DNSName(dns) => NameSubtree::Dns(dns.to_ascii_lowercase()),
        GeneralName::RFC822Name(email) => NameSubtree::Email(email.to_ascii_lowercase()),
        GeneralName::IPAddress(bytes) => NameSubtree::Ip(bytes.to_vec()),
        GeneralName::DirectoryName(dn) => NameSubtree::DirectoryName(name::rdn_keys(dn)),
        _ => NameSubtree::Unsupported,
    }
}

/// Collect emailAddress attributes from the subject DN, which count as
/// asserted email names for constraint checking alongside SAN rfc822Names.
fn extract_subject_emails(subject: &X509Name, names: &mut SubjectNames) {
    for rdn in subject.iter() {
        for attr in rdn.iter() {
            if attr.attr_type().to_id_string() == oid::EMAIL_ADDRESS {
                if let Ok(value) = attr.as_str() {
                    names.emails.push(value.to_ascii_lowercase());
                }
            }
        }
    }
}
