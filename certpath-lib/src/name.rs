//! X.501 name matching helpers.
//!
//! Issuer/subject matching uses a derived lookup key rather than the raw DER
//! encoding, so that names differing only in case or internal whitespace of
//! their string-typed attributes still compare equal (RFC 5280 Section 7.1
//! caseIgnoreMatch, approximated). Names containing attributes that are not
//! string-typed fall back to their exact raw encoding.

use crate::oid;
use x509_parser::prelude::*;

/// Build the normalized lookup key for a name.
///
/// The key folds case and whitespace of every string-typed attribute value
/// and sorts attributes within each RDN, so two DER encodings of the "same"
/// name index identically. If any attribute value is not representable as a
/// string, the exact raw encoding is used instead (exact-match only for such
/// names).
pub(crate) fn normalized_name_key(name: &X509Name) -> Vec<u8> {
    let mut key = Vec::new();
    for rdn in name.iter() {
        let mut attrs: Vec<(String, String)> = Vec::new();
        for attr in rdn.iter() {
            match attr.as_str() {
                Ok(value) => attrs.push((attr.attr_type().to_id_string(), fold_value(value))),
                Err(_) => return name.as_raw().to_vec(),
            }
        }
        attrs.sort();
        key.push(0x1f); // RDN separator, cannot occur in an OID string
        for (attr_oid, value) in attrs {
            key.extend_from_slice(attr_oid.as_bytes());
            key.push(b'=');
            key.extend_from_slice(value.as_bytes());
            key.push(0x1e);
        }
    }
    key
}

/// Per-RDN keys for directoryName subtree matching.
///
/// A directoryName constraint base matches a name when the base's RDN keys
/// are a prefix of the name's RDN keys. Attributes that are not string-typed
/// get a placeholder value, matching only other non-string attributes of the
/// same type.
pub(crate) fn rdn_keys(name: &X509Name) -> Vec<Vec<u8>> {
    let mut keys = Vec::new();
    for rdn in name.iter() {
        let mut attrs: Vec<(String, String)> = rdn
            .iter()
            .map(|attr| {
                let value = attr
                    .as_str()
                    .map(fold_value)
                    .unwrap_or_else(|_| "<binary>".to_string());
                (attr.attr_type().to_id_string(), value)
            })
            .collect();
        attrs.sort();
        let mut key = Vec::new();
        for (attr_oid, value) in attrs {
            key.extend_from_slice(attr_oid.as_bytes());
            key.push(b'=');
            key.extend_from_slice(value.as_bytes());
            key.push(0x1e);
        }
        keys.push(key);
    }
    keys
}

/// Fold an attribute value for comparison: trim, collapse internal
/// whitespace runs to a single space, lowercase.
fn fold_value(value: &str) -> String {
    let mut folded = String::with_capacity(value.len());
    let mut last_was_space = false;
    for c in value.trim().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                folded.push(' ');
            }
            last_was_space = true;
        } else {
            for lower in c.to_lowercase() {
                folded.push(lower);
            }
            last_was_space = false;
        }
    }
    folded
}

/// Render a name as a one-line string for diagnostics (e.g., "CN=Foo, O=Bar").
pub(crate) fn display_name(name: &X509Name) -> String {
    let mut parts = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>");
            parts.push(format!("{}={}", key, value));
        }
    }
    parts.join(", ")
}

/// Short display name for common DN attribute OIDs.
fn oid_short_name(oid_str: &str) -> String {
    match oid_str {
        oid::COMMON_NAME => "CN".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::EMAIL_ADDRESS => "emailAddress".into(),
        oid::DOMAIN_COMPONENT => "DC".into(),
        other => other.to_string(),
    }
}
