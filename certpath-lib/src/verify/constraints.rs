//! Name Constraints checking (RFC 5280 Section 4.2.1.10).
//!
//! Validates that the names a certificate asserts comply with a CA-imposed
//! nameConstraints extension. DNS names, email addresses, IP addresses, and
//! directoryNames are validated; URI and otherName subtrees are not
//! (a documented limitation).

use crate::cert::{Certificate, NameConstraintsInfo, NameSubtree};

/// Maximum work factor for Name Constraints checking (names × subtrees).
/// Protects against certificates with thousands of SANs or subtrees.
pub(crate) const MAX_NC_WORK_FACTOR: usize = 65_536;

/// Outcome of checking one certificate against one constraint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintCheck {
    Ok,
    Violation,
    TooMuchWork,
}

/// Check that `cert`'s asserted names comply with `nc`.
///
/// Checked names are the SAN dNSName/iPAddress/rfc822Name/directoryName
/// entries, the subject emailAddress attributes, and the subject DN itself
/// (against directoryName subtrees).
pub(crate) fn check_name_constraints(
    cert: &Certificate,
    nc: &NameConstraintsInfo,
) -> ConstraintCheck {
    let names = cert.subject_names();
    let subject_dn = cert.subject_rdn_keys();

    let total_names = names.dns.len()
        + names.emails.len()
        + names.ips.len()
        + names.dir_names.len()
        + usize::from(!subject_dn.is_empty());
    let total_subtrees = nc.permitted.len() + nc.excluded.len();
    if total_names.saturating_mul(total_subtrees) > MAX_NC_WORK_FACTOR {
        return ConstraintCheck::TooMuchWork;
    }

    // Excluded subtrees first: any match is a violation.
    for subtree in &nc.excluded {
        match subtree {
            NameSubtree::Dns(constraint) => {
                if names
                    .dns
                    .iter()
                    .any(|name| dns_name_matches_constraint(name, constraint))
                {
                    return ConstraintCheck::Violation;
                }
            }
            NameSubtree::Email(constraint) => {
                if names
                    .emails
                    .iter()
                    .any(|email| email_matches_constraint(email, constraint))
                {
                    return ConstraintCheck::Violation;
                }
            }
            NameSubtree::Ip(constraint) => {
                if names
                    .ips
                    .iter()
                    .any(|ip| ip_matches_constraint(ip, constraint))
                {
                    return ConstraintCheck::Violation;
                }
            }
            NameSubtree::DirectoryName(base) => {
                if dir_name_in_subtree(subject_dn, base)
                    || names
                        .dir_names
                        .iter()
                        .any(|dn| dir_name_in_subtree(dn, base))
                {
                    return ConstraintCheck::Violation;
                }
            }
            NameSubtree::Unsupported => {}
        }
    }

    // Permitted subtrees: for each name type with at least one constraint,
    // every asserted name of that type must fall within some subtree.
    let dns_constraints: Vec<&String> = nc
        .permitted
        .iter()
        .filter_map(|s| match s {
            NameSubtree::Dns(c) => Some(c),
            _ => None,
        })
        .collect();
    if !dns_constraints.is_empty() {
        for name in &names.dns {
            if !dns_constraints
                .iter()
                .any(|c| dns_name_matches_constraint(name, c))
            {
                return ConstraintCheck::Violation;
            }
        }
    }

    let email_constraints: Vec<&String> = nc
        .permitted
        .iter()
        .filter_map(|s| match s {
            NameSubtree::Email(c) => Some(c),
            _ => None,
        })
        .collect();
    if !email_constraints.is_empty() {
        for email in &names.emails {
            if !email_constraints
                .iter()
                .any(|c| email_matches_constraint(email, c))
            {
                return ConstraintCheck::Violation;
            }
        }
    }

    let ip_constraints: Vec<&Vec<u8>> = nc
        .permitted
        .iter()
        .filter_map(|s| match s {
            NameSubtree::Ip(c) => Some(c),
            _ => None,
        })
        .collect();
    if !ip_constraints.is_empty() {
        for ip in &names.ips {
            if !ip_constraints.iter().any(|c| ip_matches_constraint(ip, c)) {
                return ConstraintCheck::Violation;
            }
        }
    }

    let dir_constraints: Vec<&Vec<Vec<u8>>> = nc
        .permitted
        .iter()
        .filter_map(|s| match s {
            NameSubtree::DirectoryName(base) => Some(base),
            _ => None,
        })
        .collect();
    if !dir_constraints.is_empty() {
        if !subject_dn.is_empty()
            && !dir_constraints
                .iter()
                .any(|base| dir_name_in_subtree(subject_dn, base))
        {
            return ConstraintCheck::Violation;
        }
        for dn in &names.dir_names {
            if !dir_constraints
                .iter()
                .any(|base| dir_name_in_subtree(dn, base))
            {
                return ConstraintCheck::Violation;
            }
        }
    }

    ConstraintCheck::Ok
}

/// Check if a DNS name matches a Name Constraint.
///
/// RFC 5280: A constraint of ".example.com" matches "host.example.com" but
/// not "example.com". A constraint of "example.com" matches both
/// "example.com" and "host.example.com".
pub(crate) fn dns_name_matches_constraint(name: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        // Empty constraint matches everything
        return true;
    }
    if constraint.starts_with('.') {
        name.ends_with(constraint)
    } else {
        name == constraint
            || (name.len() > constraint.len()
                && name.ends_with(constraint)
                && name.as_bytes().get(name.len() - constraint.len() - 1) == Some(&b'.'))
    }
}

/// Check if an email matches a Name Constraint.
///
/// RFC 5280: A constraint of "example.com" matches any email @example.com.
/// A constraint of ".example.com" matches email at any subdomain.
/// A specific email address is an exact match.
pub(crate) fn email_matches_constraint(email: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.contains('@') {
        email == constraint
    } else if let Some(pos) = email.find('@') {
        let domain = &email[pos + 1..];
        if constraint.starts_with('.') {
            domain.ends_with(constraint)
        } else {
            domain == constraint
        }
    } else {
        false
    }
}

/// Check if an IP address (as bytes from SAN) matches a constraint
/// (IP + netmask).
///
/// IPv4 constraints are 8 bytes (4 address + 4 mask).
/// IPv6 constraints are 32 bytes (16 address + 16 mask).
pub(crate) fn ip_matches_constraint(ip_bytes: &[u8], constraint: &[u8]) -> bool {
    let addr_len = ip_bytes.len();
    // Constraint must be exactly 2x the address length (address + netmask)
    if constraint.len() != addr_len * 2 || (addr_len != 4 && addr_len != 16) {
        return false;
    }
    let (addr, mask) = constraint.split_at(addr_len);
    ip_bytes
        .iter()
        .zip(addr.iter())
        .zip(mask.iter())
        .all(|((ip, a), m)| (ip & m) == (a & m))
}

/// A directoryName is within a subtree when the base's RDN sequence is a
/// prefix of the name's RDN sequence.
fn dir_name_in_subtree(name: &[Vec<u8>], base: &[Vec<u8>]) -> bool {
    if name.is_empty() {
        return false;
    }
    base.len() <= name.len() && name[..base.len()] == base[..]
}
