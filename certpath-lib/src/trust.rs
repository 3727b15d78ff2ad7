//! Trustedness of a certificate, as recorded by a trust store.

/// How a certificate may be used during path building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustType {
    /// Certificate is blocked; any path ending here is rejected.
    Distrusted,
    /// The store has no opinion.
    Unspecified,
    /// Trusted as a root of verification.
    Anchor,
    /// Trusted both as a root and directly as an end-entity.
    AnchorOrLeaf,
    /// Trusted directly as an end-entity only.
    Leaf,
}

/// A trust record: the trust type plus anchor/leaf enforcement flags.
///
/// The flags refine what is checked on a trusted certificate; the type alone
/// determines the `is_*` predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateTrust {
    pub trust_type: TrustType,
    /// Check the anchor's own validity period.
    pub enforce_anchor_expiry: bool,
    /// Apply basicConstraints, keyUsage, name constraints and policy
    /// extensions found on the anchor.
    pub enforce_anchor_constraints: bool,
    /// With `enforce_anchor_constraints`, additionally require that the
    /// anchor carries a basicConstraints extension at all.
    pub require_anchor_basic_constraints: bool,
    /// For leaf trust, require the certificate to be self-signed.
    pub require_leaf_selfsigned: bool,
}

impl CertificateTrust {
    fn with_type(trust_type: TrustType) -> Self {
        CertificateTrust {
            trust_type,
            enforce_anchor_expiry: false,
            enforce_anchor_constraints: false,
            require_anchor_basic_constraints: false,
            require_leaf_selfsigned: false,
        }
    }

    pub fn distrusted() -> Self {
        Self::with_type(TrustType::Distrusted)
    }

    pub fn unspecified() -> Self {
        Self::with_type(TrustType::Unspecified)
    }

    pub fn anchor() -> Self {
        Self::with_type(TrustType::Anchor)
    }

    pub fn anchor_or_leaf() -> Self {
        Self::with_type(TrustType::AnchorOrLeaf)
    }

    pub fn leaf() -> Self {
        Self::with_type(TrustType::Leaf)
    }

    pub fn with_enforce_anchor_expiry(mut self) -> Self {
        self.enforce_anchor_expiry = true;
        self
    }

    pub fn with_enforce_anchor_constraints(mut self) -> Self {
        self.enforce_anchor_constraints = true;
        self
    }

    pub fn with_require_anchor_basic_constraints(mut self) -> Self {
        self.require_anchor_basic_constraints = true;
        self
    }

    pub fn with_require_leaf_selfsigned(mut self) -> Self {
        self.require_leaf_selfsigned = true;
        self
    }

    /// Usable as the root of a verified path.
    pub fn is_trust_anchor(&self) -> bool {
        matches!(self.trust_type, TrustType::Anchor | TrustType::AnchorOrLeaf)
    }

    /// Usable directly as a trusted end-entity.
    pub fn is_trust_leaf(&self) -> bool {
        matches!(self.trust_type, TrustType::Leaf | TrustType::AnchorOrLeaf)
    }

    pub fn is_distrusted(&self) -> bool {
        self.trust_type == TrustType::Distrusted
    }

    pub fn has_unspecified_trust(&self) -> bool {
        self.trust_type == TrustType::Unspecified
    }

    /// Serialize to the debug-string form, e.g.
    /// `"TRUSTED_ANCHOR+enforce_anchor_expiry"`.
    pub fn to_debug_string(&self) -> String {
        let mut out = match self.trust_type {
            TrustType::Distrusted => "DISTRUSTED",
            TrustType::Unspecified => "UNSPECIFIED",
            TrustType::Anchor => "TRUSTED_ANCHOR",
            TrustType::AnchorOrLeaf => "TRUSTED_ANCHOR_OR_LEAF",
            TrustType::Leaf => "TRUSTED_LEAF",
        }
        .to_string();
        if self.enforce_anchor_expiry {
            out.push_str("+enforce_anchor_expiry");
        }
        if self.enforce_anchor_constraints {
            out.push_str("+enforce_anchor_constraints");
        }
        if self.require_anchor_basic_constraints {
            out.push_str("+require_anchor_basic_constraints");
        }
        if self.require_leaf_selfsigned {
            out.push_str("+require_leaf_selfsigned");
        }
        out
    }

    /// Parse the form produced by [`CertificateTrust::to_debug_string`].
    pub fn from_debug_string(input: &str) -> Option<Self> {
        let mut parts = input.split('+');
        let mut trust = match parts.next()? {
            "DISTRUSTED" => Self::distrusted(),
            "UNSPECIFIED" => Self::unspecified(),
            "TRUSTED_ANCHOR" => Self::anchor(),
            "TRUSTED_ANCHOR_OR_LEAF" => Self::anchor_or_leaf(),
            "TRUSTED_LEAF" => Self::leaf(),
            _ => return None,
        };
        for flag in parts {
            match flag {
                "enforce_anchor_expiry" => trust.enforce_anchor_expiry = true,
                "enforce_anchor_constraints" => trust.enforce_anchor_constraints = true,
                "require_anchor_basic_constraints" => {
                    trust.require_anchor_basic_constraints = true
                }
                "require_leaf_selfsigned" => trust.require_leaf_selfsigned = true,
                _ => return None,
            }
        }
        Some(trust)
    }
}

impl std::fmt::Display for CertificateTrust {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}
