//! RFC 5280 Section 6.1 certificate-policy tree.
//!
//! Tracks which policy OIDs remain asserted as the chain is walked from the
//! root toward the target, including anyPolicy expansion and policy
//! mappings. The verifier owns the explicit-policy / policy-mapping /
//! inhibit-anyPolicy counters; this module owns only the tree.

use crate::oid;

struct PolicyNode {
    valid_policy: String,
    expected_policy_set: Vec<String>,
    parent: usize,
}

/// The valid-policy tree. Level 0 holds the single anyPolicy root; level `i`
/// corresponds to the `i`-th certificate processed (root-most first).
pub(crate) struct PolicyTree {
    levels: Vec<Vec<PolicyNode>>,
    null: bool,
}

impl PolicyTree {
    pub(crate) fn new() -> Self {
        PolicyTree {
            levels: vec![vec![PolicyNode {
                valid_policy: oid::ANY_POLICY.to_string(),
                expected_policy_set: vec![oid::ANY_POLICY.to_string()],
                parent: 0,
            }]],
            null: false,
        }
    }

    pub(crate) fn is_null(&self) -> bool {
        self.null
    }

    /// Process one certificate's certificatePolicies, appending a level
    /// (RFC 5280 Section 6.1.3 (d)-(e)).
    ///
    /// `any_policy_allowed` is the Section 6.1.3 (d)(2) condition:
    /// `inhibit_any_policy > 0`, or the certificate is a self-issued
    /// intermediate.
    pub(crate) fn process_policies(&mut self, policies: Option<&[String]>, any_policy_allowed: bool) {
        if self.null {
            return;
        }
        let Some(policies) = policies else {
            // (e): certificate has no certificatePolicies at all.
            self.levels.clear();
            self.null = true;
            return;
        };

        let parent_level = self.levels.len() - 1;
        let mut next: Vec<PolicyNode> = Vec::new();

        // (d)(1): match each asserted policy (other than anyPolicy) against
        // the expected policy sets of the previous level.
        for policy in policies {
            if policy == oid::ANY_POLICY {
                continue;
            }
            let mut matched = false;
            for (parent_idx, parent) in self.levels[parent_level].iter().enumerate() {
                if parent.expected_policy_set.iter().any(|p| p == policy) {
                    matched = true;
                    if !node_exists(&next, parent_idx, policy) {
                        next.push(PolicyNode {
                            valid_policy: policy.clone(),
                            expected_policy_set: vec![policy.clone()],
                            parent: parent_idx,
                        });
                    }
                }
            }
            if !matched {
                if let Some(parent_idx) = self.levels[parent_level]
                    .iter()
                    .position(|p| p.valid_policy == oid::ANY_POLICY)
                {
                    next.push(PolicyNode {
                        valid_policy: policy.clone(),
                        expected_policy_set: vec![policy.clone()],
                        parent: parent_idx,
                    });
                }
            }
        }

        // (d)(2): anyPolicy asserted and permitted here: fill in every
        // expected policy that has no child yet.
        if policies.iter().any(|p| p == oid::ANY_POLICY) && any_policy_allowed {
            for (parent_idx, parent) in self.levels[parent_level].iter().enumerate() {
                for expected in &parent.expected_policy_set {
                    if !node_exists(&next, parent_idx, expected) {
                        next.push(PolicyNode {
                            valid_policy: expected.clone(),
                            expected_policy_set: vec![expected.clone()],
                            parent: parent_idx,
                        });
                    }
                }
            }
        }

        if next.is_empty() {
            self.levels.clear();
            self.null = true;
        } else {
            self.levels.push(next);
        }
    }

    /// Process one certificate's policyMappings against the most recent
    /// level (RFC 5280 Section 6.1.4 (a)-(b)).
    ///
    /// Returns `false` when a mapping names anyPolicy on either side, which
    /// the caller must treat as a verification error.
    pub(crate) fn map_policies(&mut self, mappings: &[(String, String)], allow_mapping: bool) -> bool {
        for (issuer_domain, subject_domain) in mappings {
            if issuer_domain == oid::ANY_POLICY || subject_domain == oid::ANY_POLICY {
                return false;
            }
        }
        if self.null {
            return true;
        }

        let depth = self.levels.len() - 1;
        let mut issuer_domains: Vec<&String> = Vec::new();
        for (issuer_domain, _) in mappings {
            if !issuer_domains.contains(&issuer_domain) {
                issuer_domains.push(issuer_domain);
            }
        }

        if allow_mapping {
            for issuer_domain in issuer_domains {
                let subject_domains: Vec<String> = mappings
                    .iter()
                    .filter(|(i, _)| i == issuer_domain)
                    .map(|(_, s)| s.clone())
                    .collect();
                let existing = self.levels[depth]
                    .iter()
                    .position(|n| &n.valid_policy == issuer_domain);
                if let Some(index) = existing {
                    self.levels[depth][index].expected_policy_set = subject_domains;
                } else {
                    // (b)(1): no node for this policy, but an anyPolicy node
                    // exists: spawn a sibling under anyPolicy's parent.
                    let any_parent = self.levels[depth]
                        .iter()
                        .find(|n| n.valid_policy == oid::ANY_POLICY)
                        .map(|n| n.parent);
                    if let Some(parent) = any_parent {
                        self.levels[depth].push(PolicyNode {
                            valid_policy: issuer_domain.clone(),
                            expected_policy_set: subject_domains,
                            parent,
                        });
                    }
                }
            }
        } else {
            // (b)(2): mapping inhibited; delete the mapped nodes.
            for issuer_domain in issuer_domains {
                self.levels[depth].retain(|n| &n.valid_policy != issuer_domain);
            }
            if self.levels[depth].is_empty() {
                self.levels.clear();
                self.null = true;
            }
        }
        true
    }

    /// Intersect the tree with the caller's initial policy set
    /// (RFC 5280 Section 6.1.5 (g)).
    ///
    /// The result is expressed in the caller's policy domain: each valid
    /// leaf maps back to the policy asserted at depth 1, so a policy the
    /// chain mapped elsewhere still satisfies a caller who asked for the
    /// original OID. When the depth-1 ancestor is anyPolicy, the leaf's own
    /// policy is the most specific answer available.
    pub(crate) fn user_constrained_policy_set(&self, user_initial: &[String]) -> Vec<String> {
        if self.null {
            return Vec::new();
        }

        let mut top_level = Vec::new();
        let depth = self.levels.len() - 1;
        if depth == 0 {
            top_level.push(oid::ANY_POLICY.to_string());
        } else if let Some(last) = self.levels.last() {
            for (leaf_index, node) in last.iter().enumerate() {
                let mut level = depth;
                let mut index = leaf_index;
                while level > 1 {
                    index = self.levels[level][index].parent;
                    level -= 1;
                }
                let ancestor = &self.levels[1][index];
                let policy = if ancestor.valid_policy == oid::ANY_POLICY {
                    node.valid_policy.clone()
                } else {
                    ancestor.valid_policy.clone()
                };
                if !top_level.contains(&policy) {
                    top_level.push(policy);
                }
            }
        }

        if top_level.iter().any(|p| p == oid::ANY_POLICY) {
            return user_initial.to_vec();
        }
        if user_initial.iter().any(|p| p == oid::ANY_POLICY) {
            return top_level;
        }
        top_level
            .into_iter()
            .filter(|p| user_initial.contains(p))
            .collect()
    }
}

fn node_exists(level: &[PolicyNode], parent: usize, policy: &str) -> bool {
    level
        .iter()
        .any(|n| n.parent == parent && n.valid_policy == policy)
}
