//! Group-based package visibility.
//!
//! Rules are layered: global, then per package, then default. An explicit
//! deny at any layer hides the package no matter what else allows it.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// An explicit deny applied.
    Denied,
    /// No clause applied.
    Unchanged,
    /// An explicit allow applied.
    Allowed,
}

/// One allow/deny rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Allow every caller.
    pub allow_all: bool,
    /// Deny every caller.
    pub deny_all: bool,
    /// Groups that are allowed.
    pub allow: Vec<String>,
    /// Groups that are denied.
    pub deny: Vec<String>,
}

impl Rule {
    /// A rule allowing everyone.
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            ..Self::default()
        }
    }

    /// A rule denying everyone.
    pub fn deny_all() -> Self {
        Self {
            deny_all: true,
            ..Self::default()
        }
    }

    /// Deny clauses are checked before allow clauses.
    pub fn evaluate(&self, groups: &[String]) -> Decision {
        if self.deny_all || groups.iter().any(|g| self.deny.contains(g)) {
            Decision::Denied
        } else if self.allow_all || groups.iter().any(|g| self.allow.contains(g)) {
            Decision::Allowed
        } else {
            Decision::Unchanged
        }
    }
}

/// A rule scoped to one package, optionally to one version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRule {
    /// Package the rule applies to.
    pub package_identifier: String,
    /// Version scope. Version-scoped rules take no part in the visibility pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
    /// The rule itself.
    #[serde(flatten)]
    pub rule: Rule,
}

impl PackageRule {
    fn applies_to(&self, package_id: &str) -> bool {
        self.package_version.is_none() && self.package_identifier == package_id
    }
}

/// The complete authorization configuration.
///
/// Loaded once and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    /// Checked first; a deny here hides everything.
    pub global: Rule,
    /// Checked in declaration order.
    pub packages: Vec<PackageRule>,
    /// Checked when no package rule applies.
    pub default: Rule,
}

impl Ruleset {
    /// A ruleset under which every package is visible.
    pub fn allow_all() -> Self {
        Self {
            default: Rule::allow_all(),
            ..Self::default()
        }
    }

    /// Evaluate the global rule for a caller.
    pub fn evaluate_global_rule(&self, groups: &[String]) -> Decision {
        self.global.evaluate(groups)
    }

    /// Decide whether `package_id` is visible, given the caller's global
    /// decision from [`Ruleset::evaluate_global_rule`].
    pub fn filter_authorized_package(
        &self,
        global: Decision,
        package_id: &str,
        groups: &[String],
    ) -> bool {
        if global == Decision::Denied {
            return false;
        }

        let mut decision = global;
        let mut matched = false;
        for rule in self.packages.iter().filter(|r| r.applies_to(package_id)) {
            matched = true;
            match rule.rule.evaluate(groups) {
                Decision::Denied => return false,
                Decision::Allowed => decision = Decision::Allowed,
                Decision::Unchanged => {}
            }
        }

        if decision == Decision::Allowed {
            return true;
        }
        !matched && self.default.evaluate(groups) == Decision::Allowed
    }

    /// Global and per-package evaluation in one call.
    pub fn is_package_visible(&self, package_id: &str, groups: &[String]) -> bool {
        self.filter_authorized_package(self.evaluate_global_rule(groups), package_id, groups)
    }
}
