//! Derivation explanations and rule match status.
//!
//! Both are read-only views built from the live networks: nothing is
//! recorded beyond what incremental matching already keeps.

use quadrille_foundation::Quad;

use crate::pattern::Pattern;
use crate::rule::RuleId;
use crate::token::Bindings;

/// One active reason a quad is in the inference graph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Derivation {
    /// The rule that concluded the quad.
    pub rule: RuleId,
    /// The match's bindings.
    pub bindings: Bindings,
    /// The quads matched by the rule's positive patterns, in pattern order.
    /// Empty for aggregate rules, whose matches summarize a group.
    pub premises: Vec<Quad>,
}

/// Partial matches held after one positive pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStep {
    /// The pattern.
    pub pattern: Pattern,
    /// Distinct bindings of the matches reaching this pattern.
    pub bindings: Vec<Bindings>,
}

/// How far a rule's condition currently matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStatus {
    /// The rule.
    pub rule: RuleId,
    /// Whether the rule has a live network.
    pub active: bool,
    /// One step per positive pattern, in order.
    pub steps: Vec<MatchStep>,
    /// Bindings of the complete matches, after negation and aggregation.
    pub matches: Vec<Bindings>,
}

impl MatchStatus {
    /// Index of the first positive pattern no partial match gets past.
    #[must_use]
    pub fn blocked_at(&self) -> Option<usize> {
        self.steps.iter().position(|step| step.bindings.is_empty())
    }

    /// Returns true if the rule currently has at least one complete match.
    #[must_use]
    pub fn is_matching(&self) -> bool {
        !self.matches.is_empty()
    }
}
