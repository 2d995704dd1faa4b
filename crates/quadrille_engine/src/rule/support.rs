//! Support counting for rule conclusions.

use std::collections::HashMap;

use quadrille_foundation::{Node, Quad};

use super::compiler::RuleCompiler;
use super::engine::ConclusionFailure;
use super::{Rule, RuleId};
use crate::expr::Evaluator;
use crate::network::{DeltaKind, TokenDelta};
use crate::token::Token;

/// Per-rule and total support of every concluded quad.
///
/// Changes are also queued as effects: quads whose total rose from zero,
/// and quads whose total fell. The engine settles the queue against the
/// store once propagation of a change is complete.
#[derive(Clone, Debug, Default)]
pub(crate) struct SupportTable {
    by_rule: HashMap<(RuleId, Quad), usize>,
    totals: HashMap<Quad, usize>,
    raised: Vec<Quad>,
    lowered: Vec<Quad>,
}

impl SupportTable {
    pub(crate) fn raise(&mut self, rule: &RuleId, quad: &Quad) {
        *self.by_rule.entry((rule.clone(), quad.clone())).or_insert(0) += 1;
        let total = self.totals.entry(quad.clone()).or_insert(0);
        *total += 1;
        if *total == 1 {
            self.raised.push(quad.clone());
        }
    }

    /// # Panics
    ///
    /// Panics if the rule does not support the quad.
    pub(crate) fn lower(&mut self, rule: &RuleId, quad: &Quad) {
        let key = (rule.clone(), quad.clone());
        let count = self.by_rule.get_mut(&key).expect("rule support underflow");
        *count -= 1;
        if *count == 0 {
            self.by_rule.remove(&key);
        }
        let total = self.totals.get_mut(quad).expect("total support underflow");
        *total -= 1;
        if *total == 0 {
            self.totals.remove(quad);
        }
        self.lowered.push(quad.clone());
    }

    pub(crate) fn total(&self, quad: &Quad) -> usize {
        self.totals.get(quad).copied().unwrap_or(0)
    }

    pub(crate) fn by_rule(&self, rule: &RuleId, quad: &Quad) -> usize {
        self.by_rule
            .get(&(rule.clone(), quad.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Takes the queued `(raised, lowered)` effects.
    pub(crate) fn take_effects(&mut self) -> (Vec<Quad>, Vec<Quad>) {
        (
            std::mem::take(&mut self.raised),
            std::mem::take(&mut self.lowered),
        )
    }
}

/// The sink of one rule's network: the conclusions of every active match.
#[derive(Clone, Debug, Default)]
pub(crate) struct RuleTerminal {
    firings: HashMap<Token, Vec<Quad>>,
}

impl RuleTerminal {
    /// Applies network deltas: activations instantiate and support their
    /// conclusions, deactivations withdraw exactly what was supported.
    pub(crate) fn absorb(
        &mut self,
        rule: &Rule,
        deltas: Vec<TokenDelta>,
        graph: &Node,
        evaluator: &dyn Evaluator,
        support: &mut SupportTable,
        failures: &mut Vec<ConclusionFailure>,
    ) {
        for delta in deltas {
            match delta.kind {
                DeltaKind::Activated => {
                    let inst = RuleCompiler::instantiate(rule, delta.token.bindings(), graph, evaluator);
                    for error in inst.failures {
                        failures.push(ConclusionFailure {
                            rule: rule.id.clone(),
                            bindings: delta.token.bindings().clone(),
                            error,
                        });
                    }
                    for quad in &inst.quads {
                        support.raise(&rule.id, quad);
                    }
                    let previous = self.firings.insert(delta.token, inst.quads);
                    assert!(previous.is_none(), "rule match activated twice");
                }
                DeltaKind::Deactivated => {
                    let quads = self
                        .firings
                        .remove(&delta.token)
                        .expect("unknown rule match deactivated");
                    for quad in &quads {
                        support.lower(&rule.id, quad);
                    }
                }
            }
        }
    }

    /// Withdraws the support of every active match.
    pub(crate) fn clear(&mut self, rule: &RuleId, support: &mut SupportTable) {
        for (_, quads) in self.firings.drain() {
            for quad in &quads {
                support.lower(rule, quad);
            }
        }
    }

    /// Active matches and what each concluded.
    pub(crate) fn firings(&self) -> impl Iterator<Item = (&Token, &[Quad])> {
        self.firings.iter().map(|(token, quads)| (token, quads.as_slice()))
    }
}
