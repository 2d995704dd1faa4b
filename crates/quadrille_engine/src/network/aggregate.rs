//! Aggregate stage: one output token per non-empty group.

use std::collections::{BTreeSet, HashMap};

use quadrille_foundation::{Error, Node};

use super::{DeltaKind, TokenDelta};
use crate::expr::{Aggregation, Evaluator};
use crate::token::{Bindings, Token};

#[derive(Clone, Debug, Default)]
struct Group {
    members: BTreeSet<Token>,
    output: Option<Token>,
}

/// Groups incoming tokens and keeps each group's aggregate row current.
#[derive(Clone, Debug)]
pub(crate) struct AggregateNode {
    aggregation: Aggregation,
    groups: HashMap<Vec<Node>, Group>,
}

impl AggregateNode {
    pub(crate) fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            groups: HashMap::new(),
        }
    }

    /// Applies a batch of member changes, then recomputes every touched
    /// group once.
    ///
    /// A group's old row is deactivated and its new row activated only when
    /// the row actually changes. Groups whose aggregate fails to evaluate
    /// lose their row and report the failure with the group's bindings.
    pub(crate) fn handle(
        &mut self,
        incoming: Vec<TokenDelta>,
        evaluator: &dyn Evaluator,
        failures: &mut Vec<(Bindings, Error)>,
    ) -> Vec<TokenDelta> {
        let mut touched = BTreeSet::new();
        for delta in incoming {
            let key = delta.token.bindings().key(&self.aggregation.group_by);
            let group = self.groups.entry(key.clone()).or_default();
            match delta.kind {
                DeltaKind::Activated => {
                    assert!(
                        group.members.insert(delta.token),
                        "token activated twice at an aggregate stage"
                    );
                }
                DeltaKind::Deactivated => {
                    assert!(
                        group.members.remove(&delta.token),
                        "unknown token deactivated at an aggregate stage"
                    );
                }
            }
            touched.insert(key);
        }

        let mut out = Vec::new();
        for key in touched {
            let Some(group) = self.groups.get_mut(&key) else {
                continue;
            };
            let row = if group.members.is_empty() {
                None
            } else {
                match compute_row(&self.aggregation, &key, &group.members, evaluator) {
                    Ok(row) => Some(row),
                    Err(error) => {
                        failures.push((group_bindings(&self.aggregation, &key), error));
                        None
                    }
                }
            };
            if row != group.output {
                if let Some(old) = group.output.take() {
                    out.push(TokenDelta::deactivated(old));
                }
                if let Some(new) = row.clone() {
                    out.push(TokenDelta::activated(new));
                }
                group.output = row;
            }
            if group.members.is_empty() {
                self.groups.remove(&key);
            }
        }
        out
    }
}

fn group_bindings(aggregation: &Aggregation, key: &[Node]) -> Bindings {
    aggregation
        .group_by
        .iter()
        .cloned()
        .zip(key.iter().cloned())
        .collect()
}

fn compute_row(
    aggregation: &Aggregation,
    key: &[Node],
    members: &BTreeSet<Token>,
    evaluator: &dyn Evaluator,
) -> Result<Token, Error> {
    let member_bindings: Vec<&Bindings> = members.iter().map(Token::bindings).collect();
    let mut row = group_bindings(aggregation, key);
    for (var, aggregate) in &aggregation.aggregates {
        let value = evaluator.aggregate(aggregate, &member_bindings)?;
        row.insert(var.clone(), value.to_node());
    }
    Ok(Token::new(row, im::Vector::new()))
}
