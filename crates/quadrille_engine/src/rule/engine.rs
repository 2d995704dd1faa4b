//! The rule engine.
//!
//! Every active rule owns a network and a terminal. All networks share one
//! subscription to the store's change feed; a flush drains the feed, pushes
//! each change through every network, and writes the resulting conclusions
//! back into the store. Those writes land in the feed too, so chaining is
//! just more draining, until the feed is quiet.
//!
//! Conclusions are support-counted. A conclusion whose support falls to
//! zero is removed at once. One whose support falls but stays positive is a
//! suspect: it may only be holding itself up through a cycle of rules. Once
//! the feed is quiet, suspects are resolved by delete-and-rederive:
//!
//! 1. **over-delete** - each suspect is withdrawn from the networks (it
//!    stays in the store), and so is everything whose support drops as a
//!    consequence;
//! 2. **rederive** - withdrawn quads that still have support, necessarily
//!    from facts that were not withdrawn, are reinstated, repeatedly;
//! 3. **finalize** - withdrawn quads left without support leave the store.
//!
//! Conclusions raised while quads are withdrawn are held back until
//! finalize and written only if they are still supported then, so a rule
//! never fires on the temporary absence of a withdrawn blocker.
//!
//! Changes are taken off the feed into an engine-owned queue and leave it
//! only once propagated. A flush stopped by the round limit resumes where
//! it stopped on the next flush.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::mem;

use quadrille_foundation::{Error, ErrorKind, Node, Quad, Result, SemanticLimit};
use quadrille_storage::{Change, QuadStore, SubscriptionId};
use tracing::{debug, trace, warn};

use super::compiler::RuleCompiler;
use super::support::{RuleTerminal, SupportTable};
use super::{Rule, RuleId};
use crate::config::EngineConfig;
use crate::expr::{Evaluator, StandardEvaluator};
use crate::network::{Network, Propagation};
use crate::provenance::{Derivation, MatchStatus, MatchStep};
use crate::token::Bindings;

// =============================================================================
// Reports
// =============================================================================

/// A conclusion attempt that was dropped.
#[derive(Clone, Debug)]
pub struct ConclusionFailure {
    /// The rule whose conclusion failed.
    pub rule: RuleId,
    /// The bindings of the match (or the group, for aggregate failures).
    pub bindings: Bindings,
    /// What went wrong.
    pub error: Error,
}

impl fmt::Display for ConclusionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} with {:?}: {}", self.rule, self.bindings, self.error)
    }
}

/// What a flush (or a rule change) did.
#[derive(Clone, Debug, Default)]
pub struct FlushReport {
    /// Changes pushed through the networks.
    pub rounds: usize,
    /// Conclusions inserted into the store.
    pub materialized: usize,
    /// Conclusions removed from the store.
    pub retracted: usize,
    /// Withdrawn conclusions reinstated by delete-and-rederive.
    pub rederived: usize,
    /// Conclusion attempts that were dropped.
    pub failures: Vec<ConclusionFailure>,
}

impl FlushReport {
    /// Returns true if the flush changed nothing and dropped nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.materialized == 0 && self.retracted == 0 && self.failures.is_empty()
    }
}

// =============================================================================
// Rule Engine
// =============================================================================

struct RuleSlot {
    rule: Rule,
    network: Option<Network>,
    terminal: RuleTerminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Normal,
    Overdelete,
    Rederive,
}

/// Keeps the inference graph equal to what the registered rules conclude
/// from the rest of the store.
pub struct RuleEngine {
    config: EngineConfig,
    inference_graph: Node,
    evaluator: Box<dyn Evaluator>,
    subscription: SubscriptionId,
    rules: BTreeMap<RuleId, RuleSlot>,
    support: SupportTable,
    pending: VecDeque<Change>,
    suspects: BTreeSet<Quad>,
    withdrawn: BTreeSet<Quad>,
    deferred: BTreeSet<Quad>,
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("inference_graph", &self.inference_graph)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl RuleEngine {
    /// Creates an engine with the default configuration, subscribed to the
    /// store's change feed.
    pub fn new<S: QuadStore + ?Sized>(store: &mut S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config<S: QuadStore + ?Sized>(store: &mut S, config: EngineConfig) -> Self {
        let subscription = store.subscribe();
        debug!(graph = %config.inference_graph, "rule engine attached");
        Self {
            inference_graph: Node::iri(config.inference_graph.as_str()),
            config,
            evaluator: Box::new(StandardEvaluator),
            subscription,
            rules: BTreeMap::new(),
            support: SupportTable::default(),
            pending: VecDeque::new(),
            suspects: BTreeSet::new(),
            withdrawn: BTreeSet::new(),
            deferred: BTreeSet::new(),
        }
    }

    /// Replaces the expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the graph conclusions are written into.
    #[must_use]
    pub fn inference_graph(&self) -> &Node {
        &self.inference_graph
    }

    /// Registered rules, in id order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values().map(|slot| &slot.rule)
    }

    /// Looks up a rule.
    #[must_use]
    pub fn rule(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(id).map(|slot| &slot.rule)
    }

    /// Total support of a quad across every rule.
    #[must_use]
    pub fn support(&self, quad: &Quad) -> usize {
        self.support.total(quad)
    }

    /// Support of a quad from one rule.
    #[must_use]
    pub fn support_from(&self, rule: &RuleId, quad: &Quad) -> usize {
        self.support.by_rule(rule, quad)
    }

    /// Registers a rule and brings the store to the new fixpoint.
    ///
    /// Inactive rules are validated and registered without a network.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRule` or `InvalidRule` without changing anything,
    /// a store error, or `LimitExceeded` if the fixpoint is not reached
    /// within the configured rounds.
    pub fn add<S: QuadStore + ?Sized>(&mut self, store: &mut S, rule: Rule) -> Result<FlushReport> {
        if self.rules.contains_key(&rule.id) {
            return Err(Error::new(ErrorKind::DuplicateRule(rule.id.to_string())));
        }
        let network = RuleCompiler::compile(&rule)?;
        debug!(rule = %rule.id, active = rule.active, "adding rule");

        let id = rule.id.clone();
        let active = rule.active;
        self.rules.insert(
            id.clone(),
            RuleSlot {
                rule,
                network: None,
                terminal: RuleTerminal::default(),
            },
        );
        let mut report = FlushReport::default();
        if active {
            self.activate(store, &id, network, &mut report)?;
        }
        self.run(store, &mut report)?;
        Ok(report)
    }

    /// Unregisters a rule, retracting every conclusion only it supported.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRule`, a store error, or `LimitExceeded`.
    pub fn remove<S: QuadStore + ?Sized>(&mut self, store: &mut S, id: &RuleId) -> Result<FlushReport> {
        let mut slot = self
            .rules
            .remove(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(id.to_string())))?;
        debug!(rule = %id, "removing rule");
        slot.terminal.clear(id, &mut self.support);
        let mut report = FlushReport::default();
        self.settle(store, Phase::Normal, &mut report)?;
        self.run(store, &mut report)?;
        Ok(report)
    }

    /// Activates or deactivates a registered rule.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRule`, a store error, or `LimitExceeded`.
    pub fn set_active<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: &RuleId,
        active: bool,
    ) -> Result<FlushReport> {
        let slot = self
            .rules
            .get_mut(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(id.to_string())))?;
        let mut report = FlushReport::default();
        if slot.rule.active != active {
            debug!(rule = %id, active, "toggling rule");
            slot.rule.active = active;
            if active {
                let network = RuleCompiler::compile(&slot.rule)?;
                self.activate(store, id, network, &mut report)?;
            } else {
                slot.network = None;
                slot.terminal.clear(id, &mut self.support);
                self.settle(store, Phase::Normal, &mut report)?;
            }
        }
        self.run(store, &mut report)?;
        Ok(report)
    }

    /// Applies every store change since the last flush and reaches the
    /// fixpoint.
    ///
    /// # Errors
    ///
    /// Returns a store error, or `LimitExceeded` if more than
    /// `max_rounds` changes had to be propagated. Nothing is lost in that
    /// case: the next flush carries on from the first unpropagated change.
    pub fn flush<S: QuadStore + ?Sized>(&mut self, store: &mut S) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        self.run(store, &mut report)?;
        if !report.is_quiet() {
            debug!(
                rounds = report.rounds,
                materialized = report.materialized,
                retracted = report.retracted,
                rederived = report.rederived,
                failures = report.failures.len(),
                "flushed"
            );
        }
        Ok(report)
    }

    /// Every active derivation of a quad.
    #[must_use]
    pub fn explain(&self, quad: &Quad) -> Vec<Derivation> {
        let mut derivations: Vec<Derivation> = self
            .rules
            .values()
            .flat_map(|slot| {
                slot.terminal
                    .firings()
                    .filter(|(_, quads)| quads.contains(quad))
                    .map(|(token, _)| Derivation {
                        rule: slot.rule.id.clone(),
                        bindings: token.bindings().clone(),
                        premises: token.facts().iter().cloned().collect(),
                    })
            })
            .collect();
        derivations.sort();
        derivations
    }

    /// How far a rule's condition currently matches.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRule` if no such rule is registered.
    pub fn match_status(&self, id: &RuleId) -> Result<MatchStatus> {
        let slot = self
            .rules
            .get(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(id.to_string())))?;
        let positives = &slot.rule.condition.positives;
        let (steps, matches) = match &slot.network {
            Some(network) => (
                positives
                    .iter()
                    .enumerate()
                    .map(|(i, pattern)| MatchStep {
                        pattern: pattern.clone(),
                        bindings: network.step_bindings(i),
                    })
                    .collect(),
                network.tokens().map(|token| token.bindings().clone()).collect(),
            ),
            None => (
                positives
                    .iter()
                    .map(|pattern| MatchStep {
                        pattern: pattern.clone(),
                        bindings: Vec::new(),
                    })
                    .collect(),
                Vec::new(),
            ),
        };
        Ok(MatchStatus {
            rule: id.clone(),
            active: slot.network.is_some(),
            steps,
            matches,
        })
    }

    /// Closes the engine's subscription. Conclusions already in the store
    /// stay there.
    pub fn detach<S: QuadStore + ?Sized>(self, store: &mut S) {
        store.unsubscribe(self.subscription);
        debug!(rules = self.rules.len(), "rule engine detached");
    }

    // -------------------------------------------------------------------------
    // Propagation
    // -------------------------------------------------------------------------

    fn activate<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: &RuleId,
        mut network: Network,
        report: &mut FlushReport,
    ) -> Result<()> {
        let slot = self
            .rules
            .get_mut(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(id.to_string())))?;
        let propagation = network.prime(&*store, &*self.evaluator);
        trace!(rule = %id, matches = propagation.deltas.len(), "rule primed");
        absorb(
            slot,
            propagation,
            &self.inference_graph,
            &*self.evaluator,
            &mut self.support,
            report,
        );
        slot.network = Some(network);
        self.settle(store, Phase::Normal, report)?;
        Ok(())
    }

    fn run<S: QuadStore + ?Sized>(&mut self, store: &mut S, report: &mut FlushReport) -> Result<()> {
        loop {
            if self.rederiving() {
                self.delete_and_rederive(store, report)?;
                continue;
            }
            if self.pending.is_empty() {
                self.pending.extend(store.drain_changes(self.subscription));
            }
            if let Some(change) = self.pending.front().cloned() {
                self.tick(report, "propagation")?;
                self.pending.pop_front();
                trace!(change = ?change, "propagating");
                self.inject(change.quad(), change.is_addition(), report);
                self.settle(store, Phase::Normal, report)?;
                continue;
            }
            if self.suspects.is_empty() {
                return Ok(());
            }
            self.delete_and_rederive(store, report)?;
        }
    }

    /// True while a delete-and-rederive pass has quads withdrawn or
    /// conclusions held back.
    fn rederiving(&self) -> bool {
        !self.withdrawn.is_empty() || !self.deferred.is_empty()
    }

    /// Resolves every suspect. Each step leaves its remaining work in the
    /// engine, so a pass cut short by the round limit resumes on the next
    /// call.
    fn delete_and_rederive<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        report: &mut FlushReport,
    ) -> Result<()> {
        trace!(suspects = self.suspects.len(), "over-deleting");
        while let Some(quad) = self.suspects.first().cloned() {
            if self.withdrawn.contains(&quad) || !store.contains(&quad) {
                self.suspects.remove(&quad);
                continue;
            }
            self.tick(report, "over-delete")?;
            self.suspects.remove(&quad);
            self.withdrawn.insert(quad.clone());
            self.inject(&quad, false, report);
            self.settle(store, Phase::Overdelete, report)?;
        }

        loop {
            let revived: Vec<Quad> = self
                .withdrawn
                .iter()
                .filter(|quad| self.support.total(quad) > 0)
                .cloned()
                .collect();
            if revived.is_empty() {
                break;
            }
            for quad in revived {
                self.tick(report, "rederive")?;
                self.withdrawn.remove(&quad);
                self.inject(&quad, true, report);
                report.rederived += 1;
                self.settle(store, Phase::Rederive, report)?;
            }
        }

        for quad in mem::take(&mut self.withdrawn) {
            if store.remove(&quad)? {
                report.retracted += 1;
            }
        }
        for quad in mem::take(&mut self.deferred) {
            if self.support.total(&quad) > 0 && store.insert(quad.clone())? {
                trace!(quad = %quad, "materialized");
                report.materialized += 1;
            }
        }
        Ok(())
    }

    fn tick(&self, report: &mut FlushReport, phase: &str) -> Result<()> {
        report.rounds += 1;
        if report.rounds > self.config.max_rounds {
            return Err(Error::limit_exceeded(SemanticLimit::MaxRounds {
                limit: self.config.max_rounds,
                context: Some(phase.to_string()),
            }));
        }
        Ok(())
    }

    fn inject(&mut self, quad: &Quad, added: bool, report: &mut FlushReport) {
        let evaluator = &*self.evaluator;
        for slot in self.rules.values_mut() {
            let Some(network) = slot.network.as_mut() else {
                continue;
            };
            let propagation = if added {
                network.insert(quad, evaluator)
            } else {
                network.remove(quad, evaluator)
            };
            if !propagation.is_empty() {
                absorb(
                    slot,
                    propagation,
                    &self.inference_graph,
                    evaluator,
                    &mut self.support,
                    report,
                );
            }
        }
    }

    /// Writes queued support effects to the store.
    ///
    /// Outside the normal phase, raised quads are held back until the
    /// delete-and-rederive pass finalizes. In the over-delete phase every
    /// quad whose support fell becomes a suspect to withdraw in turn.
    fn settle<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        phase: Phase,
        report: &mut FlushReport,
    ) -> Result<()> {
        let (raised, lowered) = self.support.take_effects();
        for quad in raised {
            if phase != Phase::Normal {
                self.deferred.insert(quad);
            } else if self.support.total(&quad) > 0 && store.insert(quad.clone())? {
                trace!(quad = %quad, "materialized");
                report.materialized += 1;
            }
        }

        for quad in lowered {
            let total = self.support.total(&quad);
            match phase {
                Phase::Overdelete => {
                    if !self.withdrawn.contains(&quad) {
                        self.suspects.insert(quad);
                    }
                }
                Phase::Normal | Phase::Rederive if total == 0 => {
                    self.suspects.remove(&quad);
                    if !self.withdrawn.contains(&quad) && store.remove(&quad)? {
                        trace!(quad = %quad, "retracted");
                        report.retracted += 1;
                    }
                }
                Phase::Normal | Phase::Rederive => {
                    self.suspects.insert(quad);
                }
            }
        }
        Ok(())
    }
}

fn absorb(
    slot: &mut RuleSlot,
    propagation: Propagation,
    graph: &Node,
    evaluator: &dyn Evaluator,
    support: &mut SupportTable,
    report: &mut FlushReport,
) {
    let first_new = report.failures.len();
    for (bindings, error) in propagation.failures {
        report.failures.push(ConclusionFailure {
            rule: slot.rule.id.clone(),
            bindings,
            error,
        });
    }
    slot.terminal.absorb(
        &slot.rule,
        propagation.deltas,
        graph,
        evaluator,
        support,
        &mut report.failures,
    );
    for failure in &report.failures[first_new..] {
        warn!(rule = %failure.rule, error = %failure.error, "conclusion dropped");
    }
}
