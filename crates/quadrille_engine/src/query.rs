//! Continuous and ad hoc queries.
//!
//! A continuous query keeps a live network and tells its listeners about
//! every solution that appears or disappears. Queries with structurally
//! equal conditions share one network. Ad hoc queries are answered once,
//! but their networks are kept in a [`ResultCache`] and maintained, so
//! asking again with the same `Rc<Query>` is a lookup.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use quadrille_foundation::{Error, Result};
use quadrille_storage::{QuadStore, SubscriptionId};
use tracing::{debug, trace, warn};

use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::expr::{Evaluator, StandardEvaluator};
use crate::network::{Network, Propagation, SolutionChange, Terminal};
use crate::pattern::{Condition, ConditionKey};
use crate::token::Bindings;

// =============================================================================
// Query
// =============================================================================

/// A condition whose solutions are wanted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    condition: Condition,
}

impl Query {
    /// Creates a query.
    #[must_use]
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// The query's condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    fn validate(&self) -> Result<()> {
        self.condition.validate().map_err(Error::invalid_query)
    }
}

/// Receives solution changes of a continuous query.
pub trait SolutionListener {
    /// Called when the bindings become a solution.
    fn on_new_solution(&mut self, solution: &Bindings);

    /// Called when the bindings stop being a solution.
    fn on_solution_retracted(&mut self, solution: &Bindings);
}

/// Handle for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Instance {
    network: Network,
    terminal: Terminal,
    listeners: Vec<(ListenerId, Box<dyn SolutionListener>)>,
}

/// A cached ad hoc query: its network and current solutions.
#[derive(Debug)]
pub struct CachedResult {
    network: Network,
    terminal: Terminal,
}

impl CachedResult {
    /// Current solutions, each repeated once per supporting match.
    #[must_use]
    pub fn solutions(&self) -> Vec<Bindings> {
        self.terminal.bag()
    }

    /// Number of distinct solutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terminal.len()
    }

    /// Returns true if there are no solutions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terminal.is_empty()
    }
}

fn log_failures(propagation: &Propagation) {
    for (bindings, error) in &propagation.failures {
        warn!(bindings = ?bindings, error = %error, "aggregate dropped from query");
    }
}

// =============================================================================
// Query Engine
// =============================================================================

/// Maintains continuous queries and the ad hoc query cache.
pub struct QueryEngine {
    config: EngineConfig,
    evaluator: Box<dyn Evaluator>,
    subscription: SubscriptionId,
    instances: BTreeMap<ConditionKey, Instance>,
    listeners: HashMap<ListenerId, ConditionKey>,
    next_listener: u64,
    cache: ResultCache<Query, CachedResult>,
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("queries", &self.instances.len())
            .field("listeners", &self.listeners.len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Creates an engine with the default configuration, subscribed to the
    /// store's change feed.
    pub fn new<S: QuadStore + ?Sized>(store: &mut S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config<S: QuadStore + ?Sized>(store: &mut S, config: EngineConfig) -> Self {
        Self {
            cache: ResultCache::new(config.cache_capacity),
            config,
            evaluator: Box::new(StandardEvaluator),
            subscription: store.subscribe(),
            instances: BTreeMap::new(),
            listeners: HashMap::new(),
            next_listener: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Registers a listener for a query's solutions.
    ///
    /// Pending store changes are applied first. The listener is then told
    /// about every current solution, and about every change from here on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if the condition is malformed.
    pub fn register<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        query: &Query,
        mut listener: Box<dyn SolutionListener>,
    ) -> Result<ListenerId> {
        query.validate()?;
        self.flush(store);

        let key = query.condition.key();
        if !self.instances.contains_key(&key) {
            let mut network = Network::compile(&query.condition)?;
            let propagation = network.prime(&*store, &*self.evaluator);
            log_failures(&propagation);
            let mut terminal = Terminal::new();
            terminal.apply(&propagation.deltas);
            debug!(solutions = terminal.len(), "continuous query created");
            self.instances.insert(
                key.clone(),
                Instance {
                    network,
                    terminal,
                    listeners: Vec::new(),
                },
            );
        }

        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        if let Some(instance) = self.instances.get_mut(&key) {
            for (solution, _) in instance.terminal.solutions() {
                listener.on_new_solution(solution);
            }
            instance.listeners.push((id, listener));
        }
        self.listeners.insert(id, key);
        Ok(id)
    }

    /// Removes a listener. The query's network goes with its last listener.
    ///
    /// Returns false if the listener was not registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let Some(key) = self.listeners.remove(&id) else {
            return false;
        };
        if let Some(instance) = self.instances.get_mut(&key) {
            instance.listeners.retain(|(listener, _)| *listener != id);
            if instance.listeners.is_empty() {
                self.instances.remove(&key);
                debug!("continuous query dropped");
            }
        }
        true
    }

    /// Applies pending store changes to every continuous and cached query.
    ///
    /// Returns the number of changes applied.
    pub fn flush<S: QuadStore + ?Sized>(&mut self, store: &mut S) -> usize {
        let changes = store.drain_changes(self.subscription);
        let evaluator = &*self.evaluator;
        for change in &changes {
            let (quad, added) = (change.quad(), change.is_addition());
            trace!(change = ?change, "query propagation");
            for instance in self.instances.values_mut() {
                let propagation = if added {
                    instance.network.insert(quad, evaluator)
                } else {
                    instance.network.remove(quad, evaluator)
                };
                log_failures(&propagation);
                for solution_change in instance.terminal.apply(&propagation.deltas) {
                    for (_, listener) in &mut instance.listeners {
                        match &solution_change {
                            SolutionChange::New(solution) => listener.on_new_solution(solution),
                            SolutionChange::Retracted(solution) => {
                                listener.on_solution_retracted(solution);
                            }
                        }
                    }
                }
            }
            for cached in self.cache.values_mut() {
                let propagation = if added {
                    cached.network.insert(quad, evaluator)
                } else {
                    cached.network.remove(quad, evaluator)
                };
                log_failures(&propagation);
                cached.terminal.apply(&propagation.deltas);
            }
        }
        changes.len()
    }

    /// Answers a query once, through the result cache.
    ///
    /// Solutions come back sorted, each repeated once per supporting match.
    /// The cache recognizes the query by the identity of its `Rc`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if the condition is malformed.
    pub fn execute<S: QuadStore + ?Sized>(
        &mut self,
        store: &mut S,
        query: &Rc<Query>,
    ) -> Result<Vec<Bindings>> {
        self.flush(store);
        if let Some(cached) = self.cache.probe(query) {
            trace!("query cache hit");
            return Ok(cached.solutions());
        }

        query.validate()?;
        let mut network = Network::compile(&query.condition)?;
        let propagation = network.prime(&*store, &*self.evaluator);
        log_failures(&propagation);
        let mut terminal = Terminal::new();
        terminal.apply(&propagation.deltas);
        let solutions = terminal.bag();
        if self
            .cache
            .insert(Rc::clone(query), CachedResult { network, terminal })
            .is_some()
        {
            trace!("query cache eviction");
        }
        Ok(solutions)
    }

    /// Current solutions of a continuous query, if one is registered.
    #[must_use]
    pub fn solutions(&self, query: &Query) -> Option<Vec<Bindings>> {
        self.instances
            .get(&query.condition.key())
            .map(|instance| instance.terminal.solutions().map(|(b, _)| b.clone()).collect())
    }

    /// Number of live continuous queries.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of listeners sharing a query's network.
    #[must_use]
    pub fn listener_count(&self, query: &Query) -> usize {
        self.instances
            .get(&query.condition.key())
            .map_or(0, |instance| instance.listeners.len())
    }

    /// The ad hoc query cache.
    #[must_use]
    pub fn cache(&self) -> &ResultCache<Query, CachedResult> {
        &self.cache
    }

    /// Closes the engine's subscription.
    pub fn detach<S: QuadStore + ?Sized>(self, store: &mut S) {
        store.unsubscribe(self.subscription);
    }
}
