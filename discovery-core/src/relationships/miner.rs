//! Parallel relationship mining over every schema pair.
//!
//! Pairs are generated in a fixed order and handed out to a bounded set of
//! tokio workers through a shared cursor. Each worker checks the cancellation
//! token before claiming the next pair, so a cancelled run stops after the
//! pairs already in flight. Per-pair failures are collected rather than
//! discarding other workers' results; [`ErrorPolicy`] decides what
//! [`RelationshipMiner::find_relationships`] does with them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{
    rank_relationships, CorrelationMethod, CorrelationStrategy, JoinScoreCache, JoinStrategy,
    Relationship, RelationshipStrategy, SemanticStrategy, TemporalStrategy,
};
use crate::error::{DiscoveryError, Result};
use crate::logging::LogConfig;
use crate::model::Schema;

/// What to do when some schema pairs fail to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop handing out pairs after the first failure and return it
    #[default]
    FailFast,
    /// Evaluate every pair and return whatever succeeded
    BestEffort,
}

/// Configuration for the relationship miner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Maximum number of concurrent pair workers (default: 4)
    pub parallel_workers: usize,
    /// Minimum confidence for join and correlation relationships (default: 0.7)
    pub min_correlation: f64,
    /// Capacity of the join score cache created by the builder (default: 10,000)
    pub cache_capacity: usize,
    pub error_policy: ErrorPolicy,
    pub correlation_method: CorrelationMethod,
    /// Aligned samples required before Pearson's r is used (default: 10)
    pub min_correlation_samples: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            min_correlation: 0.7,
            cache_capacity: 10_000,
            error_policy: ErrorPolicy::FailFast,
            correlation_method: CorrelationMethod::NameHeuristic,
            min_correlation_samples: 10,
        }
    }
}

impl MinerConfig {
    /// Default configuration with one worker per CPU.
    pub fn auto() -> Self {
        Self {
            parallel_workers: num_cpus::get().max(1),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_workers == 0 {
            return Err(DiscoveryError::invalid_config(
                "parallel_workers must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_correlation) {
            return Err(DiscoveryError::invalid_config(format!(
                "min_correlation must be within [0, 1], got {}",
                self.min_correlation
            )));
        }
        if self.cache_capacity == 0 {
            return Err(DiscoveryError::invalid_config(
                "cache_capacity must be at least 1",
            ));
        }
        if self.min_correlation_samples < 2 {
            return Err(DiscoveryError::invalid_config(
                "min_correlation_samples must be at least 2",
            ));
        }
        Ok(())
    }
}

/// A schema pair that failed to evaluate.
#[derive(Debug)]
pub struct PairError {
    /// Position of the pair in generation order
    pub pair_index: usize,
    pub source_schema: String,
    pub target_schema: String,
    pub error: DiscoveryError,
}

/// Full outcome of a mining run.
#[derive(Debug)]
pub struct MiningReport {
    /// Ranked relationships from every successful pair
    pub relationships: Vec<Relationship>,
    /// Failed pairs, in pair order
    pub errors: Vec<PairError>,
    /// Worker tasks that terminated abnormally
    pub worker_errors: Vec<DiscoveryError>,
    pub pairs_evaluated: usize,
    pub pairs_total: usize,
    /// True if the caller's token stopped the run early
    pub cancelled: bool,
}

impl MiningReport {
    fn empty(pairs_total: usize) -> Self {
        Self {
            relationships: Vec::new(),
            errors: Vec::new(),
            worker_errors: Vec::new(),
            pairs_evaluated: 0,
            pairs_total,
            cancelled: false,
        }
    }

    /// True when every pair was evaluated without error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
            && self.worker_errors.is_empty()
            && !self.cancelled
            && self.pairs_evaluated == self.pairs_total
    }

    /// Splits the report into the partial result set and an aggregated error.
    pub fn into_parts(self) -> (Vec<Relationship>, Option<DiscoveryError>) {
        let mut errors: Vec<DiscoveryError> = self.errors.into_iter().map(|e| e.error).collect();
        errors.extend(self.worker_errors);
        if self.cancelled {
            errors.push(DiscoveryError::Cancelled {
                completed: self.pairs_evaluated,
                total: self.pairs_total,
            });
        }
        (self.relationships, DiscoveryError::aggregate(errors))
    }

    /// Applies an error policy to the report.
    ///
    /// `FailFast` returns the first failure in pair order, then any worker
    /// failure, then cancellation. `BestEffort` always returns the partial
    /// result set.
    pub fn into_result(self, policy: ErrorPolicy) -> Result<Vec<Relationship>> {
        if policy == ErrorPolicy::BestEffort {
            return Ok(self.relationships);
        }

        if let Some(first) = self.errors.into_iter().next() {
            return Err(first.error);
        }
        if let Some(first) = self.worker_errors.into_iter().next() {
            return Err(first);
        }
        if self.cancelled {
            return Err(DiscoveryError::Cancelled {
                completed: self.pairs_evaluated,
                total: self.pairs_total,
            });
        }
        Ok(self.relationships)
    }
}

struct PairOutcome {
    index: usize,
    result: Result<Vec<Relationship>>,
}

type Strategies = Arc<Vec<Box<dyn RelationshipStrategy>>>;

/// Finds relationships between profiled schemas.
pub struct RelationshipMiner {
    config: MinerConfig,
    strategies: Strategies,
    cache: Arc<JoinScoreCache>,
    log_config: LogConfig,
}

/// Builder for [`RelationshipMiner`].
pub struct MinerBuilder {
    config: MinerConfig,
    cache: Option<Arc<JoinScoreCache>>,
    extra_strategies: Vec<Box<dyn RelationshipStrategy>>,
    log_config: LogConfig,
}

impl MinerBuilder {
    pub fn config(mut self, config: MinerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of concurrent workers
    pub fn parallel_workers(mut self, workers: usize) -> Self {
        self.config.parallel_workers = workers;
        self
    }

    /// Set the minimum confidence for join and correlation relationships
    pub fn min_correlation(mut self, threshold: f64) -> Self {
        self.config.min_correlation = threshold;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    pub fn correlation_method(mut self, method: CorrelationMethod) -> Self {
        self.config.correlation_method = method;
        self
    }

    pub fn min_correlation_samples(mut self, samples: usize) -> Self {
        self.config.min_correlation_samples = samples;
        self
    }

    /// Share an existing join score cache instead of creating one
    pub fn cache(mut self, cache: Arc<JoinScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register an additional strategy, evaluated after the built-in ones
    pub fn add_strategy(mut self, strategy: Box<dyn RelationshipStrategy>) -> Self {
        self.extra_strategies.push(strategy);
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn build(self) -> Result<RelationshipMiner> {
        self.config.validate()?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(JoinScoreCache::new(self.config.cache_capacity)));
        let mut strategies = default_strategies(&self.config, &cache);
        strategies.extend(self.extra_strategies);

        Ok(RelationshipMiner {
            config: self.config,
            strategies: Arc::new(strategies),
            cache,
            log_config: self.log_config,
        })
    }
}

fn default_strategies(
    config: &MinerConfig,
    cache: &Arc<JoinScoreCache>,
) -> Vec<Box<dyn RelationshipStrategy>> {
    vec![
        Box::new(JoinStrategy::new(config.min_correlation, Arc::clone(cache))),
        Box::new(TemporalStrategy::new()),
        Box::new(CorrelationStrategy::new(
            config.min_correlation,
            config.correlation_method,
            config.min_correlation_samples,
        )),
        Box::new(SemanticStrategy::new()),
    ]
}

impl RelationshipMiner {
    /// Create a miner with the default configuration
    pub fn new() -> Self {
        let config = MinerConfig::default();
        let cache = Arc::new(JoinScoreCache::new(config.cache_capacity));
        Self {
            strategies: Arc::new(default_strategies(&config, &cache)),
            config,
            cache,
            log_config: LogConfig::default(),
        }
    }

    pub fn builder() -> MinerBuilder {
        MinerBuilder {
            config: MinerConfig::default(),
            cache: None,
            extra_strategies: Vec::new(),
            log_config: LogConfig::default(),
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// The join score cache used by this miner
    pub fn cache(&self) -> &Arc<JoinScoreCache> {
        &self.cache
    }

    /// Upper bound on the number of relationships from `schema_count` schemas.
    pub fn max_relationships(&self, schema_count: usize) -> usize {
        pair_count(schema_count) * self.strategies.len()
    }

    /// Number of workers spawned for `pairs` schema pairs.
    pub fn effective_workers(&self, pairs: usize) -> usize {
        self.config.parallel_workers.min(pairs)
    }

    /// Find relationships between every pair of schemas.
    ///
    /// Results are ranked by confidence, highest first. Failures are handled
    /// according to the configured [`ErrorPolicy`].
    pub async fn find_relationships(&self, schemas: &[Schema]) -> Result<Vec<Relationship>> {
        let report = self
            .find_relationships_report(schemas, CancellationToken::new())
            .await;
        report.into_result(self.config.error_policy)
    }

    /// Find relationships and report every failure alongside the results.
    ///
    /// `cancel` is checked before each pair is claimed. Under
    /// [`ErrorPolicy::FailFast`] the run also stops claiming pairs after the
    /// first failure.
    #[instrument(skip(self, schemas, cancel), fields(schemas = schemas.len()))]
    pub async fn find_relationships_report(
        &self,
        schemas: &[Schema],
        cancel: CancellationToken,
    ) -> MiningReport {
        let pairs: Arc<Vec<(usize, usize)>> = Arc::new(
            (0..schemas.len())
                .flat_map(|i| (i + 1..schemas.len()).map(move |j| (i, j)))
                .collect(),
        );
        let pairs_total = pairs.len();
        if pairs_total == 0 {
            debug!("Fewer than two schemas, nothing to mine");
            return MiningReport::empty(0);
        }

        let workers = self.effective_workers(pairs_total);
        let schemas: Arc<[Schema]> = Arc::from(schemas);
        let duplicates = Arc::new(duplicate_names(&schemas));
        if !duplicates.is_empty() {
            warn!(duplicates = ?duplicates, "Duplicate schema names");
        }

        let next = Arc::new(AtomicUsize::new(0));
        let stop = cancel.child_token();
        let fail_fast = self.config.error_policy == ErrorPolicy::FailFast;

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let schemas = Arc::clone(&schemas);
            let pairs = Arc::clone(&pairs);
            let duplicates = Arc::clone(&duplicates);
            let strategies = Arc::clone(&self.strategies);
            let next = Arc::clone(&next);
            let stop = stop.clone();
            let log_config = self.log_config.clone();

            tasks.spawn(async move {
                let mut outcomes = Vec::new();
                while !stop.is_cancelled() {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(&(i, j)) = pairs.get(index) else {
                        break;
                    };

                    let (source, target) = (&schemas[i], &schemas[j]);
                    let result = evaluate_pair(&strategies, source, target, &duplicates);
                    crate::log_pair!(
                        log_config,
                        worker,
                        source = %log_config.field(&source.name),
                        target = %log_config.field(&target.name),
                        ok = result.is_ok(),
                        "Evaluated schema pair"
                    );

                    if result.is_err() && fail_fast {
                        stop.cancel();
                    }
                    outcomes.push(PairOutcome { index, result });
                    tokio::task::yield_now().await;
                }
                outcomes
            });
        }

        let mut outcomes = Vec::with_capacity(pairs_total);
        let mut worker_errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(worker_outcomes) => outcomes.extend(worker_outcomes),
                Err(e) => worker_errors.push(DiscoveryError::worker(format!("Task join error: {e}"))),
            }
        }
        outcomes.sort_by_key(|o| o.index);

        let mut report = MiningReport::empty(pairs_total);
        report.pairs_evaluated = outcomes.len();
        report.cancelled = cancel.is_cancelled() && report.pairs_evaluated < pairs_total;
        report.worker_errors = worker_errors;

        for outcome in outcomes {
            match outcome.result {
                Ok(found) => report.relationships.extend(found),
                Err(error) => {
                    let (i, j) = pairs[outcome.index];
                    report.errors.push(PairError {
                        pair_index: outcome.index,
                        source_schema: schemas[i].name.clone(),
                        target_schema: schemas[j].name.clone(),
                        error,
                    });
                }
            }
        }
        rank_relationships(&mut report.relationships);

        if !report.errors.is_empty() || !report.worker_errors.is_empty() {
            warn!(
                failed_pairs = report.errors.len(),
                worker_errors = report.worker_errors.len(),
                "Some schema pairs failed"
            );
        }
        info!(
            workers,
            pairs_total,
            pairs_evaluated = report.pairs_evaluated,
            relationships = report.relationships.len(),
            cancelled = report.cancelled,
            "Relationship mining finished"
        );

        report
    }
}

impl Default for RelationshipMiner {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_count(schemas: usize) -> usize {
    schemas * schemas.saturating_sub(1) / 2
}

fn duplicate_names(schemas: &[Schema]) -> HashSet<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for schema in schemas {
        *counts.entry(schema.name.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn evaluate_pair(
    strategies: &[Box<dyn RelationshipStrategy>],
    source: &Schema,
    target: &Schema,
    duplicates: &HashSet<String>,
) -> Result<Vec<Relationship>> {
    for schema in [source, target] {
        if duplicates.contains(&schema.name) {
            return Err(DiscoveryError::invalid_schema(
                &schema.name,
                "schema name is not unique",
            ));
        }
    }

    let mut found = Vec::new();
    for strategy in strategies {
        let relationship = strategy.evaluate(source, target).map_err(|e| {
            DiscoveryError::pair_evaluation(
                &source.name,
                &target.name,
                format!("{} strategy failed: {e}", strategy.name()),
            )
        })?;
        found.extend(relationship);
    }
    Ok(found)
}
