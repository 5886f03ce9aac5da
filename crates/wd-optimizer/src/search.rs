//! Adaptive subrange random search.
//!
//! Each round the subrange is (re)expanded around the incumbent best, a batch
//! of configurations is sampled uniformly from it, and every configuration
//! not tried before is handed to the learner once. The run ends when the
//! subrange stops growing.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use wd_types::{Configuration, FullRange, SearchError, SubRange, WdResult};

use crate::config::SearchConfig;
use crate::expander::expand;
use crate::learner::Learner;
use crate::trial::{BestResult, BestTracker, CheckpointScore, SearchStatus, TrialRecord};

/// Result of a completed search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome<M> {
    /// `None` when no checkpoint ever beat an accuracy of 0.0.
    pub best: Option<BestResult<M>>,
    /// Evaluated configurations in evaluation order.
    pub trials: Vec<TrialRecord>,
    pub status: SearchStatus,
}

impl<M> SearchOutcome<M> {
    pub fn best_config(&self) -> Option<&Configuration> {
        self.best.as_ref().map(|b| &b.config)
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |b| b.accuracy)
    }

    /// The winning `(model, configuration)` pair, if any.
    pub fn into_best_pair(self) -> Option<(M, Configuration)> {
        self.best.map(|b| (b.model, b.config))
    }
}

/// Mutable state of one run, owned by [`SubrangeSearch::run`].
struct RunState<M> {
    subrange: SubRange,
    tried: HashSet<Configuration>,
    best: BestTracker<M>,
    rng: ChaCha8Rng,
    sampler_seed: u64,
    trials: Vec<TrialRecord>,
}

impl<M> RunState<M> {
    fn new(seed: u64) -> Self {
        Self {
            subrange: SubRange::new(),
            tried: HashSet::new(),
            best: BestTracker::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            sampler_seed: seed,
            trials: Vec::new(),
        }
    }

    /// Moves the sampler to the next seed so the sample stream depends only
    /// on how many configurations were evaluated.
    fn advance_seed(&mut self) {
        self.sampler_seed = self.sampler_seed.wrapping_add(1);
        self.rng = ChaCha8Rng::seed_from_u64(self.sampler_seed);
    }

    /// Draws one value per parameter, uniformly from its current window.
    fn sample(&mut self) -> Configuration {
        let rng = &mut self.rng;
        self.subrange
            .iter()
            .map(|(param, window)| {
                let index = rng.random_range(0..window.len());
                (param.clone(), window[index].clone())
            })
            .collect()
    }
}

/// Drives the expand / sample / evaluate loop over a [`FullRange`].
pub struct SubrangeSearch {
    config: SearchConfig,
    full_range: FullRange,
    status: SearchStatus,
}

impl SubrangeSearch {
    pub fn new(config: SearchConfig, full_range: FullRange) -> WdResult<Self> {
        config.validate()?;
        let status = SearchStatus::new(&config);
        Ok(Self {
            config,
            full_range,
            status,
        })
    }

    /// Status of the latest run, including failed ones.
    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Runs the search to convergence. Learner errors end the run.
    pub fn run<L: Learner>(&mut self, learner: &mut L) -> WdResult<SearchOutcome<L::Model>> {
        self.status = SearchStatus::new(&self.config);
        self.status.mark_running();
        info!(
            "Starting subrange search '{}' over {:?} (num_epochs: {:?})",
            self.config.name,
            self.full_range,
            self.full_range.num_epochs()
        );

        match self.run_rounds(learner) {
            Ok(state) => {
                self.status.mark_completed();
                let best = state.best.into_best();
                match &best {
                    Some(b) => info!(
                        "Best config {} with validation accuracy {}",
                        b.config, b.accuracy
                    ),
                    None => warn!("Search converged with no result above accuracy 0.0"),
                }
                Ok(SearchOutcome {
                    best,
                    trials: state.trials,
                    status: self.status.clone(),
                })
            }
            Err(e) => {
                warn!("Search '{}' failed: {}", self.config.name, e);
                self.status.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    fn run_rounds<L: Learner>(&mut self, learner: &mut L) -> WdResult<RunState<L::Model>> {
        let attempts_per_round = self.config.attempts_per_round(&self.full_range);
        let mut state = RunState::new(self.config.seed);
        let no_best = Configuration::new();

        loop {
            let incumbent = state.best.config().unwrap_or(&no_best);
            if !expand(&mut state.subrange, &self.full_range, incumbent)? {
                break;
            }
            self.status.rounds += 1;
            info!(
                "Round {}: subrange {} ({} attempts)",
                self.status.rounds, state.subrange, attempts_per_round
            );

            for _ in 0..attempts_per_round {
                let candidate = state.sample();
                if state.tried.contains(&candidate) {
                    debug!("Already tried: {}", candidate);
                    self.status.duplicates_skipped += 1;
                    continue;
                }
                state.tried.insert(candidate.clone());
                self.evaluate(learner, &mut state, candidate)?;
            }
        }

        info!(
            "Search converged after {} rounds: {} trials, {} duplicates skipped",
            self.status.rounds, self.status.trials_evaluated, self.status.duplicates_skipped
        );
        Ok(state)
    }

    fn evaluate<L: Learner>(
        &mut self,
        learner: &mut L,
        state: &mut RunState<L::Model>,
        candidate: Configuration,
    ) -> WdResult<()> {
        info!("Running config: {}", candidate);
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut results = learner
            .learn(&candidate, self.full_range.num_epochs(), self.config.seed)
            .map_err(|e| SearchError::Learner(e.into()))?;
        state.advance_seed();

        let mut checkpoints = Vec::with_capacity(self.full_range.num_epochs().len());
        let mut improved_best = false;

        for epoch in self.full_range.num_epochs() {
            let position = results
                .iter()
                .position(|c| &c.epoch == epoch)
                .ok_or_else(|| SearchError::MissingCheckpoint {
                    checkpoint: epoch.to_string(),
                })?;
            let result = results.swap_remove(position);

            let tagged = candidate.with_num_epochs(result.epoch.clone());
            debug!("{} val_loss: {} val_acc: {}", tagged, result.val_loss, result.val_accuracy);
            checkpoints.push(CheckpointScore {
                epoch: result.epoch,
                val_loss: result.val_loss,
                val_accuracy: result.val_accuracy,
            });

            if state.best.offer(tagged, result.val_accuracy, result.model) {
                improved_best = true;
                self.status.best_accuracy = state.best.accuracy();
                self.status.best_config = state.best.config().cloned();
                info!(
                    "New best validation accuracy {} at {}",
                    state.best.accuracy(),
                    epoch
                );
            }
        }

        let elapsed = clock.elapsed();
        info!("Trial finished in {:.3}s", elapsed.as_secs_f64());
        if let Some(best) = state.best.config() {
            info!("Best config so far: {} ({})", best, state.best.accuracy());
        }

        state.trials.push(TrialRecord {
            trial_number: self.status.trials_evaluated,
            round: self.status.rounds,
            parameters: candidate,
            seed: self.config.seed,
            checkpoints,
            improved_best,
            best_accuracy: state.best.accuracy(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        self.status.trials_evaluated += 1;

        Ok(())
    }
}

/// Runs a search with default settings and returns the winning
/// `(model, configuration)` pair, or `None` if nothing beat accuracy 0.0.
pub fn search<L: Learner>(
    learner: &mut L,
    full_range: FullRange,
    seed: u64,
) -> WdResult<Option<(L::Model, Configuration)>> {
    let config = SearchConfig::new("search").with_seed(seed);
    let outcome = SubrangeSearch::new(config, full_range)?.run(learner)?;
    Ok(outcome.into_best_pair())
}
