//! Trial tracking, best-result tracking and run status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wd_types::{Configuration, ParameterValue};

use crate::config::{SearchConfig, SearchId};

/// Lifecycle state for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub id: SearchId,
    pub name: String,
    pub state: SearchState,
    /// Rounds in which the subrange was initialized or grew.
    pub rounds: usize,
    pub trials_evaluated: usize,
    pub duplicates_skipped: usize,
    pub best_accuracy: f64,
    pub best_config: Option<Configuration>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SearchStatus {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            state: SearchState::Pending,
            rounds: 0,
            trials_evaluated: 0,
            duplicates_skipped: 0,
            best_accuracy: 0.0,
            best_config: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SearchState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SearchState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = SearchState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

/// Validation metrics recorded for one checkpoint of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointScore {
    pub epoch: ParameterValue,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// A single evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Position among evaluated (non-duplicate) configurations, from zero.
    pub trial_number: usize,
    /// Growth round the configuration was sampled in, from one.
    pub round: usize,
    pub parameters: Configuration,
    /// Seed passed to the learner.
    pub seed: u64,
    pub checkpoints: Vec<CheckpointScore>,
    /// Whether any checkpoint of this trial replaced the best result.
    pub improved_best: bool,
    /// Best accuracy of the run after this trial.
    pub best_accuracy: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// The best (configuration, accuracy, model) seen in a run.
///
/// `config` carries the `num_epochs` checkpoint that achieved it.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResult<M> {
    pub config: Configuration,
    pub accuracy: f64,
    pub model: M,
}

/// Keeps the best result, replacing it only on strict improvement.
#[derive(Debug, Clone)]
pub struct BestTracker<M> {
    accuracy: f64,
    best: Option<BestResult<M>>,
}

impl<M> BestTracker<M> {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            best: None,
        }
    }

    /// Current best accuracy; 0.0 until something beats it.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn config(&self) -> Option<&Configuration> {
        self.best.as_ref().map(|b| &b.config)
    }

    pub fn best(&self) -> Option<&BestResult<M>> {
        self.best.as_ref()
    }

    /// Offers a candidate. Returns `true` if it became the new best. Ties and
    /// NaN accuracies never replace the incumbent.
    pub fn offer(&mut self, config: Configuration, accuracy: f64, model: M) -> bool {
        if accuracy > self.accuracy {
            self.accuracy = accuracy;
            self.best = Some(BestResult {
                config,
                accuracy,
                model,
            });
            true
        } else {
            false
        }
    }

    pub fn into_best(self) -> Option<BestResult<M>> {
        self.best
    }
}

impl<M> Default for BestTracker<M> {
    fn default() -> Self {
        Self::new()
    }
}
