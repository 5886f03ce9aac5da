//! The learning procedure the search drives.

use wd_types::{Configuration, ParameterValue};

/// Outcome of training up to one `num_epochs` checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint<M> {
    /// Checkpoint identifier, one of the requested `num_epochs` values.
    pub epoch: ParameterValue,
    /// Model state at this checkpoint.
    pub model: M,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Wrapper over a learning algorithm.
///
/// Implementations must be deterministic for equal `config` and `seed`, and
/// must return one [`Checkpoint`] per requested `num_epochs` entry. Errors
/// end the search run; they are never retried.
pub trait Learner {
    type Model;

    fn learn(
        &mut self,
        config: &Configuration,
        num_epochs: &[ParameterValue],
        seed: u64,
    ) -> anyhow::Result<Vec<Checkpoint<Self::Model>>>;
}
