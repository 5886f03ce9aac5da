//! # wd-optimizer
//!
//! Adaptive subrange random search for Widen.
//!
//! The searchable window of every ordered parameter starts around the median
//! of its domain and widens only toward edges where the current best
//! configuration sits. Each round samples a batch of configurations from the
//! window, skips those already tried, and evaluates the rest with a
//! [`Learner`].

mod config;
mod expander;
mod learner;
mod search;
mod trial;

pub use config::{SearchConfig, SearchId};
pub use expander::expand;
pub use learner::{Checkpoint, Learner};
pub use search::{search, SearchOutcome, SubrangeSearch};
pub use trial::{BestResult, BestTracker, CheckpointScore, SearchState, SearchStatus, TrialRecord};
