//! # wd-types
//!
//! Core types for Widen: parameter values, domains, the full search range,
//! the adaptive subrange, sampled configurations and the error taxonomy.

pub mod errors;
pub mod space;
pub mod value;

pub use errors::*;
pub use space::*;
pub use value::*;
