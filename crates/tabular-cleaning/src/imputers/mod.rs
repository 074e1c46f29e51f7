//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Statistical imputation (median, mode)
//! - The per-column resolver that chooses between filling and dropping rows

mod resolver;
mod statistical;

pub use resolver::MissingValueResolver;
pub use statistical::{FilledColumn, StatisticalImputer};
