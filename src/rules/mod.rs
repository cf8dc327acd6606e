//! Rule parsing and evaluation.
//!
//! Rules (predicates) guard steps: `skip` rules decide whether a step
//! runs at all, `check` and `expect` rules assert on the world after it
//! ran. See [`predicate`] for the grammar and [`evaluate`] for the
//! semantics of each tag.

mod evaluate;
mod interpolate;
mod predicate;

pub use evaluate::{CancelToken, Evaluator, RuleError};
pub use interpolate::interpolate;
pub use predicate::{Predicate, PredicateBody};
