//! # Transition Evaluator
//!
//! The pure transition-evaluation function of the rollup: it maps one transition record plus the
//! account and strategy leaves it touches to the updated leaves, or rejects the transition. It
//! performs no storage access, which is what lets the same function serve both the operator
//! building honest blocks and the dispute resolver re-deriving a committed block's claim.
//!
//! Rejections are precise inside this crate and deliberately coarse at the dispute layer: apart
//! from init placement and account-id binding, every failure surfaces to the audit trail as
//! "failed to evaluate" (see [`EvalError::revert_reason`]).

pub mod errors;
pub mod evaluate;

pub use errors::EvalError;
pub use evaluate::{evaluate, EvalContext, TransitionEffect};
