//! Transition engine.
//!
//! # Responsibility
//! - Map `(snapshot, command)` to the next snapshot as a pure function.
//! - Encode all invariant-preserving edge-case policy: placeholder tabs,
//!   active-tab reassignment, membership consistency, history trimming.
//!
//! # Invariants
//! - The engine raises no errors; invalid commands degrade to no-ops.
//! - Ids and timestamps come only from the injected `TransitionEnv`.

pub mod command;
pub mod env;
mod membership;
pub mod rebalance;
pub mod transition;

pub use command::{Command, GroupFilterToggle, RESET_ALL_FILTERS};
pub use env::{SequenceEnv, SystemEnv, TransitionEnv};
pub use rebalance::{rebalance_after_delete, Rebalanced};
pub use transition::{draft_new_tab, transition};
