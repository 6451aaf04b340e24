//! Reconciliation of expected registrations against bank entries
//!
//! [`engine`] holds the automatic four-pass matcher, [`overrides`] the
//! operator decisions that the matcher must leave alone, and [`summary`] the
//! read-only views built on top of both.

pub mod engine;
pub mod notes;
pub mod overrides;
pub mod summary;

pub use engine::reconcile;
pub use overrides::{bind, inject_payment, reconcile_preserving_manual, undo_injection};
pub use summary::*;
