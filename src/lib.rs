//! # Reconcile Core
//!
//! Payment reconciliation for event registrations: matches a roster of
//! expected payments against an imported bank statement and keeps operator
//! overrides intact across re-runs.
//!
//! ## Features
//!
//! - **Four-pass matching**: exact tail and amount, grouped sums per account
//!   tail, tail-only candidates, and player names found in remittance messages
//! - **Manual overrides**: inject a payment received outside the bank feed,
//!   undo it, or bind a bank entry to a registration by hand
//! - **Import**: tab-separated text pasted from a spreadsheet
//! - **Storage abstraction**: trait-based, the caller owns persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{reconcile, BankEntry, RegistrationEntry, RegistrationStatus};
//! use bigdecimal::BigDecimal;
//!
//! let registrations = vec![RegistrationEntry::new(
//!     "reg-1".to_string(),
//!     "Alice".to_string(),
//!     BigDecimal::from(1000),
//!     "12345".to_string(),
//!     String::new(),
//! )];
//! let bank_entries = vec![BankEntry::new(
//!     "bank-1".to_string(),
//!     BigDecimal::from(1000),
//!     "12345".to_string(),
//! )];
//!
//! let result = reconcile(&registrations, &bank_entries);
//! assert_eq!(result.registrations[0].status, RegistrationStatus::Matched);
//! ```

pub mod import;
pub mod reconciliation;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use import::{ImportConfig, ImportMode, ImportProgress};
pub use reconciliation::*;
pub use session::Session;
pub use traits::*;
pub use types::*;
