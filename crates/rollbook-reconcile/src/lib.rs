//! # rollbook-reconcile
//!
//! Turns the structured output of an extraction step (free-text position
//! and technique names, possibly misspelled) into catalog references with
//! confidence scores.
//!
//! This crate provides:
//! - [`Reconciler`]: position-first matching, with the resolved position
//!   used as context for the technique
//! - [`normalize_gi_mode`]: literal gi / no-gi normalization
//! - The `rollbook` command-line tool
//!
//! ## Example
//!
//! ```ignore
//! use rollbook_reconcile::reconcile;
//!
//! let payload = ExtractionPayload::from_json(&raw)?;
//! let matched = reconcile(&payload, &store.index());
//! for name in matched.unmatched().positions {
//!     println!("new position? {}", name);
//! }
//! ```

pub mod engine;
pub mod gi;

pub use engine::{reconcile, Reconciler};
pub use gi::normalize_gi_mode;
