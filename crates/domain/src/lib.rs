//! Booking allocation engine.
//!
//! This crate provides:
//! - The berth allocation policy as an ordered rule table
//! - Tiered admission (exempt, confirmed, RAC, waiting list)
//! - A checked capacity ledger over a locked train
//! - `BookingService`, which runs the create and cancel paths inside a
//!   per-train store transaction

pub mod admission;
pub mod berth;
pub mod capacity;
pub mod error;
pub mod service;

pub use admission::{ADMISSION_TIERS, Admission, AdmissionTier, admit};
pub use berth::{BERTH_RULES, BerthRule, allocate};
pub use capacity::{Ledger, check_invariants};
pub use error::DomainError;
pub use service::{BookingService, Cancellation, NewTrain, NewUser};
