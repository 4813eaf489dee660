//! Shared types for the berth reservation engine.
//!
//! Typed identifiers, the `Money` value object, and the persisted records
//! (`User`, `Train`, `Booking`) that every other crate passes around.

pub mod model;
pub mod money;
pub mod types;

pub use model::{BerthType, Booking, BookingStatus, ParseEnumError, Train, User, capacity};
pub use money::Money;
pub use types::{BookingId, TrainId, UserId};
