pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{BerthType, Booking, BookingId, BookingStatus, Train, TrainId, User, UserId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryReservationStore, InMemoryTransaction};
pub use postgres::{PostgresReservationStore, PostgresTransaction};
pub use store::{ReservationStore, ReservationStoreExt, TrainTransaction};
