use async_trait::async_trait;

use crate::{Booking, BookingId, BookingStatus, Result, StoreError, Train, TrainId, User, UserId};

/// Core trait for reservation store implementations.
///
/// Plain reads and master-data inserts go straight to the store. Anything
/// that changes a train's capacity goes through [`ReservationStore::lock_train`],
/// which hands out a [`TrainTransaction`] holding that train exclusively.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Transaction type returned by [`ReservationStore::lock_train`].
    type Transaction: TrainTransaction;

    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    async fn insert_train(&self, train: &Train) -> Result<()>;

    async fn get_train(&self, train_id: TrainId) -> Result<Option<Train>>;

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// Lists a train's bookings in booking order, optionally filtered by status.
    async fn list_bookings(
        &self,
        train_id: TrainId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>>;

    /// Acquires the train's exclusive lock and opens a transaction on it.
    ///
    /// Waits for any other holder of the same train to finish. Fails with
    /// `NotFound` if the train does not exist.
    async fn lock_train(&self, train_id: TrainId) -> Result<Self::Transaction>;
}

/// Unit of work over one locked train.
///
/// Changes become visible to other readers only on [`TrainTransaction::commit`].
/// Dropping the transaction without committing discards every change and
/// releases the lock.
#[async_trait]
pub trait TrainTransaction: Send {
    /// The locked train as of the last modification in this transaction.
    fn train(&self) -> &Train;

    /// Mutable access to the locked train; persisted on commit.
    fn train_mut(&mut self) -> &mut Train;

    /// Reads a passenger through this transaction's connection.
    async fn find_user(&mut self, user_id: UserId) -> Result<Option<User>>;

    /// Reads a booking on this train as of this transaction.
    async fn find_booking(&mut self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// Returns the earliest booking on this train with the given status.
    ///
    /// Ties on the booking timestamp are broken by insertion order.
    async fn oldest_booking(&mut self, status: BookingStatus) -> Result<Option<Booking>>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()>;

    /// Overwrites an existing booking's status and berth.
    async fn update_booking(&mut self, booking: &Booking) -> Result<()>;

    async fn delete_booking(&mut self, booking_id: BookingId) -> Result<()>;

    /// Persists the train and all booking changes, then releases the lock.
    async fn commit(self) -> Result<()>;
}

/// Extension trait providing convenience methods for reservation stores.
#[async_trait]
pub trait ReservationStoreExt: ReservationStore {
    /// Loads a user, failing with `NotFound` if it doesn't exist.
    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", user_id))
    }

    /// Loads a booking, failing with `NotFound` if it doesn't exist.
    async fn require_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.get_booking(booking_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Booking", booking_id))
    }
}

// Blanket implementation for all ReservationStore implementations
impl<T: ReservationStore + ?Sized> ReservationStoreExt for T {}
