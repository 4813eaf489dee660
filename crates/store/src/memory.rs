use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    Booking, BookingId, BookingStatus, Result, StoreError, Train, TrainId, User, UserId,
    store::{ReservationStore, TrainTransaction},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    trains: HashMap<TrainId, Train>,
    /// Kept in insertion order.
    bookings: Vec<Booking>,
}

/// In-memory reservation store for tests and local runs.
///
/// Provides the same interface as the PostgreSQL implementation. Each train
/// gets its own async mutex, so transactions on different trains run
/// concurrently while transactions on the same train queue up.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    state: Arc<RwLock<MemoryState>>,
    train_locks: Arc<Mutex<HashMap<TrainId, Arc<Mutex<()>>>>>,
}

impl InMemoryReservationStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bookings stored across all trains.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    async fn train_lock(&self, train_id: TrainId) -> Arc<Mutex<()>> {
        let mut locks = self.train_locks.lock().await;
        locks.entry(train_id).or_default().clone()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    type Transaction = InMemoryTransaction;

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.state.write().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn insert_train(&self, train: &Train) -> Result<()> {
        self.state
            .write()
            .await
            .trains
            .insert(train.id, train.clone());
        Ok(())
    }

    async fn get_train(&self, train_id: TrainId) -> Result<Option<Train>> {
        Ok(self.state.read().await.trains.get(&train_id).cloned())
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state.bookings.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn list_bookings(
        &self,
        train_id: TrainId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.train_id == train_id)
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect())
    }

    async fn lock_train(&self, train_id: TrainId) -> Result<InMemoryTransaction> {
        let guard = self.train_lock(train_id).await.lock_owned().await;

        let state = self.state.read().await;
        let train = state
            .trains
            .get(&train_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Train", train_id))?;
        let bookings = state
            .bookings
            .iter()
            .filter(|b| b.train_id == train_id)
            .cloned()
            .collect();
        drop(state);

        tracing::trace!(%train_id, "train locked");

        Ok(InMemoryTransaction {
            state: self.state.clone(),
            guard,
            train,
            bookings,
            deleted: Vec::new(),
        })
    }
}

/// Transaction over one train in the in-memory store.
///
/// Works on a private copy of the train and its bookings; the copy is
/// written back on commit.
pub struct InMemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    guard: OwnedMutexGuard<()>,
    train: Train,
    bookings: Vec<Booking>,
    deleted: Vec<BookingId>,
}

impl InMemoryTransaction {
    fn position(&self, booking_id: BookingId) -> Result<usize> {
        self.bookings
            .iter()
            .position(|b| b.id == booking_id)
            .ok_or_else(|| StoreError::not_found("Booking", booking_id))
    }
}

#[async_trait]
impl TrainTransaction for InMemoryTransaction {
    fn train(&self) -> &Train {
        &self.train
    }

    fn train_mut(&mut self) -> &mut Train {
        &mut self.train
    }

    async fn find_user(&mut self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_booking(&mut self, booking_id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn oldest_booking(&mut self, status: BookingStatus) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| b.status == status)
            .min_by_key(|b| b.booked_at)
            .cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        self.bookings.push(booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        let index = self.position(booking.id)?;
        self.bookings[index] = booking.clone();
        Ok(())
    }

    async fn delete_booking(&mut self, booking_id: BookingId) -> Result<()> {
        let index = self.position(booking_id)?;
        self.bookings.remove(index);
        self.deleted.push(booking_id);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction {
            state,
            guard,
            mut train,
            bookings,
            deleted,
        } = self;

        let train_id = train.id;
        train.updated_at = Utc::now();

        let mut state = state.write().await;
        state.trains.insert(train_id, train);
        state.bookings.retain(|b| !deleted.contains(&b.id));
        for booking in bookings {
            match state.bookings.iter_mut().find(|b| b.id == booking.id) {
                Some(existing) => *existing = booking,
                None => state.bookings.push(booking),
            }
        }
        drop(state);
        drop(guard);

        tracing::trace!(%train_id, "train transaction committed");
        Ok(())
    }
}
