//! Booking service: the transactional create and cancel paths.

use common::{BerthType, Booking, BookingId, BookingStatus, Train, TrainId, User, UserId};
use store::{ReservationStore, ReservationStoreExt, TrainTransaction};

use crate::admission::{self, Admission};
use crate::berth;
use crate::capacity::{self, Ledger};
use crate::error::DomainError;

/// Request to register a passenger.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, age: u32, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
        }
    }
}

/// Request to register a train with the standard capacity.
#[derive(Debug, Clone)]
pub struct NewTrain {
    pub train_name: String,
    pub train_number: String,
}

impl NewTrain {
    pub fn new(train_name: impl Into<String>, train_number: impl Into<String>) -> Self {
        Self {
            train_name: train_name.into(),
            train_number: train_number.into(),
        }
    }
}

/// What a cancellation did to the train's bookings.
#[derive(Debug, Clone)]
pub struct Cancellation {
    /// The booking as it was when deleted.
    pub cancelled: Booking,
    /// RAC booking moved onto the freed berth.
    pub confirmed_from_rac: Option<Booking>,
    /// Waiting-list booking moved onto the freed RAC spot.
    pub rac_from_waiting_list: Option<Booking>,
}

/// Service for passengers, trains and bookings.
///
/// Every capacity change runs inside a [`TrainTransaction`], so requests on
/// the same train are serialised while different trains proceed in parallel.
pub struct BookingService<S: ReservationStore> {
    store: S,
}

impl<S: ReservationStore> BookingService<S> {
    /// Creates a new booking service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a passenger.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        let name = new_user.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name must not be empty".into()));
        }

        let user = User::new(name, new_user.age, new_user.gender);
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, is_child = user.is_child, "user created");
        Ok(user)
    }

    /// Registers a train with full, unbooked capacity.
    #[tracing::instrument(skip(self))]
    pub async fn create_train(&self, new_train: NewTrain) -> Result<Train, DomainError> {
        let train_name = new_train.train_name.trim();
        let train_number = new_train.train_number.trim();
        if train_name.is_empty() || train_number.is_empty() {
            return Err(DomainError::Validation(
                "train_name and train_number must not be empty".into(),
            ));
        }

        let train = Train::new(train_name, train_number);
        self.store.insert_train(&train).await?;

        tracing::info!(train_id = %train.id, train_number = %train.train_number, "train created");
        Ok(train)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.store.get_user(user_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_train(&self, train_id: TrainId) -> Result<Option<Train>, DomainError> {
        Ok(self.store.get_train(train_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.store.get_booking(booking_id).await?)
    }

    /// Lists a train's bookings in booking order.
    ///
    /// Fails with `NotFound` if the train does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        train_id: TrainId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, DomainError> {
        if self.store.get_train(train_id).await?.is_none() {
            return Err(DomainError::not_found("Train", train_id));
        }
        Ok(self.store.list_bookings(train_id, status).await?)
    }

    /// Books a passenger onto a train.
    ///
    /// The train stays locked from the admission decision until the booking
    /// is committed. When every tier is full the transaction is dropped and
    /// `NoTicketsAvailable` is returned.
    #[tracing::instrument(skip(self))]
    pub async fn create_booking(
        &self,
        user_id: UserId,
        train_id: TrainId,
    ) -> Result<Booking, DomainError> {
        let user = self.store.require_user(user_id).await?;
        let mut tx = self.store.lock_train(train_id).await?;

        let Some(admission) = admission::admit(tx.train(), &user) else {
            metrics::counter!("booking_rejections_total").increment(1);
            tracing::info!(%train_id, %user_id, "no tickets available");
            return Err(DomainError::NoTicketsAvailable { train_id });
        };

        apply_admission(tx.train_mut(), admission)
            .inspect_err(|e| tracing::error!(error = %e, %train_id, "booking aborted"))?;

        let booking = Booking::new(
            user.id,
            train_id,
            admission.status(),
            admission.berth_type(),
            admission.amount(),
        );
        tx.insert_booking(&booking).await?;
        tx.commit().await?;

        metrics::counter!("bookings_created_total", "status" => booking.status.as_str())
            .increment(1);
        tracing::info!(
            booking_id = %booking.id,
            status = %booking.status,
            berth_type = ?booking.berth_type,
            amount = %booking.amount,
            "booking created"
        );

        Ok(booking)
    }

    /// Cancels a booking and promotes the queue behind it.
    ///
    /// Only a cancelled berth-holding confirmed booking frees capacity. The
    /// oldest RAC booking then takes that berth, and the oldest waiting-list
    /// booking takes the RAC spot it leaves behind. RAC, waiting-list and
    /// no-berth bookings are simply deleted.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, booking_id: BookingId) -> Result<Cancellation, DomainError> {
        let train_id = self.store.require_booking(booking_id).await?.train_id;
        let mut tx = self.store.lock_train(train_id).await?;

        // Re-read under the lock; a concurrent promotion may have moved it
        let booking = tx
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

        let released = match (booking.status, booking.berth_type) {
            (BookingStatus::Confirmed, Some(berth)) if berth.is_confirmed_class() => {
                Ledger::new(tx.train_mut())
                    .release_berth(berth)
                    .inspect_err(|e| tracing::error!(error = %e, %train_id, "cancel aborted"))?;
                Some(berth)
            }
            _ => {
                tracing::info!(
                    %booking_id,
                    status = %booking.status,
                    berth_type = ?booking.berth_type,
                    "booking held no berth, deleting without capacity change"
                );
                None
            }
        };

        let mut cancellation = Cancellation {
            cancelled: booking,
            confirmed_from_rac: None,
            rac_from_waiting_list: None,
        };

        if let Some(berth) = released {
            tracing::debug!(%berth, "berth released");
            self.promote(&mut tx, &mut cancellation)
                .await
                .inspect_err(|e| tracing::error!(error = %e, %train_id, "promotion aborted"))?;
        }

        capacity::check_invariants(tx.train())
            .inspect_err(|e| tracing::error!(error = %e, %train_id, "cancel aborted"))?;

        tx.delete_booking(booking_id).await?;
        tx.commit().await?;

        metrics::counter!(
            "bookings_cancelled_total",
            "status" => cancellation.cancelled.status.as_str()
        )
        .increment(1);
        tracing::info!(
            %booking_id,
            status = %cancellation.cancelled.status,
            promoted_to_confirmed = ?cancellation.confirmed_from_rac.as_ref().map(|b| b.id),
            promoted_to_rac = ?cancellation.rac_from_waiting_list.as_ref().map(|b| b.id),
            "booking cancelled"
        );

        Ok(cancellation)
    }

    /// Moves the oldest RAC booking onto the freed berth, then the oldest
    /// waiting-list booking onto the freed RAC spot.
    async fn promote(
        &self,
        tx: &mut S::Transaction,
        cancellation: &mut Cancellation,
    ) -> Result<(), DomainError> {
        let Some(mut rac) = tx.oldest_booking(BookingStatus::Rac).await? else {
            return Ok(());
        };

        let passenger = tx
            .find_user(rac.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", rac.user_id))?;
        let berth = match berth::allocate(tx.train(), &passenger) {
            Some(berth) if berth.is_confirmed_class() => berth,
            other => {
                return Err(DomainError::InvariantViolation(format!(
                    "no confirmed berth for promoted booking {} after release (got {other:?})",
                    rac.id
                )));
            }
        };

        let mut ledger = Ledger::new(tx.train_mut());
        ledger.consume_berth(berth)?;
        ledger.release_rac_spot()?;

        let from = promote_booking(&mut rac, Some(berth))?;
        tx.update_booking(&rac).await?;
        record_promotion(&rac, from);
        cancellation.confirmed_from_rac = Some(rac);

        let Some(mut waiting) = tx.oldest_booking(BookingStatus::WaitingList).await? else {
            return Ok(());
        };

        let mut ledger = Ledger::new(tx.train_mut());
        ledger.leave_waiting_list()?;
        ledger.consume_rac_spot()?;

        let from = promote_booking(&mut waiting, Some(BerthType::SideLower))?;
        tx.update_booking(&waiting).await?;
        record_promotion(&waiting, from);
        cancellation.rac_from_waiting_list = Some(waiting);

        Ok(())
    }
}

fn apply_admission(train: &mut Train, admission: Admission) -> Result<(), DomainError> {
    let mut ledger = Ledger::new(train);
    ledger.admit(admission)?;
    ledger.check_invariants()
}

/// Moves a booking one step up its status path and returns the old status.
fn promote_booking(
    booking: &mut Booking,
    berth_type: Option<BerthType>,
) -> Result<BookingStatus, DomainError> {
    let from = booking.status;
    let to = from.promoted().ok_or_else(|| {
        DomainError::InvariantViolation(format!("booking {} is already {from}", booking.id))
    })?;
    booking.reassign(to, berth_type);
    Ok(from)
}

fn record_promotion(booking: &Booking, from: BookingStatus) {
    metrics::counter!(
        "booking_promotions_total",
        "from" => from.as_str(),
        "to" => booking.status.as_str()
    )
    .increment(1);
    tracing::info!(
        booking_id = %booking.id,
        from = %from,
        to = %booking.status,
        berth_type = ?booking.berth_type,
        "booking promoted"
    );
}
