use async_trait::async_trait;
use chrono::Utc;
use common::{BerthType, Money};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Booking, BookingId, BookingStatus, Result, StoreError, Train, TrainId, User, UserId,
    store::{ReservationStore, TrainTransaction},
};

const TRAIN_COLUMNS: &str = "id, train_name, train_number, \
    total_confirmed_berths, total_rac_berths, available_confirmed_berths, \
    available_rac_spots, waiting_list_count, lower_berths_available, \
    middle_berths_available, upper_berths_available, side_lower_berths_available, \
    side_upper_berths_available, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, age, gender, is_child, created_at";

const BOOKING_COLUMNS: &str =
    "id, user_id, train_id, status, berth_type, amount_minor, booked_at, updated_at";

/// PostgreSQL-backed reservation store.
///
/// Train locking maps onto `SELECT ... FOR UPDATE` inside a database
/// transaction, so concurrent API instances serialise on the same row.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Creates a new PostgreSQL reservation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn count(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} is negative: {value}")))
}

fn db_int(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{value} exceeds INTEGER")))
}

fn row_to_user(row: PgRow) -> Result<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        age: count(&row, "age")?,
        gender: row.try_get("gender")?,
        is_child: row.try_get("is_child")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_train(row: PgRow) -> Result<Train> {
    Ok(Train {
        id: TrainId::from_uuid(row.try_get::<Uuid, _>("id")?),
        train_name: row.try_get("train_name")?,
        train_number: row.try_get("train_number")?,
        total_confirmed_berths: count(&row, "total_confirmed_berths")?,
        total_rac_berths: count(&row, "total_rac_berths")?,
        available_confirmed_berths: count(&row, "available_confirmed_berths")?,
        available_rac_spots: count(&row, "available_rac_spots")?,
        waiting_list_count: count(&row, "waiting_list_count")?,
        lower_berths_available: count(&row, "lower_berths_available")?,
        middle_berths_available: count(&row, "middle_berths_available")?,
        upper_berths_available: count(&row, "upper_berths_available")?,
        side_lower_berths_available: count(&row, "side_lower_berths_available")?,
        side_upper_berths_available: count(&row, "side_upper_berths_available")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_booking(row: PgRow) -> Result<Booking> {
    let status: String = row.try_get("status")?;
    let berth_type: Option<String> = row.try_get("berth_type")?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        train_id: TrainId::from_uuid(row.try_get::<Uuid, _>("train_id")?),
        status: status
            .parse::<BookingStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        berth_type: berth_type
            .map(|b| b.parse::<BerthType>())
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        amount: Money::from_minor(row.try_get("amount_minor")?),
        booked_at: row.try_get("booked_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    type Transaction = PostgresTransaction;

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, age, gender, is_child, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(db_int(user.age)?)
        .bind(&user.gender)
        .bind(user.is_child)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_user).transpose()
    }

    async fn insert_train(&self, train: &Train) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO trains ({TRAIN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ))
        .bind(train.id.as_uuid())
        .bind(&train.train_name)
        .bind(&train.train_number)
        .bind(db_int(train.total_confirmed_berths)?)
        .bind(db_int(train.total_rac_berths)?)
        .bind(db_int(train.available_confirmed_berths)?)
        .bind(db_int(train.available_rac_spots)?)
        .bind(db_int(train.waiting_list_count)?)
        .bind(db_int(train.lower_berths_available)?)
        .bind(db_int(train.middle_berths_available)?)
        .bind(db_int(train.upper_berths_available)?)
        .bind(db_int(train.side_lower_berths_available)?)
        .bind(db_int(train.side_upper_berths_available)?)
        .bind(train.created_at)
        .bind(train.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_train(&self, train_id: TrainId) -> Result<Option<Train>> {
        let row = sqlx::query(&format!("SELECT {TRAIN_COLUMNS} FROM trains WHERE id = $1"))
            .bind(train_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_train).transpose()
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn list_bookings(
        &self,
        train_id: TrainId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE train_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY booked_at ASC, seq ASC"
        ))
        .bind(train_id.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn lock_train(&self, train_id: TrainId) -> Result<PostgresTransaction> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {TRAIN_COLUMNS} FROM trains WHERE id = $1 FOR UPDATE"
        ))
        .bind(train_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` on the error path rolls it back
        let train = row
            .map(row_to_train)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("Train", train_id))?;

        tracing::trace!(%train_id, "train row locked");

        Ok(PostgresTransaction { tx, train })
    }
}

/// Transaction holding a train row lock in PostgreSQL.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
    train: Train,
}

#[async_trait]
impl TrainTransaction for PostgresTransaction {
    fn train(&self) -> &Train {
        &self.train
    }

    fn train_mut(&mut self) -> &mut Train {
        &mut self.train
    }

    async fn find_user(&mut self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_user).transpose()
    }

    async fn find_booking(&mut self, booking_id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 AND train_id = $2"
        ))
        .bind(booking_id.as_uuid())
        .bind(self.train.id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn oldest_booking(&mut self, status: BookingStatus) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE train_id = $1 AND status = $2 \
             ORDER BY booked_at ASC, seq ASC \
             LIMIT 1"
        ))
        .bind(self.train.id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, train_id, status, berth_type, amount_minor, booked_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.train_id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.berth_type.map(|b| b.as_str()))
        .bind(booking.amount.minor())
        .bind(booking.booked_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $2, berth_type = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.berth_type.map(|b| b.as_str()))
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Booking", booking.id));
        }
        Ok(())
    }

    async fn delete_booking(&mut self, booking_id: BookingId) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Booking", booking_id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let PostgresTransaction { mut tx, train } = self;

        sqlx::query(
            r#"
            UPDATE trains SET
                available_confirmed_berths = $2,
                available_rac_spots = $3,
                waiting_list_count = $4,
                lower_berths_available = $5,
                middle_berths_available = $6,
                upper_berths_available = $7,
                side_lower_berths_available = $8,
                side_upper_berths_available = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(train.id.as_uuid())
        .bind(db_int(train.available_confirmed_berths)?)
        .bind(db_int(train.available_rac_spots)?)
        .bind(db_int(train.waiting_list_count)?)
        .bind(db_int(train.lower_berths_available)?)
        .bind(db_int(train.middle_berths_available)?)
        .bind(db_int(train.upper_berths_available)?)
        .bind(db_int(train.side_lower_berths_available)?)
        .bind(db_int(train.side_upper_berths_available)?)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::trace!(train_id = %train.id, "train transaction committed");
        Ok(())
    }
}
