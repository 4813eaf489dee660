//! Persisted records shared by the store, the booking engine and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingId, Money, TrainId, UserId};

/// Fixed capacity structure of a train and the fare constants.
pub mod capacity {
    /// Berths in the confirmed class (lower + middle + upper).
    pub const CONFIRMED_BERTHS: u32 = 63;
    /// Side-lower berths shared by RAC passengers.
    pub const RAC_BERTHS: u32 = 9;
    /// Passengers seated on a single RAC berth.
    pub const RIDERS_PER_RAC_BERTH: u32 = 2;
    pub const RAC_SPOTS: u32 = RAC_BERTHS * RIDERS_PER_RAC_BERTH;
    pub const WAITING_LIST_LIMIT: u32 = 10;

    pub const LOWER_BERTHS: u32 = 21;
    pub const MIDDLE_BERTHS: u32 = 21;
    pub const UPPER_BERTHS: u32 = 21;
    pub const SIDE_LOWER_BERTHS: u32 = 9;
    pub const SIDE_UPPER_BERTHS: u32 = 9;

    /// Passengers younger than this travel without a berth.
    pub const CHILD_AGE_LIMIT: u32 = 5;
    /// Passengers this age or older get lower-berth priority.
    pub const SENIOR_AGE: u32 = 60;

    /// Flat fare, in whole units.
    pub const STANDARD_FARE: i64 = 1000;
    pub const CHILD_FARE: i64 = 0;
}

/// Error returned when a stored or submitted enum string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Admission tier a booking currently holds.
///
/// State transitions:
/// ```text
/// (new) ──► WaitingList ──► Rac ──► Confirmed ──► (deleted)
///   │                        ▲          ▲
///   └────────────────────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Rac,
    WaitingList,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rac => "RAC",
            BookingStatus::WaitingList => "WAITING_LIST",
        }
    }

    /// Returns the status a booking moves to when promoted, if any.
    pub fn promoted(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::WaitingList => Some(BookingStatus::Rac),
            BookingStatus::Rac => Some(BookingStatus::Confirmed),
            BookingStatus::Confirmed => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "RAC" => Ok(BookingStatus::Rac),
            "WAITING_LIST" => Ok(BookingStatus::WaitingList),
            other => Err(ParseEnumError {
                kind: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

/// Physical berth category assigned to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BerthType {
    Lower,
    Middle,
    Upper,
    SideLower,
    /// Children under the age limit share a berth and consume no capacity.
    NoBerth,
}

impl BerthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BerthType::Lower => "LOWER",
            BerthType::Middle => "MIDDLE",
            BerthType::Upper => "UPPER",
            BerthType::SideLower => "SIDE_LOWER",
            BerthType::NoBerth => "NO_BERTH",
        }
    }

    /// Returns true for the berth types that back the confirmed class.
    pub fn is_confirmed_class(&self) -> bool {
        matches!(self, BerthType::Lower | BerthType::Middle | BerthType::Upper)
    }
}

impl std::fmt::Display for BerthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BerthType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOWER" => Ok(BerthType::Lower),
            "MIDDLE" => Ok(BerthType::Middle),
            "UPPER" => Ok(BerthType::Upper),
            "SIDE_LOWER" => Ok(BerthType::SideLower),
            "NO_BERTH" => Ok(BerthType::NoBerth),
            other => Err(ParseEnumError {
                kind: "berth type",
                value: other.to_string(),
            }),
        }
    }
}

/// A passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Derived from `age` when the user is created.
    pub is_child: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, age: u32, gender: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            age,
            gender: gender.into(),
            is_child: age < capacity::CHILD_AGE_LIMIT,
            created_at: Utc::now(),
        }
    }

    pub fn is_female(&self) -> bool {
        self.gender.trim().eq_ignore_ascii_case("female")
    }

    pub fn is_senior(&self) -> bool {
        self.age >= capacity::SENIOR_AGE
    }

    /// True when the passenger is young enough to travel without a berth.
    pub fn is_berth_exempt(&self) -> bool {
        self.age < capacity::CHILD_AGE_LIMIT
    }
}

/// Seat inventory of a single train.
///
/// Counters are only mutated while the train is locked by a store
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub train_name: String,
    pub train_number: String,

    pub total_confirmed_berths: u32,
    pub total_rac_berths: u32,
    pub available_confirmed_berths: u32,
    pub available_rac_spots: u32,
    pub waiting_list_count: u32,

    pub lower_berths_available: u32,
    pub middle_berths_available: u32,
    pub upper_berths_available: u32,
    pub side_lower_berths_available: u32,
    pub side_upper_berths_available: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Train {
    /// Creates a train with its full, unbooked capacity.
    pub fn new(train_name: impl Into<String>, train_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TrainId::new(),
            train_name: train_name.into(),
            train_number: train_number.into(),
            total_confirmed_berths: capacity::CONFIRMED_BERTHS,
            total_rac_berths: capacity::RAC_BERTHS,
            available_confirmed_berths: capacity::CONFIRMED_BERTHS,
            available_rac_spots: capacity::RAC_SPOTS,
            waiting_list_count: 0,
            lower_berths_available: capacity::LOWER_BERTHS,
            middle_berths_available: capacity::MIDDLE_BERTHS,
            upper_berths_available: capacity::UPPER_BERTHS,
            side_lower_berths_available: capacity::SIDE_LOWER_BERTHS,
            side_upper_berths_available: capacity::SIDE_UPPER_BERTHS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total RAC spots (berths times riders per berth).
    pub fn total_rac_spots(&self) -> u32 {
        self.total_rac_berths * capacity::RIDERS_PER_RAC_BERTH
    }

    /// Sum of the per-type confirmed-class counters.
    pub fn confirmed_class_available(&self) -> u32 {
        self.lower_berths_available + self.middle_berths_available + self.upper_berths_available
    }
}

/// One passenger's reservation on one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub train_id: TrainId,
    pub status: BookingStatus,
    /// Unset while the booking is on the waiting list.
    pub berth_type: Option<BerthType>,
    pub amount: Money,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: UserId,
        train_id: TrainId,
        status: BookingStatus,
        berth_type: Option<BerthType>,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new(),
            user_id,
            train_id,
            status,
            berth_type,
            amount,
            booked_at: now,
            updated_at: now,
        }
    }

    /// Rewrites status and berth in place, as a promotion does.
    pub fn reassign(&mut self, status: BookingStatus, berth_type: Option<BerthType>) {
        self.status = status;
        self.berth_type = berth_type;
        self.updated_at = Utc::now();
    }
}
