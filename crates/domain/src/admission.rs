//! Tiered admission.
//!
//! Each request is offered to the tiers in order: the child exemption, a
//! confirmed berth, an RAC spot, then the waiting list. The first tier that
//! accepts decides the booking's status, berth and fare.

use common::{BerthType, BookingStatus, Money, Train, User, capacity};

use crate::berth;

/// Outcome of a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Under-age passenger: confirmed without a berth, free of charge.
    Exempt,
    Confirmed(BerthType),
    Rac,
    WaitingList,
}

impl Admission {
    pub fn status(&self) -> BookingStatus {
        match self {
            Admission::Exempt | Admission::Confirmed(_) => BookingStatus::Confirmed,
            Admission::Rac => BookingStatus::Rac,
            Admission::WaitingList => BookingStatus::WaitingList,
        }
    }

    pub fn berth_type(&self) -> Option<BerthType> {
        match self {
            Admission::Exempt => Some(BerthType::NoBerth),
            Admission::Confirmed(berth) => Some(*berth),
            Admission::Rac => Some(BerthType::SideLower),
            Admission::WaitingList => None,
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            Admission::Exempt => Money::from_major(capacity::CHILD_FARE),
            _ => Money::from_major(capacity::STANDARD_FARE),
        }
    }
}

/// One row of the admission table.
#[derive(Debug)]
pub struct AdmissionTier {
    pub name: &'static str,
    pub admit: fn(&Train, &User) -> Option<Admission>,
}

fn exempt_tier(_: &Train, passenger: &User) -> Option<Admission> {
    passenger.is_berth_exempt().then_some(Admission::Exempt)
}

fn confirmed_tier(train: &Train, passenger: &User) -> Option<Admission> {
    if train.available_confirmed_berths == 0 {
        return None;
    }

    match berth::allocate(train, passenger) {
        Some(berth) if berth.is_confirmed_class() => Some(Admission::Confirmed(berth)),
        _ => {
            tracing::warn!(
                train_id = %train.id,
                available_confirmed_berths = train.available_confirmed_berths,
                confirmed_class_available = train.confirmed_class_available(),
                "confirmed counter out of step with berth counters, falling through to RAC"
            );
            None
        }
    }
}

fn rac_tier(train: &Train, _: &User) -> Option<Admission> {
    (train.available_rac_spots > 0).then_some(Admission::Rac)
}

fn waiting_list_tier(train: &Train, _: &User) -> Option<Admission> {
    (train.waiting_list_count < capacity::WAITING_LIST_LIMIT).then_some(Admission::WaitingList)
}

/// Admission tiers in the order they are offered.
pub static ADMISSION_TIERS: [AdmissionTier; 4] = [
    AdmissionTier {
        name: "exempt",
        admit: exempt_tier,
    },
    AdmissionTier {
        name: "confirmed",
        admit: confirmed_tier,
    },
    AdmissionTier {
        name: "rac",
        admit: rac_tier,
    },
    AdmissionTier {
        name: "waiting_list",
        admit: waiting_list_tier,
    },
];

/// Decides how the passenger is admitted to the train.
///
/// Returns `None` when every tier is full. Pure: the caller applies the
/// outcome to the train through the capacity ledger.
pub fn admit(train: &Train, passenger: &User) -> Option<Admission> {
    ADMISSION_TIERS.iter().find_map(|tier| {
        let admission = (tier.admit)(train, passenger)?;
        tracing::debug!(tier = tier.name, ?admission, "admission tier accepted");
        Some(admission)
    })
}
