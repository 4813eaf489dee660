//! Checked capacity counters.

use common::{BerthType, Train, capacity};

use crate::admission::Admission;
use crate::error::DomainError;

/// Mutates a locked train's counters, refusing any step that would take a
/// counter below zero or above its initial total.
///
/// A refusal is an [`DomainError::InvariantViolation`]; the caller must
/// abandon the transaction.
pub struct Ledger<'a> {
    train: &'a mut Train,
}

impl<'a> Ledger<'a> {
    pub fn new(train: &'a mut Train) -> Self {
        Self { train }
    }

    /// Applies the capacity effect of an admission.
    pub fn admit(&mut self, admission: Admission) -> Result<(), DomainError> {
        match admission {
            Admission::Exempt => Ok(()),
            Admission::Confirmed(berth) => self.consume_berth(berth),
            Admission::Rac => self.consume_rac_spot(),
            Admission::WaitingList => self.join_waiting_list(),
        }
    }

    /// Takes one confirmed-class berth. `NoBerth` and `SideLower` are no-ops.
    pub fn consume_berth(&mut self, berth: BerthType) -> Result<(), DomainError> {
        let aggregate = decrement(
            self.train.available_confirmed_berths,
            "available_confirmed_berths",
        );
        let Some((counter, name, _)) = self.berth_counter(berth) else {
            return Ok(());
        };
        let aggregate = aggregate?;
        *counter = decrement(*counter, name)?;
        self.train.available_confirmed_berths = aggregate;
        Ok(())
    }

    /// Returns one confirmed-class berth. `NoBerth` and `SideLower` are no-ops.
    pub fn release_berth(&mut self, berth: BerthType) -> Result<(), DomainError> {
        let aggregate = increment(
            self.train.available_confirmed_berths,
            self.train.total_confirmed_berths,
            "available_confirmed_berths",
        );
        let Some((counter, name, total)) = self.berth_counter(berth) else {
            return Ok(());
        };
        let aggregate = aggregate?;
        *counter = increment(*counter, total, name)?;
        self.train.available_confirmed_berths = aggregate;
        Ok(())
    }

    pub fn consume_rac_spot(&mut self) -> Result<(), DomainError> {
        self.train.available_rac_spots =
            decrement(self.train.available_rac_spots, "available_rac_spots")?;
        Ok(())
    }

    pub fn release_rac_spot(&mut self) -> Result<(), DomainError> {
        self.train.available_rac_spots = increment(
            self.train.available_rac_spots,
            self.train.total_rac_spots(),
            "available_rac_spots",
        )?;
        Ok(())
    }

    pub fn join_waiting_list(&mut self) -> Result<(), DomainError> {
        self.train.waiting_list_count = increment(
            self.train.waiting_list_count,
            capacity::WAITING_LIST_LIMIT,
            "waiting_list_count",
        )?;
        Ok(())
    }

    pub fn leave_waiting_list(&mut self) -> Result<(), DomainError> {
        self.train.waiting_list_count =
            decrement(self.train.waiting_list_count, "waiting_list_count")?;
        Ok(())
    }

    /// Verifies every counter is within its bounds.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        check_invariants(self.train)
    }

    fn berth_counter(&mut self, berth: BerthType) -> Option<(&mut u32, &'static str, u32)> {
        let slot = match berth {
            BerthType::Lower => (
                &mut self.train.lower_berths_available,
                "lower_berths_available",
                capacity::LOWER_BERTHS,
            ),
            BerthType::Middle => (
                &mut self.train.middle_berths_available,
                "middle_berths_available",
                capacity::MIDDLE_BERTHS,
            ),
            BerthType::Upper => (
                &mut self.train.upper_berths_available,
                "upper_berths_available",
                capacity::UPPER_BERTHS,
            ),
            BerthType::SideLower | BerthType::NoBerth => return None,
        };
        Some(slot)
    }
}

fn decrement(value: u32, name: &str) -> Result<u32, DomainError> {
    value
        .checked_sub(1)
        .ok_or_else(|| DomainError::InvariantViolation(format!("{name} would drop below zero")))
}

fn increment(value: u32, total: u32, name: &str) -> Result<u32, DomainError> {
    if value >= total {
        return Err(DomainError::InvariantViolation(format!(
            "{name} would exceed {total}"
        )));
    }
    Ok(value + 1)
}

/// Verifies every counter on the train is within its bounds.
pub fn check_invariants(train: &Train) -> Result<(), DomainError> {
    let bounds = [
        (
            "available_confirmed_berths",
            train.available_confirmed_berths,
            train.total_confirmed_berths,
        ),
        (
            "available_rac_spots",
            train.available_rac_spots,
            train.total_rac_spots(),
        ),
        (
            "waiting_list_count",
            train.waiting_list_count,
            capacity::WAITING_LIST_LIMIT,
        ),
        (
            "lower_berths_available",
            train.lower_berths_available,
            capacity::LOWER_BERTHS,
        ),
        (
            "middle_berths_available",
            train.middle_berths_available,
            capacity::MIDDLE_BERTHS,
        ),
        (
            "upper_berths_available",
            train.upper_berths_available,
            capacity::UPPER_BERTHS,
        ),
        (
            "side_lower_berths_available",
            train.side_lower_berths_available,
            capacity::SIDE_LOWER_BERTHS,
        ),
        (
            "side_upper_berths_available",
            train.side_upper_berths_available,
            capacity::SIDE_UPPER_BERTHS,
        ),
    ];

    match bounds.iter().find(|(_, value, total)| value > total) {
        Some((name, value, total)) => Err(DomainError::InvariantViolation(format!(
            "{name} is {value}, above its total of {total}"
        ))),
        None => Ok(()),
    }
}
