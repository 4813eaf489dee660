//! Berth allocation policy.
//!
//! A pure decision over a passenger and the train's per-type availability.
//! Rules are kept as an ordered table so the priority order can be read and
//! tested on its own; the first rule whose predicate holds wins.

use common::{BerthType, Train, User};

/// One row of the allocation table.
#[derive(Debug)]
pub struct BerthRule {
    /// Short name recorded in traces.
    pub name: &'static str,
    pub applies: fn(&User, &Train) -> bool,
    pub berth: BerthType,
}

fn child_exemption(passenger: &User, _: &Train) -> bool {
    passenger.is_berth_exempt()
}

fn senior_lower(passenger: &User, train: &Train) -> bool {
    passenger.is_senior() && train.lower_berths_available > 0
}

fn female_lower(passenger: &User, train: &Train) -> bool {
    passenger.is_female() && train.lower_berths_available > 0
}

fn any_lower(_: &User, train: &Train) -> bool {
    train.lower_berths_available > 0
}

fn any_middle(_: &User, train: &Train) -> bool {
    train.middle_berths_available > 0
}

fn any_upper(_: &User, train: &Train) -> bool {
    train.upper_berths_available > 0
}

/// Allocation rules in priority order.
pub static BERTH_RULES: [BerthRule; 6] = [
    BerthRule {
        name: "child_exemption",
        applies: child_exemption,
        berth: BerthType::NoBerth,
    },
    BerthRule {
        name: "senior_lower",
        applies: senior_lower,
        berth: BerthType::Lower,
    },
    BerthRule {
        name: "female_lower",
        applies: female_lower,
        berth: BerthType::Lower,
    },
    BerthRule {
        name: "lower",
        applies: any_lower,
        berth: BerthType::Lower,
    },
    BerthRule {
        name: "middle",
        applies: any_middle,
        berth: BerthType::Middle,
    },
    BerthRule {
        name: "upper",
        applies: any_upper,
        berth: BerthType::Upper,
    },
];

/// Returns the first rule that matches, if any.
pub fn matching_rule(train: &Train, passenger: &User) -> Option<&'static BerthRule> {
    BERTH_RULES
        .iter()
        .find(|rule| (rule.applies)(passenger, train))
}

/// Picks a berth type for the passenger.
///
/// `Some(BerthType::NoBerth)` is the child exemption and consumes nothing.
/// `None` means no confirmed-class berth is left, whatever the aggregate
/// counter says. Never mutates the train.
pub fn allocate(train: &Train, passenger: &User) -> Option<BerthType> {
    let rule = matching_rule(train, passenger);
    match rule {
        Some(rule) => {
            tracing::debug!(rule = rule.name, berth = %rule.berth, "berth rule matched");
            Some(rule.berth)
        }
        None => {
            tracing::debug!(train_id = %train.id, "no confirmed-class berth left");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_with(lower: u32, middle: u32, upper: u32) -> Train {
        let mut train = Train::new("Test Express", "TR-1");
        train.lower_berths_available = lower;
        train.middle_berths_available = middle;
        train.upper_berths_available = upper;
        train.available_confirmed_berths = lower + middle + upper;
        train
    }

    #[test]
    fn child_gets_no_berth_even_when_full() {
        let child = User::new("Tara", 3, "Female");
        assert_eq!(allocate(&train_with(0, 0, 0), &child), Some(BerthType::NoBerth));
        assert_eq!(allocate(&train_with(21, 21, 21), &child), Some(BerthType::NoBerth));
    }

    #[test]
    fn senior_gets_lower_when_available() {
        let senior = User::new("Gopal", 65, "Male");
        let rule = matching_rule(&train_with(1, 21, 21), &senior).unwrap();
        assert_eq!(rule.name, "senior_lower");
        assert_eq!(rule.berth, BerthType::Lower);
    }

    #[test]
    fn female_gets_lower_when_available() {
        let passenger = User::new("Lakshmi", 30, "Female");
        let rule = matching_rule(&train_with(1, 21, 21), &passenger).unwrap();
        assert_eq!(rule.name, "female_lower");
    }

    #[test]
    fn general_passenger_falls_through_lower_middle_upper() {
        let passenger = User::new("Vikram", 30, "Male");
        assert_eq!(allocate(&train_with(2, 2, 2), &passenger), Some(BerthType::Lower));
        assert_eq!(allocate(&train_with(0, 2, 2), &passenger), Some(BerthType::Middle));
        assert_eq!(allocate(&train_with(0, 0, 2), &passenger), Some(BerthType::Upper));
    }

    #[test]
    fn senior_without_lower_gets_next_berth() {
        let senior = User::new("Gopal", 70, "Male");
        assert_eq!(allocate(&train_with(0, 3, 0), &senior), Some(BerthType::Middle));
    }

    #[test]
    fn unavailable_when_per_type_counters_exhausted() {
        let passenger = User::new("Vikram", 30, "Male");
        let mut train = train_with(0, 0, 0);
        // Aggregate counter out of step with the per-type counters
        train.available_confirmed_berths = 5;
        assert_eq!(allocate(&train, &passenger), None);
    }

    #[test]
    fn allocation_does_not_mutate_train() {
        let train = train_with(1, 1, 1);
        let before = train.clone();
        allocate(&train, &User::new("Vikram", 30, "Male"));
        assert_eq!(train, before);
    }

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<_> = BERTH_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["child_exemption", "senior_lower", "female_lower", "lower", "middle", "upper"]
        );
    }
}
