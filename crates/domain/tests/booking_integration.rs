//! Integration tests for the booking service.
//!
//! These tests drive the create and cancel paths end to end against the
//! in-memory store, covering tier boundaries, berth preferences, the
//! promotion cascade and concurrent booking on one train.

use std::sync::Arc;

use common::{BerthType, Booking, BookingStatus, Train};
use domain::{BookingService, DomainError, Ledger, NewTrain, NewUser, check_invariants};
use store::{InMemoryReservationStore, ReservationStore, TrainTransaction};

type Service = BookingService<InMemoryReservationStore>;

/// Helper to create a service with one fresh train
async fn setup() -> (Service, Train) {
    let service = BookingService::new(InMemoryReservationStore::new());
    let train = service
        .create_train(NewTrain::new("Rajdhani Express", "12951"))
        .await
        .unwrap();
    (service, train)
}

async fn book(service: &Service, train: &Train, age: u32, gender: &str) -> Booking {
    let user = service
        .create_user(NewUser::new("Passenger", age, gender))
        .await
        .unwrap();
    service.create_booking(user.id, train.id).await.unwrap()
}

/// Books `count` adult male passengers in sequence.
async fn fill(service: &Service, train: &Train, count: usize) -> Vec<Booking> {
    let mut bookings = Vec::with_capacity(count);
    for _ in 0..count {
        bookings.push(book(service, train, 30, "Male").await);
    }
    bookings
}

async fn reload(service: &Service, train: &Train) -> Train {
    service.get_train(train.id).await.unwrap().unwrap()
}

/// Every availability counter, ignoring timestamps.
fn counters(train: &Train) -> [u32; 8] {
    [
        train.available_confirmed_berths,
        train.available_rac_spots,
        train.waiting_list_count,
        train.lower_berths_available,
        train.middle_berths_available,
        train.upper_berths_available,
        train.side_lower_berths_available,
        train.side_upper_berths_available,
    ]
}

mod tiers {
    use super::*;

    #[tokio::test]
    async fn confirmed_capacity_is_63_then_rac() {
        let (service, train) = setup().await;

        let confirmed = fill(&service, &train, 63).await;
        assert!(
            confirmed
                .iter()
                .all(|b| b.status == BookingStatus::Confirmed)
        );

        let after = reload(&service, &train).await;
        assert_eq!(after.available_confirmed_berths, 0);
        assert_eq!(after.lower_berths_available, 0);
        assert_eq!(after.middle_berths_available, 0);
        assert_eq!(after.upper_berths_available, 0);

        let next = book(&service, &train, 30, "Male").await;
        assert_eq!(next.status, BookingStatus::Rac);
        assert_eq!(next.berth_type, Some(BerthType::SideLower));
    }

    #[tokio::test]
    async fn rac_capacity_is_18_then_waiting_list() {
        let (service, train) = setup().await;
        fill(&service, &train, 63 + 18).await;

        let after = reload(&service, &train).await;
        assert_eq!(after.available_rac_spots, 0);

        let next = book(&service, &train, 30, "Male").await;
        assert_eq!(next.status, BookingStatus::WaitingList);
        assert_eq!(next.berth_type, None);
    }

    #[tokio::test]
    async fn waiting_list_caps_at_10_and_rejection_mutates_nothing() {
        let (service, train) = setup().await;
        fill(&service, &train, 63 + 18 + 10).await;

        let before = reload(&service, &train).await;
        assert_eq!(before.waiting_list_count, 10);

        let user = service
            .create_user(NewUser::new("Late", 30, "Male"))
            .await
            .unwrap();
        let result = service.create_booking(user.id, train.id).await;
        assert!(matches!(
            result,
            Err(DomainError::NoTicketsAvailable { train_id }) if train_id == train.id
        ));

        let after = reload(&service, &train).await;
        assert_eq!(counters(&after), counters(&before));
        assert_eq!(service.store().booking_count().await, 91);
    }

    #[tokio::test]
    async fn child_never_changes_counters() {
        let (service, train) = setup().await;
        fill(&service, &train, 63 + 18 + 10).await;
        let before = reload(&service, &train).await;

        let booking = book(&service, &train, 4, "Female").await;
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.berth_type, Some(BerthType::NoBerth));
        assert!(booking.amount.is_zero());

        assert_eq!(counters(&reload(&service, &train).await), counters(&before));
    }

    #[tokio::test]
    async fn counters_stay_within_bounds_throughout() {
        let (service, train) = setup().await;
        for _ in 0..95 {
            let user = service
                .create_user(NewUser::new("Passenger", 40, "Female"))
                .await
                .unwrap();
            let _ = service.create_booking(user.id, train.id).await;
            check_invariants(&reload(&service, &train).await).unwrap();
        }
    }
}

mod berth_preference {
    use super::*;

    #[tokio::test]
    async fn general_passengers_fill_lower_middle_upper_in_order() {
        let (service, train) = setup().await;
        let bookings = fill(&service, &train, 63).await;

        let berths: Vec<_> = bookings.iter().map(|b| b.berth_type.unwrap()).collect();
        assert!(berths[..21].iter().all(|b| *b == BerthType::Lower));
        assert!(berths[21..42].iter().all(|b| *b == BerthType::Middle));
        assert!(berths[42..].iter().all(|b| *b == BerthType::Upper));
    }

    #[tokio::test]
    async fn senior_and_female_get_lower_while_available() {
        let (service, train) = setup().await;
        fill(&service, &train, 20).await;

        let senior = book(&service, &train, 72, "Male").await;
        assert_eq!(senior.berth_type, Some(BerthType::Lower));

        // Lower is now exhausted
        let female = book(&service, &train, 28, "FEMALE").await;
        assert_eq!(female.berth_type, Some(BerthType::Middle));
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn round_trip_restores_counters() {
        let (service, train) = setup().await;
        let before = reload(&service, &train).await;

        let booking = book(&service, &train, 35, "Female").await;
        service.cancel_booking(booking.id).await.unwrap();

        let after = reload(&service, &train).await;
        assert_eq!(counters(&after), counters(&before));
    }

    #[tokio::test]
    async fn confirmed_cancel_promotes_rac_and_waiting_list() {
        let (service, train) = setup().await;
        let bookings = fill(&service, &train, 63 + 18 + 2).await;
        let middle = &bookings[30];
        assert_eq!(middle.berth_type, Some(BerthType::Middle));
        let oldest_rac = &bookings[63];
        let oldest_waiting = &bookings[81];

        let cancellation = service.cancel_booking(middle.id).await.unwrap();

        let promoted = cancellation.confirmed_from_rac.unwrap();
        assert_eq!(promoted.id, oldest_rac.id);
        assert_eq!(promoted.status, BookingStatus::Confirmed);
        assert_eq!(promoted.berth_type, Some(BerthType::Middle));

        let moved_up = cancellation.rac_from_waiting_list.unwrap();
        assert_eq!(moved_up.id, oldest_waiting.id);
        assert_eq!(moved_up.status, BookingStatus::Rac);
        assert_eq!(moved_up.berth_type, Some(BerthType::SideLower));

        let after = reload(&service, &train).await;
        assert_eq!(after.available_confirmed_berths, 0);
        assert_eq!(after.middle_berths_available, 0);
        assert_eq!(after.available_rac_spots, 0);
        assert_eq!(after.waiting_list_count, 1);
        check_invariants(&after).unwrap();

        let all = service.list_bookings(train.id, None).await.unwrap();
        let count = |status| all.iter().filter(|b| b.status == status).count();
        assert_eq!(count(BookingStatus::Confirmed), 63);
        assert_eq!(count(BookingStatus::Rac), 18);
        assert_eq!(count(BookingStatus::WaitingList), 1);
        assert!(service.get_booking(middle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn confirmed_cancel_with_rac_but_no_waiting_list() {
        let (service, train) = setup().await;
        let bookings = fill(&service, &train, 63 + 3).await;

        let cancellation = service.cancel_booking(bookings[0].id).await.unwrap();
        assert_eq!(
            cancellation.confirmed_from_rac.map(|b| b.id),
            Some(bookings[63].id)
        );
        assert!(cancellation.rac_from_waiting_list.is_none());

        let after = reload(&service, &train).await;
        assert_eq!(after.available_confirmed_berths, 0);
        assert_eq!(after.lower_berths_available, 0);
        assert_eq!(after.available_rac_spots, 16);
        assert_eq!(after.waiting_list_count, 0);
    }

    #[tokio::test]
    async fn child_cancel_changes_nothing_and_promotes_no_one() {
        let (service, train) = setup().await;
        fill(&service, &train, 63 + 1).await;
        let child = book(&service, &train, 2, "Male").await;
        let before = reload(&service, &train).await;

        let cancellation = service.cancel_booking(child.id).await.unwrap();
        assert!(cancellation.confirmed_from_rac.is_none());

        assert_eq!(counters(&reload(&service, &train).await), counters(&before));
        let rac = service
            .list_bookings(train.id, Some(BookingStatus::Rac))
            .await
            .unwrap();
        assert_eq!(rac.len(), 1);
    }

    #[tokio::test]
    async fn rac_and_waiting_list_cancel_delete_only_the_record() {
        let (service, train) = setup().await;
        let bookings = fill(&service, &train, 63 + 18 + 1).await;
        let before = reload(&service, &train).await;

        service.cancel_booking(bookings[70].id).await.unwrap();
        service.cancel_booking(bookings[81].id).await.unwrap();

        assert_eq!(counters(&reload(&service, &train).await), counters(&before));
        assert!(service.get_booking(bookings[70].id).await.unwrap().is_none());
        assert!(service.get_booking(bookings[81].id).await.unwrap().is_none());
        assert_eq!(service.store().booking_count().await, 80);
    }

    #[tokio::test]
    async fn cancelling_twice_is_not_found() {
        let (service, train) = setup().await;
        let booking = book(&service, &train, 30, "Male").await;

        service.cancel_booking(booking.id).await.unwrap();
        let result = service.cancel_booking(booking.id).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}

mod concurrency {
    use futures_util::future::join_all;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_overbook() {
        let (service, train) = setup().await;
        let service = Arc::new(service);

        let mut users = Vec::new();
        for i in 0..100 {
            let user = service
                .create_user(NewUser::new(format!("Passenger {i}"), 30, "Male"))
                .await
                .unwrap();
            users.push(user.id);
        }

        let handles = users.into_iter().map(|user_id| {
            let service = service.clone();
            let train_id = train.id;
            tokio::spawn(async move { service.create_booking(user_id, train_id).await })
        });
        let results = join_all(handles).await;

        let mut rejections = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => {}
                Err(DomainError::NoTicketsAvailable { .. }) => rejections += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(rejections, 9);

        let all = service.list_bookings(train.id, None).await.unwrap();
        let count = |status| all.iter().filter(|b| b.status == status).count();
        assert_eq!(count(BookingStatus::Confirmed), 63);
        assert_eq!(count(BookingStatus::Rac), 18);
        assert_eq!(count(BookingStatus::WaitingList), 10);

        let after = reload(&service, &train).await;
        assert_eq!(after.available_confirmed_berths, 0);
        assert_eq!(after.available_rac_spots, 0);
        assert_eq!(after.waiting_list_count, 10);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_store_unchanged() {
        let (service, train) = setup().await;
        let before = reload(&service, &train).await;

        {
            let mut tx = service.store().lock_train(train.id).await.unwrap();
            Ledger::new(tx.train_mut()).consume_rac_spot().unwrap();
            tx.train_mut().waiting_list_count = 4;
        }

        assert_eq!(counters(&reload(&service, &train).await), counters(&before));
    }
}
