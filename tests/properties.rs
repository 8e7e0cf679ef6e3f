//! Property tests across module boundaries.

use proptest::prelude::*;

use coachdesk::adapters::memory::InMemoryStore;
use coachdesk::domain::foundation::{AttributeMap, ClientId, Scalar, Timestamp, TrainerId};
use coachdesk::domain::scheduling::{Booking, BookingStatus};
use coachdesk::domain::workflow::{conditions_match, ConditionSpec, Conditions, Operator};
use coachdesk::ports::{BookingRepository, BookingWrite};

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Null),
        any::<bool>().prop_map(Scalar::Bool),
        (-50i64..50).prop_map(Scalar::Int),
        "[a-c]{0,3}".prop_map(Scalar::Text),
    ]
}

proptest! {
    /// However requests arrive, held bookings accepted by the store never
    /// overlap one another.
    #[test]
    fn accepted_bookings_never_overlap(requests in prop::collection::vec((0i64..48, 1i64..6), 1..25)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let store = InMemoryStore::new();
            let trainer = TrainerId::new();
            let client = ClientId::new();
            let now = Timestamp::now();
            let base = now.plus_minutes(24 * 60);

            for (start_slot, length) in requests {
                let start = base.plus_minutes(start_slot * 30);
                let booking = Booking::schedule(trainer, client, start, start.plus_minutes(length * 30), None, None, now).unwrap();
                let write = store.insert_checked(&booking).await.unwrap();
                prop_assert!(matches!(write, BookingWrite::Written | BookingWrite::Conflict(_)));
            }

            let held = store
                .list_held_between(trainer, base, base.plus_minutes(60 * 48))
                .await
                .unwrap();
            for (i, a) in held.iter().enumerate() {
                prop_assert_eq!(a.status, BookingStatus::Pending);
                for b in held.iter().skip(i + 1) {
                    let overlap = a.start.is_before(&b.end) && b.start.is_before(&a.end);
                    prop_assert!(!overlap, "{:?} overlaps {:?}", (a.start, a.end), (b.start, b.end));
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn empty_conditions_match_anything(data in prop::collection::btree_map("[a-d]", scalar(), 0..4)) {
        prop_assert!(conditions_match(&Conditions::new(), &data));
    }

    #[test]
    fn not_equals_negates_equals(field in "[a-d]", actual in scalar(), expected in scalar()) {
        let mut data = AttributeMap::new();
        data.insert(field.clone(), actual);

        let mut eq = Conditions::new();
        eq.insert(field.clone(), ConditionSpec::Compare { operator: Operator::Equals, value: expected.clone() });
        let mut ne = Conditions::new();
        ne.insert(field, ConditionSpec::Compare { operator: Operator::NotEquals, value: expected });

        prop_assert_ne!(conditions_match(&eq, &data), conditions_match(&ne, &data));
    }

    #[test]
    fn bare_scalar_means_equality(actual in scalar(), expected in scalar()) {
        let mut data = AttributeMap::new();
        data.insert("f".to_string(), actual);

        let mut bare = Conditions::new();
        bare.insert("f".to_string(), ConditionSpec::Equals(expected.clone()));
        let mut explicit = Conditions::new();
        explicit.insert("f".to_string(), ConditionSpec::Compare { operator: Operator::Equals, value: expected });

        prop_assert_eq!(conditions_match(&bare, &data), conditions_match(&explicit, &data));
    }
}
