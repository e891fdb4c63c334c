//! Property Tests
//!
//! For any capacity, demand and strategy: no counter goes negative, the
//! number of orders equals the units debited, and exactly
//! `min(capacity, demand)` orders succeed.

use crate::common::*;
use proptest::prelude::*;

fn strategy_at(index: usize) -> LockStrategy {
    all_strategies()[index % 3]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn orders_conserve_every_counter(
        capacity in 0u64..12,
        buyers in 1u64..16,
        strategy in 0usize..3,
    ) {
        let strategy = strategy_at(strategy);
        let service = Arc::new(fast_service());
        seed(&service, capacity, capacity + 3, buyers, 2_500);

        let results = race(&service, buyers, strategy);
        let succeeded = results.iter().filter(|r| r.is_ok()).count() as u64;
        prop_assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_insufficient()));

        let snapshot = service.snapshot();
        let (coupons, stock, points) = levels(&snapshot, buyers);
        prop_assert_eq!(succeeded, capacity.min(buyers));
        prop_assert_eq!(snapshot.order_count as u64, succeeded);
        prop_assert_eq!(coupons, capacity - succeeded);
        prop_assert_eq!(stock, capacity + 3 - succeeded);
        prop_assert_eq!(points, buyers * 2_500 - succeeded * 1_000);
    }

    #[test]
    fn repeated_orders_stop_at_the_point_balance(
        balance in 0u64..6_000,
        strategy in 0usize..3,
    ) {
        let service = fast_service();
        seed(&service, 100, 100, 1, balance);
        let strategy = strategy_at(strategy);

        let mut placed = 0u64;
        loop {
            match service.place_order(UserId(1), PRODUCT, COUPON, strategy) {
                Ok(_) => placed += 1,
                Err(e) => {
                    prop_assert!(e.is_insufficient());
                    break;
                }
            }
        }

        prop_assert_eq!(placed, balance / 1_000);
        prop_assert_eq!(service.points.balance(UserId(1)).unwrap(), balance % 1_000);
        prop_assert_eq!(levels(&service.snapshot(), 1).0, 100 - placed);
    }
}
