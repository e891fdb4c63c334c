//! Conservation Under Contention
//!
//! With capacity C and N > C attempts, exactly C succeed and N - C fail
//! with `InsufficientResource`.

use crate::common::*;

fn oversubscribed(strategy: LockStrategy, capacity: u64, buyers: u64) {
    let service = Arc::new(fast_service());
    seed(&service, capacity, 1_000, buyers, 10_000);

    let results = race(&service, buyers, strategy);
    let succeeded = results.iter().filter(|r| r.is_ok()).count() as u64;
    let rejected: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    assert_eq!(succeeded, capacity, "{}", strategy);
    assert_eq!(rejected.len() as u64, buyers - capacity, "{}", strategy);
    for err in rejected {
        assert!(
            matches!(err, Error::InsufficientResource { key, .. } if *key == ResourceKey::coupon(COUPON)),
            "{}: {}",
            strategy,
            err
        );
    }

    let snapshot = service.snapshot();
    let (coupons, stock, points) = levels(&snapshot, buyers);
    assert_eq!(coupons, 0);
    assert_eq!(stock, 1_000 - capacity);
    assert_eq!(points, buyers * 10_000 - capacity * 1_000);
    assert_eq!(snapshot.order_count as u64, capacity);
}

#[test]
fn coupon_capacity_is_conserved_under_every_strategy() {
    for strategy in all_strategies() {
        oversubscribed(strategy, 10, 40);
    }
}

#[test]
fn stock_runs_out_before_coupons() {
    let service = Arc::new(fast_service());
    seed(&service, 100, 5, 20, 10_000);

    let results = race(&service, 20, LockStrategy::hybrid());
    let rejected: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(rejected.len(), 15);
    assert!(rejected.iter().all(|e| matches!(
        e,
        Error::InsufficientResource { key, .. } if *key == ResourceKey::stock(PRODUCT)
    )));

    let (coupons, stock, _) = levels(&service.snapshot(), 20);
    assert_eq!((coupons, stock), (95, 0));
}

#[test]
fn poor_buyers_are_rejected_without_touching_shared_rows() {
    let service = Arc::new(fast_service());
    seed(&service, 10, 10, 10, 999);

    let results = race(&service, 10, LockStrategy::optimistic());
    assert!(results.iter().all(|r| matches!(r, Err(e) if e.is_insufficient())));
    assert_eq!(levels(&service.snapshot(), 10), (10, 10, 9_990));
    assert_eq!(service.order_count(), 0);
}

// ============================================================================
// Mixed strategies on shared rows
// ============================================================================

#[test]
fn mixed_lock_modes_on_the_same_rows_conserve_counters() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x0dde_10c4);
    let mut mode = || {
        if rng.gen_bool(0.5) {
            LockMode::Optimistic
        } else {
            LockMode::Pessimistic
        }
    };
    let strategies: Vec<LockStrategy> = (0..60)
        .map(|_| LockStrategy {
            coupon: mode(),
            stock: mode(),
            point: mode(),
        })
        .collect();

    let service = Arc::new(fast_service());
    seed(&service, 45, 1_000, 60, 10_000);
    let barrier = Arc::new(Barrier::new(strategies.len()));

    let handles: Vec<_> = strategies
        .into_iter()
        .enumerate()
        .map(|(i, strategy)| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.place_order(UserId(i as u64 + 1), PRODUCT, COUPON, strategy)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 45);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.is_insufficient()));
    assert_eq!(levels(&service.snapshot(), 60), (0, 955, 60 * 10_000 - 45 * 1_000));
}
