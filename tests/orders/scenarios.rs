//! Flash-sale Scenarios
//!
//! 100 buyers race for 100 coupons and 100 stock units under each strategy.

use crate::common::*;

const BUYERS: u64 = 100;

fn flash_sale(strategy: LockStrategy) {
    let service = Arc::new(fast_service());
    seed(&service, 100, 100, BUYERS, 10_000);

    let results = race(&service, BUYERS, strategy);
    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert!(failures.is_empty(), "{}: {:?}", strategy, failures);

    let snapshot = service.snapshot();
    assert_eq!(levels(&snapshot, BUYERS), (0, 0, BUYERS * 9_000), "{}", strategy);
    assert_eq!(snapshot.order_count, 100);
    assert_eq!(service.order_count(), 100);

    // Every buyer got exactly one order, with a distinct id
    let mut ids: Vec<_> = service.orders().iter().map(|o| o.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    for user in 1..=BUYERS {
        assert_eq!(service.orders_for_user(UserId(user)).len(), 1);
    }
}

// ============================================================================
// One test per strategy
// ============================================================================

#[test]
fn optimistic_flash_sale_sells_out_exactly() {
    flash_sale(LockStrategy::optimistic());
}

#[test]
fn pessimistic_flash_sale_sells_out_exactly() {
    flash_sale(LockStrategy::pessimistic());
}

#[test]
fn hybrid_flash_sale_sells_out_exactly() {
    flash_sale(LockStrategy::hybrid());
}

// ============================================================================
// Strategy trade-offs
// ============================================================================

#[test]
fn pessimistic_flash_sale_never_conflicts() {
    let service = Arc::new(fast_service());
    seed(&service, 50, 50, 50, 10_000);

    race(&service, 50, LockStrategy::pessimistic());

    let stats = service.stats();
    assert_eq!(stats.conflicts, 0);
    assert_eq!(stats.committed, 50);
    assert_eq!(stats.started, 50);
}

#[test]
fn optimistic_flash_sale_converts_conflicts_into_orders() {
    let service = Arc::new(fast_service());
    seed(&service, 50, 50, 50, 10_000);

    let results = race(&service, 50, LockStrategy::optimistic());
    assert!(results.iter().all(|r| r.is_ok()));

    let stats = service.stats();
    assert_eq!(stats.committed, 50);
    assert_eq!(stats.started, stats.committed + stats.conflicts);
}
