//! Blocking Behavior
//!
//! A slow order (an external step of 2 seconds inside the attempt) races a
//! point-only operation on the same buyer. Under the pessimistic strategy
//! the point row is locked for the whole step, so the point operation
//! waits; under hybrid the point leg is optimistic and the operation
//! completes promptly.

use crate::common::*;
use std::sync::mpsc;

const SLOW_STEP: Duration = Duration::from_secs(2);
const BUYER: UserId = UserId(1);

/// Service whose orders signal `entered` once every leg is obtained, then
/// sleep for `step`.
fn slow_service(step: Duration) -> (Arc<OrderService>, mpsc::Receiver<()>) {
    init_tracing();
    let (entered_tx, entered_rx) = mpsc::sync_channel(8);
    let service = OrderService::builder()
        .retry_delay_ms(1)
        .external_step(move |_: &OrderRequest| -> orderlock_core::Result<()> {
            let _ = entered_tx.try_send(());
            thread::sleep(step);
            Ok(())
        })
        .build_in_memory()
        .expect("valid configuration");
    seed(&service, 10, 10, 1, 10_000);
    (Arc::new(service), entered_rx)
}

/// Start a slow order under `strategy` and measure how long a zero-point
/// spend on the same buyer takes once the order holds its legs.
fn zero_spend_behind_slow_order(strategy: LockStrategy) -> Duration {
    let (service, entered) = slow_service(SLOW_STEP);

    let slow_order = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.place_order(BUYER, PRODUCT, COUPON, strategy))
    };
    entered.recv().expect("slow order never reached its external step");

    let started = Instant::now();
    let balance = service
        .points
        .use_points(BUYER, 0, LockMode::Pessimistic)
        .expect("zero spend");
    let elapsed = started.elapsed();

    slow_order.join().unwrap().expect("slow order");
    assert!(balance == 10_000 || balance == 9_000);
    assert_eq!(service.points.balance(BUYER).unwrap(), 9_000);
    assert_eq!(service.order_count(), 1);
    elapsed
}

// ============================================================================
// Pessimistic vs hybrid
// ============================================================================

#[test]
fn pessimistic_slow_order_blocks_point_operation() {
    let waited = zero_spend_behind_slow_order(LockStrategy::pessimistic());
    assert!(
        waited >= Duration::from_millis(1_200),
        "point operation finished after {:?}, before the slow order released its lock",
        waited
    );
}

#[test]
fn hybrid_slow_order_does_not_block_point_operation() {
    let waited = zero_spend_behind_slow_order(LockStrategy::hybrid());
    assert!(
        waited < Duration::from_secs(1),
        "point operation waited {:?} behind an optimistic point leg",
        waited
    );
}

#[test]
fn hybrid_slow_order_still_blocks_coupon_contenders() {
    let (service, entered) = slow_service(Duration::from_millis(500));
    service.store().insert(UserPoint::new(UserId(2), 10_000));

    let slow_order = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.place_order(BUYER, PRODUCT, COUPON, LockStrategy::hybrid()))
    };
    entered.recv().unwrap();
    let first_entered = Instant::now();

    // The second order queues on the coupon lock until the first commits,
    // so it reaches its own external step only after the first one ends.
    let second_order = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            service.place_order(UserId(2), PRODUCT, COUPON, LockStrategy::hybrid())
        })
    };
    entered.recv().unwrap();
    let waited = first_entered.elapsed();

    slow_order.join().unwrap().unwrap();
    second_order.join().unwrap().unwrap();
    assert!(waited >= Duration::from_millis(400), "second order entered after {:?}", waited);
    assert_eq!(service.order_count(), 2);
}

// ============================================================================
// Hybrid reconciliation
// ============================================================================

#[test]
fn hybrid_point_leg_reconciles_a_concurrent_top_up() {
    let (service, entered) = slow_service(Duration::from_millis(200));

    let slow_order = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.place_order(BUYER, PRODUCT, COUPON, LockStrategy::hybrid()))
    };
    entered.recv().unwrap();

    // Commits while the order's point leg is in flight, so the order's
    // conditional point write loses and the order is retried.
    let started = Instant::now();
    service.points.charge(BUYER, 500, LockMode::Optimistic).unwrap();
    assert!(started.elapsed() < Duration::from_millis(150));

    slow_order.join().unwrap().unwrap();
    assert_eq!(service.points.balance(BUYER).unwrap(), 10_000 + 500 - 1_000);
    assert!(service.stats().conflicts >= 1);
    assert_eq!(service.order_count(), 1);

    let (coupons, stock, _) = levels(&service.snapshot(), 1);
    assert_eq!((coupons, stock), (9, 9));
}
