//! Retry Bounds
//!
//! The retry loop converts conflicts into further attempts, never retries a
//! business error, and always stops at an attempt limit, a deadline or a
//! cancellation.

use crate::common::*;

fn service_with(build: impl FnOnce(OrderServiceBuilder) -> OrderServiceBuilder) -> OrderService {
    init_tracing();
    let service = build(OrderService::builder().retry_delay_ms(1))
        .build_in_memory()
        .expect("valid configuration");
    seed(&service, 10, 10, 1, 10_000);
    service
}

// ============================================================================
// Business errors are terminal
// ============================================================================

#[test]
fn exhausted_coupon_is_not_retried() {
    let service = fast_service();
    seed(&service, 0, 10, 1, 10_000);

    let err = service
        .place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap_err();
    assert!(err.is_insufficient());
    assert_eq!(service.stats().started, 1);
    assert_eq!(service.stats().business_aborts, 1);
}

#[test]
fn missing_row_is_not_retried() {
    let service = fast_service();
    seed(&service, 10, 10, 1, 10_000);

    let err = service
        .place_order(UserId(1), ProductId(99), COUPON, LockStrategy::hybrid())
        .unwrap_err();
    assert_eq!(err, Error::NotFound(ResourceKey::stock(ProductId(99))));
    assert_eq!(service.stats().started, 1);
}

// ============================================================================
// Bounds on conflicts
// ============================================================================

// A row held by a pessimistic lock makes every optimistic commit on it
// fail with a retryable conflict.

#[test]
fn attempt_limit_stops_the_loop() {
    let service = service_with(|b| b.max_attempts(3));
    let (_row, _lock) = service
        .store()
        .load_for_update(ResourceKey::coupon(COUPON))
        .unwrap();

    let err = service
        .place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap_err();
    assert_eq!(
        err,
        Error::RetryExhausted {
            attempts: 3,
            cause: ExhaustionCause::MaxAttempts
        }
    );
    assert_eq!(service.stats().conflicts, 3);
    assert_eq!(levels(&service.snapshot(), 1), (10, 10, 10_000));
}

#[test]
fn deadline_stops_the_loop() {
    let service = service_with(|b| b.timeout_ms(100));
    let (_row, _lock) = service
        .store()
        .load_for_update(ResourceKey::coupon(COUPON))
        .unwrap();

    let started = Instant::now();
    let err = service
        .place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::RetryExhausted {
            cause: ExhaustionCause::Deadline,
            ..
        }
    ));
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn cancellation_stops_the_loop() {
    let token = CancellationToken::new();
    let service = service_with(|b| b.retry_delay_ms(20).cancellation(token.clone()));
    let (_row, _lock) = service
        .store()
        .load_for_update(ResourceKey::coupon(COUPON))
        .unwrap();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        token.cancel();
    });

    let err = service
        .place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap_err();
    canceller.join().unwrap();

    match err {
        Error::RetryExhausted { attempts, cause } => {
            assert_eq!(cause, ExhaustionCause::Cancelled);
            assert!(attempts >= 1);
        }
        other => panic!("expected cancellation, got {}", other),
    }
}

#[test]
fn conflict_resolves_once_the_lock_is_released() {
    let service = Arc::new(service_with(|b| b));
    let holder = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            let (_row, _lock) = service
                .store()
                .load_for_update(ResourceKey::coupon(COUPON))
                .unwrap();
            thread::sleep(Duration::from_millis(50));
        })
    };
    thread::sleep(Duration::from_millis(10));

    service
        .place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap();
    holder.join().unwrap();
    assert_eq!(service.order_count(), 1);
}

// ============================================================================
// Single attempts
// ============================================================================

#[test]
fn single_attempt_surfaces_the_conflict() {
    let service = fast_service();
    seed(&service, 10, 10, 1, 10_000);
    let (_row, _lock) = service
        .store()
        .load_for_update(ResourceKey::stock(PRODUCT))
        .unwrap();

    let err = service
        .try_place_order(UserId(1), PRODUCT, COUPON, LockStrategy::optimistic())
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(service.stats().started, 1);
    assert_eq!(service.order_count(), 0);
}
