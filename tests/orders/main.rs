//! Order Integration Tests
//!
//! Tests for orderlock: the three strategies under contention, atomicity,
//! blocking behavior, retry bounds and the single-resource services.


mod atomicity;
mod blocking;
mod conservation;
mod properties;
mod retry;
mod scenarios;
mod services;
