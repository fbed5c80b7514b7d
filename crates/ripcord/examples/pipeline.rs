// Copyright (c) The Ripcord Project Authors.
// Licensed under the MIT License.

//! End-to-end pipeline example that wraps a flaky downstream service with all
//! three policies by:
//!
//! 1. Bounding the call rate with a fixed-window rate limiter
//! 2. Tripping a circuit breaker when the failure rate crosses the threshold
//! 3. Retrying transient failures with capped exponential backoff
//! 4. Serving a fallback answer whenever the pipeline fails terminally

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ripcord::breaker::BreakerOptions;
use ripcord::limiter::LimiterOptions;
use ripcord::pipeline::Pipeline;
use ripcord::retry::{RetryOptions, RetryPolicy};
use ripcord::{RecoveryInfo, RegistryBuilder};
use tick::Clock;

static CALLS: AtomicU32 = AtomicU32::new(0);

/// A downstream service that fails for a while, then recovers.
async fn flaky_lookup() -> Result<String, String> {
    let call = CALLS.fetch_add(1, Ordering::Relaxed);
    if call < 12 {
        Err("connection timed out".to_string())
    } else {
        Ok(format!("fresh result #{call}"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let clock = Clock::new_tokio();
    let mut builder = RegistryBuilder::new(&clock);

    let breaker = builder.circuit_breaker(
        "lookup-service",
        BreakerOptions::new()
            .sliding_window_size(4)
            .failure_rate_threshold(75.0)
            .wait_duration_in_open_state(Duration::from_millis(500))
            .permitted_calls_in_half_open(2),
    );
    let limiter = builder.rate_limiter(
        "lookup-service",
        LimiterOptions::new()
            .limit_for_period(20)
            .limit_refresh_period(Duration::from_secs(1)),
    );

    builder.pipeline(
        Pipeline::builder("lookup", &clock)
            .rate_limiter(limiter)
            .circuit_breaker(breaker)
            .retry(RetryPolicy::new(
                RetryOptions::new()
                    .max_attempts(3)
                    .base_delay(Duration::from_millis(50))
                    .backoff_multiplier(2.0)
                    .max_delay(Duration::from_millis(200)),
                |error: &String| {
                    if error.contains("timed out") {
                        RecoveryInfo::retry()
                    } else {
                        RecoveryInfo::never()
                    }
                },
            ))
            .fallback(|error| {
                println!("  fallback engaged: {error}");
                Ok("cached result".to_string())
            })
            .on_outcome(|event| {
                println!("  [{}] {:?} -> {:?}", event.pipeline, event.stage, event.outcome);
            })
            .build(),
    );

    let registry = builder.build();

    for round in 0..8 {
        println!("round {round}:");
        match registry.execute("lookup", flaky_lookup).await {
            Ok(value) => println!("  answer: {value}"),
            Err(error) => println!("  error: {error}"),
        }

        if let Some(status) = registry.status("lookup-service") {
            if let Some(breaker) = status.breaker {
                println!("  breaker: {:?}", breaker.state);
            }
        }

        clock.delay(Duration::from_millis(200)).await;
    }
}
