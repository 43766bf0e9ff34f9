// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

mod common;

use alloy::primitives::Address;
use common::MockChainClient;
use mintworx::domain::error::SniperError;
use mintworx::infrastructure::network::provider::ChainClient;
use mintworx::infrastructure::network::throttle::ThrottledChainClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const TARGET: Address = Address::new([0xC0; 20]);
const SPACING: Duration = Duration::from_secs(2);
const TIMEOUT: Duration = Duration::from_secs(15);

fn throttled(client: &Arc<MockChainClient>) -> ThrottledChainClient {
    ThrottledChainClient::new(client.clone(), SPACING, TIMEOUT)
}

#[tokio::test(start_paused = true)]
async fn read_calls_are_spaced_not_dropped() {
    let client = Arc::new(MockChainClient::default());
    let throttled = throttled(&client);

    let start = Instant::now();
    throttled.get_code(TARGET).await.unwrap();
    let first = start.elapsed();
    throttled.get_code(TARGET).await.unwrap();
    let second = start.elapsed();

    assert!(first < Duration::from_millis(100));
    // The second call is delayed to the next slot, never rejected.
    assert!(second >= SPACING);
    assert!(second < SPACING + Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn distinct_methods_are_throttled_independently() {
    let client = Arc::new(MockChainClient::default());
    let throttled = throttled(&client);

    let start = Instant::now();
    throttled.get_code(TARGET).await.unwrap();
    throttled.get_block_number().await.unwrap();
    throttled.get_transaction_count(TARGET).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn hung_call_times_out() {
    let client = Arc::new(MockChainClient::default());
    client.set_get_code_hanging(true);
    let throttled = throttled(&client);

    let start = Instant::now();
    let err = throttled.get_code(TARGET).await.unwrap_err();
    match err {
        SniperError::Timeout { method, elapsed_ms } => {
            assert_eq!(method, "getCode");
            assert_eq!(elapsed_ms, TIMEOUT.as_millis() as u64);
        }
        other => panic!("expected a timeout, got {other}"),
    }
    assert!(start.elapsed() >= TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_extend_the_cooldown() {
    let client = Arc::new(MockChainClient::default());
    client.set_get_code_failing(true);
    let throttled = throttled(&client);

    for _ in 0..4 {
        throttled.get_code(TARGET).await.unwrap_err();
    }

    // Past the error threshold the reserved slot is four spacings out.
    let start = Instant::now();
    throttled.get_code(TARGET).await.unwrap_err();
    assert!(start.elapsed() >= SPACING * 4);
}

#[tokio::test(start_paused = true)]
async fn gas_estimation_is_timed_but_never_spaced() {
    let client = Arc::new(MockChainClient::default());
    let throttled = throttled(&client);

    let tx = alloy::rpc::types::TransactionRequest::default();
    let start = Instant::now();
    for _ in 0..5 {
        // Reverting estimates are still instant answers, not delayed ones.
        throttled.estimate_gas(&tx).await.unwrap_err();
    }
    assert!(start.elapsed() < Duration::from_millis(100));
}
