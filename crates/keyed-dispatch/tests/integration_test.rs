use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keyed_dispatch::{DispatchError, Processor, Router};
use tokio::sync::Notify;
use tokio::time::timeout;

// Sentinel values driving fault injection in the test processor.
const POISON: u32 = 0xDEAD;
const BOMB: u32 = 0xB002;
const STALL: u32 = 0x57A1;

#[derive(Debug)]
struct Reading {
    device: u64,
    value: u32,
}

#[derive(Debug, thiserror::Error)]
enum ReadingError {
    #[error("reading rejected: {0}")]
    Rejected(u32),
    #[error("device id missing")]
    MissingDevice,
}

/// Records every processed reading and tracks per-device in-flight counts,
/// so tests can assert ordering and the absence of same-key overlap.
#[derive(Clone, Default)]
struct TestProcessor {
    seen: Arc<Mutex<Vec<(u64, u32)>>>,
    active: Arc<Mutex<HashMap<u64, usize>>>,
    overlaps: Arc<AtomicUsize>,
    gate: Arc<Notify>,
    delay: Duration,
}

impl TestProcessor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn recorded(&self, device: u64) -> Vec<u32> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| *d == device)
            .map(|(_, v)| *v)
            .collect()
    }
}

#[async_trait]
impl Processor for TestProcessor {
    type Key = u64;
    type Input = Reading;
    type Output = u32;
    type Error = ReadingError;

    fn key_of(&self, input: &Reading) -> Result<u64, ReadingError> {
        if input.device == 0 {
            return Err(ReadingError::MissingDevice);
        }
        Ok(input.device)
    }

    fn endpoint_of(&self, key: &u64) -> String {
        format!("/test/readings/{key:012X}/")
    }

    async fn process(&self, input: Reading) -> Result<u32, ReadingError> {
        let Reading { device, value } = input;

        {
            let mut active = self.active.lock().unwrap();
            let in_flight = active.entry(device).or_insert(0);
            *in_flight += 1;
            if *in_flight > 1 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
        }

        if value == STALL {
            self.gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.seen.lock().unwrap().push((device, value));

        {
            let mut active = self.active.lock().unwrap();
            if let Some(in_flight) = active.get_mut(&device) {
                *in_flight -= 1;
            }
        }

        if value == POISON {
            return Err(ReadingError::Rejected(value));
        }
        if value == BOMB {
            panic!("synthetic processing crash");
        }
        Ok(value.wrapping_mul(2))
    }
}

#[tokio::test]
async fn request_returns_processing_output() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    tokio::spawn(router.run());

    let out = client
        .request(Reading {
            device: 7,
            value: 21,
        })
        .await
        .unwrap();
    assert_eq!(out, 42);
}

#[tokio::test]
async fn same_key_messages_are_serialized_in_arrival_order() {
    let processor = TestProcessor::with_delay(Duration::from_millis(2));
    let probe = processor.clone();
    let (router, client) = Router::new("/test/readings/", processor);
    tokio::spawn(router.run());

    for value in 0..32 {
        client.send(Reading { device: 5, value }).unwrap();
    }
    // FIFO per key: once this request comes back, everything queued before
    // it for the same device has been processed.
    let out = client
        .request(Reading {
            device: 5,
            value: 100,
        })
        .await
        .unwrap();
    assert_eq!(out, 200);

    let mut expected: Vec<u32> = (0..32).collect();
    expected.push(100);
    assert_eq!(probe.recorded(5), expected);
    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_same_key_burst_never_overlaps() {
    let processor = TestProcessor::with_delay(Duration::from_millis(1));
    let probe = processor.clone();
    let (router, client) = Router::new("/test/readings/", processor);
    tokio::spawn(router.run());

    let mut joins = Vec::new();
    for value in 0..16u32 {
        let client = client.clone();
        joins.push(tokio::spawn(async move {
            client.request(Reading { device: 9, value }).await
        }));
    }
    for join in joins {
        join.await.unwrap().unwrap();
    }

    assert_eq!(probe.recorded(9).len(), 16);
    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn back_to_back_first_messages_reach_one_worker_in_order() {
    // Two messages for an unseen key arrive before any worker exists; both
    // must be observed, in order, by the single worker created for the key.
    let processor = TestProcessor::default();
    let probe = processor.clone();
    let (router, client) = Router::new("/test/readings/", processor);
    tokio::spawn(router.run());

    client.send(Reading { device: 3, value: 1 }).unwrap();
    let out = client
        .request(Reading { device: 3, value: 2 })
        .await
        .unwrap();
    assert_eq!(out, 4);

    assert_eq!(probe.recorded(3), vec![1, 2]);
    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_key_does_not_delay_other_keys() {
    let processor = TestProcessor::default();
    let probe = processor.clone();
    let (router, client) = Router::new("/test/readings/", processor);
    tokio::spawn(router.run());

    // Device 1 parks inside its processing callback.
    let stalled = client
        .submit(Reading {
            device: 1,
            value: STALL,
        })
        .unwrap();

    // Device 2 must complete while device 1 is still parked.
    let out = timeout(
        Duration::from_secs(1),
        client.request(Reading { device: 2, value: 8 }),
    )
    .await
    .expect("distinct key was blocked by a stalled worker")
    .unwrap();
    assert_eq!(out, 16);
    assert!(probe.recorded(1).is_empty());

    probe.gate.notify_one();
    let out = stalled.outcome().await.unwrap();
    assert_eq!(out, STALL.wrapping_mul(2));
}

#[tokio::test]
async fn processing_error_becomes_failure_reply() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    tokio::spawn(router.run());

    let err = client
        .request(Reading {
            device: 4,
            value: POISON,
        })
        .await
        .unwrap_err();
    match err {
        DispatchError::Processing(message) => assert!(message.contains("rejected")),
        other => panic!("unexpected error: {other}"),
    }

    // The worker survives the fault and keeps serving its key.
    let out = client
        .request(Reading { device: 4, value: 6 })
        .await
        .unwrap();
    assert_eq!(out, 12);
}

#[tokio::test]
async fn fire_and_forget_fault_is_not_surfaced() {
    let processor = TestProcessor::default();
    let probe = processor.clone();
    let (router, client) = Router::new("/test/readings/", processor);
    tokio::spawn(router.run());

    client
        .send(Reading {
            device: 6,
            value: POISON,
        })
        .unwrap();

    // The fault is only logged; the key keeps processing in order.
    let out = client
        .request(Reading { device: 6, value: 3 })
        .await
        .unwrap();
    assert_eq!(out, 6);
    assert_eq!(probe.recorded(6), vec![POISON, 3]);
}

#[tokio::test]
async fn callback_panic_is_contained_and_replied() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    tokio::spawn(router.run());

    let err = client
        .request(Reading {
            device: 8,
            value: BOMB,
        })
        .await
        .unwrap_err();
    match err {
        DispatchError::Panicked(message) => assert!(message.contains("synthetic")),
        other => panic!("unexpected error: {other}"),
    }

    // The panic did not kill the worker.
    let out = client
        .request(Reading { device: 8, value: 2 })
        .await
        .unwrap();
    assert_eq!(out, 4);
}

#[tokio::test]
async fn key_extraction_failure_becomes_failure_reply() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    tokio::spawn(router.run());

    let err = client
        .request(Reading { device: 0, value: 1 })
        .await
        .unwrap_err();
    match err {
        DispatchError::Processing(message) => assert!(message.contains("missing")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn router_stops_workers_once_clients_are_gone() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    let router = tokio::spawn(router.run());

    client
        .request(Reading {
            device: 11,
            value: 1,
        })
        .await
        .unwrap();
    client
        .request(Reading {
            device: 12,
            value: 1,
        })
        .await
        .unwrap();
    drop(client);

    timeout(Duration::from_secs(1), router)
        .await
        .expect("router did not shut down")
        .unwrap();
}

#[tokio::test]
async fn request_against_dead_router_fails_fast() {
    let (router, client) = Router::new("/test/readings/", TestProcessor::default());
    let handle = tokio::spawn(router.run());
    handle.abort();
    let _ = handle.await;

    let err = client
        .request(Reading { device: 2, value: 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RouterClosed));
}
