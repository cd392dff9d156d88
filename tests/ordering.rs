//! Send queue ordering and delivery across a simulated pair.

mod common;

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use common::{GUEST_RELAY, HOST_RELAY, Pair, Side};
use name_relay::{Error, RelayFragment, StdUrlCodec};
use proptest::prelude::*;

#[test]
fn test_messages_use_separate_navigations() {
    common::init_tracing();
    let pair = Pair::ready("abc123");

    pair.host.post_message("hello").unwrap();
    assert!(pair.host.is_in_flight());
    assert_eq!(pair.host_doc.frames.pending_len(), 1);

    // Completing "hello" happens before "world" is even queued.
    let hello = pair.relay_one(Side::Host).unwrap();
    assert_eq!(hello.name, "hello");
    assert!(!pair.host.is_in_flight());

    pair.host.post_message("world").unwrap();
    let world = pair.relay_one(Side::Host).unwrap();
    assert_eq!(world.name, "world");

    assert_eq!(pair.guest_doc.messages(), ["hello", "world"]);
    assert!(!pair.host_doc.frames.saw_overlap());
}

#[test]
fn test_second_post_waits_for_completion() {
    let pair = Pair::ready("abc123");

    pair.host.post_message("hello").unwrap();
    pair.host.post_message("world").unwrap();

    // Only one navigation outstanding; "world" waits in the queue.
    assert_eq!(pair.host_doc.frames.pending_len(), 1);
    assert_eq!(pair.host.pending_count(), 1);

    pair.relay_one(Side::Host);
    assert_eq!(pair.guest_doc.messages(), ["hello"]);
    assert_eq!(pair.host_doc.frames.pending_len(), 1);

    pair.relay_one(Side::Host);
    assert_eq!(pair.guest_doc.messages(), ["hello", "world"]);
    assert!(pair.host.status().is_idle());
    assert!(!pair.host_doc.frames.saw_overlap());
}

#[test]
fn test_relay_urls() {
    let pair = Pair::ready("abc123");

    pair.host.post_message("to guest").unwrap();
    pair.guest.post_message("to host").unwrap();

    let host_nav = pair.relay_one(Side::Host).unwrap();
    assert!(host_nav.url.starts_with(&format!("{GUEST_RELAY}#_3")));
    assert_eq!(host_nav.url, pair.host.relay_url());

    let fragment = RelayFragment::from_url(&host_nav.url, &StdUrlCodec).unwrap();
    assert_eq!(
        fragment,
        RelayFragment::ToGuest {
            remote_url: pair.host.remote_bootstrap_url().unwrap().to_string(),
            channel: "abc123".into(),
        }
    );

    let guest_nav = pair.relay_one(Side::Guest).unwrap();
    assert_eq!(guest_nav.url, format!("{HOST_RELAY}#_2abc123"));
}

#[test]
fn test_messages_carry_sender_origin() {
    let pair = Pair::ready("abc123");

    pair.host.post_message("from host").unwrap();
    pair.guest.post_message("from guest").unwrap();
    pair.settle();

    assert_eq!(
        pair.guest_doc.inbox.lock().clone(),
        [("from host".to_string(), "https://a.example".to_string())]
    );
    assert_eq!(
        pair.host_doc.inbox.lock().clone(),
        [("from guest".to_string(), "https://b.example".to_string())]
    );
}

#[test]
fn test_message_content_is_opaque() {
    let pair = Pair::ready("abc123");
    let awkward = "{\"a\":[1,2]} #_3 %41 + ünïcode";

    pair.guest.post_message(awkward).unwrap();
    pair.guest.post_message("").unwrap();
    pair.settle();

    assert_eq!(pair.host_doc.messages(), [awkward, ""]);
}

#[test]
fn test_ready_is_reserved() {
    let pair = Pair::ready("abc123");

    let err = pair.host.post_message("ready").unwrap_err();
    assert!(matches!(err, Error::ReservedMessage { .. }));
    let err = pair.guest.post_message("ready").unwrap_err();
    assert!(matches!(err, Error::ReservedMessage { .. }));
    assert_eq!(pair.host.pending_count(), 0);
}

#[test]
fn test_failed_navigation_keeps_message_at_head() {
    let pair = Pair::ready("abc123");

    pair.host_doc.frames.set_fail_navigation(true);
    let err = pair.host.post_message("first").unwrap_err();
    assert!(err.is_frame_error());
    assert_eq!(pair.host.pending_count(), 1);
    assert!(!pair.host.is_in_flight());

    pair.host_doc.frames.set_fail_navigation(false);
    pair.host.post_message("second").unwrap();
    pair.settle();

    assert_eq!(pair.guest_doc.messages(), ["first", "second"]);
}

#[test]
fn test_post_error_does_not_unqueue_message() {
    let pair = Pair::ready("abc123");

    pair.host_doc.frames.set_fail_navigation(true);
    assert!(pair.host.post_message("first").is_err());
    // The error comes from resending "first", but "second" is queued too.
    assert!(pair.host.post_message("second").is_err());
    assert_eq!(pair.host.pending_count(), 2);

    pair.host_doc.frames.set_fail_navigation(false);
    pair.host.post_message("third").unwrap();
    pair.settle();

    assert_eq!(pair.guest_doc.messages(), ["first", "second", "third"]);
    assert!(!pair.host_doc.frames.saw_overlap());
}

// ============================================================================
// Concurrency
// ============================================================================

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn thread_messages(t: usize) -> Vec<String> {
    (0..PER_THREAD).map(|i| format!("t{t}-{i}")).collect()
}

fn assert_each_thread_in_order(delivered: &[String]) {
    assert_eq!(delivered.len(), THREADS * PER_THREAD);
    for t in 0..THREADS {
        let prefix = format!("t{t}-");
        let mine: Vec<_> = delivered
            .iter()
            .filter(|m| m.starts_with(&prefix))
            .cloned()
            .collect();
        assert_eq!(mine, thread_messages(t));
    }
}

#[test]
fn test_concurrent_posts_start_one_navigation() {
    let pair = Pair::ready("abc123");
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let (host, barrier) = (&pair.host, &barrier);
            scope.spawn(move || {
                barrier.wait();
                for message in thread_messages(t) {
                    host.post_message(message).unwrap();
                }
            });
        }
    });

    assert_eq!(pair.host_doc.frames.pending_len(), 1);
    assert_eq!(pair.host.pending_count(), THREADS * PER_THREAD - 1);
    assert!(!pair.host_doc.frames.saw_overlap());

    pair.settle();
    assert_each_thread_in_order(&pair.guest_doc.messages());
    assert!(pair.host.status().is_idle());
}

#[test]
fn test_concurrent_posts_and_completions() {
    let pair = Pair::ready("abc123");
    let barrier = Barrier::new(THREADS + 1);
    let posted = AtomicBool::new(false);

    thread::scope(|scope| {
        let relay = scope.spawn(|| {
            barrier.wait();
            loop {
                let done = posted.load(Ordering::SeqCst);
                let relayed = pair.relay_one(Side::Host).is_some();
                assert!(pair.host_doc.frames.pending_len() <= 1);
                if done && !relayed {
                    break;
                }
                if !relayed {
                    thread::yield_now();
                }
            }
        });

        let posters: Vec<_> = (0..THREADS)
            .map(|t| {
                let (host, barrier) = (&pair.host, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    for message in thread_messages(t) {
                        host.post_message(message).unwrap();
                    }
                })
            })
            .collect();
        for poster in posters {
            poster.join().unwrap();
        }
        posted.store(true, Ordering::SeqCst);
        relay.join().unwrap();
    });

    assert!(!pair.host_doc.frames.saw_overlap());
    assert_each_thread_in_order(&pair.guest_doc.messages());
    assert!(pair.host.status().is_idle());
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Post(Side),
    Complete(Side),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Post(Side::Host)),
        Just(Op::Post(Side::Guest)),
        Just(Op::Complete(Side::Host)),
        Just(Op::Complete(Side::Guest)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_delivery_is_fifo_without_overlap(ops in prop::collection::vec(op(), 0..48)) {
        let pair = Pair::ready("abc123");
        let mut posted_by_host = Vec::new();
        let mut posted_by_guest = Vec::new();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Post(Side::Host) => {
                    let message = format!("h{i}");
                    pair.host.post_message(message.as_str()).unwrap();
                    posted_by_host.push(message);
                }
                Op::Post(Side::Guest) => {
                    let message = format!("g{i}");
                    pair.guest.post_message(message.as_str()).unwrap();
                    posted_by_guest.push(message);
                }
                Op::Complete(side) => {
                    pair.relay_one(side);
                }
            }
            prop_assert!(pair.doc(Side::Host).frames.pending_len() <= 1);
            prop_assert!(pair.doc(Side::Guest).frames.pending_len() <= 1);
        }
        pair.settle();

        prop_assert_eq!(pair.guest_doc.messages(), posted_by_host);
        prop_assert_eq!(pair.host_doc.messages(), posted_by_guest);
        prop_assert!(!pair.host_doc.frames.saw_overlap());
        prop_assert!(!pair.guest_doc.frames.saw_overlap());
        prop_assert!(pair.host.status().is_idle());
        prop_assert!(pair.guest.status().is_idle());
    }
}
