mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use relic_reporter::metrics::{ErrorRate, RequestCount, ResponseTime};
use relic_reporter::{Accumulator, MetricSet, RequestEvent};

use common::log_endpoints;

const WRITERS: usize = 8;
const UPDATES: usize = 20_000;

const LOG_COUNT: &str = "Component/ReqPerEndpoint/log[requests]";
const OVERALL_COUNT: &str = "Component/Requests/overall[requests]";
const LOG_ERRORS: &str = "Component/PercentageOfErrorsPerEndpoint/log[percent]";
const LOG_TIME: &str = "Component/ResponseTimePerEndpoint/log[ms]";

#[test]
fn interleaved_collects_never_lose_or_double_count() {
    let counter = Arc::new(RequestCount::new(&log_endpoints()));
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let counter = counter.clone();
            thread::spawn(move || {
                let endpoint = if w % 2 == 0 { "log" } else { "other" };
                let event = RequestEvent::new(endpoint).with_status(200);
                for _ in 0..UPDATES {
                    counter.update(&event).unwrap();
                }
            })
        })
        .collect();

    let collector = {
        let counter = counter.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut seen = 0.0;
            let mut flushes = 0;
            while !done.load(Ordering::SeqCst) {
                let values = counter.collect();
                let per_endpoint = values[LOG_COUNT] + values["Component/ReqPerEndpoint/other[requests]"];
                // overall is read in the same critical section as the endpoints
                assert_eq!(per_endpoint, values[OVERALL_COUNT]);
                seen += values[OVERALL_COUNT];
                flushes += 1;
                thread::sleep(Duration::from_micros(50));
            }
            (seen, flushes)
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    let (seen, flushes) = collector.join().unwrap();

    let rest = counter.collect()[OVERALL_COUNT];
    assert!(flushes > 0);
    assert_eq!(seen + rest, (WRITERS * UPDATES) as f64);
}

#[test]
fn error_tallies_are_never_torn() {
    let rate = Arc::new(ErrorRate::new(&log_endpoints()));
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let rate = rate.clone();
            thread::spawn(move || {
                let event = RequestEvent::new("log").with_status(500);
                for _ in 0..UPDATES {
                    rate.update(&event).unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let rate = rate.clone();
        let done = done.clone();
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                let v = rate.collect()[LOG_ERRORS];
                // every update is an error, so a consistent read is 0 (idle) or 1
                assert!(v == 0.0 || v == 1.0, "torn ratio {v}");
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    reader.join().unwrap();
}

#[test]
fn metric_set_dispatch_from_many_threads() {
    let set = Arc::new(MetricSet::standard(&log_endpoints()));

    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let set = set.clone();
            thread::spawn(move || {
                let event = RequestEvent::new("log")
                    .with_status(200)
                    .with_elapsed(Duration::from_millis(2));
                for _ in 0..1_000 {
                    set.dispatch(&event);
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let values = set.collect_all();
    assert_eq!(values[LOG_COUNT], (WRITERS * 1_000) as f64);
    assert_eq!(values[LOG_ERRORS], 0.0);
    assert!((values[LOG_TIME] - 2.0).abs() < 1e-9);
}

#[test]
fn response_time_is_shareable_across_threads() {
    let timing = Arc::new(ResponseTime::new(&log_endpoints()));
    let handles: Vec<_> = (1..=4u64)
        .map(|ms| {
            let timing = timing.clone();
            thread::spawn(move || {
                timing
                    .update(&RequestEvent::new("log").with_elapsed(Duration::from_millis(ms)))
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // (1 + 2 + 3 + 4) / 4
    assert!((timing.collect()[LOG_TIME] - 2.5).abs() < 1e-9);
}
