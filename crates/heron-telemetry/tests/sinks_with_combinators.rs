//! Telemetry sinks plugged into combinators.

use heron_combinators::{Combinator, Logged, Timed};
use heron_core::{Metadata, Phase, SyncCallable};
use heron_telemetry::{Fanout, MemorySink, MetricsTimingSink};
use heron_test::{flaky_sync, CallCounter, TestError};

#[test]
fn test_memory_sink_collects_call_records() {
    let sink = MemorySink::default();
    let divide: SyncCallable<(i32, i32), i32, TestError> =
        SyncCallable::new(Metadata::new("divide"), |(a, b): (i32, i32)| {
            a.checked_div(b)
                .ok_or_else(|| TestError::Permanent("division by zero".into()))
        });

    let logged = Logged::new(sink.clone()).wrap_sync(divide);
    assert_eq!(logged.call((8, 2)), Ok(4));
    assert!(logged.call((1, 0)).is_err());

    let phases: Vec<Phase> = sink.logs().iter().map(|r| r.phase).collect();
    assert_eq!(
        phases,
        [Phase::Call, Phase::Success, Phase::Call, Phase::Failure]
    );
    assert_eq!(
        sink.logs()[3].payload.as_deref(),
        Some("permanent failure: division by zero")
    );
}

#[test]
fn test_fanout_feeds_memory_and_metrics() {
    let memory = MemorySink::default();
    let fanout = Fanout::new().timing(memory.clone()).timing(MetricsTimingSink);

    let counter = CallCounter::new();
    let timed = Timed::new(fanout).wrap_sync(flaky_sync("fetch", &counter, 1, 3_u8));

    assert_eq!(timed.call(()), Err(TestError::Transient));
    assert_eq!(timed.call(()), Ok(3));

    let timings = memory.timings();
    assert_eq!(timings.len(), 2);
    assert!(!timings[0].succeeded);
    assert!(timings[1].succeeded);
    assert!(timings.iter().all(|t| t.callable == "fetch"));
}
