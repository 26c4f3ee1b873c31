use geiger_core::pulse::{EdgeTimestamp, PulseCounter};

const DEAD_TIME_US: u32 = 190;

fn counter() -> PulseCounter {
    let counter = PulseCounter::new();
    counter.init(DEAD_TIME_US, EdgeTimestamp::new(0, 0));
    counter
}

fn edge(micros: u32) -> EdgeTimestamp {
    EdgeTimestamp::from_micros(u64::from(micros))
}

#[test]
fn edges_inside_dead_time_count_once() {
    let counter = counter();
    counter.on_edge(edge(0));
    counter.on_edge(edge(100));

    assert_eq!(counter.drain().count, 1);
    assert_eq!(counter.rejected_edges(), 1);
}

#[test]
fn ringing_burst_after_a_pulse_counts_once() {
    let counter = counter();
    for offset in (0..DEAD_TIME_US).step_by(10) {
        counter.on_edge(edge(50_000 + offset));
    }

    assert_eq!(counter.drain().count, 1);
}

#[test]
fn edges_spaced_beyond_dead_time_all_count() {
    let counter = counter();
    for micros in [0, 300, 600] {
        assert!(counter.on_edge(edge(micros)).is_accepted());
    }

    let drained = counter.drain();
    assert_eq!(drained.count, 3);
    assert_eq!(drained.last_interval_us, 300);
    assert_eq!(drained.last_timestamp_ms, 0);
}

#[test]
fn second_drain_without_edges_is_empty() {
    let counter = counter();
    counter.on_edge(edge(1_000));
    counter.on_edge(edge(2_500));

    let first = counter.drain();
    let second = counter.drain();
    assert_eq!(first.count, 2);
    assert_eq!(second.count, 0);
    assert_eq!(
        (second.last_timestamp_ms, second.last_interval_us),
        (first.last_timestamp_ms, first.last_interval_us),
        "timestamp and interval are informational and survive a drain"
    );
}

#[test]
fn longer_dead_time_rejects_more_edges() {
    let counter = PulseCounter::new();
    counter.init(500, EdgeTimestamp::new(0, 0));
    for micros in [0, 300, 600, 900] {
        counter.on_edge(edge(micros));
    }

    assert_eq!(counter.drain().count, 2);
}
