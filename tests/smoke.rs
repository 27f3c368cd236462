use voxelhooks_core::SimTick;
use voxelhooks_testkit::{EventRecord, JsonlSink};

#[test]
fn deterministic_event_stream_can_be_written() {
    let path = std::env::temp_dir().join("voxelhooks-smoke-eventlog.jsonl");
    let mut sink = JsonlSink::create(&path).expect("can create temp log");
    let record = EventRecord {
        tick: SimTick::ZERO.advance(1),
        kind: "smoke_test",
        payload: serde_json::json!({"status": "ok"}),
    };
    sink.write(&record).expect("can write event");
    sink.flush().expect("can flush");
    assert_eq!(sink.records_written(), 1);
}
