//! Tests for output module

use super::*;
use crate::engine::Message;
use crate::types::LogLevel;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn lines(bytes: &[u8]) -> Vec<Value> {
    std::str::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_vec_sink_collects() {
    let mut sink: Vec<Message> = Vec::new();
    sink.emit(Message::info("hello")).unwrap();
    sink.emit(Message::state("events", json!({"date": "2024-01-01"})))
        .unwrap();
    assert_eq!(sink.len(), 2);
    assert!(sink[1].is_state());
}

#[test]
fn test_json_lines_record() {
    let mut writer = JsonLinesWriter::new(Vec::new());
    writer
        .emit(Message::record("events", json!({"id": "e1", "amount": 100})))
        .unwrap();
    assert_eq!(writer.written(), 1);

    let out = lines(&writer.into_inner());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["type"], "RECORD");
    assert_eq!(out[0]["record"]["stream"], "events");
    assert_eq!(out[0]["record"]["data"], json!({"id": "e1", "amount": 100}));
    assert!(out[0]["record"]["emitted_at"].is_i64());
}

#[test]
fn test_json_lines_state_and_log() {
    let mut writer = JsonLinesWriter::new(Vec::new());
    writer
        .emit(Message::state("summary", json!({"date": "2024-02-02"})))
        .unwrap();
    writer.emit(Message::log(LogLevel::Warn, "careful")).unwrap();
    writer.flush().unwrap();

    let out = lines(&writer.into_inner());
    assert_eq!(
        out[0],
        json!({
            "type": "STATE",
            "state": {
                "type": "STREAM",
                "stream": {
                    "stream_descriptor": {"name": "summary"},
                    "stream_state": {"date": "2024-02-02"}
                }
            }
        })
    );
    assert_eq!(
        out[1],
        json!({"type": "LOG", "log": {"level": "WARN", "message": "careful"}})
    );
}
