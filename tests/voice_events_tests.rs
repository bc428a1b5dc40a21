use loqa_interviews::models::Role;
use loqa_interviews::voice::{
    call_subject, decode_call_event, CallEvent, CallEventMessage, Utterance,
};

#[test]
fn test_call_started_deserialization() {
    let json = r#"{"event": "call_started", "call_id": "call_abc"}"#;

    let event: CallEvent = serde_json::from_str(json).unwrap();
    assert_eq!(
        event,
        CallEvent::CallStarted {
            call_id: Some("call_abc".to_string())
        }
    );
    assert_eq!(event.name(), "call_started");
}

#[test]
fn test_call_ended_without_reason() {
    let event: CallEvent = serde_json::from_str(r#"{"event": "call_ended"}"#).unwrap();
    assert_eq!(event, CallEvent::CallEnded { reason: None });
}

#[test]
fn test_talking_markers() {
    let start: CallEvent = serde_json::from_str(r#"{"event": "agent_start_talking"}"#).unwrap();
    let stop: CallEvent = serde_json::from_str(r#"{"event": "agent_stop_talking"}"#).unwrap();
    assert_eq!(start, CallEvent::AgentStartTalking);
    assert_eq!(stop, CallEvent::AgentStopTalking);
}

#[test]
fn test_transcript_update_deserialization() {
    let json = r#"{
        "event": "update",
        "transcript": [
            {"role": "agent", "content": "Tell me about yourself."},
            {"role": "user", "content": "I build distributed systems."}
        ]
    }"#;

    let event: CallEvent = serde_json::from_str(json).unwrap();
    match event {
        CallEvent::Update { transcript } => {
            assert_eq!(transcript.len(), 2);
            assert_eq!(transcript[0].role, Role::Agent);
            assert_eq!(transcript[1].content, "I build distributed systems.");
        }
        other => panic!("expected update, got {:?}", other),
    }
}

#[test]
fn test_unknown_event_is_rejected() {
    let result = serde_json::from_str::<CallEvent>(r#"{"event": "dtmf", "digit": "1"}"#);
    assert!(result.is_err());
}

#[test]
fn test_envelope_flattens_event() {
    let msg = CallEventMessage {
        call_id: "call_abc".to_string(),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        event: CallEvent::Update {
            transcript: vec![Utterance {
                role: Role::User,
                content: "Hello".to_string(),
            }],
        },
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"call_id\":\"call_abc\""));
    assert!(json.contains("\"event\":\"update\""));
    assert!(json.contains("\"transcript\""));

    let deserialized: CallEventMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.call_id, "call_abc");
    assert_eq!(deserialized.event, msg.event);
}

#[test]
fn test_error_event_in_envelope() {
    let json = r#"{
        "call_id": "call_abc",
        "timestamp": "2025-10-27T14:31:00Z",
        "event": "error",
        "message": "agent crashed"
    }"#;

    let msg: CallEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        msg.event,
        CallEvent::Error {
            message: "agent crashed".to_string()
        }
    );
}

#[test]
fn test_call_subject_format() {
    assert_eq!(call_subject("call_abc"), "voice.call.call_abc.events");
}

#[test]
fn test_relay_decode_keeps_matching_call() {
    let msg = CallEventMessage {
        call_id: "call_abc".to_string(),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        event: CallEvent::CallEnded {
            reason: Some("agent_hangup".to_string()),
        },
    };
    let payload = serde_json::to_vec(&msg).unwrap();

    assert_eq!(decode_call_event("call_abc", &payload), Some(msg.event));
}

#[test]
fn test_relay_decode_drops_foreign_and_garbage() {
    let foreign = br#"{"call_id": "call_xyz", "timestamp": "t", "event": "agent_stop_talking"}"#;
    assert_eq!(decode_call_event("call_abc", foreign), None);

    assert_eq!(decode_call_event("call_abc", b"not json"), None);
}
