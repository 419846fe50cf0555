use super::*;

// ==================== SyncOptions Tests ====================

#[test]
fn test_sync_options_default() {
    let opts = SyncOptions::default();

    assert_eq!(opts.max_reconnect_attempts, 10, "max attempts should default to 10");
    assert_eq!(opts.base_delay_ms, 1000, "base_delay_ms should default to 1000");
    assert_eq!(
        opts.max_reconnect_delay_ms, 30_000,
        "max_reconnect_delay_ms should default to 30000"
    );
    assert_eq!(
        opts.stability_window_ms, 5000,
        "stability_window_ms should default to 5000"
    );
}

#[test]
fn test_sync_options_builder_pattern() {
    let opts = SyncOptions::new()
        .with_max_reconnect_attempts(3)
        .with_base_delay_ms(200)
        .with_max_reconnect_delay_ms(5000)
        .with_stability_window_ms(1000)
        .with_keepalive_interval_ms(0)
        .with_pong_timeout_ms(0);

    assert_eq!(opts.max_reconnect_attempts, 3);
    assert_eq!(opts.base_delay_ms, 200);
    assert_eq!(opts.max_reconnect_delay_ms, 5000);
    assert_eq!(opts.stability_window_ms, 1000);
    assert!(opts.keepalive_interval().is_zero());
    assert!(opts.pong_timeout().is_zero());
}

#[test]
fn test_sync_options_serde_defaults() {
    let opts: SyncOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(opts.max_reconnect_attempts, 10);
    assert_eq!(opts.base_delay_ms, 1000);

    let opts: SyncOptions =
        serde_json::from_str(r#"{"max_reconnect_attempts": 2, "base_delay_ms": 50}"#).unwrap();
    assert_eq!(opts.max_reconnect_attempts, 2);
    assert_eq!(opts.base_delay_ms, 50);
    assert_eq!(opts.max_reconnect_delay_ms, 30_000);
}

// ==================== EventKind Tests ====================

#[test]
fn test_event_kind_wire_round_trip() {
    for kind in EventKind::ALL {
        assert_eq!(
            EventKind::from_wire(kind.as_wire()),
            Some(kind),
            "{:?} should round-trip through its wire name",
            kind
        );
    }
}

#[test]
fn test_event_kind_rejects_unknown() {
    assert_eq!(EventKind::from_wire("entity.exploded"), None);
    assert_eq!(EventKind::from_wire(""), None);
}

// ==================== decode_frame Tests ====================

#[test]
fn test_decode_entity_created() {
    let envelope = decode_frame(
        r#"{"event_type":"entity.created","group_id":"proj1","data":{"id":"e1","name":"Ada","labels":["Person"]}}"#,
    )
    .unwrap()
    .unwrap();

    assert_eq!(envelope.group_id, "proj1");
    assert_eq!(envelope.kind(), EventKind::EntityCreated);
    match envelope.event {
        ServerEvent::EntityCreated(payload) => {
            assert_eq!(payload.id.as_deref(), Some("e1"));
            assert_eq!(payload.name.as_deref(), Some("Ada"));
            assert_eq!(payload.labels, Some(vec!["Person".to_string()]));
            assert!(payload.summary.is_none());
        },
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_decode_queue_status() {
    let envelope = decode_frame(
        r#"{"event_type":"queue.status","group_id":"proj1","data":{"pending_count":4,"is_processing":true}}"#,
    )
    .unwrap()
    .unwrap();

    match envelope.event {
        ServerEvent::QueueStatus(status) => {
            assert_eq!(status.pending_count, 4);
            assert!(status.is_processing);
        },
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_decode_tolerates_missing_data() {
    // group.deleted frames carry no payload at all.
    let envelope = decode_frame(r#"{"event_type":"group.deleted","group_id":"proj1"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(envelope.kind(), EventKind::GroupDeleted);
}

#[test]
fn test_decode_tolerates_partial_payloads() {
    let envelope = decode_frame(
        r#"{"event_type":"edge.created","group_id":"proj1","data":{"id":"edge-9"}}"#,
    )
    .unwrap()
    .unwrap();
    match envelope.event {
        ServerEvent::EdgeCreated(payload) => {
            assert_eq!(payload.id.as_deref(), Some("edge-9"));
            assert!(payload.source_id.is_none());
            assert!(payload.target_id.is_none());
        },
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_decode_malformed_json_is_protocol_error() {
    let err = decode_frame("{not json").unwrap_err();
    assert!(matches!(
        err,
        crate::error::LatticeLinkError::ProtocolError(_)
    ));
}

#[test]
fn test_decode_missing_event_type_is_protocol_error() {
    let err = decode_frame(r#"{"group_id":"proj1","data":{}}"#).unwrap_err();
    assert!(matches!(
        err,
        crate::error::LatticeLinkError::ProtocolError(_)
    ));
}

#[test]
fn test_decode_missing_group_id_is_protocol_error() {
    let err = decode_frame(r#"{"event_type":"entity.created","data":{}}"#).unwrap_err();
    assert!(matches!(
        err,
        crate::error::LatticeLinkError::ProtocolError(_)
    ));
}

#[test]
fn test_decode_unknown_event_type_is_skipped() {
    let result = decode_frame(
        r#"{"event_type":"entity.annotated","group_id":"proj1","data":{"id":"e1"}}"#,
    )
    .unwrap();
    assert!(result.is_none(), "unknown event types are dropped, not errors");
}

// ==================== ConnectionState Tests ====================

#[test]
fn test_connection_state_display() {
    assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
    assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    assert_eq!(ConnectionState::Connected.to_string(), "connected");
    assert_eq!(ConnectionState::Reconnecting.to_string(), "reconnecting");
    assert_eq!(ConnectionState::Error.to_string(), "error");
}
