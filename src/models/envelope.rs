use serde_json::Value as JsonValue;

use crate::error::{LatticeLinkError, Result};

use super::server_event::{EventKind, ServerEvent};

/// A decoded push-stream frame: group scope plus typed event.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// The tenant graph this event is scoped to.
    pub group_id: String,
    /// The typed event payload.
    pub event: ServerEvent,
}

impl Envelope {
    /// Discriminant of the contained event.
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Decode a raw text frame into a typed [`Envelope`].
///
/// Decoding is two-stage so that unknown future event types degrade to a
/// logged skip instead of an error:
///
/// - malformed JSON, a missing `event_type`, or a missing `group_id` is a
///   [`ProtocolError`](LatticeLinkError::ProtocolError) (the caller logs and
///   drops the frame);
/// - a well-formed frame with an unrecognized `event_type` returns
///   `Ok(None)` after a warning;
/// - otherwise the payload is decoded into its [`ServerEvent`] variant.
///
/// Frames may omit `data` entirely (e.g. `group.deleted`); an empty object
/// is substituted before payload decoding.
pub fn decode_frame(text: &str) -> Result<Option<Envelope>> {
    let mut value: JsonValue = serde_json::from_str(text)
        .map_err(|e| LatticeLinkError::ProtocolError(format!("malformed frame: {}", e)))?;

    let event_type = value
        .get("event_type")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LatticeLinkError::ProtocolError("frame has no event_type".to_string())
        })?;

    if EventKind::from_wire(&event_type).is_none() {
        log::warn!("Dropping frame with unrecognized event_type '{}'", event_type);
        return Ok(None);
    }

    let group_id = value
        .get("group_id")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LatticeLinkError::ProtocolError(format!(
                "frame '{}' has no group_id",
                event_type
            ))
        })?;

    if value.get("data").is_none() {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("data".to_string(), JsonValue::Object(Default::default()));
        }
    }

    let event: ServerEvent = serde_json::from_value(value).map_err(|e| {
        LatticeLinkError::ProtocolError(format!(
            "failed to decode '{}' payload: {}",
            event_type, e
        ))
    })?;

    Ok(Some(Envelope { group_id, event }))
}
