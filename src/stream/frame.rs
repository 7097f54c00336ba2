use serde_json::{Map, Value};

/// One decoded unit of a streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Display text to append, in arrival order.
    Delta(String),
    /// A JSON object record carrying no text field (e.g. a trailing governance
    /// payload). Kept whole for the normalizer.
    Envelope(Value),
}

const DELTA_FIELDS: [&str; 3] = ["delta", "text", "content"];

fn text_field(map: &Map<String, Value>, allow_nested: bool) -> Option<String> {
    DELTA_FIELDS.iter().find_map(|field| match map.get(*field)? {
        Value::String(text) => Some(text.clone()),
        Value::Object(inner) if allow_nested => text_field(inner, false),
        _ => None,
    })
}

/// Pull the streamed text out of a JSON record.
///
/// Looks at `delta`, `text`, `content` in that order; a `delta` object is
/// searched one level deep (`{"delta": {"content": "..."}}`).
#[must_use]
pub fn delta_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => text_field(map, true),
        _ => None,
    }
}

/// Turn one record payload into a frame.
///
/// JSON objects yield their text field or become an envelope; JSON strings
/// yield their value; anything else (including unparseable text) is yielded
/// raw. Empty deltas are dropped since they cannot change the concatenation.
#[must_use]
pub fn interpret(payload: &str) -> Option<StreamFrame> {
    let frame = match serde_json::from_str::<Value>(payload) {
        Ok(value @ (Value::Object(_) | Value::String(_))) => match delta_text(&value) {
            Some(text) => StreamFrame::Delta(text),
            None if value.as_object().is_some_and(|m| !m.is_empty()) => {
                StreamFrame::Envelope(value)
            }
            None => {
                tracing::debug!("skipping empty JSON record");
                return None;
            }
        },
        _ => StreamFrame::Delta(payload.to_string()),
    };

    match &frame {
        StreamFrame::Delta(text) if text.is_empty() => None,
        _ => Some(frame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delta_field_wins_over_text_and_content() {
        let value = json!({"content": "c", "text": "t", "delta": "d"});
        assert_eq!(delta_text(&value).as_deref(), Some("d"));
    }

    #[test]
    fn nested_delta_object_is_searched() {
        let value = json!({"delta": {"content": "Hel"}});
        assert_eq!(delta_text(&value).as_deref(), Some("Hel"));
    }

    #[test]
    fn non_string_delta_falls_through_to_text() {
        let value = json!({"delta": 3, "text": "fallback"});
        assert_eq!(delta_text(&value).as_deref(), Some("fallback"));
    }

    #[test]
    fn plain_text_is_yielded_raw() {
        assert_eq!(
            interpret("not json at all"),
            Some(StreamFrame::Delta("not json at all".into()))
        );
    }

    #[test]
    fn json_number_is_yielded_raw() {
        assert_eq!(interpret("42"), Some(StreamFrame::Delta("42".into())));
    }

    #[test]
    fn json_string_yields_value() {
        assert_eq!(
            interpret("\"quoted\""),
            Some(StreamFrame::Delta("quoted".into()))
        );
    }

    #[test]
    fn object_without_text_is_envelope() {
        let frame = interpret("{\"proposed_commands\":[{\"command\":\"x\"}]}");
        assert!(matches!(frame, Some(StreamFrame::Envelope(_))));
    }

    #[test]
    fn empty_values_are_dropped() {
        assert_eq!(interpret("{\"delta\":\"\"}"), None);
        assert_eq!(interpret("{}"), None);
    }
}
