use strum::Display;

/// Framing a response body is decoded with, chosen from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StreamKind {
    EventStream,
    NdJson,
    None,
}

const NDJSON_TYPES: [&str; 5] = [
    "application/x-ndjson",
    "application/ndjson",
    "application/jsonl",
    "application/x-jsonlines",
    "application/jsonlines",
];

#[must_use]
pub fn classify(content_type: Option<&str>) -> StreamKind {
    let Some(raw) = content_type else {
        return StreamKind::None;
    };
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "text/event-stream" {
        StreamKind::EventStream
    } else if NDJSON_TYPES.contains(&essence.as_str()) {
        StreamKind::NdJson
    } else {
        StreamKind::None
    }
}
