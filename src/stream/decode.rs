use super::classify::{StreamKind, classify};
use super::frame::{StreamFrame, interpret};
use super::ndjson::{NdjsonBuffer, parse_line};
use super::sse::{SseBuffer, SseRecord, parse_record};
use crate::error::StreamError;
use crate::transport::{ByteStream, RawResponse};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;

/// Lazy, single-pass sequence of decoded frames. Read errors are yielded,
/// never swallowed, and end the sequence.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamFrame, StreamError>> + Send + 'static>>;

/// Either a frame producer or the response handed back untouched for
/// whole-body parsing.
pub enum Classified {
    Stream(DeltaStream),
    Body(RawResponse),
}

/// Inspect the declared content type and pick the decoder.
pub fn classify_response(response: RawResponse) -> Classified {
    match classify(response.content_type.as_deref()) {
        StreamKind::EventStream => {
            tracing::debug!("decoding reply as event stream");
            Classified::Stream(event_stream_frames(response.body))
        }
        StreamKind::NdJson => {
            tracing::debug!("decoding reply as newline-delimited records");
            Classified::Stream(ndjson_frames(response.body))
        }
        StreamKind::None => Classified::Body(response),
    }
}

pub fn event_stream_frames(mut body: ByteStream) -> DeltaStream {
    let stream = async_stream::try_stream! {
        let mut buffer = SseBuffer::new();
        let mut finished = false;

        'read: while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buffer.push_chunk(&chunk);

            while let Some(record) = buffer.next_record() {
                match parse_record(&record) {
                    Some(SseRecord::Done) => {
                        finished = true;
                        break 'read;
                    }
                    Some(SseRecord::Data(payload)) => {
                        if let Some(frame) = interpret(&payload) {
                            yield frame;
                        }
                    }
                    None => {}
                }
            }
        }

        if !finished {
            let tail = buffer.finish().and_then(|record| match parse_record(&record) {
                Some(SseRecord::Data(payload)) => interpret(&payload),
                _ => None,
            });
            if let Some(frame) = tail {
                yield frame;
            }
        }
    };

    Box::pin(stream)
}

pub fn ndjson_frames(mut body: ByteStream) -> DeltaStream {
    let stream = async_stream::try_stream! {
        let mut buffer = NdjsonBuffer::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buffer.push_chunk(&chunk);

            while let Some(line) = buffer.next_line() {
                if let Some(frame) = parse_line(&line) {
                    yield frame;
                }
            }
        }

        if let Some(frame) = buffer.finish().and_then(|line| parse_line(&line)) {
            yield frame;
        }
    };

    Box::pin(stream)
}

/// Drained form of a frame stream: the concatenated text plus every
/// envelope seen, merged in arrival order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectedStream {
    pub text: String,
    pub envelope: Option<Value>,
}

impl CollectedStream {
    pub fn feed(&mut self, frame: StreamFrame) {
        match frame {
            StreamFrame::Delta(text) => self.text.push_str(&text),
            StreamFrame::Envelope(value) => self.merge_envelope(value),
        }
    }

    /// Later envelopes override earlier top-level keys and keep the rest, so a
    /// trailing metadata record cannot drop an earlier governance payload.
    fn merge_envelope(&mut self, value: Value) {
        match (&mut self.envelope, value) {
            (Some(Value::Object(current)), Value::Object(next)) => current.extend(next),
            (slot, value) => *slot = Some(value),
        }
    }
}

pub async fn collect(mut frames: DeltaStream) -> Result<CollectedStream, StreamError> {
    let mut collected = CollectedStream::default();
    while let Some(frame) = frames.next().await {
        collected.feed(frame?);
    }
    Ok(collected)
}
