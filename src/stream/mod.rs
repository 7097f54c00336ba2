pub mod classify;
pub mod decode;
pub mod frame;
pub mod ndjson;
pub mod sse;

pub use classify::{StreamKind, classify};
pub use decode::{
    Classified, CollectedStream, DeltaStream, classify_response, collect, event_stream_frames,
    ndjson_frames,
};
pub use frame::{StreamFrame, delta_text, interpret};
