pub mod exchange;
pub mod http_client;

pub use exchange::{ByteStream, HttpTransport, RawResponse, Transport, TransportFuture};
pub use http_client::{build_http_client, build_http_client_with_timeouts};
