pub mod aliases;
pub mod display;
pub mod proposals;
pub mod response;

pub use display::{filter_internal_lines, synthetic_summary};
pub use proposals::extract_proposals;
pub use response::{
    NormalizeOptions, NormalizedResponse, normalize, normalize_body, normalize_stream,
    normalize_text,
};
