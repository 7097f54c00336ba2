mod backend;
mod console;
mod core;
mod observability;

pub use backend::BackendConfig;
pub use console::ConsoleConfig;
pub use core::Config;
pub use observability::ObservabilityConfig;
