//! Built-in merge backends.

pub mod concat;
pub mod external;

pub use concat::ConcatBackend;
pub use external::ExternalToolBackend;
