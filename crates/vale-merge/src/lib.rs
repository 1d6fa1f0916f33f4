//! Artifact merge adapter.
//!
//! Several rendered vouchers are combined into one document by trying an
//! ordered list of backends until one succeeds. Each backend implements the
//! single [`MergeBackend`] capability; the [`MergeChain`] logs every failure
//! and only gives up, with [`MergeError::NoBackendAvailable`], once all of
//! them have failed.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use vale_merge::{MergeChain, MergeConfig};
//!
//! let chain = MergeChain::from_config(&MergeConfig::default()).unwrap();
//! let inputs = vec![PathBuf::from("vale_000001.pdf"), PathBuf::from("vale_000002.pdf")];
//! let outcome = chain.merge_with_fallback(&inputs, "merged.pdf".as_ref()).unwrap();
//! println!("merged with {}", outcome.backend);
//! ```

pub mod backend;
pub mod backends;
pub mod chain;
pub mod config;
pub mod error;

pub use backend::{BackendAttempt, MergeBackend};
pub use backends::concat::ConcatBackend;
pub use backends::external::ExternalToolBackend;
pub use chain::{MergeChain, MergeOutcome};
pub use config::{BackendSpec, MergeConfig};
pub use error::{MergeError, MergeResult};
