//! Durable voucher registry.
//!
//! The registry is a single JSON index file living next to the rendered
//! voucher artifacts. It hands out voucher numbers, records every issued or
//! consolidated voucher, governs status changes, and can rebuild itself from
//! the artifact directory when the index is missing or corrupt.
//!
//! # Architecture
//!
//! - **Registry** keeps an in-memory mirror of the index behind a `RwLock`.
//!   Every mutation is persisted (temp file + atomic rename) before the write
//!   lock is released; if persisting fails the in-memory change is rolled back.
//! - **Sequence allocation** hands out `max(number) + 1`, also accounting for
//!   numbers reserved earlier in this process, so concurrent callers never
//!   receive the same number. Reserved-but-unused numbers are skipped forever.
//! - **Transitions** between statuses are decided by one table in
//!   [`transition`]; callers cannot bypass it.
//! - **Reindexing** scans the artifact directory and adds a `Pending` record
//!   for every conforming artifact whose number is not yet registered.
//!
//! # Modules
//!
//! - [`config`]: [`RegistryConfig`]
//! - [`error`]: [`RegistryError`] and [`RegistryResult`]
//! - [`fsio`]: Atomic file replacement
//! - [`index_file`]: Reading and writing the index file
//! - [`lock`]: Advisory lock against a second writer process
//! - [`registry`]: The [`Registry`] itself
//! - [`reindex`]: [`ReindexReport`] and the directory scan
//! - [`sidecar`]: Sidecar reading and writing
//! - [`transition`]: The status transition table

pub mod config;
pub mod error;
pub mod fsio;
pub mod index_file;
pub mod lock;
pub mod registry;
pub mod reindex;
pub mod sidecar;
pub mod transition;

pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::{RecoveryNotice, Registry, VerifyReport};
pub use reindex::ReindexReport;
pub use lock::ProcessLock;
pub use sidecar::{read_sidecar, save_sidecar, write_sidecar, SidecarIssue};
pub use transition::{check_transition, Transition};
