//! `rollcall` - Workshop registration and attendance tracking
//!
//! This library registers participants under short scannable ids, records
//! which sessions each participant attended, and produces attendance sheets,
//! credentials and full JSON backups. State is persisted as a single blob
//! after every change.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod ids;
pub mod logging;
pub mod model;
pub mod registry;
pub mod report;
pub mod scan;
pub mod storage;
pub mod workshop;

pub use backup::BackupDocument;
pub use config::{Config, WorkshopConfig};
pub use credential::CredentialPayload;
pub use error::{Error, ImportError, ImportErrorKind, Result};
pub use ids::IdAllocator;
pub use logging::init_logging;
pub use model::{AttendanceResult, Participant, WorkshopState};
pub use report::{GridRow, HomeStats};
pub use scan::{ScanOutcome, ScanSource};
pub use storage::{MemoryStore, SqliteStore, StorageStats, Store};
pub use workshop::Workshop;
