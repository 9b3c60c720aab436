pub mod diff;
pub mod domain;
pub mod error;
pub mod history;
pub mod ledger;
pub mod memory;
pub mod ports;

pub use diff::{diff_lines, diff_stats, DiffSegment, DiffStats, SegmentKind};
pub use domain::{Document, DocumentStatus, DocumentVersion};
pub use error::HistoryError;
pub use history::{HistoryEngine, RestoredVersion, VersionComparison};
pub use ledger::{RecordedEdit, VersionLedger, INITIAL_VERSION_DESCRIPTION};
pub use memory::MemoryStore;
pub use ports::{
    AccessPolicy, DocumentStore, LanguageModel, NewVersion, PortError, PortResult,
};
