//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use docket_core::ports::{AccessPolicy, DocumentStore, LanguageModel};
use docket_core::{HistoryEngine, VersionLedger};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The ledger and the history engine are the only writers of document
/// content; handlers never reach around them to the store for writes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub access: Arc<dyn AccessPolicy>,
    pub ledger: VersionLedger,
    pub history: HistoryEngine,
    pub drafting: Arc<dyn LanguageModel>,
    pub analysis: Arc<dyn LanguageModel>,
    pub config: Arc<Config>,
}
