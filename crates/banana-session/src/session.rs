//! Editor session
//!
//! A [`Session`] owns everything the editor integration needs between
//! keystrokes: the component catalog, the grammar compiled from it, the
//! type table and the last diagnostics. Network round trips update that
//! state; completion and highlighting read it synchronously.
//!
//! Overlapping refreshes are ordered by sequence number. Every refresh
//! and type check takes a number when it starts, and a response is only
//! applied when nothing started later has been applied already. A slow
//! response can therefore never overwrite a newer one.

use crate::client::{with_retries, HttpBackend, RemoteService};
use crate::config::SessionConfig;
use crate::error::Result;
use banana_complete::{line_prefix, resolve, CompletionCandidate};
use banana_error::{BananaReport, Marker};
use banana_lexer::{compile, HighlightToken, Highlighter, TokenizerGrammar};
use banana_schema::{Catalog, TypeTable};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a refresh did to the type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The table was replaced wholesale
    Replaced,
    /// The backend returned no variables; the previous table stays
    Empty,
    /// A refresh started later was applied first; this response is dropped
    Superseded,
}

/// Result of reacting to an edit
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChange {
    /// `None` when every refresh attempt failed
    pub refresh: Option<RefreshOutcome>,
    /// `None` when the type check failed
    pub diagnostics: Option<BananaReport>,
}

/// Snapshot guarded by the session lock
#[derive(Debug)]
struct State {
    catalog: Catalog,
    grammar: TokenizerGrammar,
    table: TypeTable,
    diagnostics: BananaReport,
    /// Sequence number of the refresh that produced `table`
    table_seq: u64,
    /// Sequence number of the type check that produced `diagnostics`
    report_seq: u64,
}

impl Default for State {
    fn default() -> Self {
        let catalog = Catalog::default();
        Self {
            grammar: compile(&catalog.components),
            catalog,
            table: TypeTable::new(),
            diagnostics: BananaReport::default(),
            table_seq: 0,
            report_seq: 0,
        }
    }
}

/// Code intelligence state for one open document
pub struct Session {
    service: Arc<dyn RemoteService>,
    retries: u32,
    state: RwLock<State>,
    next_seq: AtomicU64,
}

impl Session {
    /// Creates a session with an empty catalog and table
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self {
            service,
            retries: 2,
            state: RwLock::new(State::default()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Creates a session talking HTTP to the configured backend
    pub fn connect(config: SessionConfig) -> Self {
        let retries = config.retries;
        Self::new(Arc::new(HttpBackend::new(config))).with_retries(retries)
    }

    /// Sets the number of retries for catalog loads and refreshes
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn next_sequence(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ========================================================================
    // Round trips
    // ========================================================================

    /// Fetches the catalog and recompiles the grammar from it.
    ///
    /// On failure the previous catalog and grammar stay in place.
    pub async fn load_catalog(&self) -> Result<TokenizerGrammar> {
        let catalog = with_retries(self.retries, || self.service.fetch_catalog()).await?;
        let grammar = compile(&catalog.components);
        tracing::info!(components = catalog.len(), "loaded component catalog");

        let mut state = self.state.write();
        state.catalog = catalog;
        state.grammar = grammar.clone();
        Ok(grammar)
    }

    /// Asks the backend for the type table of `source`.
    ///
    /// A non-empty answer replaces the table unless a later refresh was
    /// applied first. Errors leave the table untouched.
    pub async fn refresh(&self, source: &str) -> Result<RefreshOutcome> {
        let seq = self.next_sequence();
        let fresh = with_retries(self.retries, || self.service.infer_types(source)).await?;

        let mut state = self.state.write();
        let outcome = if seq < state.table_seq {
            RefreshOutcome::Superseded
        } else if state.table.replace_or_keep(fresh) {
            state.table_seq = seq;
            RefreshOutcome::Replaced
        } else {
            RefreshOutcome::Empty
        };

        tracing::debug!(seq, ?outcome, variables = state.table.len(), "type table refresh");
        Ok(outcome)
    }

    /// Type checks `source` with a single attempt.
    ///
    /// Returns the report the backend sent. It becomes the current
    /// diagnostics unless a later check was applied first. Failures are
    /// logged and yield `None`; the previous diagnostics stay.
    pub async fn typecheck(&self, source: &str) -> Option<BananaReport> {
        let seq = self.next_sequence();
        let report = match self.service.typecheck(source).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(seq, %err, "type check failed, keeping previous diagnostics");
                return None;
            }
        };

        let mut state = self.state.write();
        if seq > state.report_seq {
            state.diagnostics = report.clone();
            state.report_seq = seq;
        } else {
            tracing::debug!(seq, "dropping superseded type check report");
        }
        Some(report)
    }

    /// Reacts to an edit: refreshes the type table and type checks the
    /// new content concurrently
    pub async fn on_content_change(&self, source: &str) -> ContentChange {
        let (refresh, diagnostics) =
            futures_util::future::join(self.refresh(source), self.typecheck(source)).await;

        let refresh = match refresh {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!(%err, "type table refresh failed, keeping previous table");
                None
            }
        };

        ContentChange {
            refresh,
            diagnostics,
        }
    }

    /// Submits the pipeline for execution
    pub async fn submit(&self, source: &str) -> Result<BananaReport> {
        let report = self.service.submit(source).await?;
        tracing::info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "pipeline submitted"
        );
        Ok(report)
    }

    // ========================================================================
    // Synchronous reads
    // ========================================================================

    /// Completion candidates for the text before the cursor
    pub fn complete(&self, text_before_cursor: &str) -> Vec<CompletionCandidate> {
        let state = self.state.read();
        resolve(text_before_cursor, &state.table, &state.catalog.components)
    }

    /// Completion candidates at a 1-based position of `source`
    pub fn complete_at(&self, source: &str, line: usize, column: usize) -> Vec<CompletionCandidate> {
        match line_prefix(source, line, column) {
            Some(prefix) => self.complete(prefix),
            None => Vec::new(),
        }
    }

    /// Highlights `source` with the current grammar
    pub fn highlight(&self, source: &str) -> banana_lexer::Result<Vec<HighlightToken>> {
        let grammar = self.grammar();
        Ok(Highlighter::new(&grammar)?.highlight(source))
    }

    pub fn catalog(&self) -> Catalog {
        self.state.read().catalog.clone()
    }

    pub fn grammar(&self) -> TokenizerGrammar {
        self.state.read().grammar.clone()
    }

    pub fn type_table(&self) -> TypeTable {
        self.state.read().table.clone()
    }

    pub fn diagnostics(&self) -> BananaReport {
        self.state.read().diagnostics.clone()
    }

    /// Editor markers for the current diagnostics
    pub fn markers(&self) -> Vec<Marker> {
        self.state.read().diagnostics.markers()
    }
}
