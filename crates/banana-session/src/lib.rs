//! banana-session - Editor session for the banana language
//!
//! Provides:
//! - **Session**: catalog, grammar, type table and diagnostics for one document
//! - **HTTP backend**: client for the remote type checker
//! - **Configuration**: backend location, retries and timeouts
//!
//! # Example
//!
//! ```rust,ignore
//! use banana_session::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::connect(SessionConfig::default());
//!     session.load_catalog().await.ok();
//!
//!     let source = "src = MonascaMarkovChainSource()\nsink = ";
//!     session.on_content_change(source).await;
//!
//!     for candidate in session.complete(source) {
//!         println!("{}", candidate.label);
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::{with_retries, HttpBackend, RemoteService};
pub use config::SessionConfig;
pub use error::{BananaError, Result};
pub use session::{ContentChange, RefreshOutcome, Session};

/// Installs the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
