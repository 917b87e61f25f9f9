//! Action resolution for interactive assistants.
//!
//! This crate turns free-form user text into an ordered list of action
//! identifiers:
//!
//! - **[`registry`]** -- Immutable catalog of [`ActionDefinition`]s with
//!   startup-time validation of identifiers and slash commands.
//! - **[`matcher`]** -- Stage 1: synchronous slash-command and keyword
//!   matching built on an [`aho_corasick`] automaton.
//! - **[`resolver`]** -- Stage 2: the [`SemanticResolver`] contract for
//!   slower, intent-based resolution supplied by the embedding application.
//! - **[`engine`]** -- [`ResolutionEngine`], which runs both stages, merges
//!   their output, and degrades to Stage 1 when Stage 2 fails or times out.
//! - **[`config`]** -- TOML action catalogs and engine settings.
//! - **[`theme`]** -- Observable light/dark theme cell.
//! - **[`error`]** -- Unified error type via [`thiserror`].
//!
//! All public types are `Send + Sync`.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod resolver;
pub mod theme;

pub use config::{CatalogConfig, EngineConfig, SemanticConfig};
pub use engine::{MatchResult, Resolution, ResolutionEngine, SemanticOutcome};
pub use error::{ActionError, Result};
pub use matcher::{LocalMatch, LocalMatcher, match_local};
pub use registry::{ActionDefinition, ActionRegistry};
pub use resolver::{FnResolver, NoopResolver, SemanticResolver};
pub use theme::{Theme, ThemeStore};
