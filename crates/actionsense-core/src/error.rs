//! Action resolution error types.
//!
//! Every fallible API in this crate returns [`ActionError`].  Configuration
//! variants are meant to abort startup; lookup and semantic variants are
//! recoverable by the caller.

/// Unified error type for action registration and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    // -- Configuration errors ------------------------------------------------
    /// Two definitions share the same identifier.
    #[error("duplicate action identifier: {id}")]
    DuplicateIdentifier { id: String },

    /// Two definitions claim the same slash command.
    #[error("duplicate slash command `/{command}` (claimed by `{first}` and `{second}`)")]
    DuplicateSlashCommand {
        command: String,
        first: String,
        second: String,
    },

    /// A definition has an empty or blank identifier.
    #[error("action identifier must not be empty")]
    EmptyIdentifier,

    /// A slash command contains whitespace or a leading `/`.
    #[error("invalid slash command `{command}` for action `{id}`: {reason}")]
    InvalidSlashCommand {
        id: String,
        command: String,
        reason: String,
    },

    // -- Lookup errors -------------------------------------------------------
    /// The requested action is not registered.
    #[error("unknown action: {id}")]
    UnknownAction { id: String },

    // -- Semantic resolver errors --------------------------------------------
    /// A semantic resolver could not produce a result.
    #[error("semantic resolution failed: {reason}")]
    SemanticFailed { reason: String },

    // -- Catalog loading -----------------------------------------------------
    /// The catalog file is structurally valid but semantically wrong.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Reading the catalog file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid TOML for the expected schema.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ActionError {
    /// Whether this error must abort startup rather than be handled at runtime.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::DuplicateSlashCommand { .. }
                | Self::EmptyIdentifier
                | Self::InvalidSlashCommand { .. }
                | Self::Config { .. }
                | Self::Toml(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ActionError>;
