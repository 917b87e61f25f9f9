//! Action catalog.
//!
//! The registry holds every [`ActionDefinition`] known to the process.  It is
//! built once at startup by [`ActionRegistry::register`], which rejects
//! duplicate identifiers and conflicting slash commands, and is read-only
//! afterwards.  Wrap it in `Arc` to share it with a
//! [`ResolutionEngine`](crate::engine::ResolutionEngine).
//!
//! # Example
//!
//! ```rust
//! # use actionsense_core::registry::{ActionDefinition, ActionRegistry};
//! let registry = ActionRegistry::register(vec![
//!     ActionDefinition::new("image", "Generate image", "Create an image")
//!         .with_keywords(["image", "picture"])
//!         .with_slash_command("image"),
//!     ActionDefinition::new("debug", "Debug mode", "Investigate an error")
//!         .with_keywords(["debug", "error"]),
//! ])
//! .unwrap();
//!
//! assert_eq!(registry.len(), 2);
//! assert_eq!(registry.lookup("debug").unwrap().label, "Debug mode");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single action that can be suggested to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Unique identifier (e.g. "image", "debug").
    pub id: String,

    /// Human-readable label shown on the badge.
    pub label: String,

    /// Short description shown as tooltip.
    #[serde(default)]
    pub description: String,

    /// Optional icon (emoji or short string).  Plays no role in matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Keywords for Stage 1 matching.  Case-insensitive substrings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Slash command trigger without the leading `/` (e.g. "image").
    #[serde(
        default,
        alias = "slashCommand",
        skip_serializing_if = "Option::is_none"
    )]
    pub slash_command: Option<String>,
}

impl ActionDefinition {
    /// Create a definition with no icon, keywords, or slash command.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            icon: None,
            keywords: Vec::new(),
            slash_command: None,
        }
    }

    /// Set the display icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Replace the keyword list.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the slash command trigger (without the leading `/`).
    #[must_use]
    pub fn with_slash_command(mut self, command: impl Into<String>) -> Self {
        self.slash_command = Some(command.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable, validated catalog of actions in registration order.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    /// Definitions in registration order.
    definitions: Vec<ActionDefinition>,

    /// Identifier -> index into `definitions`.
    by_id: HashMap<String, usize>,

    /// Lowercased slash command -> index into `definitions`.
    by_slash_command: HashMap<String, usize>,
}

impl ActionRegistry {
    /// Validate and register a set of definitions.
    ///
    /// Blank slash commands are treated as absent and surrounding whitespace
    /// is trimmed.  Slash commands are compared case-insensitively, so
    /// `Image` and `image` collide.
    pub fn register(definitions: impl IntoIterator<Item = ActionDefinition>) -> Result<Self> {
        let mut registry = Self::default();

        for mut definition in definitions {
            if definition.id.trim().is_empty() {
                return Err(ActionError::EmptyIdentifier);
            }

            if registry.by_id.contains_key(&definition.id) {
                return Err(ActionError::DuplicateIdentifier { id: definition.id });
            }

            definition.slash_command = normalize_slash_command(&definition)?;

            let index = registry.definitions.len();

            if let Some(command) = &definition.slash_command {
                let key = command.to_lowercase();
                if let Some(&existing) = registry.by_slash_command.get(&key) {
                    return Err(ActionError::DuplicateSlashCommand {
                        command: command.clone(),
                        first: registry.definitions[existing].id.clone(),
                        second: definition.id,
                    });
                }
                registry.by_slash_command.insert(key, index);
            }

            tracing::debug!(
                action_id = %definition.id,
                keywords = definition.keywords.len(),
                slash_command = ?definition.slash_command,
                "action registered"
            );

            registry.by_id.insert(definition.id.clone(), index);
            registry.definitions.push(definition);
        }

        tracing::info!(count = registry.definitions.len(), "action registry built");

        Ok(registry)
    }

    /// Retrieve a definition by identifier.
    pub fn lookup(&self, id: &str) -> Result<&ActionDefinition> {
        self.by_id
            .get(id)
            .map(|&index| &self.definitions[index])
            .ok_or_else(|| ActionError::UnknownAction { id: id.to_string() })
    }

    /// All definitions in registration order.
    pub fn list(&self) -> &[ActionDefinition] {
        &self.definitions
    }

    /// Whether an action with this identifier is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Find the action bound to a slash command (case-insensitive, no `/`).
    pub fn find_by_slash_command(&self, command: &str) -> Option<&ActionDefinition> {
        self.by_slash_command
            .get(&command.to_lowercase())
            .map(|&index| &self.definitions[index])
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.id.as_str())
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry holds no actions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Trim a slash command, map blanks to `None`, and reject malformed values.
fn normalize_slash_command(definition: &ActionDefinition) -> Result<Option<String>> {
    let Some(raw) = definition.slash_command.as_deref() else {
        return Ok(None);
    };

    let command = raw.trim();
    if command.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: &str| ActionError::InvalidSlashCommand {
        id: definition.id.clone(),
        command: raw.to_string(),
        reason: reason.to_string(),
    };

    if command.starts_with('/') {
        return Err(invalid("must not include the leading `/`"));
    }
    if command.chars().any(char::is_whitespace) {
        return Err(invalid("must be a single token"));
    }

    Ok(Some(command.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
