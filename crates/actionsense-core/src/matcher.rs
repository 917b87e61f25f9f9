//! Stage 1: local slash-command and keyword matcher.
//!
//! The matcher is pure, synchronous, and deterministic.  It resolves input in
//! two steps:
//!
//! | Step | Technique | Result |
//! |------|-----------|--------|
//! | 1 | `/token` compared against slash commands (hash lookup) | exactly one ID, short-circuits |
//! | 2 | Keyword substrings via [`aho_corasick`] (overlapping scan) | zero or more IDs, registration order |
//!
//! Keywords are compiled into a single automaton when the matcher is built,
//! so each call scans the input once regardless of catalog size.
//!
//! # Example
//!
//! ```rust
//! # use actionsense_core::matcher::{LocalMatch, LocalMatcher};
//! # use actionsense_core::registry::ActionDefinition;
//! let matcher = LocalMatcher::new(&[
//!     ActionDefinition::new("image", "Generate image", "")
//!         .with_keywords(["image", "picture"])
//!         .with_slash_command("image"),
//! ]);
//!
//! assert!(matches!(matcher.match_input("/image a cat"), LocalMatch::SlashCommand { .. }));
//! assert_eq!(matcher.match_input("draw a Picture").ids(), ["image"]);
//! ```

use std::collections::HashMap;

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};

use crate::registry::ActionDefinition;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The outcome of Stage 1 matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalMatch {
    /// The input began with `/command` naming a registered slash command.
    /// Explicit intent: no other stage should be consulted.
    SlashCommand {
        /// The action bound to the command.
        id: String,
    },

    /// Keyword matches in registration order.  May be empty.
    Keywords(Vec<String>),
}

impl LocalMatch {
    /// The matched identifiers in confidence order.
    pub fn ids(&self) -> &[String] {
        match self {
            Self::SlashCommand { id } => std::slice::from_ref(id),
            Self::Keywords(ids) => ids,
        }
    }

    /// Consume the match and return its identifiers.
    pub fn into_ids(self) -> Vec<String> {
        match self {
            Self::SlashCommand { id } => vec![id],
            Self::Keywords(ids) => ids,
        }
    }

    /// Whether this is an explicit slash-command hit.
    pub fn is_slash_command(&self) -> bool {
        matches!(self, Self::SlashCommand { .. })
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

// ---------------------------------------------------------------------------
// LocalMatcher
// ---------------------------------------------------------------------------

/// Compiled Stage 1 matcher over a fixed candidate list.
///
/// Build it once per registry and reuse it; it holds no mutable state and is
/// safe to share across tasks.
#[derive(Debug, Clone)]
pub struct LocalMatcher {
    /// Candidate identifiers in registration order.
    ids: Vec<String>,

    /// Lowercased slash command -> candidate index.  First candidate wins.
    slash_commands: HashMap<String, usize>,

    /// Distinct lowercased keywords, indexed by automaton pattern id.
    keywords: Vec<String>,

    /// Candidate indices owning each keyword in `keywords`.
    owners: Vec<Vec<usize>>,

    /// Automaton over `keywords`.  `None` when there are no keywords or the
    /// build failed, in which case matching falls back to a linear scan.
    automaton: Option<AhoCorasick>,
}

impl LocalMatcher {
    /// Compile a matcher for the given candidates.
    pub fn new(candidates: &[ActionDefinition]) -> Self {
        let mut slash_commands = HashMap::new();
        let mut keyword_index: HashMap<String, usize> = HashMap::new();
        let mut keywords = Vec::new();
        let mut owners: Vec<Vec<usize>> = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(command) = candidate.slash_command.as_deref() {
                let command = command.trim().to_lowercase();
                if !command.is_empty() {
                    slash_commands.entry(command).or_insert(index);
                }
            }

            for keyword in &candidate.keywords {
                if keyword.trim().is_empty() {
                    continue;
                }
                let keyword = keyword.to_lowercase();
                let pattern = *keyword_index.entry(keyword.clone()).or_insert_with(|| {
                    keywords.push(keyword);
                    owners.push(Vec::new());
                    owners.len() - 1
                });
                if owners[pattern].last() != Some(&index) {
                    owners[pattern].push(index);
                }
            }
        }

        let automaton = if keywords.is_empty() {
            None
        } else {
            match AhoCorasick::new(&keywords) {
                Ok(ac) => {
                    tracing::trace!(count = keywords.len(), "keyword automaton built");
                    Some(ac)
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to build keyword automaton");
                    None
                }
            }
        };

        Self {
            ids: candidates.iter().map(|c| c.id.clone()).collect(),
            slash_commands,
            keywords,
            owners,
            automaton,
        }
    }

    /// Run Stage 1 against raw user input.
    pub fn match_input(&self, input: &str) -> LocalMatch {
        let normalized = input.trim().to_lowercase();

        if let Some(id) = self.try_slash_command(&normalized) {
            tracing::debug!(action_id = %id, "slash command match");
            return LocalMatch::SlashCommand { id: id.to_string() };
        }

        let ids = self.try_keywords(&normalized);
        tracing::debug!(matches = ids.len(), "keyword match");
        LocalMatch::Keywords(ids)
    }

    /// Number of candidates this matcher was built from.
    pub fn candidate_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of distinct keywords compiled into the matcher.
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    // -- Private helpers ----------------------------------------------------

    /// Resolve `/token ...` to the candidate owning `token`.
    fn try_slash_command(&self, normalized: &str) -> Option<&str> {
        let rest = normalized.strip_prefix('/')?;
        let token = rest.split(char::is_whitespace).next()?;
        if token.is_empty() {
            return None;
        }

        self.slash_commands
            .get(token)
            .map(|&index| self.ids[index].as_str())
    }

    /// Collect every candidate with a keyword occurring in `normalized`.
    fn try_keywords(&self, normalized: &str) -> Vec<String> {
        let mut matched = vec![false; self.ids.len()];

        match &self.automaton {
            Some(ac) => {
                for mat in ac.find_overlapping_iter(normalized) {
                    for &owner in &self.owners[mat.pattern().as_usize()] {
                        matched[owner] = true;
                    }
                }
            }
            None => {
                for (pattern, keyword) in self.keywords.iter().enumerate() {
                    if normalized.contains(keyword.as_str()) {
                        for &owner in &self.owners[pattern] {
                            matched[owner] = true;
                        }
                    }
                }
            }
        }

        self.ids
            .iter()
            .zip(matched)
            .filter_map(|(id, hit)| hit.then(|| id.clone()))
            .collect()
    }
}

/// One-shot Stage 1 over an arbitrary candidate list.
///
/// Compiles a throwaway [`LocalMatcher`]; prefer building one up front when
/// matching repeatedly against the same candidates.
pub fn match_local(input: &str, candidates: &[ActionDefinition]) -> LocalMatch {
    LocalMatcher::new(candidates).match_input(input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
