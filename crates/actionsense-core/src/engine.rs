//! Resolution engine.
//!
//! The engine combines the two stages:
//!
//! 1. **Stage 1** ([`LocalMatcher`]) always runs first.  A slash-command hit
//!    is authoritative and returned immediately without consulting Stage 2.
//! 2. **Stage 2** ([`SemanticResolver`]) runs otherwise, bounded by
//!    [`EngineConfig::semantic_timeout`].  Its identifiers are filtered
//!    against the registry and appended after the keyword matches.
//!
//! A failing or slow Stage 2 never fails the resolution: the engine degrades
//! to the Stage 1 result.  [`ResolutionEngine::resolve_detailed`] reports
//! what happened to Stage 2 for callers that want to surface it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::matcher::{LocalMatch, LocalMatcher};
use crate::registry::ActionRegistry;
use crate::resolver::SemanticResolver;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Ordered, duplicate-free action identifiers, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchResult(Vec<String>);

impl MatchResult {
    /// The identifiers in confidence order.
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn into_ids(self) -> Vec<String> {
        self.0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<MatchResult> for Vec<String> {
    fn from(result: MatchResult) -> Self {
        result.0
    }
}

/// What happened to Stage 2 during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SemanticOutcome {
    /// The engine has no semantic resolver.
    NotConfigured,
    /// A slash command matched, so Stage 2 was not invoked.
    Skipped,
    /// Stage 2 answered.
    Completed {
        /// Identifiers returned by the resolver.
        returned: usize,
        /// Identifiers dropped because they are not registered.
        dropped: usize,
    },
    /// Stage 2 returned an error; the result is Stage 1 only.
    Failed {
        reason: String,
    },
    /// Stage 2 did not settle in time; the result is Stage 1 only.
    TimedOut {
        #[serde(with = "millis")]
        after: Duration,
    },
}

impl SemanticOutcome {
    /// Whether the result was degraded to Stage 1 because Stage 2 was
    /// unavailable.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut { .. })
    }
}

/// A resolution with Stage 2 diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub matches: MatchResult,
    pub semantic: SemanticOutcome,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// ResolutionEngine
// ---------------------------------------------------------------------------

/// Two-stage action resolver.
///
/// Holds no per-request state; share it behind `Arc` and call it from as many
/// tasks as needed.
pub struct ResolutionEngine {
    registry: Arc<ActionRegistry>,
    matcher: LocalMatcher,
    semantic: Option<Arc<dyn SemanticResolver>>,
    config: EngineConfig,
}

impl ResolutionEngine {
    /// Create an engine that only uses Stage 1.
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        let matcher = LocalMatcher::new(registry.list());
        Self {
            registry,
            matcher,
            semantic: None,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with a semantic resolver for Stage 2.
    pub fn with_semantic(
        registry: Arc<ActionRegistry>,
        semantic: Arc<dyn SemanticResolver>,
    ) -> Self {
        Self {
            semantic: Some(semantic),
            ..Self::new(registry)
        }
    }

    /// Replace the engine settings.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry this engine resolves against.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve input to an ordered list of action identifiers.
    ///
    /// Never fails; an empty result means no action matched.
    pub async fn resolve(&self, input: &str) -> MatchResult {
        self.resolve_detailed(input).await.matches
    }

    /// Stage 1 only.  Synchronous and never suspends.
    pub fn resolve_local(&self, input: &str) -> LocalMatch {
        self.matcher.match_input(input)
    }

    /// Resolve input, reporting what happened to Stage 2.
    pub async fn resolve_detailed(&self, input: &str) -> Resolution {
        let local = self.matcher.match_input(input);

        if local.is_slash_command() {
            debug!(input = %input, "slash command is authoritative, skipping semantic stage");
            return Resolution {
                matches: MatchResult(local.into_ids()),
                semantic: SemanticOutcome::Skipped,
            };
        }

        let keywords = local.into_ids();

        let Some(semantic) = &self.semantic else {
            return Resolution {
                matches: MatchResult(keywords),
                semantic: SemanticOutcome::NotConfigured,
            };
        };

        let timeout = self.config.semantic_timeout;
        let call = semantic.resolve(input, self.registry.list());

        let (semantic_ids, outcome) = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(ids)) => {
                let returned = ids.len();
                let known: Vec<String> = ids
                    .into_iter()
                    .filter(|id| self.registry.contains(id))
                    .collect();
                let dropped = returned - known.len();
                if dropped > 0 {
                    debug!(dropped, "semantic resolver returned unknown action ids");
                }
                (known, SemanticOutcome::Completed { returned, dropped })
            }
            Ok(Err(e)) => {
                warn!(error = %e, "semantic resolution failed, using local matches only");
                (
                    Vec::new(),
                    SemanticOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "semantic resolution timed out, using local matches only"
                );
                (Vec::new(), SemanticOutcome::TimedOut { after: timeout })
            }
        };

        let matches = merge(keywords, semantic_ids);
        debug!(input = %input, matches = matches.len(), outcome = ?outcome, "resolution complete");

        Resolution {
            matches,
            semantic: outcome,
        }
    }

    /// Resolve input unless `token` is cancelled first.
    ///
    /// Returns `None` on cancellation; the in-flight Stage 2 call is dropped.
    pub async fn resolve_cancellable(
        &self,
        input: &str,
        token: &CancellationToken,
    ) -> Option<Resolution> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(input = %input, "resolution cancelled");
                None
            }
            resolution = self.resolve_detailed(input) => Some(resolution),
        }
    }
}

/// Keyword matches first, then unseen semantic matches, each in its own order.
fn merge(keywords: Vec<String>, semantic: Vec<String>) -> MatchResult {
    let mut seen: HashSet<String> = HashSet::with_capacity(keywords.len() + semantic.len());
    let mut merged = Vec::with_capacity(keywords.len() + semantic.len());

    for id in keywords.into_iter().chain(semantic) {
        if seen.insert(id.clone()) {
            merged.push(id);
        }
    }

    MatchResult(merged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ActionError, Result};
    use crate::registry::ActionDefinition;
    use async_trait::async_trait;

    struct Fixed(Vec<&'static str>);

    #[async_trait]
    impl SemanticResolver for Fixed {
        async fn resolve(&self, _: &str, _: &[ActionDefinition]) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl SemanticResolver for Failing {
        async fn resolve(&self, _: &str, _: &[ActionDefinition]) -> Result<Vec<String>> {
            Err(ActionError::SemanticFailed {
                reason: "model unavailable".into(),
            })
        }
    }

    fn registry() -> Arc<ActionRegistry> {
        Arc::new(
            ActionRegistry::register(vec![
                ActionDefinition::new("image", "Generate image", "")
                    .with_keywords(["image", "picture"])
                    .with_slash_command("image"),
                ActionDefinition::new("debug", "Debug", "").with_keywords(["debug", "error"]),
                ActionDefinition::new("search", "Search", ""),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn merge_keeps_first_position_and_order() {
        let merged = merge(
            vec!["a".into(), "b".into()],
            vec!["c".into(), "a".into(), "d".into(), "c".into()],
        );
        assert_eq!(merged.ids(), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn local_only_engine() {
        let engine = ResolutionEngine::new(registry());
        let resolution = engine.resolve_detailed("picture of a debug session").await;
        assert_eq!(resolution.matches.ids(), ["image", "debug"]);
        assert_eq!(resolution.semantic, SemanticOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn slash_command_skips_semantic_stage() {
        let engine = ResolutionEngine::with_semantic(registry(), Arc::new(Fixed(vec!["debug"])));
        let resolution = engine.resolve_detailed("/image a cat").await;
        assert_eq!(resolution.matches.ids(), ["image"]);
        assert_eq!(resolution.semantic, SemanticOutcome::Skipped);
    }

    #[tokio::test]
    async fn semantic_matches_follow_keywords() {
        let engine = ResolutionEngine::with_semantic(
            registry(),
            Arc::new(Fixed(vec!["search", "image"])),
        );
        let resolution = engine.resolve_detailed("fix this error").await;
        assert_eq!(resolution.matches.ids(), ["debug", "search", "image"]);
        assert_eq!(
            resolution.semantic,
            SemanticOutcome::Completed {
                returned: 2,
                dropped: 0
            }
        );
    }

    #[tokio::test]
    async fn unknown_semantic_ids_dropped() {
        let engine = ResolutionEngine::with_semantic(
            registry(),
            Arc::new(Fixed(vec!["ghost", "search"])),
        );
        let resolution = engine.resolve_detailed("look this up").await;
        assert_eq!(resolution.matches.ids(), ["search"]);
        assert_eq!(
            resolution.semantic,
            SemanticOutcome::Completed {
                returned: 2,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn failure_degrades_to_local() {
        let engine = ResolutionEngine::with_semantic(registry(), Arc::new(Failing));
        let resolution = engine.resolve_detailed("debug it").await;
        assert_eq!(resolution.matches.ids(), ["debug"]);
        assert!(resolution.semantic.is_degraded());
        assert!(matches!(resolution.semantic, SemanticOutcome::Failed { .. }));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SemanticOutcome::TimedOut {
            after: Duration::from_millis(250),
        })
        .unwrap();
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["after"], 250);

        let result = serde_json::to_value(MatchResult(vec!["a".into()])).unwrap();
        assert_eq!(result, serde_json::json!(["a"]));
    }
}
