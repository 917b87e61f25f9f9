//! Stage 2: the semantic resolver contract.
//!
//! A [`SemanticResolver`] receives the user's input together with the full
//! candidate list and returns the identifiers it believes match.  The engine
//! does not care how: a language model, an embedding index, or a local
//! heuristic are all valid implementations.  Returned identifiers are
//! untrusted and filtered against the registry by the engine.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::ActionDefinition;

/// Intent-based action resolver supplied by the embedding application.
#[async_trait]
pub trait SemanticResolver: Send + Sync {
    /// Return the identifiers of `actions` that match `input`, best first.
    async fn resolve(&self, input: &str, actions: &[ActionDefinition]) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// FnResolver
// ---------------------------------------------------------------------------

/// Adapts an async closure into a [`SemanticResolver`].
///
/// The closure receives owned copies of the input and candidates so the
/// returned future is free of borrowed lifetimes.
///
/// ```rust
/// # use actionsense_core::{ActionDefinition, ActionError};
/// # use actionsense_core::resolver::{FnResolver, SemanticResolver};
/// let resolver = FnResolver::new(|input: String, _actions: Vec<ActionDefinition>| async move {
///     let ids = if input.contains("fail") { vec!["debug".to_string()] } else { vec![] };
///     Ok::<_, ActionError>(ids)
/// });
/// # let _ = &resolver as &dyn SemanticResolver;
/// ```
pub struct FnResolver<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnResolver<F, Fut>
where
    F: Fn(String, Vec<ActionDefinition>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>>> + Send,
{
    /// Wrap `f` as a resolver.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> SemanticResolver for FnResolver<F, Fut>
where
    F: Fn(String, Vec<ActionDefinition>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>>> + Send,
{
    async fn resolve(&self, input: &str, actions: &[ActionDefinition]) -> Result<Vec<String>> {
        (self.f)(input.to_string(), actions.to_vec()).await
    }
}

// ---------------------------------------------------------------------------
// NoopResolver
// ---------------------------------------------------------------------------

/// Resolver that never matches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl SemanticResolver for NoopResolver {
    async fn resolve(&self, _input: &str, _actions: &[ActionDefinition]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;

    #[tokio::test]
    async fn fn_resolver_receives_input_and_candidates() {
        let resolver = FnResolver::new(|input: String, actions: Vec<ActionDefinition>| async move {
            Ok::<_, ActionError>(
                actions
                    .into_iter()
                    .filter(|a| input.contains(&a.label))
                    .map(|a| a.id)
                    .collect::<Vec<_>>(),
            )
        });

        let actions = vec![
            ActionDefinition::new("a", "alpha", ""),
            ActionDefinition::new("b", "beta", ""),
        ];
        let ids = resolver.resolve("something beta", &actions).await.unwrap();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn fn_resolver_propagates_errors() {
        let resolver = FnResolver::new(|_: String, _: Vec<ActionDefinition>| async {
            Err::<Vec<String>, _>(ActionError::SemanticFailed {
                reason: "offline".into(),
            })
        });

        let result = resolver.resolve("x", &[]).await;
        assert!(matches!(result, Err(ActionError::SemanticFailed { .. })));
    }

    #[tokio::test]
    async fn noop_resolver_returns_nothing() {
        let ids = NoopResolver.resolve("anything", &[]).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn resolvers_are_object_safe() {
        let resolver: Box<dyn SemanticResolver> = Box::new(NoopResolver);
        assert!(resolver.resolve("x", &[]).await.unwrap().is_empty());
    }
}
