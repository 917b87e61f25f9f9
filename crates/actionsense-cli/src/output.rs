//! Plain-text rendering for catalog listings and resolutions.

use actionsense_core::{ActionDefinition, ActionRegistry, Resolution, SemanticOutcome};

/// Print every action with its triggers.
pub fn print_catalog(registry: &ActionRegistry) {
    if registry.is_empty() {
        println!("(no actions registered)");
        return;
    }

    for action in registry.list() {
        println!("{}", describe(action));
        if !action.description.is_empty() {
            println!("    {}", action.description);
        }
        if let Some(command) = &action.slash_command {
            println!("    command:  /{command}");
        }
        if !action.keywords.is_empty() {
            println!("    keywords: {}", action.keywords.join(", "));
        }
    }
}

/// Print the matched actions, best first, plus a note when Stage 2 degraded.
pub fn print_resolution(registry: &ActionRegistry, resolution: &Resolution) {
    if resolution.matches.is_empty() {
        println!("  no matching action");
    }

    for (rank, id) in resolution.matches.iter().enumerate() {
        match registry.lookup(id) {
            Ok(action) => println!("  {}. {}", rank + 1, describe(action)),
            Err(_) => println!("  {}. {id}", rank + 1),
        }
    }

    if let Some(note) = semantic_note(&resolution.semantic) {
        println!("  ({note})");
    }
}

fn describe(action: &ActionDefinition) -> String {
    match &action.icon {
        Some(icon) => format!("{icon} {} [{}]", action.label, action.id),
        None => format!("{} [{}]", action.label, action.id),
    }
}

fn semantic_note(outcome: &SemanticOutcome) -> Option<String> {
    match outcome {
        SemanticOutcome::Failed { reason } => {
            Some(format!("semantic resolver unavailable: {reason}"))
        }
        SemanticOutcome::TimedOut { after } => Some(format!(
            "semantic resolver timed out after {} ms",
            after.as_millis()
        )),
        SemanticOutcome::NotConfigured
        | SemanticOutcome::Skipped
        | SemanticOutcome::Completed { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn describe_with_and_without_icon() {
        let plain = ActionDefinition::new("debug", "Debug", "");
        assert_eq!(describe(&plain), "Debug [debug]");
        assert_eq!(describe(&plain.with_icon("🐛")), "🐛 Debug [debug]");
    }

    #[test]
    fn notes_only_for_degraded_outcomes() {
        assert!(semantic_note(&SemanticOutcome::Skipped).is_none());
        assert!(
            semantic_note(&SemanticOutcome::TimedOut {
                after: Duration::from_millis(300)
            })
            .unwrap()
            .contains("300 ms")
        );
    }
}
