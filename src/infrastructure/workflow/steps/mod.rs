//! Built-in step implementations
//!
//! Collaborators that vary per run (the entity mutator, the term lookup)
//! travel in the context's service registry under the names below.

mod assistant;
mod taxonomy;

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

pub use assistant::{AiAssistantStep, ManagedAssistantStep};
pub use taxonomy::TaxonomyResolutionStep;

use crate::domain::{
    apply_actions, Action, AssistantExecutor, EntityMutator, ExecutionContext, StepConfig,
    StepRegistry, TermLookup,
};
use crate::domain::workflow::ServiceRegistry;

/// Service name of the [`EntityMutator`] used to apply actions
pub const ENTITY_MUTATOR_SERVICE: &str = "entity_mutator";

/// Service name of the [`TermLookup`] used by taxonomy resolution
pub const TERM_LOOKUP_SERVICE: &str = "term_lookup";

/// Step output key holding the action report
pub const ACTIONS_KEY: &str = "_actions";

/// Step output key holding parser warnings
pub const WARNINGS_KEY: &str = "_warnings";

type SharedEntityMutator = Arc<dyn EntityMutator>;
type SharedTermLookup = Arc<dyn TermLookup>;

/// Registry with every built-in step
pub fn default_registry(executor: Arc<dyn AssistantExecutor>) -> StepRegistry {
    StepRegistry::new()
        .with_step(Arc::new(AiAssistantStep::new(executor.clone())))
        .with_step(Arc::new(ManagedAssistantStep::new(executor)))
        .with_step(Arc::new(TaxonomyResolutionStep::new()))
}

pub fn provide_entity_mutator(services: &mut ServiceRegistry, mutator: Arc<dyn EntityMutator>) {
    services.insert(ENTITY_MUTATOR_SERVICE, Arc::new(mutator));
}

pub fn provide_term_lookup(services: &mut ServiceRegistry, lookup: Arc<dyn TermLookup>) {
    services.insert(TERM_LOOKUP_SERVICE, Arc::new(lookup));
}

fn term_lookup(context: &ExecutionContext) -> Option<SharedTermLookup> {
    context
        .service::<SharedTermLookup>(TERM_LOOKUP_SERVICE)
        .map(|lookup| lookup.as_ref().clone())
}

/// Paths listed under the `required_paths` setting
fn configured_paths(config: &StepConfig) -> Vec<String> {
    config
        .setting("required_paths")
        .and_then(|v| v.as_array())
        .map(|paths| {
            paths
                .iter()
                .filter_map(|p| p.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Apply `actions` when the context allows it, and report what happened.
///
/// Actions are only applied on an entity context outside dry runs with an
/// entity mutator registered; otherwise they are reported as planned.
async fn dispatch_actions(context: &ExecutionContext, step_id: &str, actions: &[Action]) -> Value {
    let held = if context.is_dry_run() {
        Some("dry run")
    } else if context.is_virtual() {
        Some("virtual context")
    } else {
        None
    };

    let mutator = context.service::<SharedEntityMutator>(ENTITY_MUTATOR_SERVICE);

    match (held, context.post_id(), mutator) {
        (None, Some(post_id), Some(mutator)) => {
            let outcomes = apply_actions(mutator.as_ref().as_ref(), post_id, actions).await;
            let failed = outcomes.iter().filter(|o| !o.success).count();
            if failed > 0 {
                warn!(step_id = %step_id, post_id, failed, total = outcomes.len(), "Some actions failed");
            }

            json!({
                "applied": true,
                "planned": actions,
                "results": outcomes,
            })
        }
        (held, _, _) => {
            let reason = held.unwrap_or("no entity mutator registered");
            debug!(step_id = %step_id, actions = actions.len(), reason = %reason, "Actions not applied");

            json!({
                "applied": false,
                "reason": reason,
                "planned": actions,
            })
        }
    }
}
