//! Action dispatch - typed side effects derived from parsed assistant output

mod dispatcher;
mod entity;

pub use dispatcher::{apply_actions, generate_actions, ActionOutcome, EntityMutator};
pub use entity::{Action, ActionTarget};

#[cfg(test)]
pub use dispatcher::MockEntityMutator;
