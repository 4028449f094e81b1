//! Entity mutator implementations

mod in_memory_mutator;

pub use in_memory_mutator::InMemoryEntityMutator;
