//! Term lookup implementations

mod in_memory_lookup;

pub use in_memory_lookup::InMemoryTermLookup;
