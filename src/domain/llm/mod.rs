//! Chat-completion provider domain models and traits

mod message;
mod provider;
mod provider_resolver;
mod response;

pub use message::{Message, MessageRole};
pub use provider::{ChatParameters, ChatProvider};
pub use provider_resolver::{ProviderResolver, RegistryProviderResolver, StaticProviderResolver};
pub use response::Usage;

#[cfg(test)]
pub use provider::mock::MockChatProvider;
