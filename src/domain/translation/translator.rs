//! Translator contract

use async_trait::async_trait;

use super::entity::LanguagePair;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Translates text for a single direct language pair
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Translator: Send + Sync + std::fmt::Debug {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, DomainError>;
}
