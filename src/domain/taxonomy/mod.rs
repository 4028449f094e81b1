//! Taxonomy term lookup

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// An existing taxonomy term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
}

impl Term {
    pub fn new(id: u64, taxonomy: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            taxonomy: taxonomy.into(),
            slug: slugify(&name),
            name,
        }
    }
}

/// Finds existing terms by name or slug
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TermLookup: Send + Sync + std::fmt::Debug {
    /// Find a term whose name or slug matches `label`, ignoring case
    async fn find_term(&self, taxonomy: &str, label: &str) -> Result<Option<Term>, DomainError>;
}

/// Lowercase alphanumeric runs joined by single hyphens
pub fn slugify(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
