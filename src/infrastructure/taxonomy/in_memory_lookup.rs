//! In-memory term lookup

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::taxonomy::slugify;
use crate::domain::{DomainError, Term, TermLookup};

/// Terms held in memory, matched by name or slug ignoring case
#[derive(Debug, Clone, Default)]
pub struct InMemoryTermLookup {
    terms: Arc<RwLock<Vec<Term>>>,
}

impl InMemoryTermLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terms(terms: Vec<Term>) -> Self {
        Self {
            terms: Arc::new(RwLock::new(terms)),
        }
    }

    pub async fn add_term(&self, term: Term) {
        self.terms.write().await.push(term);
    }
}

#[async_trait]
impl TermLookup for InMemoryTermLookup {
    async fn find_term(&self, taxonomy: &str, label: &str) -> Result<Option<Term>, DomainError> {
        let label = label.trim();
        if label.is_empty() {
            return Ok(None);
        }

        let slug = slugify(label);
        let terms = self.terms.read().await;

        Ok(terms
            .iter()
            .filter(|t| t.taxonomy == taxonomy)
            .find(|t| t.name.eq_ignore_ascii_case(label) || t.slug == slug)
            .cloned())
    }
}
