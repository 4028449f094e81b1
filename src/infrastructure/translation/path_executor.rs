//! Multi-hop translation

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{DomainError, TranslationPath, TranslationPathResolver, Translator};

/// Final text plus every hop's intermediate output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationOutcome {
    pub path: TranslationPath,
    pub text: String,
    pub hop_outputs: Vec<String>,
}

/// Resolves the path for a pair and runs its hops in order
#[derive(Debug)]
pub struct TranslationPathExecutor {
    resolver: TranslationPathResolver,
    translator: Arc<dyn Translator>,
}

impl TranslationPathExecutor {
    pub fn new(resolver: TranslationPathResolver, translator: Arc<dyn Translator>) -> Self {
        Self {
            resolver,
            translator,
        }
    }

    pub fn resolver(&self) -> &TranslationPathResolver {
        &self.resolver
    }

    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationOutcome, DomainError> {
        let path = self.resolver.resolve(source, target)?;
        self.execute_path(text, path).await
    }

    /// Each hop translates the previous hop's output; the first failure
    /// aborts with that hop's error
    pub async fn execute_path(
        &self,
        text: &str,
        path: TranslationPath,
    ) -> Result<TranslationOutcome, DomainError> {
        let mut current = text.to_string();
        let mut hop_outputs = Vec::new();

        for (index, hop) in path.hops().iter().enumerate() {
            current = match self.translator.translate(&current, hop).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(path = %path, hop = %hop, hop_index = index, error = %e, "Translation hop failed");
                    return Err(e);
                }
            };
            hop_outputs.push(current.clone());
        }

        info!(path = %path, hops = hop_outputs.len(), "Translation completed");

        Ok(TranslationOutcome {
            path,
            text: current,
            hop_outputs,
        })
    }
}
