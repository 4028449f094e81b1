use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider {
        provider: String,
        message: String,
        error_code: Option<String>,
        retry_after: Option<u64>,
    },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Action error: {message}")]
    Action { message: String },

    #[error("Type mismatch at '{path}': {message}")]
    TypeMismatch { path: String, message: String },

    #[error("Translation error ({source_language} -> {target_language}): {message}")]
    Translation {
        source_language: String,
        target_language: String,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            error_code: None,
            retry_after: None,
        }
    }

    /// Provider error carrying the vendor error code and an optional retry hint in seconds
    pub fn provider_with_code(
        provider: impl Into<String>,
        message: impl Into<String>,
        error_code: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            error_code: Some(error_code.into()),
            retry_after,
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self::Action {
            message: message.into(),
        }
    }

    pub fn type_mismatch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn translation(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Translation {
            source_language: source_language.into(),
            target_language: target_language.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attribute a provider error to `name`; other variants are unchanged
    pub fn for_provider(self, name: &str) -> Self {
        match self {
            Self::Provider {
                message,
                error_code,
                retry_after,
                ..
            } => Self::Provider {
                provider: name.to_string(),
                message,
                error_code,
                retry_after,
            },
            other => other,
        }
    }

    /// Vendor error code, when this is a provider error that carried one
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Provider { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }

    /// Seconds the provider asked us to wait before retrying
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Provider { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Assistant 'seo' not found");
        assert_eq!(error.to_string(), "Not found: Assistant 'seo' not found");
    }

    #[test]
    fn test_configuration_error() {
        let error = DomainError::configuration("system_prompt is required");
        assert_eq!(
            error.to_string(),
            "Configuration error: system_prompt is required"
        );
    }

    #[test]
    fn test_provider_error_details() {
        let error = DomainError::provider_with_code("openai", "Rate limited", "429", Some(20));
        assert_eq!(error.to_string(), "Provider error: openai - Rate limited");
        assert_eq!(error.error_code(), Some("429"));
        assert_eq!(error.retry_after(), Some(20));

        let plain = DomainError::provider("openai", "boom");
        assert_eq!(plain.error_code(), None);
        assert_eq!(plain.retry_after(), None);
    }

    #[test]
    fn test_type_mismatch_error() {
        let error = DomainError::type_mismatch("post.title.value", "parent is not an object");
        assert_eq!(
            error.to_string(),
            "Type mismatch at 'post.title.value': parent is not an object"
        );
    }
}
