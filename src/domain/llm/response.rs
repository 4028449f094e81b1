use serde::{Deserialize, Serialize};

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Read a usage block from a raw provider payload.
    ///
    /// Understands both the `prompt_tokens`/`completion_tokens` and the
    /// `input_tokens`/`output_tokens` naming.
    pub fn from_raw(value: &serde_json::Value) -> Option<Self> {
        let read = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(|v| v.as_u64()))
                .map(|v| v as u32)
        };

        let prompt = read(&["prompt_tokens", "input_tokens"]);
        let completion = read(&["completion_tokens", "output_tokens"]);

        match (prompt, completion) {
            (None, None) => None,
            (p, c) => Some(Self::new(p.unwrap_or(0), c.unwrap_or(0))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_calculation() {
        let usage = Usage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
    }

    #[test]
    fn test_usage_from_raw_openai_shape() {
        let usage = Usage::from_raw(&json!({"prompt_tokens": 12, "completion_tokens": 3})).unwrap();
        assert_eq!(usage, Usage::new(12, 3));
    }

    #[test]
    fn test_usage_from_raw_anthropic_shape() {
        let usage = Usage::from_raw(&json!({"input_tokens": 7, "output_tokens": 9})).unwrap();
        assert_eq!(usage.total_tokens, 16);
    }

    #[test]
    fn test_usage_from_raw_missing() {
        assert!(Usage::from_raw(&json!({"foo": 1})).is_none());
    }
}
