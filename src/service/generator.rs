//! The text-generation collaborator seam.

use std::time::Duration;

use crate::error::GenerationError;

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text
    pub prompt: String,
    /// Maximum time the call may take
    pub timeout: Duration,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Produces proposal text for a prompt.
///
/// Implementations are synchronous and must honour the request timeout,
/// reporting it as [`GenerationError::Timeout`].
pub trait TextGenerator: Send + Sync {
    /// Generate text for the request.
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self(request)
    }
}

/// Generator that always returns the same text.
///
/// Useful for rendering pre-generated text and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    text: String,
}

impl StaticGenerator {
    /// Create a generator returning `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextGenerator for StaticGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(self.text.clone())
    }
}

/// Options for generation calls.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Maximum time a call may take
    pub timeout: Duration,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl GenerationOptions {
    /// Create new generation options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Build a request for a prompt.
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.into(),
            timeout: self.timeout,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_tokens: 2048,
            temperature: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = GenerationOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_tokens(0)
            .with_temperature(3.0);

        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.max_tokens, 1);
        assert_eq!(options.temperature, 2.0);

        let request = options.request("hello");
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.max_tokens, 1);
    }

    #[test]
    fn test_closure_generator() {
        let generator = |request: &GenerationRequest| {
            if request.prompt.is_empty() {
                Err(GenerationError::EmptyResponse)
            } else {
                Ok(request.prompt.to_uppercase())
            }
        };
        let options = GenerationOptions::default();

        assert_eq!(generator.generate(&options.request("ab")).unwrap(), "AB");
        assert_eq!(
            generator.generate(&options.request("")),
            Err(GenerationError::EmptyResponse)
        );
    }

    #[test]
    fn test_static_generator() {
        let generator = StaticGenerator::new("## Summary");
        let text = generator.generate(&GenerationOptions::default().request("x")).unwrap();
        assert_eq!(text, "## Summary");
    }
}
