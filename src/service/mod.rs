//! Proposal assembly: brief → prompt → generated text → document.

mod generator;
mod prompt;

pub use generator::{GenerationOptions, GenerationRequest, StaticGenerator, TextGenerator};
pub use prompt::{PromptBuilder, DEFAULT_SECTIONS};

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::error::{GenerationError, Result};
use crate::model::{Block, Brief};
use crate::parser::segment;
use crate::render::{DocxRenderer, RenderContext, RenderStats, Template, DOCX_CONTENT_TYPE};

/// A finished proposal document.
#[derive(Debug, Clone)]
pub struct ProposalOutput {
    /// Suggested file name, e.g. `Proposal_ACME_20260305.docx`
    pub filename: String,
    /// MIME type of `bytes`
    pub content_type: &'static str,
    /// `.docx` package bytes
    pub bytes: Vec<u8>,
    /// Generated text the document was built from
    pub text: String,
    /// Blocks that were rendered
    pub blocks: Vec<Block>,
    /// Rendering statistics
    pub stats: RenderStats,
}

/// Orchestrates one proposal per call.
///
/// Template and renderer are shared read-only; the service itself holds no
/// per-request state and can serve concurrent calls.
pub struct ProposalService<G> {
    generator: G,
    template: Arc<Template>,
    renderer: Arc<DocxRenderer>,
    prompt: PromptBuilder,
    options: GenerationOptions,
    generation_date: Option<NaiveDate>,
}

impl<G: TextGenerator> ProposalService<G> {
    /// Create a service. Fails when the template lacks a registered style.
    pub fn new(
        generator: G,
        template: impl Into<Arc<Template>>,
        renderer: impl Into<Arc<DocxRenderer>>,
    ) -> Result<Self> {
        let template = template.into();
        let renderer = renderer.into();
        renderer.bind(&template)?;

        Ok(Self {
            generator,
            template,
            renderer,
            prompt: PromptBuilder::default(),
            options: GenerationOptions::default(),
            generation_date: None,
        })
    }

    /// Set the prompt builder and return self.
    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set the generation options and return self.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the generation date instead of using today's local date.
    pub fn with_generation_date(mut self, date: NaiveDate) -> Self {
        self.generation_date = Some(date);
        self
    }

    /// Get the text generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The prompt that would be sent for a brief.
    pub fn prompt_for(&self, brief: &Brief) -> String {
        self.prompt.build(brief)
    }

    /// Generate a proposal document for a brief.
    pub fn generate(&self, brief: &Brief) -> Result<ProposalOutput> {
        brief.validate()?;

        let request = self.options.request(self.prompt.build(brief));
        log::info!(
            "requesting proposal text for '{}' ({} prompt chars)",
            brief.client_name,
            request.prompt.len()
        );
        let text = self.generator.generate(&request).map_err(|e| {
            log::warn!("text generation failed: {}", e);
            e
        })?;

        self.assemble(brief, &text)
    }

    /// Build the document from already generated text.
    pub fn render_text(&self, brief: &Brief, text: &str) -> Result<ProposalOutput> {
        brief.validate()?;
        self.assemble(brief, text)
    }

    fn assemble(&self, brief: &Brief, text: &str) -> Result<ProposalOutput> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        let date = self
            .generation_date
            .unwrap_or_else(|| Local::now().date_naive());
        let blocks = segment(strip_code_fence(text));
        let context = RenderContext::from_brief(brief, date);
        let rendered = self.renderer.render(&self.template, &blocks, &context)?;

        Ok(ProposalOutput {
            filename: output_filename(&brief.client_name, date),
            content_type: DOCX_CONTENT_TYPE,
            bytes: rendered.bytes,
            text: text.to_string(),
            blocks,
            stats: rendered.stats,
        })
    }
}

/// Remove one code fence wrapping the whole text, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed
        .strip_prefix("```")
        .or_else(|| trimmed.strip_prefix("~~~"))
    else {
        return text;
    };
    let fence = &trimmed[..3];

    // The opening line may carry a language tag.
    let Some((_, body)) = rest.split_once('\n') else {
        return text;
    };
    match body.trim_end().strip_suffix(fence) {
        Some(inner) if !inner.contains(fence) => inner.trim_end(),
        _ => text,
    }
}

/// Reduce a client name to a file-name-safe stem.
///
/// Keeps alphanumerics, `_` and `-`; spaces become `_`; an empty result
/// becomes `proposal`.
pub fn safe_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let stem = kept.trim().replace(' ', "_");
    if stem.is_empty() {
        "proposal".to_string()
    } else {
        stem
    }
}

/// File name for a proposal: `Proposal_<ClientName>_<YYYYMMDD>.docx`.
pub fn output_filename(client_name: &str, date: NaiveDate) -> String {
    format!(
        "Proposal_{}_{}.docx",
        safe_filename(client_name),
        date.format("%Y%m%d")
    )
}
