//! # propdocx
//!
//! Business-proposal generation from a short brief.
//!
//! The crate turns semi-structured generated text (headings, lists,
//! bold/italic spans and simple tables) into a styled `.docx` document
//! based on a template, tolerating malformed input without failing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use propdocx::{segment, Propdocx, RenderContext};
//!
//! fn main() -> propdocx::Result<()> {
//!     let text = "## Executive Summary\nWe deliver **on time**.\n- Item A\n- Item B";
//!
//!     // Inspect the block structure
//!     let blocks = segment(text);
//!     println!("{} blocks", blocks.len());
//!
//!     // Render into the built-in template
//!     let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
//!     let context = RenderContext::new("ACME", "Proposal for ACME", date);
//!     let document = Propdocx::new().convert(text, &context)?;
//!     std::fs::write("proposal.docx", &document.bytes)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Block segmentation**: `##`/`###` headings, bullet and numbered items,
//!   paragraphs, raw fallback for unsupported constructs
//! - **Inline emphasis**: nested `**bold**` and `_italic_`, unmatched markers
//!   kept literally
//! - **Tables**: JSON table descriptors and pipe tables, ragged rows padded
//! - **Templates**: style registry, `{{placeholder}}` substitution in body,
//!   headers and footers
//! - **Service**: brief validation, prompt building and a pluggable
//!   [`TextGenerator`]

pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod service;

// Re-export commonly used types
pub use error::{Error, FieldError, GenerationError, Result};
pub use model::{Block, Brief, Deliverable, Financials, Grid, InlineRun, Phase, Signature, Tone};
pub use parser::{parse_inline, segment, Extraction, SegmenterState};
pub use render::{
    DocxRenderer, JsonFormat, RenderContext, RenderOptions, RenderStats, RenderedDocument,
    StyleRegistry, StyleRole, Template, DOCX_CONTENT_TYPE,
};
pub use service::{
    GenerationOptions, GenerationRequest, PromptBuilder, ProposalOutput, ProposalService,
    StaticGenerator, TextGenerator,
};

use std::path::Path;

/// Render generated text into the built-in template.
///
/// # Example
///
/// ```no_run
/// use propdocx::{convert_text, RenderContext};
///
/// let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
/// let context = RenderContext::new("ACME", "Proposal for ACME", date);
/// let document = convert_text("## Scope\n- Design\n- Build", &context).unwrap();
/// println!("{} bytes", document.bytes.len());
/// ```
pub fn convert_text(text: &str, context: &RenderContext) -> Result<RenderedDocument> {
    Propdocx::new().convert(text, context)
}

/// Render generated text into a template file.
pub fn convert_text_with_template<P: AsRef<Path>>(
    text: &str,
    template: P,
    context: &RenderContext,
) -> Result<RenderedDocument> {
    Propdocx::new().with_template_file(template)?.convert(text, context)
}

/// Segment text and serialize the blocks as JSON.
///
/// A code fence wrapping the whole text is removed first, as it is for a
/// generated proposal.
///
/// # Example
///
/// ```
/// use propdocx::{blocks_json, JsonFormat};
///
/// let json = blocks_json("## Scope", JsonFormat::Compact).unwrap();
/// assert!(json.contains("\"heading\""));
/// ```
pub fn blocks_json(text: &str, format: JsonFormat) -> Result<String> {
    render::to_json(&segment(service::strip_code_fence(text)), format)
}

/// Builder for converting generated text into documents.
///
/// # Example
///
/// ```no_run
/// use propdocx::{Propdocx, RenderContext, StyleRegistry, StyleRole};
///
/// let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
/// let context = RenderContext::new("ACME", "Proposal for ACME", date);
/// let conversion = Propdocx::new()
///     .with_template_file("corporate.docx")?
///     .with_styles(StyleRegistry::default().with_style(StyleRole::Section, "CorpHeading"))
///     .without_title_fallback()
///     .parse("## Scope\n- Design");
/// let document = conversion.render(&context)?;
/// # Ok::<(), propdocx::Error>(())
/// ```
pub struct Propdocx {
    template: Template,
    registry: StyleRegistry,
    render_options: RenderOptions,
}

impl Propdocx {
    /// Create a builder using the built-in template and styles.
    pub fn new() -> Self {
        Self {
            template: Template::builtin(),
            registry: StyleRegistry::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Use a template loaded from a file.
    pub fn with_template_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.template = Template::from_path(path)?;
        Ok(self)
    }

    /// Use an already loaded template.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Set the style registry.
    pub fn with_styles(mut self, registry: StyleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set the date format for date placeholders.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_date_format(format);
        self
    }

    /// Never emit a title paragraph of our own.
    pub fn without_title_fallback(mut self) -> Self {
        self.render_options = self.render_options.with_title_fallback(false);
        self
    }

    /// Segment text, keeping the settings for rendering.
    pub fn parse(self, text: &str) -> Conversion {
        Conversion {
            blocks: segment(text),
            template: self.template,
            registry: self.registry,
            render_options: self.render_options,
        }
    }

    /// Segment and render in one step.
    pub fn convert(self, text: &str, context: &RenderContext) -> Result<RenderedDocument> {
        self.parse(text).render(context)
    }
}

impl Default for Propdocx {
    fn default() -> Self {
        Self::new()
    }
}

/// Segmented text ready to render.
pub struct Conversion {
    /// The segmented blocks
    pub blocks: Vec<Block>,
    template: Template,
    registry: StyleRegistry,
    render_options: RenderOptions,
}

impl Conversion {
    /// Render into a `.docx` package.
    ///
    /// Fails with a configuration error when the template does not define
    /// every registered style.
    pub fn render(&self, context: &RenderContext) -> Result<RenderedDocument> {
        let renderer = DocxRenderer::new(self.registry.clone(), self.render_options.clone())?;
        renderer.bind(&self.template)?;
        renderer.render(&self.template, &self.blocks, context)
    }

    /// Convert the blocks to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.blocks, format)
    }

    /// Visible text of the blocks, one per line.
    pub fn plain_text(&self) -> String {
        model::plain_text(&self.blocks)
    }

    /// Get the blocks.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context() -> RenderContext {
        RenderContext::new("ACME", "Plan", NaiveDate::from_ymd_opt(2026, 3, 5).unwrap())
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Propdocx::default();
        assert!(builder.render_options.title_fallback);
        assert_eq!(builder.registry, StyleRegistry::default());
    }

    #[test]
    fn test_builder_chained() {
        let builder = Propdocx::new()
            .with_date_format("%Y-%m-%d")
            .without_title_fallback();
        assert_eq!(builder.render_options.date_format, "%Y-%m-%d");
        assert!(!builder.render_options.title_fallback);
    }

    #[test]
    fn test_parse_and_plain_text() {
        let conversion = Propdocx::new().parse("## Scope\n- **Design**\n\nDone.");
        assert_eq!(conversion.blocks().len(), 3);
        assert_eq!(conversion.plain_text(), "Scope\nDesign\nDone.");
        assert!(conversion.to_json(JsonFormat::Compact).unwrap().starts_with('['));
    }

    #[test]
    fn test_convert_text() {
        let document = convert_text("## Scope\n- Design", &context()).unwrap();
        assert!(document.bytes.starts_with(b"PK"));
        assert_eq!(document.stats.heading_count, 1);
        assert_eq!(document.stats.list_item_count, 1);
    }

    #[test]
    fn test_convert_empty_text() {
        let document = convert_text("", &context()).unwrap();
        assert_eq!(document.stats.block_count(), 0);
    }

    #[test]
    fn test_unbound_styles_fail() {
        let result = Propdocx::new()
            .with_styles(StyleRegistry::default().with_style(StyleRole::Bullet, "Nope"))
            .convert("- a", &context());
        assert!(matches!(result, Err(Error::StyleNotInTemplate { .. })));
    }

    #[test]
    fn test_missing_template_file() {
        let err = match Propdocx::new().with_template_file("/nonexistent/template.docx") {
            Err(e) => e,
            Ok(_) => panic!("missing template file loaded"),
        };
        assert!(matches!(err, Error::Template(_)));
        assert!(err.is_configuration());
    }
}
