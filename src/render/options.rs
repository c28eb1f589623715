//! Rendering options and configuration.

/// Date format used for the `{{date}}` and `{{deadline}}` placeholders.
pub const DEFAULT_DATE_FORMAT: &str = "%d %B %Y";

/// Options for rendering blocks into a document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// chrono format string for date placeholders
    pub date_format: String,

    /// Emit a title paragraph when the template has no `{{title}}` token
    pub title_fallback: bool,

    /// Emit a caption paragraph before tables that carry a name
    pub table_captions: bool,

    /// Substitute placeholders in headers and footers too
    pub process_headers_footers: bool,

    /// How parts of the output package are stored
    pub compression: Compression,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date format.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Enable or disable the fallback title paragraph.
    pub fn with_title_fallback(mut self, enabled: bool) -> Self {
        self.title_fallback = enabled;
        self
    }

    /// Enable or disable table captions.
    pub fn with_table_captions(mut self, enabled: bool) -> Self {
        self.table_captions = enabled;
        self
    }

    /// Enable or disable header/footer substitution.
    pub fn with_headers_footers(mut self, enabled: bool) -> Self {
        self.process_headers_footers = enabled;
        self
    }

    /// Set the package compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            title_fallback: true,
            table_captions: true,
            process_headers_footers: true,
            compression: Compression::Deflate,
        }
    }
}

/// Storage method for the parts of the output package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Deflate-compressed parts
    #[default]
    Deflate,
    /// Uncompressed parts
    Stored,
}

impl Compression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Deflate => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_date_format("%Y-%m-%d")
            .with_title_fallback(false)
            .with_compression(Compression::Stored);

        assert_eq!(options.date_format, "%Y-%m-%d");
        assert!(!options.title_fallback);
        assert!(options.table_captions);
        assert_eq!(options.compression.method(), zip::CompressionMethod::Stored);
    }

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.date_format, DEFAULT_DATE_FORMAT);
        assert!(options.process_headers_footers);
        assert_eq!(options.compression, Compression::Deflate);
    }
}
