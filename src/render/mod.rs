//! Rendering of blocks into styled documents.

mod docx;
mod json;
mod options;
mod placeholder;
mod result;
mod styles;
mod template;
mod xml;

pub use docx::{
    format_currency, format_date, DocxRenderer, RenderContext, CONTENT_MARKER, DELIVERABLE_SLOTS,
    DOCX_CONTENT_TYPE, MAX_APPENDED_ROWS, PHASE_SLOTS,
};
pub use json::{to_json, JsonFormat};
pub use options::{Compression, RenderOptions, DEFAULT_DATE_FORMAT};
pub use placeholder::{placeholder_keys, Placeholders};
pub use result::{RenderStats, RenderedDocument};
pub use styles::{StyleRegistry, StyleRole};
pub use template::{Template, DOCUMENT_PART, STYLES_PART};
