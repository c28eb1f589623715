//! WordprocessingML renderer.

use std::fmt::Write as _;

use chrono::NaiveDate;
use quick_xml::escape::escape;

use super::options::{RenderOptions, DEFAULT_DATE_FORMAT};
use super::placeholder::Placeholders;
use super::result::{RenderStats, RenderedDocument};
use super::styles::{StyleRegistry, StyleRole};
use super::template::{is_header_or_footer, write_package, Template, DOCUMENT_PART};
use super::xml::{append_table_rows, paragraph_texts, rewrite_part, ParagraphEdit};
use crate::error::Result;
use crate::model::{Block, Brief, Deliverable, Financials, Grid, InlineRun, Phase, Signature, Tone};
use crate::parser::parse_inline;

/// MIME type of the rendered document.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Marker for the paragraph replaced by the rendered blocks.
pub const CONTENT_MARKER: &str = "{{content}}";

/// Deliverables with numbered `{{deliverable_N_*}}` placeholders.
pub const DELIVERABLE_SLOTS: usize = 4;

/// Phases with numbered `{{phase_N_*}}` placeholders.
pub const PHASE_SLOTS: usize = 3;

/// Rows appended to a single template table.
pub const MAX_APPENDED_ROWS: usize = 200;

const DELIVERABLE_HEADERS: [&str; 3] = ["deliverable", "description", "acceptance"];
const PHASE_HEADERS: [&str; 3] = ["phase", "duration", "key tasks"];

/// Values substituted into template placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// `{{client_name}}`
    pub client_name: String,
    /// `{{title}}`, also used for the fallback title paragraph
    pub title: String,
    /// `{{date}}`
    pub date: NaiveDate,
    /// `{{deadline}}` (empty when absent)
    pub deadline: Option<NaiveDate>,
    /// `{{audience}}`
    pub audience: Option<String>,
    /// `{{contact_email}}`
    pub contact_email: Option<String>,
    /// `{{technologies}}`, comma separated
    pub technologies: Vec<String>,
    /// `{{tone}}`
    pub tone: Option<Tone>,
    /// `{{current_date}}`: the day the document is generated
    pub generated_on: NaiveDate,
    /// `{{provider_company_name}}`
    pub provider_name: Option<String>,
    /// `{{proposal_date}}`
    pub proposal_date: Option<NaiveDate>,
    /// `{{valid_until_date}}`
    pub valid_until: Option<NaiveDate>,
    /// Rows for the deliverables table and `{{deliverable_N_*}}`
    pub deliverables: Vec<Deliverable>,
    /// Rows for the timeline table and `{{phase_N_*}}`
    pub phases: Vec<Phase>,
    /// `{{development_cost}}` and friends, plus `{{total_investment_cost}}`
    pub financials: Option<Financials>,
    /// `{{client_signature_name}}`, `{{client_signature_date}}`
    pub client_signature: Signature,
    /// `{{provider_signature_name}}`, `{{provider_signature_date}}`
    pub provider_signature: Signature,
    extra: Placeholders,
}

impl RenderContext {
    /// Create a context with the three core values.
    pub fn new(client_name: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            client_name: client_name.into(),
            title: title.into(),
            date,
            deadline: None,
            audience: None,
            contact_email: None,
            technologies: Vec::new(),
            tone: None,
            generated_on: date,
            provider_name: None,
            proposal_date: None,
            valid_until: None,
            deliverables: Vec::new(),
            phases: Vec::new(),
            financials: None,
            client_signature: Signature::default(),
            provider_signature: Signature::default(),
            extra: Placeholders::new(),
        }
    }

    /// Build the context for a brief.
    ///
    /// `{{date}}` is the deadline when the brief has one, otherwise the
    /// generation date.
    pub fn from_brief(brief: &Brief, generation_date: NaiveDate) -> Self {
        Self {
            client_name: brief.client_name.trim().to_string(),
            title: brief.display_title(),
            date: brief.deadline.unwrap_or(generation_date),
            deadline: brief.deadline,
            audience: brief.audience.clone(),
            contact_email: brief.contact_email.clone(),
            technologies: brief.technologies.clone(),
            tone: Some(brief.tone),
            generated_on: generation_date,
            provider_name: brief.provider_name.as_deref().map(|p| p.trim().to_string()),
            proposal_date: brief.proposal_date,
            valid_until: brief.valid_until_date,
            deliverables: brief.deliverables.clone(),
            phases: brief.phases.clone(),
            financials: brief.financials,
            client_signature: brief.client_signature(),
            provider_signature: brief.provider_signature(),
            extra: Placeholders::new(),
        }
    }

    /// Add a custom placeholder value and return self.
    ///
    /// Custom values never override the built-in keys.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key, value);
        self
    }

    /// All placeholder values, dates formatted with `date_format`.
    pub fn placeholders(&self, date_format: &str) -> Placeholders {
        let mut values = self.extra.clone();
        values.insert("client_name", self.client_name.as_str());
        values.insert("title", self.title.as_str());
        values.insert("date", format_date(self.date, date_format));
        values.insert(
            "deadline",
            self.deadline
                .map(|d| format_date(d, date_format))
                .unwrap_or_default(),
        );
        values.insert("audience", self.audience.clone().unwrap_or_default());
        values.insert("contact_email", self.contact_email.clone().unwrap_or_default());
        values.insert("technologies", self.technologies.join(", "));
        values.insert(
            "tone",
            self.tone.map(|t| t.as_str()).unwrap_or_default(),
        );

        let date = |d: Option<NaiveDate>| d.map(|d| format_date(d, date_format)).unwrap_or_default();
        values.insert("client_company_name", self.client_name.as_str());
        values.insert("provider_company_name", self.provider_name.clone().unwrap_or_default());
        values.insert("current_date", format_date(self.generated_on, date_format));
        values.insert("expected_completion_date", date(self.deadline));
        values.insert("proposal_date", date(self.proposal_date));
        values.insert("valid_until_date", date(self.valid_until));
        values.insert(
            "client_signature_name",
            self.client_signature.name.clone().unwrap_or_default(),
        );
        values.insert("client_signature_date", date(self.client_signature.date));
        values.insert(
            "provider_signature_name",
            self.provider_signature.name.clone().unwrap_or_default(),
        );
        values.insert("provider_signature_date", date(self.provider_signature.date));

        let financials = self.financials.unwrap_or_default();
        for (key, cost) in financials.items() {
            values.insert(key, cost.map(format_currency).unwrap_or_default());
        }
        values.insert(
            "total_investment_cost",
            self.financials
                .map(|f| format_currency(f.total()))
                .unwrap_or_default(),
        );

        for slot in 0..DELIVERABLE_SLOTS {
            let d = self.deliverables.get(slot);
            let n = slot + 1;
            values.insert(
                format!("deliverable_{}_title", n),
                d.map(|d| d.title.as_str()).unwrap_or_default(),
            );
            values.insert(
                format!("deliverable_{}_description", n),
                d.map(|d| d.description.as_str()).unwrap_or_default(),
            );
            values.insert(
                format!("deliverable_{}_acceptance", n),
                d.map(|d| d.acceptance_criteria.as_str()).unwrap_or_default(),
            );
        }
        for slot in 0..PHASE_SLOTS {
            let p = self.phases.get(slot);
            let n = slot + 1;
            values.insert(
                format!("phase_{}_tasks", n),
                p.map(|p| p.tasks.as_str()).unwrap_or_default(),
            );
            values.insert(
                format!("phase_{}_duration", n),
                p.map(Phase::duration_label).unwrap_or_default(),
            );
        }
        values
    }

    fn deliverable_rows(&self) -> Vec<Vec<String>> {
        self.deliverables
            .iter()
            .map(|d| {
                vec![
                    d.title.clone(),
                    d.description.clone(),
                    d.acceptance_criteria.clone(),
                ]
            })
            .collect()
    }

    fn phase_rows(&self) -> Vec<Vec<String>> {
        self.phases
            .iter()
            .enumerate()
            .map(|(i, p)| vec![format!("Phase {}", i + 1), p.duration_label(), p.tasks.clone()])
            .collect()
    }
}

/// Format an amount with thousands separators and two decimals, e.g.
/// `12,500.00`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

/// Format a date, falling back to the default format when `format` is not
/// a valid chrono format string.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_ok() {
        return out;
    }
    log::warn!("invalid date format {:?}, using {:?}", format, DEFAULT_DATE_FORMAT);
    date.format(DEFAULT_DATE_FORMAT).to_string()
}

/// Renders blocks into a copy of a template.
///
/// The renderer holds an immutable registry and options and can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct DocxRenderer {
    registry: StyleRegistry,
    options: RenderOptions,
}

impl DocxRenderer {
    /// Create a renderer. Fails when a role has no style.
    pub fn new(registry: StyleRegistry, options: RenderOptions) -> Result<Self> {
        registry.validate()?;
        Ok(Self { registry, options })
    }

    /// Get the style registry.
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Get the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Check that the template defines every registered style.
    ///
    /// Meant to run once at startup, before any request is served.
    pub fn bind(&self, template: &Template) -> Result<()> {
        template.check_styles(&self.registry)
    }

    /// Render blocks into a new `.docx` package based on `template`.
    pub fn render(
        &self,
        template: &Template,
        blocks: &[Block],
        context: &RenderContext,
    ) -> Result<RenderedDocument> {
        let mut stats = RenderStats::new();
        let values = context.placeholders(&self.options.date_format);

        let mut body = String::new();
        if self.options.title_fallback && !template.has_placeholder("title")? {
            self.write_paragraph(
                &mut body,
                StyleRole::Title,
                &[InlineRun::plain(context.title.as_str())],
            );
        }
        body.push_str(&self.blocks_xml(blocks, &mut stats));

        let mut parts: Vec<(&str, Vec<u8>)> = Vec::new();
        for (name, data) in template.parts() {
            let rewritten = if name == DOCUMENT_PART {
                let xml = template.xml_part(name)?;
                Some(self.render_document(xml, &values, &body, &mut stats, context)?)
            } else if self.options.process_headers_footers && is_header_or_footer(name) {
                let xml = template.xml_part(name)?;
                Some(substitute_part(xml, &values, &mut stats)?)
            } else {
                None
            };

            match rewritten {
                Some(xml) => parts.push((name, xml.into_bytes())),
                None => parts.push((name, data.to_vec())),
            }
        }

        let bytes = write_package(
            parts.iter().map(|(name, data)| (*name, data.as_slice())),
            self.options.compression,
        )?;

        log::debug!(
            "rendered {} blocks, {} placeholders, {} bytes",
            stats.block_count(),
            stats.placeholder_count,
            bytes.len()
        );
        Ok(RenderedDocument { bytes, stats })
    }

    fn render_document(
        &self,
        xml: &str,
        values: &Placeholders,
        body: &str,
        stats: &mut RenderStats,
        context: &RenderContext,
    ) -> Result<String> {
        let appended = self.append_rows(xml, context, stats)?;
        let xml = appended.as_str();

        let has_marker = paragraph_texts(xml)?
            .iter()
            .any(|text| text.trim() == CONTENT_MARKER);
        let mut inserted = false;
        let mut substituted = 0;

        let out = rewrite_part(
            xml,
            |text| {
                if has_marker && text.trim() == CONTENT_MARKER {
                    if inserted {
                        // Only the first marker receives the content.
                        return ParagraphEdit::Replace(String::new());
                    }
                    inserted = true;
                    return ParagraphEdit::Replace(body.to_string());
                }
                substitute_paragraph(text, values, &mut substituted)
            },
            if has_marker { None } else { Some(body) },
        )?;

        stats.placeholder_count += substituted;
        Ok(out)
    }

    /// Fill the first deliverables table and the first timeline table of the
    /// template, recognised by their header cells.
    fn append_rows(
        &self,
        xml: &str,
        context: &RenderContext,
        stats: &mut RenderStats,
    ) -> Result<String> {
        let mut deliverables = Some(context.deliverable_rows()).filter(|r| !r.is_empty());
        let mut phases = Some(context.phase_rows()).filter(|r| !r.is_empty());
        if deliverables.is_none() && phases.is_none() {
            return Ok(xml.to_string());
        }

        let mut appended = 0;
        let out = append_table_rows(xml, |header| {
            let rows = if deliverables.is_some() && header_matches(header, &DELIVERABLE_HEADERS) {
                deliverables.take()
            } else if phases.is_some() && header_matches(header, &PHASE_HEADERS) {
                phases.take()
            } else {
                None
            }?;

            let mut out = String::new();
            for row in rows.iter().take(MAX_APPENDED_ROWS) {
                self.write_appended_row(&mut out, row, header.len());
                appended += 1;
            }
            Some(out)
        })?;

        if deliverables.is_some() {
            log::debug!("template has no deliverables table, skipping rows");
        }
        if phases.is_some() {
            log::debug!("template has no timeline table, skipping rows");
        }
        stats.appended_row_count += appended;
        Ok(out)
    }

    /// A plain-text row fitted to `columns` cells. Narrow tables get the
    /// values joined into the first cell.
    fn write_appended_row(&self, out: &mut String, values: &[String], columns: usize) {
        if columns == 0 {
            return;
        }
        let cells: Vec<String> = if columns < values.len() {
            let mut cells = vec![values.join(" - ")];
            cells.resize(columns, String::new());
            cells
        } else {
            let mut cells = values.to_vec();
            cells.resize(columns, String::new());
            cells
        };

        out.push_str("<w:tr>");
        for cell in &cells {
            self.write_cell(out, StyleRole::TableCell, &[InlineRun::plain(cell.as_str())]);
        }
        out.push_str("</w:tr>");
    }

    /// XML of the given blocks as body-level elements.
    pub fn blocks_xml(&self, blocks: &[Block], stats: &mut RenderStats) -> String {
        let mut out = String::new();

        for block in blocks {
            stats.add_block(block);
            match block {
                Block::Heading { level, runs } => {
                    let role = if *level <= 1 {
                        StyleRole::Section
                    } else {
                        StyleRole::Subsection
                    };
                    self.write_paragraph(&mut out, role, runs);
                }
                Block::Paragraph { runs } => self.write_paragraph(&mut out, StyleRole::Body, runs),
                Block::BulletItem { runs } => {
                    self.write_paragraph(&mut out, StyleRole::Bullet, runs)
                }
                Block::NumberedItem { runs } => {
                    self.write_paragraph(&mut out, StyleRole::Numbered, runs)
                }
                Block::Table(grid) => self.write_table(&mut out, grid),
                Block::Raw { text } => {
                    self.write_paragraph(&mut out, StyleRole::Body, &[InlineRun::plain(text.as_str())])
                }
            }
        }

        out
    }

    fn style(&self, role: StyleRole) -> &str {
        // The registry was validated in `new`.
        self.registry.style_for(role).unwrap_or(role.default_style_id())
    }

    fn write_paragraph(&self, out: &mut String, role: StyleRole, runs: &[InlineRun]) {
        out.push_str("<w:p><w:pPr><w:pStyle w:val=\"");
        out.push_str(&escape(self.style(role)));
        out.push_str("\"/></w:pPr>");
        for run in runs {
            write_run(out, run);
        }
        out.push_str("</w:p>");
    }

    fn write_cell(&self, out: &mut String, role: StyleRole, runs: &[InlineRun]) {
        out.push_str("<w:tc><w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/></w:tcPr>");
        self.write_paragraph(out, role, runs);
        out.push_str("</w:tc>");
    }

    fn write_table(&self, out: &mut String, grid: &Grid) {
        if self.options.table_captions {
            if let Some(name) = &grid.name {
                self.write_paragraph(out, StyleRole::Body, &[InlineRun::bold(name.as_str())]);
            }
        }

        out.push_str("<w:tbl><w:tblPr><w:tblStyle w:val=\"");
        out.push_str(&escape(self.style(StyleRole::Table)));
        out.push_str("\"/><w:tblW w:w=\"5000\" w:type=\"pct\"/>");
        out.push_str("<w:tblLook w:val=\"04A0\" w:firstRow=\"1\" w:lastRow=\"0\" w:firstColumn=\"0\" w:lastColumn=\"0\" w:noHBand=\"0\" w:noVBand=\"1\"/>");
        out.push_str("</w:tblPr><w:tblGrid>");
        for _ in 0..grid.column_count() {
            out.push_str("<w:gridCol/>");
        }
        out.push_str("</w:tblGrid>");

        for (idx, row) in grid.rows().iter().enumerate() {
            let header = idx == 0;
            out.push_str("<w:tr>");
            if header {
                out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            let role = if header {
                StyleRole::TableHeader
            } else {
                StyleRole::TableCell
            };
            for cell in row {
                self.write_cell(out, role, &parse_inline(cell));
            }
            out.push_str("</w:tr>");
        }

        out.push_str("</w:tbl>");
    }
}

impl Default for DocxRenderer {
    fn default() -> Self {
        Self {
            registry: StyleRegistry::default(),
            options: RenderOptions::default(),
        }
    }
}

/// Whether every wanted header appears, case-insensitively, inside some
/// header cell.
fn header_matches(header: &[String], wanted: &[&str]) -> bool {
    let cells: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
    wanted
        .iter()
        .all(|w| cells.iter().any(|cell| cell.contains(w)))
}

fn write_run(out: &mut String, run: &InlineRun) {
    if run.is_empty() {
        return;
    }

    out.push_str("<w:r>");
    if run.bold || run.italic {
        out.push_str("<w:rPr>");
        if run.bold {
            out.push_str("<w:b/>");
        }
        if run.italic {
            out.push_str("<w:i/>");
        }
        out.push_str("</w:rPr>");
    }

    let text = sanitize(&run.text);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        if !line.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape(line));
            out.push_str("</w:t>");
        }
    }
    out.push_str("</w:r>");
}

/// Drop characters XML 1.0 cannot carry.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\t' || c == '\n' || !c.is_control())
        .filter(|&c| c != '\u{FFFE}' && c != '\u{FFFF}')
        .collect()
}

fn substitute_paragraph(text: &str, values: &Placeholders, count: &mut u32) -> ParagraphEdit {
    if !text.contains("{{") {
        return ParagraphEdit::Keep;
    }
    let (new_text, n) = values.substitute(text);
    if n == 0 {
        ParagraphEdit::Keep
    } else {
        *count += n as u32;
        ParagraphEdit::SetText(new_text)
    }
}

fn substitute_part(xml: &str, values: &Placeholders, stats: &mut RenderStats) -> Result<String> {
    let mut substituted = 0;
    let out = rewrite_part(
        xml,
        |text| substitute_paragraph(text, values, &mut substituted),
        None,
    )?;
    stats.placeholder_count += substituted;
    Ok(out)
}
