//! Event-level rewriting of WordprocessingML parts.
//!
//! Paragraphs (`w:p`) are buffered whole so that text split across several
//! runs can be inspected and rewritten as one string. Everything outside a
//! paragraph is streamed through unchanged. Element names are matched with
//! their conventional `w:` prefix.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";
const BODY: &[u8] = b"w:body";
const SECTION_PROPERTIES: &[u8] = b"w:sectPr";
const TABLE: &[u8] = b"w:tbl";
const ROW: &[u8] = b"w:tr";
const CELL: &[u8] = b"w:tc";

/// What to do with one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParagraphEdit {
    /// Leave the paragraph as it is
    Keep,
    /// Put this text in the first text node and empty the others
    SetText(String),
    /// Replace the whole paragraph by pre-built XML
    Replace(String),
}

/// Visible text of every top-level paragraph, in document order.
pub(crate) fn paragraph_texts(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut texts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => depth += 1,
            Event::End(e) if e.name().as_ref() == PARAGRAPH => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    texts.push(std::mem::take(&mut current));
                }
            }
            Event::Empty(e) if e.name().as_ref() == PARAGRAPH && depth == 0 => {
                texts.push(String::new());
            }
            Event::Start(e) if e.name().as_ref() == TEXT => in_text = true,
            Event::End(e) if e.name().as_ref() == TEXT => in_text = false,
            Event::Text(t) if in_text && depth > 0 => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(texts)
}

/// Rewrite a part paragraph by paragraph.
///
/// `edit` sees the visible text of each top-level paragraph. When
/// `body_insert` is set, that XML is written just before the body-level
/// section properties (or before `</w:body>` when there are none).
pub(crate) fn rewrite_part<F>(xml: &str, mut edit: F, body_insert: Option<&str>) -> Result<String>
where
    F: FnMut(&str) -> ParagraphEdit,
{
    let mut reader = Reader::from_str(xml);
    let extra = body_insert.map_or(0, str::len);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + extra));
    let mut pending_insert = body_insert;

    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;
    let mut path: Vec<Vec<u8>> = Vec::new();

    loop {
        let event = reader.read_event()?;
        let tag = Tag::of(&event);

        if matches!(event, Event::Eof) {
            break;
        }

        if depth > 0 {
            match &tag {
                Tag::Open(name) if name == PARAGRAPH => depth += 1,
                Tag::Close(name) if name == PARAGRAPH => depth -= 1,
                _ => {}
            }
            paragraph.push(event.into_owned());
            if depth == 0 {
                flush_paragraph(&mut writer, std::mem::take(&mut paragraph), &mut edit)?;
            }
            continue;
        }

        match &tag {
            Tag::Open(name) if name == PARAGRAPH => {
                depth = 1;
                paragraph.push(event.into_owned());
                continue;
            }
            Tag::Open(name) | Tag::Empty(name)
                if name == SECTION_PROPERTIES && path.last().is_some_and(|p| p == BODY) =>
            {
                if let Some(insert) = pending_insert.take() {
                    write_raw(&mut writer, insert)?;
                }
            }
            Tag::Close(name) if name == BODY => {
                if let Some(insert) = pending_insert.take() {
                    write_raw(&mut writer, insert)?;
                }
            }
            _ => {}
        }

        match tag {
            Tag::Open(name) => path.push(name),
            Tag::Close(_) => {
                path.pop();
            }
            _ => {}
        }
        writer.write_event(event)?;
    }

    // Unterminated paragraph at end of input: keep what we have.
    for event in paragraph {
        writer.write_event(event)?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| crate::error::Error::Render(format!("rewritten XML is not UTF-8: {}", e)))
}

/// Append rows to tables.
///
/// `rows` sees the text of each table's first-row cells when the table
/// closes, innermost tables first. XML it returns is written just before
/// `</w:tbl>`.
pub(crate) fn append_table_rows<F>(xml: &str, mut rows: F) -> Result<String>
where
    F: FnMut(&[String]) -> Option<String>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut tables: Vec<TableFrame> = Vec::new();

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        match Tag::of(&event) {
            Tag::Open(name) if name == TABLE => tables.push(TableFrame::default()),
            Tag::Close(name) if name == TABLE => {
                if let Some(table) = tables.pop() {
                    if let Some(extra) = rows(&table.header) {
                        write_raw(&mut writer, &extra)?;
                    }
                }
            }
            Tag::Open(name) if name == ROW => {
                if let Some(table) = tables.last_mut() {
                    table.rows += 1;
                }
            }
            Tag::Open(name) if name == CELL => {
                if let Some(table) = tables.last_mut().filter(|f| f.rows == 1) {
                    table.cell = Some(String::new());
                }
            }
            Tag::Empty(name) if name == CELL => {
                if let Some(table) = tables.last_mut().filter(|f| f.rows == 1) {
                    table.header.push(String::new());
                }
            }
            Tag::Close(name) if name == CELL => {
                if let Some(table) = tables.last_mut() {
                    if let Some(cell) = table.cell.take() {
                        table.header.push(cell.trim().to_string());
                    }
                }
            }
            Tag::Open(name) if name == TEXT => {
                if let Some(table) = tables.last_mut() {
                    table.in_text = true;
                }
            }
            Tag::Close(name) if name == TEXT => {
                if let Some(table) = tables.last_mut() {
                    table.in_text = false;
                }
            }
            _ => {
                if let Event::Text(t) = &event {
                    if let Some(table) = tables.last_mut().filter(|f| f.in_text) {
                        if let Some(cell) = table.cell.as_mut() {
                            cell.push_str(&t.unescape()?);
                        }
                    }
                }
            }
        }

        writer.write_event(event)?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| crate::error::Error::Render(format!("rewritten XML is not UTF-8: {}", e)))
}

/// A table being read: row count so far and its first-row cell texts.
#[derive(Default)]
struct TableFrame {
    rows: usize,
    header: Vec<String>,
    cell: Option<String>,
    in_text: bool,
}

/// Element boundary of an event, with its qualified name.
enum Tag {
    Open(Vec<u8>),
    Close(Vec<u8>),
    Empty(Vec<u8>),
    Other,
}

impl Tag {
    fn of(event: &Event<'_>) -> Self {
        match event {
            Event::Start(e) => Tag::Open(e.name().as_ref().to_vec()),
            Event::End(e) => Tag::Close(e.name().as_ref().to_vec()),
            Event::Empty(e) => Tag::Empty(e.name().as_ref().to_vec()),
            _ => Tag::Other,
        }
    }
}

fn write_raw(writer: &mut Writer<Vec<u8>>, xml: &str) -> Result<()> {
    writer.write_event(Event::Text(BytesText::from_escaped(xml)))?;
    Ok(())
}

fn flush_paragraph<F>(
    writer: &mut Writer<Vec<u8>>,
    events: Vec<Event<'static>>,
    edit: &mut F,
) -> Result<()>
where
    F: FnMut(&str) -> ParagraphEdit,
{
    let text = visible_text(&events)?;
    match edit(&text) {
        ParagraphEdit::Keep => {
            for event in events {
                writer.write_event(event)?;
            }
        }
        ParagraphEdit::SetText(new_text) => {
            for event in set_text(events, &new_text) {
                writer.write_event(event)?;
            }
        }
        ParagraphEdit::Replace(xml) => write_raw(writer, &xml)?,
    }
    Ok(())
}

fn visible_text(events: &[Event<'static>]) -> Result<String> {
    let mut text = String::new();
    let mut in_text = false;
    for event in events {
        match event {
            Event::Start(e) if e.name().as_ref() == TEXT => in_text = true,
            Event::End(e) if e.name().as_ref() == TEXT => in_text = false,
            Event::Text(t) if in_text => text.push_str(&t.unescape()?),
            _ => {}
        }
    }
    Ok(text)
}

/// Move the paragraph's whole text into its first text node, keeping the
/// run properties of that node's run.
fn set_text(events: Vec<Event<'static>>, text: &str) -> Vec<Event<'static>> {
    let mut out: Vec<Event<'static>> = Vec::with_capacity(events.len());
    let mut in_text = false;
    let mut written = false;
    let mut text_start = None;

    for event in events {
        match event {
            Event::Start(e) if e.name().as_ref() == TEXT => {
                in_text = true;
                text_start = Some(out.len());
                out.push(Event::Start(e));
            }
            Event::End(e) if e.name().as_ref() == TEXT => {
                in_text = false;
                out.push(Event::End(e));
            }
            Event::Text(_) if in_text => {
                if written {
                    continue;
                }
                written = true;
                if let Some(idx) = text_start {
                    if let Event::Start(start) = &out[idx] {
                        let preserved = preserve_space(start);
                        out[idx] = Event::Start(preserved);
                    }
                }
                out.push(Event::Text(BytesText::new(text).into_owned()));
            }
            other => out.push(other),
        }
    }

    out
}

fn preserve_space(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut rebuilt = BytesStart::new("w:t");
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() != b"xml:space" {
            rebuilt.push_attribute(attr);
        }
    }
    rebuilt.push_attribute(("xml:space", "preserve"));
    rebuilt.into_owned()
}
