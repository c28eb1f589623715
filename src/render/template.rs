//! Document templates.
//!
//! A template is a `.docx` package held in memory. It is never modified:
//! every render reads from it and writes a new package.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::options::Compression;
use super::placeholder::placeholder_keys;
use super::styles::StyleRegistry;
use super::xml::paragraph_texts;
use crate::error::{Error, Result};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Style definitions part.
pub const STYLES_PART: &str = "word/styles.xml";

/// A read-only `.docx` skeleton.
#[derive(Debug, Clone)]
pub struct Template {
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

impl Template {
    /// Load a template from a `.docx` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::Template(format!("cannot read {}: {}", path.display(), e)))?;
        log::debug!("loaded template {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(&data)
    }

    /// Load a template from `.docx` bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            parts.push(Part {
                name: entry.name().to_string(),
                data: buf,
            });
        }

        let template = Self { parts };
        if template.part(DOCUMENT_PART).is_none() {
            return Err(Error::Template(format!("package has no {}", DOCUMENT_PART)));
        }
        template.check_parts()?;
        Ok(template)
    }

    /// Parse every part a render reads, so a broken package fails on load
    /// rather than on the first request.
    fn check_parts(&self) -> Result<()> {
        let names: Vec<&str> = self.text_parts().collect();
        for name in names {
            paragraph_texts(self.xml_part(name)?).map_err(|e| {
                Error::Template(format!("{} is not well-formed XML: {}", name, e))
            })?;
        }
        if self.part(STYLES_PART).is_some() {
            self.style_ids().map_err(|e| {
                Error::Template(format!("{} is not well-formed XML: {}", STYLES_PART, e))
            })?;
        }
        Ok(())
    }

    /// The self-contained default template.
    ///
    /// It defines every style of the default [`StyleRegistry`], bullet and
    /// decimal numbering, a header showing `{{client_name}}` and a footer
    /// showing `{{date}}`.
    pub fn builtin() -> Self {
        let parts = builtin::PARTS
            .iter()
            .map(|(name, xml)| Part {
                name: (*name).to_string(),
                data: xml.as_bytes().to_vec(),
            })
            .collect();
        Self { parts }
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Names of all parts, in package order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Parts in package order.
    pub(crate) fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|p| (p.name.as_str(), p.data.as_slice()))
    }

    /// A part decoded as UTF-8 XML.
    pub fn xml_part(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::Template(format!("package has no {}", name)))?;
        std::str::from_utf8(data)
            .map_err(|e| Error::Template(format!("{} is not valid UTF-8: {}", name, e)))
    }

    /// Header and footer part names.
    pub fn header_footer_parts(&self) -> impl Iterator<Item = &str> {
        self.part_names().filter(|name| is_header_or_footer(name))
    }

    /// Style ids defined in `word/styles.xml`.
    pub fn style_ids(&self) -> Result<BTreeSet<String>> {
        let xml = self.xml_part(STYLES_PART)?;
        let mut reader = Reader::from_str(xml);
        let mut ids = BTreeSet::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"w:style" => {
                    let attr = e
                        .try_get_attribute("w:styleId")
                        .map_err(quick_xml::Error::from)?;
                    if let Some(attr) = attr {
                        ids.insert(attr.unescape_value()?.into_owned());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(ids)
    }

    /// Check that every role of the registry maps to a style this template
    /// defines.
    pub fn check_styles(&self, registry: &StyleRegistry) -> Result<()> {
        registry.validate()?;
        let ids = self.style_ids()?;
        for (role, style) in registry.iter() {
            if !ids.contains(style) {
                return Err(Error::StyleNotInTemplate {
                    role,
                    style: style.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Placeholder names used in the body, headers and footers.
    pub fn placeholders(&self) -> Result<BTreeSet<String>> {
        let mut keys = BTreeSet::new();
        for name in self.text_parts() {
            for text in paragraph_texts(self.xml_part(name)?)? {
                keys.extend(placeholder_keys(&text).map(str::to_string));
            }
        }
        Ok(keys)
    }

    /// Whether `{{key}}` appears anywhere in the body, headers or footers.
    pub fn has_placeholder(&self, key: &str) -> Result<bool> {
        Ok(self.placeholders()?.contains(key))
    }

    /// Serialize the template as a `.docx` package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        write_package(self.parts(), Compression::Deflate)
    }

    fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.part_names()
            .filter(|name| *name == DOCUMENT_PART)
            .chain(self.header_footer_parts())
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn is_header_or_footer(name: &str) -> bool {
    (name.starts_with("word/header") || name.starts_with("word/footer")) && name.ends_with(".xml")
}

/// Write parts into a new zip package.
///
/// Entries get a fixed timestamp so identical input gives identical bytes.
pub(crate) fn write_package<'a, I>(parts: I, compression: Compression) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(compression.method())
        .last_modified_time(zip::DateTime::default());

    for (name, data) in parts {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

mod builtin {
    pub(super) const PARTS: [(&str, &str); 8] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", DOCUMENT),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES),
        ("word/numbering.xml", NUMBERING),
        ("word/header1.xml", HEADER),
        ("word/footer1.xml", FOOTER),
    ];

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
  <Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>
</Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
</Relationships>"#;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>{{title}}</w:t></w:r></w:p>
    <w:p><w:pPr><w:pStyle w:val="Subtitle"/></w:pPr><w:r><w:t xml:space="preserve">Prepared for {{client_name}}, {{date}}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{{content}}</w:t></w:r></w:p>
    <w:sectPr>
      <w:headerReference w:type="default" r:id="rId3"/>
      <w:footerReference w:type="default" r:id="rId4"/>
      <w:pgSz w:w="11906" w:h="16838"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:spacing w:after="240"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="48"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Subtitle">
    <w:name w:val="Subtitle"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:rPr><w:i/><w:color w:val="595959"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="26"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet">
    <w:name w:val="List Bullet"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:spacing w:after="60"/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListNumber">
    <w:name w:val="List Number"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:numPr><w:numId w:val="2"/></w:numPr><w:spacing w:after="60"/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="TableHeader">
    <w:name w:val="Table Header"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="0"/></w:pPr>
    <w:rPr><w:b/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="TableCell">
    <w:name w:val="Table Cell"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="0"/></w:pPr>
  </w:style>
  <w:style w:type="table" w:styleId="TableGrid">
    <w:name w:val="Table Grid"/>
    <w:tblPr>
      <w:tblBorders>
        <w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>
      </w:tblBorders>
      <w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar>
    </w:tblPr>
  </w:style>
</w:styles>"#;

    const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="&#8226;"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

    const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:t>{{client_name}}</w:t></w:r></w:p>
</w:hdr>"#;

    const FOOTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>{{date}}</w:t></w:r></w:p>
</w:ftr>"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StyleRole;

    #[test]
    fn test_builtin_defines_default_styles() {
        let template = Template::builtin();
        assert!(template.check_styles(&StyleRegistry::default()).is_ok());

        let ids = template.style_ids().unwrap();
        assert!(ids.contains("Heading1"));
        assert!(ids.contains("TableGrid"));
    }

    #[test]
    fn test_style_not_in_template() {
        let registry = StyleRegistry::default().with_style(StyleRole::Bullet, "FancyBullet");
        let err = Template::builtin().check_styles(&registry).unwrap_err();
        match err {
            Error::StyleNotInTemplate { role, style } => {
                assert_eq!(role, StyleRole::Bullet);
                assert_eq!(style, "FancyBullet");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builtin_placeholders() {
        let keys = Template::builtin().placeholders().unwrap();
        let keys: Vec<_> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["client_name", "content", "date", "title"]);
    }

    #[test]
    fn test_header_footer_parts() {
        let template = Template::builtin();
        let parts: Vec<_> = template.header_footer_parts().collect();
        assert_eq!(parts, vec!["word/header1.xml", "word/footer1.xml"]);
    }

    #[test]
    fn test_round_trip_bytes() {
        let bytes = Template::builtin().to_bytes().unwrap();
        let template = Template::from_bytes(&bytes).unwrap();
        assert_eq!(template.part_names().count(), 8);
        assert!(template.has_placeholder("content").unwrap());
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = write_package([("word/styles.xml", &b"<w:styles/>"[..])], Compression::Stored)
            .unwrap();
        let err = Template::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_corrupt_document_part() {
        let bytes = write_package(
            [(DOCUMENT_PART, &b"<w:document><w:body><w:p><w:r><w:t>x</w:r></w:p></w:body></w:document>"[..])],
            Compression::Stored,
        )
        .unwrap();
        let err = Template::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Template(ref msg) if msg.contains(DOCUMENT_PART)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_corrupt_header_part() {
        let bytes = write_package(
            [
                (DOCUMENT_PART, &b"<w:document><w:body/></w:document>"[..]),
                ("word/header1.xml", &b"<w:hdr><w:p><w:r><w:t>{{client_name}}</w:p></w:hdr>"[..]),
            ],
            Compression::Stored,
        )
        .unwrap();
        let err = Template::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Template(ref msg) if msg.contains("word/header1.xml")));
    }

    #[test]
    fn test_non_utf8_document_part() {
        let bytes = write_package([(DOCUMENT_PART, &b"\xff\xfe\x00"[..])], Compression::Stored)
            .unwrap();
        let err = Template::from_bytes(&bytes).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unreadable_path() {
        let err = Template::from_path("/nonexistent/propdocx/template.docx").unwrap_err();
        assert!(matches!(err, Error::Template(ref msg) if msg.starts_with("cannot read")));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_not_a_zip() {
        let err = Template::from_bytes(b"plain text").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_deterministic_package() {
        let a = Template::builtin().to_bytes().unwrap();
        let b = Template::builtin().to_bytes().unwrap();
        assert_eq!(a, b);
    }
}
