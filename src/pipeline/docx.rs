//! `.docx` container: open, expose top-level paragraphs, serialise.
//!
//! A `.docx` file is a zip archive; the body text lives in
//! `word/document.xml`. Only that part is parsed. Every other entry (styles,
//! media, headers, relationships, …) is carried through byte-for-byte.
//!
//! `word/document.xml` is kept as a flat list of owned quick-xml events so
//! that anything we do not touch is written back exactly as it was read
//! (attribute values stay in their raw escaped form). The event list is split
//! into [`Segment`]s: raw runs of events, and [`Paragraph`]s, one per direct
//! `w:p` child of `w:body`. Paragraphs inside tables, text boxes, headers and
//! footers are deliberately not exposed.
//!
//! Element names are matched on their `w:` qualified form, the prefix Word
//! and every mainstream producer use for the WordprocessingML namespace.

use crate::error::TranslateError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip entry holding the main document body.
pub const DOCUMENT_PART: &str = "word/document.xml";

type XmlEvent = Event<'static>;

// ── Package ──────────────────────────────────────────────────────────────

struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: zip::DateTime,
    unix_mode: Option<u32>,
    is_dir: bool,
}

/// Largest uncompressed size accepted for a single package entry.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

fn read_entries(bytes: &[u8]) -> Result<Vec<PackageEntry>, TranslateError> {
    read_entries_limited(bytes, MAX_ENTRY_BYTES)
}

/// Unpack every entry, refusing any that inflates past `limit` bytes.
///
/// The sizes recorded in the archive are not trusted: buffers grow with the
/// data actually read, never with the header's claim.
fn read_entries_limited(bytes: &[u8], limit: u64) -> Result<Vec<PackageEntry>, TranslateError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| TranslateError::document(format!("not a .docx (zip) container: {e}")))?;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| TranslateError::document(format!("zip entry {i}: {e}")))?;
        let name = file.name().to_string();
        let hint = file.size().min(limit).min(bytes.len() as u64) as usize;
        let mut data = Vec::with_capacity(hint);
        (&mut file)
            .take(limit + 1)
            .read_to_end(&mut data)
            .map_err(|e| TranslateError::document(format!("read '{name}': {e}")))?;
        if data.len() as u64 > limit {
            return Err(TranslateError::document(format!(
                "entry '{name}' unpacks to more than {limit} bytes"
            )));
        }
        entries.push(PackageEntry {
            name,
            data,
            compression: file.compression(),
            last_modified: file.last_modified().unwrap_or_default(),
            unix_mode: file.unix_mode(),
            is_dir: file.is_dir(),
        });
    }
    Ok(entries)
}

fn write_entries(entries: &[PackageEntry], document_xml: &[u8]) -> Result<Vec<u8>, TranslateError> {
    let internal = |what: &str, name: &str, e: &dyn std::fmt::Display| {
        TranslateError::Internal(format!("{what} '{name}': {e}"))
    };

    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    for ent in entries {
        // Only stored/deflated are writable with the enabled zip features.
        let method = match ent.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let mut opts = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(ent.last_modified);
        if let Some(mode) = ent.unix_mode {
            opts = opts.unix_permissions(mode);
        }
        if ent.is_dir || ent.name.ends_with('/') {
            zout.add_directory(ent.name.as_str(), opts)
                .map_err(|e| internal("add zip dir", &ent.name, &e))?;
            continue;
        }
        let data = if ent.name == DOCUMENT_PART {
            document_xml
        } else {
            ent.data.as_slice()
        };
        zout.start_file(ent.name.as_str(), opts)
            .map_err(|e| internal("start zip entry", &ent.name, &e))?;
        zout.write_all(data)
            .map_err(|e| internal("write zip entry", &ent.name, &e))?;
    }
    let cursor = zout
        .finish()
        .map_err(|e| TranslateError::Internal(format!("finish zip: {e}")))?;
    Ok(cursor.into_inner())
}

// ── XML helpers ──────────────────────────────────────────────────────────

fn parse_events(xml: &[u8]) -> Result<Vec<XmlEvent>, TranslateError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = reader.read_event_into(&mut buf).map_err(|e| {
            TranslateError::document(format!(
                "{DOCUMENT_PART} at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match ev {
            Event::Eof => break,
            other => events.push(other.into_owned()),
        }
    }
    Ok(events)
}

fn element_name<'a>(ev: &'a XmlEvent) -> Option<&'a [u8]> {
    match ev {
        Event::Start(s) | Event::Empty(s) => Some(s.name().into_inner()),
        _ => None,
    }
}

fn node_name<'a>(node: &'a [XmlEvent]) -> Option<&'a [u8]> {
    node.first().and_then(element_name)
}

/// Split an element (root `Start` … `End`, or a lone `Empty`) into its
/// direct child nodes. Each child is a `Start..=End` slice or a single event.
fn child_nodes(node: &[XmlEvent]) -> Vec<&[XmlEvent]> {
    if node.len() < 2 {
        return Vec::new();
    }
    let inner = &node[1..node.len() - 1];
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ev) in inner.iter().enumerate() {
        match ev {
            Event::Start(_) => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(&inner[start..=i]);
                }
            }
            _ => {
                if depth == 0 {
                    out.push(&inner[i..=i]);
                }
            }
        }
    }
    out
}

fn text_of(t: &BytesText<'_>) -> String {
    match t.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(t).into_owned(),
    }
}

// ── Paragraph ────────────────────────────────────────────────────────────

/// A top-level body paragraph (`w:body/w:p`).
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// The full `w:p` element: `Start … End`, or a single `Empty`.
    events: Vec<XmlEvent>,
}

impl Paragraph {
    /// Runs that contribute to the paragraph text: direct `w:r` children and
    /// the runs of direct `w:hyperlink` children, in document order.
    fn runs(&self) -> Vec<&[XmlEvent]> {
        let mut runs = Vec::new();
        for child in child_nodes(&self.events) {
            match node_name(child) {
                Some(b"w:r") => runs.push(child),
                Some(b"w:hyperlink") => runs.extend(
                    child_nodes(child)
                        .into_iter()
                        .filter(|n| matches!(node_name(n), Some(b"w:r"))),
                ),
                _ => {}
            }
        }
        runs
    }

    /// The paragraph's plain text.
    ///
    /// `w:t` contributes its text, `w:tab`/`w:ptab` a tab, text-wrapping
    /// `w:br` and `w:cr` a newline, `w:noBreakHyphen` a hyphen.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for run in self.runs() {
            for item in child_nodes(run) {
                match node_name(item) {
                    Some(b"w:t") => {
                        for ev in child_nodes(item).into_iter().flatten() {
                            if let Event::Text(t) = ev {
                                out.push_str(&text_of(t));
                            }
                        }
                    }
                    Some(b"w:tab") | Some(b"w:ptab") => out.push('\t'),
                    Some(b"w:cr") => out.push('\n'),
                    Some(b"w:br") => {
                        if is_text_wrapping_break(&item[0]) {
                            out.push('\n');
                        }
                    }
                    Some(b"w:noBreakHyphen") => out.push('-'),
                    _ => {}
                }
            }
        }
        out
    }

    /// True when the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Replace the paragraph's content with a single run holding `text`.
    ///
    /// Paragraph properties (`w:pPr`) are kept. All runs, hyperlinks,
    /// bookmarks and other inline content are dropped; the first run's
    /// properties (`w:rPr`) are carried over to the new run. Tabs and line
    /// breaks in `text` become `w:tab` and `w:br`.
    pub fn set_text(&mut self, text: &str) {
        let (root, had_children) = match self.events.first() {
            Some(Event::Start(s)) => (s.clone(), true),
            Some(Event::Empty(s)) => (s.clone(), false),
            _ => (BytesStart::new("w:p"), false),
        };
        let root_name = String::from_utf8_lossy(root.name().into_inner()).into_owned();

        let mut ppr: Vec<XmlEvent> = Vec::new();
        let mut rpr: Vec<XmlEvent> = Vec::new();
        if had_children {
            let children = child_nodes(&self.events);
            if let Some(node) = children.iter().find(|n| matches!(node_name(n), Some(b"w:pPr"))) {
                ppr = node.to_vec();
            }
            if let Some(run) = self.runs().first() {
                if let Some(node) = child_nodes(run)
                    .into_iter()
                    .find(|n| matches!(node_name(n), Some(b"w:rPr")))
                {
                    rpr = node.to_vec();
                }
            }
        }

        let mut events = Vec::with_capacity(ppr.len() + rpr.len() + 8);
        events.push(Event::Start(root));
        events.extend(ppr);
        if !text.is_empty() {
            events.push(Event::Start(BytesStart::new("w:r")));
            events.extend(rpr);
            push_run_content(&mut events, text);
            events.push(Event::End(BytesEnd::new("w:r")));
        }
        events.push(Event::End(BytesEnd::new(root_name)));
        self.events = events;
    }
}

fn is_text_wrapping_break(ev: &XmlEvent) -> bool {
    let (Event::Start(s) | Event::Empty(s)) = ev else {
        return false;
    };
    match s.try_get_attribute("w:type") {
        Ok(Some(attr)) => attr.value.as_ref() == b"textWrapping",
        _ => true,
    }
}

fn push_run_content(events: &mut Vec<XmlEvent>, text: &str) {
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush_text(events, &mut pending);
                events.push(Event::Empty(BytesStart::new("w:tab")));
            }
            '\n' | '\r' => {
                flush_text(events, &mut pending);
                events.push(Event::Empty(BytesStart::new("w:br")));
            }
            c => pending.push(c),
        }
    }
    flush_text(events, &mut pending);
}

fn flush_text(events: &mut Vec<XmlEvent>, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let mut start = BytesStart::new("w:t");
    if pending.starts_with(char::is_whitespace) || pending.ends_with(char::is_whitespace) {
        start.push_attribute(("xml:space", "preserve"));
    }
    events.push(Event::Start(start));
    events.push(Event::Text(BytesText::new(pending.as_str()).into_owned()));
    events.push(Event::End(BytesEnd::new("w:t")));
    pending.clear();
}

// ── Document ─────────────────────────────────────────────────────────────

/// A slice of `word/document.xml`.
#[derive(Debug, Clone)]
enum Segment {
    Raw(Vec<XmlEvent>),
    Paragraph(Paragraph),
}

/// An opened `.docx` document.
pub struct Document {
    entries: Vec<PackageEntry>,
    segments: Vec<Segment>,
}

impl Document {
    /// Open a `.docx` from bytes.
    ///
    /// # Errors
    /// [`TranslateError::DocumentFormat`] when the bytes are not a zip, the
    /// zip has no `word/document.xml`, or that part is not well-formed XML
    /// with a `w:body`.
    pub fn open(bytes: &[u8]) -> Result<Self, TranslateError> {
        let entries = read_entries(bytes)?;
        let xml = entries
            .iter()
            .find(|e| e.name == DOCUMENT_PART)
            .ok_or_else(|| TranslateError::document(format!("missing {DOCUMENT_PART}")))?;
        let segments = split_body(parse_events(&xml.data)?)?;

        let doc = Self { entries, segments };
        debug!(
            "Opened document: {} zip entries, {} paragraphs",
            doc.entries.len(),
            doc.paragraph_count()
        );
        Ok(doc)
    }

    /// Top-level paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Paragraph(p) => Some(p),
            Segment::Raw(_) => None,
        })
    }

    /// Mutable top-level paragraphs in document order.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.segments.iter_mut().filter_map(|s| match s {
            Segment::Paragraph(p) => Some(p),
            Segment::Raw(_) => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Plain text of every top-level paragraph.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// Serialise the document back to `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranslateError> {
        let mut writer = Writer::new(Vec::new());
        for segment in &self.segments {
            let events = match segment {
                Segment::Raw(events) => events,
                Segment::Paragraph(p) => &p.events,
            };
            for ev in events {
                writer
                    .write_event(ev.borrow())
                    .map_err(|e| TranslateError::Internal(format!("write {DOCUMENT_PART}: {e}")))?;
            }
        }
        write_entries(&self.entries, &writer.into_inner())
    }
}

/// Cut the event stream into raw segments and top-level paragraphs.
fn split_body(events: Vec<XmlEvent>) -> Result<Vec<Segment>, TranslateError> {
    let mut segments = Vec::new();
    let mut raw: Vec<XmlEvent> = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_body = false;

    let mut iter = events.into_iter();
    while let Some(ev) = iter.next() {
        let in_body = stack.last().map(Vec::as_slice) == Some(b"w:body".as_slice());
        let is_paragraph = in_body && element_name(&ev) == Some(b"w:p".as_slice());

        if is_paragraph {
            if !raw.is_empty() {
                segments.push(Segment::Raw(std::mem::take(&mut raw)));
            }
            let mut para = vec![];
            if let Event::Start(_) = ev {
                para.push(ev);
                let mut depth = 1usize;
                for inner in iter.by_ref() {
                    match inner {
                        Event::Start(_) => depth += 1,
                        Event::End(_) => depth -= 1,
                        _ => {}
                    }
                    para.push(inner);
                    if depth == 0 {
                        break;
                    }
                }
                if depth != 0 {
                    return Err(TranslateError::document("unterminated w:p element"));
                }
            } else {
                para.push(ev);
            }
            segments.push(Segment::Paragraph(Paragraph { events: para }));
            continue;
        }

        match &ev {
            Event::Start(s) => {
                let name = s.name().into_inner().to_vec();
                seen_body |= name == b"w:body";
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Empty(s) => seen_body |= s.name().into_inner() == b"w:body",
            _ => {}
        }
        raw.push(ev);
    }
    if !raw.is_empty() {
        segments.push(Segment::Raw(raw));
    }
    if !seen_body {
        return Err(TranslateError::document(format!("{DOCUMENT_PART} has no w:body")));
    }
    Ok(segments)
}
