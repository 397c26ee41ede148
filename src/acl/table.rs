//! Generic parsed table: opaque preamble, managed region, partner blocks.

use std::fmt;
use std::path::{Path, PathBuf};

use super::AclEntry;
use crate::error::AclError;
use crate::validation::{HEADER_CLOSE, HEADER_OPEN};

/// Where the managed region of a table begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionAnchor {
    /// Everything after the first line equal to the marker text.
    Marker(String),
    /// Everything from the first partner header to end-of-file.
    FirstHeader,
}

/// `##-- {certification_id}: {partner_name} --##`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerHeader {
    pub certification_id: String,
    pub partner_name: String,
}

impl PartnerHeader {
    pub fn new(certification_id: impl Into<String>, partner_name: impl Into<String>) -> Self {
        Self {
            certification_id: certification_id.into(),
            partner_name: partner_name.into(),
        }
    }

    /// Parse a header line, trimming the delimiter punctuation.
    pub fn parse(line: &str) -> Option<Self> {
        let inner = line
            .trim()
            .strip_prefix(HEADER_OPEN)?
            .strip_suffix(HEADER_CLOSE)?;
        let (cert_id, name) = inner.split_once(':')?;
        let cert_id = cert_id.trim();
        if cert_id.is_empty() || !cert_id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(cert_id, name.trim()))
    }
}

impl fmt::Display for PartnerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {}",
            HEADER_OPEN, self.certification_id, self.partner_name, HEADER_CLOSE
        )
    }
}

/// A parsed value together with the exact text it was read from, so
/// untouched lines render byte-for-byte.
#[derive(Debug, Clone)]
pub struct Record<T> {
    pub value: T,
    text: String,
}

impl<T: fmt::Display> Record<T> {
    pub fn new(value: T) -> Self {
        let text = value.to_string();
        Self { value, text }
    }
}

impl<T> Record<T> {
    fn parsed(value: T, text: &str) -> Self {
        Self {
            value,
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A non-header line inside the managed region.
#[derive(Debug, Clone)]
pub enum RegionLine<E> {
    Entry(Record<E>),
    /// Comments and lines that do not parse as an entry.
    Other(String),
}

impl<E> RegionLine<E> {
    pub fn text(&self) -> &str {
        match self {
            Self::Entry(record) => record.text(),
            Self::Other(text) => text,
        }
    }

    pub fn entry(&self) -> Option<&E> {
        match self {
            Self::Entry(record) => Some(&record.value),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PartnerBlock<E> {
    header: Record<PartnerHeader>,
    lines: Vec<RegionLine<E>>,
}

impl<E> PartnerBlock<E> {
    pub fn header(&self) -> &PartnerHeader {
        &self.header.value
    }

    pub fn lines(&self) -> &[RegionLine<E>] {
        &self.lines
    }

    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.lines.iter().filter_map(RegionLine::entry)
    }
}

/// What [`AclTable::insert_entry`] did to the block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    CreatedHeader,
    ExtendedBlock,
}

/// One managed file, parsed.
#[derive(Debug, Clone)]
pub struct AclTable<E> {
    path: PathBuf,
    preamble: Vec<String>,
    /// Partner headers found above the managed region. They stay part of
    /// the preamble text and are never edited.
    outside_headers: Vec<PartnerHeader>,
    marker: Option<String>,
    loose: Vec<RegionLine<E>>,
    blocks: Vec<PartnerBlock<E>>,
    dirty: bool,
}

impl<E: AclEntry> AclTable<E> {
    /// Parse file content. Blank lines inside the managed region are dropped.
    pub fn parse(
        path: impl Into<PathBuf>,
        text: &str,
        anchor: &RegionAnchor,
    ) -> Result<Self, AclError> {
        let path = path.into();
        let lines: Vec<&str> = text.lines().collect();

        let (preamble_end, region_start, marker) = match anchor {
            RegionAnchor::Marker(marker) => {
                let idx = lines
                    .iter()
                    .position(|l| l.trim() == marker.trim())
                    .ok_or_else(|| AclError::MissingMarker {
                        marker: marker.clone(),
                        path: path.clone(),
                    })?;
                (idx, idx + 1, Some(lines[idx].to_string()))
            }
            RegionAnchor::FirstHeader => {
                let idx = lines
                    .iter()
                    .position(|l| PartnerHeader::parse(l).is_some())
                    .unwrap_or(lines.len());
                (idx, idx, None)
            }
        };

        let mut preamble: Vec<String> = lines[..preamble_end]
            .iter()
            .map(|l| l.to_string())
            .collect();
        if *anchor == RegionAnchor::FirstHeader {
            while preamble.last().is_some_and(|l| l.trim().is_empty()) {
                preamble.pop();
            }
        }

        let outside_headers = preamble
            .iter()
            .filter_map(|l| PartnerHeader::parse(l))
            .collect();

        let mut table = Self {
            path,
            preamble,
            outside_headers,
            marker,
            loose: Vec::new(),
            blocks: Vec::new(),
            dirty: false,
        };

        for line in &lines[region_start..] {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(header) = PartnerHeader::parse(line) {
                table.blocks.push(PartnerBlock {
                    header: Record::parsed(header, line),
                    lines: Vec::new(),
                });
                continue;
            }
            let region_line = match E::parse(line) {
                Some(entry) => RegionLine::Entry(Record::parsed(entry, line)),
                None => RegionLine::Other(line.to_string()),
            };
            match table.blocks.last_mut() {
                Some(block) => block.lines.push(region_line),
                None => table.loose.push(region_line),
            }
        }

        Ok(table)
    }

    /// Whether a line with this key already exists anywhere in the file.
    pub fn contains_key(&self, key: &E::Key) -> bool {
        self.preamble
            .iter()
            .filter_map(|l| E::parse(l))
            .any(|e| &e.key() == key)
            || self.region_entries().any(|e| &e.key() == key)
    }

    /// Keys of every entry in the file, in file order.
    pub fn keys(&self) -> Vec<E::Key> {
        let mut keys: Vec<E::Key> = self
            .preamble
            .iter()
            .filter_map(|l| E::parse(l))
            .map(|e| e.key())
            .collect();
        keys.extend(self.region_entries().map(|e| e.key()));
        keys
    }

    /// Insert `entry` directly below the header for `certification_id`,
    /// creating the header at the end of the managed region if needed.
    ///
    /// Fails when the only header for `certification_id` sits above the
    /// managed region: that text is not ours to edit, and a second header
    /// would split the partner across two blocks.
    pub fn insert_entry(
        &mut self,
        certification_id: &str,
        partner_name: &str,
        entry: E,
    ) -> Result<InsertOutcome, AclError> {
        let line = RegionLine::Entry(Record::new(entry));

        if let Some(block) = self
            .blocks
            .iter_mut()
            .find(|b| b.header.value.certification_id == certification_id)
        {
            block.lines.insert(0, line);
            self.dirty = true;
            return Ok(InsertOutcome::ExtendedBlock);
        }

        if self
            .outside_headers
            .iter()
            .any(|h| h.certification_id == certification_id)
        {
            return Err(AclError::HeaderOutsideRegion {
                certification_id: certification_id.to_string(),
                path: self.path.clone(),
            });
        }

        self.blocks.push(PartnerBlock {
            header: Record::new(PartnerHeader::new(certification_id, partner_name)),
            lines: vec![line],
        });
        self.dirty = true;
        Ok(InsertOutcome::CreatedHeader)
    }

    fn region_entries(&self) -> impl Iterator<Item = &E> {
        self.loose
            .iter()
            .chain(self.blocks.iter().flat_map(|b| b.lines.iter()))
            .filter_map(RegionLine::entry)
    }
}

impl<E> AclTable<E> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once an entry has been inserted since parsing.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn blocks(&self) -> &[PartnerBlock<E>] {
        &self.blocks
    }

    pub fn find_block(&self, certification_id: &str) -> Option<&PartnerBlock<E>> {
        self.blocks
            .iter()
            .find(|b| b.header().certification_id == certification_id)
    }

    /// Headers above the managed region, in file order.
    pub fn outside_headers(&self) -> &[PartnerHeader] {
        &self.outside_headers
    }

    /// Partner name recorded for `certification_id`. Headers inside the
    /// managed region take precedence over ones above it.
    pub fn partner_name(&self, certification_id: &str) -> Option<&str> {
        self.find_block(certification_id)
            .map(|b| b.header())
            .or_else(|| {
                self.outside_headers
                    .iter()
                    .find(|h| h.certification_id == certification_id)
            })
            .map(|h| h.partner_name.as_str())
    }

    /// Headers for `certification_id` anywhere in the file.
    pub fn header_count(&self, certification_id: &str) -> usize {
        self.outside_headers
            .iter()
            .chain(self.blocks.iter().map(|b| b.header()))
            .filter(|h| h.certification_id == certification_id)
            .count()
    }

    /// Every line of the normalized table, in order.
    pub fn lines(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.preamble.iter().map(String::as_str).collect();
        if let Some(marker) = &self.marker {
            out.push(marker);
        }
        out.extend(self.loose.iter().map(RegionLine::text));
        for block in &self.blocks {
            out.push(block.header.text());
            out.extend(block.lines.iter().map(RegionLine::text));
        }
        out
    }

    /// Serialize the table; every line is newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
