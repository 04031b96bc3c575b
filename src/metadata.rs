//! metadata.xml codec.
//!
//! The device-side instrumentation writes a `<screenshots>` document
//! enumerating every recorded screenshot: its name, tile grid, device paths
//! of the tile images, and optional description / error / extras. This module
//! parses that document into `Screenshot` records, writes it back out after
//! filtering, and defines the empty document used when a device has no
//! results.

use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use tracing::debug;

/// Written in place of device metadata when no test run left results behind.
pub const EMPTY_METADATA: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<screenshots>\n</screenshots>";

/// One recorded screenshot from the metadata document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Screenshot {
    pub name: String,
    pub description: Option<String>,
    /// Failure text recorded by the instrumentation. A record with an error
    /// has no usable tiles.
    pub error: Option<String>,
    /// Tile grid dimensions. Large views are split into a grid of PNG tiles.
    pub tile_width: u32,
    pub tile_height: u32,
    /// Free-form tag/text pairs attached by the test (`<extras>` children),
    /// in document order.
    pub extras: Vec<(String, String)>,
    /// Device paths of the tile images.
    pub absolute_file_names: Vec<String>,
    /// Device path of the view-hierarchy dump, when one was recorded.
    pub view_hierarchy: Option<String>,
}

impl Screenshot {
    /// A record with the given name and a single 1x1 tile grid.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            error: None,
            tile_width: 1,
            tile_height: 1,
            extras: Vec::new(),
            absolute_file_names: Vec::new(),
            view_hierarchy: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed metadata document: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed text content: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("screenshot record #{0} has no <name>")]
    MissingName(usize),
    #[error("invalid <{field}> value '{value}'")]
    BadNumber { field: &'static str, value: String },
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Record under construction while walking the document.
#[derive(Default)]
struct PartialRecord {
    name: Option<String>,
    description: Option<String>,
    error: Option<String>,
    tile_width: Option<u32>,
    tile_height: Option<u32>,
    extras: Vec<(String, String)>,
    absolute_file_names: Vec<String>,
    view_hierarchy: Option<String>,
}

impl PartialRecord {
    /// Store `text` for the element at `path` (element names relative to the
    /// enclosing `<screenshot>`). Unknown elements are ignored.
    fn set_field(&mut self, path: &[String], text: String) -> Result<(), MetadataError> {
        match path {
            [tag] => match tag.as_str() {
                "name" => self.name = Some(text),
                "description" => self.description = Some(text),
                "error" => self.error = Some(text),
                "tile_width" => self.tile_width = Some(parse_tile("tile_width", &text)?),
                "tile_height" => self.tile_height = Some(parse_tile("tile_height", &text)?),
                "absolute_file_name" => self.absolute_file_names.push(text),
                "view_hierarchy" => self.view_hierarchy = Some(text),
                _ => {}
            },
            [extras, tag] if extras == "extras" => {
                self.extras.push((tag.clone(), text));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self, index: usize) -> Result<Screenshot, MetadataError> {
        Ok(Screenshot {
            name: self.name.ok_or(MetadataError::MissingName(index))?,
            description: self.description,
            error: self.error,
            // Records written before tiling existed carry no dimensions.
            tile_width: self.tile_width.unwrap_or(1),
            tile_height: self.tile_height.unwrap_or(1),
            extras: self.extras,
            absolute_file_names: self.absolute_file_names,
            view_hierarchy: self.view_hierarchy,
        })
    }
}

fn parse_tile(field: &'static str, value: &str) -> Result<u32, MetadataError> {
    value.trim().parse().map_err(|_| MetadataError::BadNumber {
        field,
        value: value.to_string(),
    })
}

/// Parse a metadata document from a string.
pub fn parse_metadata_str(xml: &str) -> Result<Vec<Screenshot>, MetadataError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut current: Option<PartialRecord> = None;
    // Element names below the current <screenshot>.
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if current.is_none() {
                    if tag == "screenshot" {
                        current = Some(PartialRecord::default());
                    }
                } else {
                    path.push(tag);
                }
            }
            Event::Text(t) => {
                if let Some(rec) = current.as_mut() {
                    let text = t.unescape()?.into_owned();
                    rec.set_field(&path, text)?;
                }
            }
            Event::End(e) => {
                let tag = e.name();
                if current.is_some() && tag.as_ref() == b"screenshot" && path.is_empty() {
                    if let Some(rec) = current.take() {
                        records.push(rec.finish(records.len())?);
                    }
                } else if current.is_some() {
                    path.pop();
                }
            }
            Event::Empty(e) => {
                // A self-closing <screenshot/> carries no name either.
                if current.is_none() && e.name().as_ref() == b"screenshot" {
                    records.push(PartialRecord::default().finish(records.len())?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

/// Parse `{path}` as a metadata document.
pub fn parse_metadata(path: &Path) -> Result<Vec<Screenshot>, MetadataError> {
    let xml = std::fs::read_to_string(path)?;
    parse_metadata_str(&xml)
}

// ─── Writing ─────────────────────────────────────────────────────────────────

/// Serialize records back to the metadata schema at `path`.
pub fn write_metadata(records: &[Screenshot], path: &Path) -> Result<(), MetadataError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("screenshots")))?;

    for rec in records {
        writer.write_event(Event::Start(BytesStart::new("screenshot")))?;
        write_text_element(&mut writer, "name", &rec.name)?;
        if let Some(description) = &rec.description {
            write_text_element(&mut writer, "description", description)?;
        }
        if let Some(error) = &rec.error {
            write_text_element(&mut writer, "error", error)?;
        }
        write_text_element(&mut writer, "tile_width", &rec.tile_width.to_string())?;
        write_text_element(&mut writer, "tile_height", &rec.tile_height.to_string())?;
        if !rec.extras.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("extras")))?;
            for (tag, text) in &rec.extras {
                write_text_element(&mut writer, tag, text)?;
            }
            writer.write_event(Event::End(BytesEnd::new("extras")))?;
        }
        for file in &rec.absolute_file_names {
            write_text_element(&mut writer, "absolute_file_name", file)?;
        }
        if let Some(dump) = &rec.view_hierarchy {
            write_text_element(&mut writer, "view_hierarchy", dump)?;
        }
        writer.write_event(Event::End(BytesEnd::new("screenshot")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("screenshots")))?;
    std::fs::write(path, writer.into_inner())?;
    Ok(())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), MetadataError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Rewrite the metadata file at `path`, keeping only records whose name
/// matches `name_regex` (search semantics — any match within the name counts).
pub fn filter_screenshots(path: &Path, name_regex: &Regex) -> Result<(), MetadataError> {
    let records = parse_metadata(path)?;
    let before = records.len();
    let kept: Vec<Screenshot> = records
        .into_iter()
        .filter(|rec| name_regex.is_match(&rec.name))
        .collect();
    debug!(before, after = kept.len(), pattern = %name_regex, "filtered screenshots");
    write_metadata(&kept, path)
}
