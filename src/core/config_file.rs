//! Build configuration (`.bc`) documents
//!
//! A `.bc` file is a small XML document listing one or more named build
//! configurations, each with its member resources, a compiler options
//! string, and a per-file build flag:
//!
//! ```xml
//! <buildConfigurations>
//!     <buildConfiguration name="main">
//!         <resource>src/app.es</resource>
//!         <compilerOptions>--optimize 5 --standard</compilerOptions>
//!         <buildType>disabled</buildType>
//!     </buildConfiguration>
//! </buildConfigurations>
//! ```
//!
//! Parsing is tolerant: `buildConfiguration` elements are picked up
//! wherever they appear, unknown elements are ignored, and a block with a
//! missing or empty `name` attribute is skipped with a warning. Only a
//! document that is not well-formed XML fails the whole read.

use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::config::defaults::INCLUDE_ALL_KEYWORD;
use crate::core::configuration::BuildMode;
use crate::error::ConfigFileError;

const ROOT_TAG: &str = "buildConfigurations";
const BLOCK_TAG: &str = "buildConfiguration";
const RESOURCE_TAG: &str = "resource";
const OPTIONS_TAG: &str = "compilerOptions";
const MODE_TAG: &str = "buildType";
const NAME_ATTR: &str = "name";

const INDENT_WIDTH: usize = 4;

/// One `buildConfiguration` element of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBlock {
    /// Configuration name from the `name` attribute
    pub name: String,
    /// Member resource paths as written in the document, project-relative
    pub resources: Vec<String>,
    /// Whether the document contained the include-all resource entry
    pub include_all: bool,
    /// Raw compiler options string
    pub options: String,
    /// Whole-configuration or per-file compilation
    pub mode: BuildMode,
}

impl ConfigBlock {
    /// Create an empty block with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A parsed `.bc` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Configuration blocks in document order, duplicates preserved
    pub blocks: Vec<ConfigBlock>,
}

impl ConfigFile {
    /// Read and parse a `.bc` file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not well-formed
    /// XML.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigFileError::Read {
            path: path.to_path_buf(),
            error: error.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse a `.bc` document from a string
    ///
    /// `origin` names the document in warnings and errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not well-formed XML. Blocks with
    /// a missing or empty name are skipped, not failed.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigFileError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text_start = true;
        reader.config_mut().trim_text_end = true;

        let mut blocks: Vec<ConfigBlock> = Vec::new();
        let mut current: Option<ConfigBlock> = None;
        let mut field = Field::None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag = e.name();
                    if tag.as_ref() == BLOCK_TAG.as_bytes() {
                        // A start before the previous block closed means a
                        // missing end tag; keep what was collected so far.
                        if let Some(block) = current.take() {
                            blocks.push(block);
                        }
                        field = Field::None;
                        current = block_name(&e, origin)?.map(ConfigBlock::new);
                    } else if current.is_some() {
                        field = Field::of(tag.as_ref());
                    }
                }
                Ok(Event::Empty(e)) => {
                    let tag = e.name();
                    if tag.as_ref() == BLOCK_TAG.as_bytes() {
                        if let Some(block) = current.take() {
                            blocks.push(block);
                        }
                        field = Field::None;
                        if let Some(name) = block_name(&e, origin)? {
                            blocks.push(ConfigBlock::new(name));
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(block) = current.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|error| xml_error(origin, &error))?;
                        apply_field(block, field, text.trim());
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == BLOCK_TAG.as_bytes() {
                        if let Some(block) = current.take() {
                            blocks.push(block);
                        }
                    }
                    field = Field::None;
                }
                Ok(Event::Eof) => {
                    // Truncated document: keep the partial block rather
                    // than dropping user data.
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    break;
                }
                Ok(_) => {}
                Err(error) => return Err(xml_error(origin, &error)),
            }
        }

        Ok(Self { blocks })
    }

    /// Render the document as indented XML
    ///
    /// An include-all block serializes the include-all keyword as its first
    /// resource entry, so parsing the output restores the flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML writer fails.
    pub fn serialize(&self) -> Result<String, ConfigFileError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(serialize_error)?;
        writer
            .write_event(Event::Start(BytesStart::new(ROOT_TAG)))
            .map_err(serialize_error)?;

        for block in &self.blocks {
            let mut start = BytesStart::new(BLOCK_TAG);
            start.push_attribute((NAME_ATTR, block.name.as_str()));
            writer
                .write_event(Event::Start(start))
                .map_err(serialize_error)?;

            if block.include_all {
                write_text_element(&mut writer, RESOURCE_TAG, INCLUDE_ALL_KEYWORD)?;
            }
            for resource in &block.resources {
                write_text_element(&mut writer, RESOURCE_TAG, resource)?;
            }
            write_text_element(&mut writer, OPTIONS_TAG, &block.options)?;
            write_text_element(&mut writer, MODE_TAG, block.mode.as_flag())?;

            writer
                .write_event(Event::End(BytesEnd::new(BLOCK_TAG)))
                .map_err(serialize_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT_TAG)))
            .map_err(serialize_error)?;

        String::from_utf8(writer.into_inner()).map_err(serialize_error)
    }

    /// Write the document to disk atomically
    ///
    /// The content goes to a temporary sibling first and is renamed over
    /// the target, so a crash mid-write never leaves a half-written `.bc`
    /// file behind.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or either filesystem step fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let xml = self.serialize()?;
        let temp = temp_path(path);
        fs::write(&temp, xml).map_err(|error| ConfigFileError::Write {
            path: temp.clone(),
            error: error.to_string(),
        })?;
        fs::rename(&temp, path).map_err(|error| ConfigFileError::Write {
            path: path.to_path_buf(),
            error: error.to_string(),
        })
    }
}

/// Child element of a block currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Resource,
    Options,
    Mode,
}

impl Field {
    fn of(tag: &[u8]) -> Self {
        if tag == RESOURCE_TAG.as_bytes() {
            Self::Resource
        } else if tag == OPTIONS_TAG.as_bytes() {
            Self::Options
        } else if tag == MODE_TAG.as_bytes() {
            Self::Mode
        } else {
            Self::None
        }
    }
}

fn apply_field(block: &mut ConfigBlock, field: Field, text: &str) {
    match field {
        Field::Resource => {
            if text == INCLUDE_ALL_KEYWORD {
                block.include_all = true;
            } else if !text.is_empty() {
                block.resources.push(text.to_string());
            }
        }
        Field::Options => block.options = text.to_string(),
        Field::Mode => block.mode = BuildMode::from_flag(text),
        Field::None => {}
    }
}

/// Extract the block's name attribute, or `None` when the block should be
/// skipped
fn block_name(start: &BytesStart<'_>, origin: &Path) -> Result<Option<String>, ConfigFileError> {
    let attr = start
        .try_get_attribute(NAME_ATTR)
        .map_err(|error| xml_error(origin, &error))?;
    let Some(attr) = attr else {
        tracing::warn!(
            "Skipping configuration without a name in {}",
            origin.display()
        );
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|error| xml_error(origin, &error))?;
    let name = value.trim();
    if name.is_empty() {
        tracing::warn!(
            "Skipping configuration with an empty name in {}",
            origin.display()
        );
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

fn xml_error(origin: &Path, error: &dyn Display) -> ConfigFileError {
    ConfigFileError::Xml {
        path: origin.to_path_buf(),
        error: error.to_string(),
    }
}

fn serialize_error(error: impl Display) -> ConfigFileError {
    ConfigFileError::Serialize {
        error: error.to_string(),
    }
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), ConfigFileError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(serialize_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(serialize_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(serialize_error)?;
    Ok(())
}

fn temp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("config"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}
