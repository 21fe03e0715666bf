//! Error types for the kra library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for KRA operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exists but is not a readable ZIP container
    #[error("Not a KRA archive: {0}")]
    NotAnArchive(PathBuf),

    /// Required archive entry is missing
    #[error("Archive entry not found: {0}")]
    EntryNotFound(String),

    /// Malformed manifest XML
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// Required manifest attribute is absent
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    /// Layer-blob header line lacks its keyword prefix
    #[error("Layer header line missing keyword '{keyword}'")]
    HeaderKeyword { keyword: &'static str },

    /// Layer-blob header or tile record does not parse
    #[error("Malformed layer header line: {0:?}")]
    HeaderSyntax(String),

    /// Layer blob ends before the bytes its headers promise
    #[error("Layer blob truncated at offset {offset} ({needed} more bytes needed)")]
    TruncatedBlob { offset: usize, needed: usize },

    /// Header tile dimensions are zero or multiply past any plausible size
    #[error("Implausible tile geometry: {width}x{height} at {pixel_size} bytes/px")]
    TileGeometry {
        width: u32,
        height: u32,
        pixel_size: u32,
    },

    /// Tile origin is not a multiple of the tile dimensions
    #[error("Tile origin ({left},{top}) not aligned to the tile grid")]
    MisalignedTile { left: i32, top: i32 },

    /// Per-tile compression tag other than LZF
    #[error("Unsupported tile compression tag: {0}")]
    UnsupportedCompression(u8),

    /// LZF literal run would write past the end of the output buffer
    #[error("LZF literal run of {run} bytes overruns output ({cursor}/{capacity})")]
    LzfLiteralOverrun {
        run: usize,
        cursor: usize,
        capacity: usize,
    },

    /// LZF back-reference copy would write past the end of the output buffer
    #[error("LZF back-reference of {len} bytes overruns output ({cursor}/{capacity})")]
    LzfReferenceOverrun {
        len: usize,
        cursor: usize,
        capacity: usize,
    },

    /// LZF back-reference points before the start of the output buffer
    #[error("LZF back-reference {distance} bytes behind cursor {cursor}")]
    LzfReferenceUnderflow { distance: usize, cursor: usize },

    /// Layer not found by uuid
    #[error("No layer with uuid {0}")]
    LayerNotFound(String),

    /// Root-level layer index out of bounds
    #[error("Layer index {index} out of bounds (count: {count})")]
    LayerOutOfBounds { index: usize, count: usize },

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parse error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a manifest error.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create a missing-attribute error.
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }
}

/// Result type alias for KRA operations.
pub type Result<T> = std::result::Result<T, Error>;
