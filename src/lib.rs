//! # kra
//!
//! Reader for Krita's native `.kra` layered-image container.
//!
//! A `.kra` file is a ZIP archive holding an XML manifest (`maindoc.xml`)
//! plus one binary blob per paint layer. Each blob stores a sparse grid of
//! LZF-compressed 64×64 tiles in planar channel order. This crate parses the
//! manifest into a layer tree, decodes the tile blobs, and assembles each
//! layer into a flat interleaved raster usable by image encoders and editors.
//!
//! Writing `.kra` files, vector/filter/mask layers, blend-mode compositing
//! and color management are out of scope.
//!
//! ## Modules
//!
//! - [`util`] - Errors, color spaces, load diagnostics
//! - [`archive`] - ZIP container access ([`archive::BlobSource`] seam)
//! - [`tiles`] - Layer-blob codec: header protocol, LZF, tile composition
//! - [`doc`] - Layer tree and the [`Document`] export API
//!
//! ## Example
//!
//! ```ignore
//! use kra::Document;
//!
//! let doc = Document::load("painting.kra")?;
//! for layer in doc.get_all_exported_layers() {
//!     println!("{} ({}x{})", layer.name, layer.width(), layer.height());
//! }
//! ```

pub mod archive;
pub mod doc;
pub mod tiles;
pub mod util;

// Re-export commonly used types
pub use doc::{Document, ExportedLayer, ExportedLayerKind, Layer, LayerKind};
pub use util::{ColorSpace, Diagnostic, Diagnostics, Error, Result, Severity};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archive::{BlobSource, KraArchive};
    pub use crate::doc::{Document, ExportedLayer, ExportedLayerKind, Layer, LayerKind};
    pub use crate::tiles::{Extent, LayerData, Tile};
    pub use crate::util::{ColorSpace, Diagnostic, Error, Result};
}
