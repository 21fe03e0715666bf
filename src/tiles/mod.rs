//! Layer-blob codec and tile composition.
//!
//! Each paint layer's archive entry is a self-contained binary blob:
//!
//! ```text
//! VERSION 2\n
//! TILEWIDTH 64\n
//! TILEHEIGHT 64\n
//! PIXELSIZE 4\n
//! DATA <tileCount>\n
//! <left>,<top>,LZF,<byteCount>\n       repeated tileCount times,
//! <byteCount bytes: tag + payload>     each record followed by its payload
//! ```
//!
//! There is no table of contents: a tile's offset is only recoverable by
//! consuming every prior record, so parsing is strictly sequential. Tiles
//! that are fully transparent are simply absent from the blob.

mod compose;
mod format;
mod lzf;
mod reader;

pub use compose::*;
pub use format::*;
pub use lzf::*;
pub use reader::*;
