//! `maindoc.xml` parsing and layer-tree construction.
//!
//! The manifest is a `DOC > IMAGE` element carrying the document attributes,
//! with a nested `<layers>` list describing the tree top-to-bottom. Paint
//! layers point at a blob entry in the archive; group layers nest another
//! `<layers>` list. Anything with an unrecognized `nodetype` is skipped with
//! a diagnostic rather than failing the load.
//!
//! Paint-layer blobs are fetched and decoded here, while the archive is in
//! hand. A blob that cannot be read or whose header is unusable demotes that
//! one layer to an empty tile set; only a malformed manifest is fatal.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use super::layer::{Layer, LayerKind};
use crate::archive::BlobSource;
use crate::tiles::{self, LayerData};
use crate::util::{ColorSpace, Diagnostics, Error, Result};

/// Document-wide attributes from the `IMAGE` element.
#[derive(Debug, Clone)]
pub(crate) struct ImageAttrs {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

/// Parse the manifest and build the layer tree, fetching paint-layer blobs
/// from `source` as they are encountered.
pub(crate) fn parse_manifest(
    xml: &[u8],
    source: &mut dyn BlobSource,
    diags: &mut Diagnostics,
) -> Result<(ImageAttrs, Vec<Layer>)> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut image: Option<ImageAttrs> = None;
    let mut layers = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"IMAGE" => {
                image = Some(parse_image_attrs(&e)?);
            }
            Event::Start(e) if e.name().as_ref() == b"layers" => {
                let doc_name = match &image {
                    Some(attrs) => attrs.name.clone(),
                    None => return Err(Error::manifest("<layers> before <IMAGE>")),
                };
                layers = parse_layer_list(&mut reader, source, &doc_name, diags)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let image = image.ok_or_else(|| Error::manifest("no <IMAGE> element"))?;
    debug!(
        name = %image.name,
        width = image.width,
        height = image.height,
        root_layers = layers.len(),
        "manifest parsed"
    );
    Ok((image, layers))
}

fn parse_image_attrs(e: &BytesStart) -> Result<ImageAttrs> {
    let name = require_attr(e, "IMAGE", "name")?;
    let width = require_attr(e, "IMAGE", "width")?
        .parse()
        .map_err(|_| Error::manifest("IMAGE width is not an unsigned integer"))?;
    let height = require_attr(e, "IMAGE", "height")?
        .parse()
        .map_err(|_| Error::manifest("IMAGE height is not an unsigned integer"))?;
    let color_space = ColorSpace::from_name(&require_attr(e, "IMAGE", "colorspacename")?);
    Ok(ImageAttrs {
        name,
        width,
        height,
        color_space,
    })
}

/// Consume `<layer>` children until the matching `</layers>`.
fn parse_layer_list(
    reader: &mut Reader<&[u8]>,
    source: &mut dyn BlobSource,
    doc_name: &str,
    diags: &mut Diagnostics,
) -> Result<Vec<Layer>> {
    let mut layers = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.name().as_ref() == b"layer" => {
                if let Some(layer) = parse_layer(reader, &e, false, source, doc_name, diags)? {
                    layers.push(layer);
                }
            }
            Event::Start(e) if e.name().as_ref() == b"layer" => {
                if let Some(layer) = parse_layer(reader, &e, true, source, doc_name, diags)? {
                    layers.push(layer);
                }
            }
            Event::End(e) if e.name().as_ref() == b"layers" => break,
            Event::Eof => return Err(Error::manifest("unterminated <layers> element")),
            _ => {}
        }
    }
    Ok(layers)
}

/// Parse one `<layer>`. Returns `None` for node types the reader does not
/// model (filter layers, clone layers, masks, ...).
fn parse_layer(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    has_body: bool,
    source: &mut dyn BlobSource,
    doc_name: &str,
    diags: &mut Diagnostics,
) -> Result<Option<Layer>> {
    let node_type = attr(e, "nodetype")?.unwrap_or_default();
    match node_type.as_str() {
        "paintlayer" => {
            let common = common_attrs(e)?;
            let color_space = attr(e, "colorspacename")?
                .map(|name| ColorSpace::from_name(&name))
                .unwrap_or_default();
            if has_body {
                // Paint layers may carry masks as children; not modeled.
                reader.read_to_end(e.name())?;
            }
            let data = fetch_layer_data(source, doc_name, &common, color_space, diags);
            Ok(Some(common.into_layer(color_space, LayerKind::Paint(data))))
        }
        "grouplayer" => {
            let common = common_attrs(e)?;
            let mut children = Vec::new();
            if has_body {
                loop {
                    match reader.read_event()? {
                        Event::Start(inner) if inner.name().as_ref() == b"layers" => {
                            children = parse_layer_list(reader, source, doc_name, diags)?;
                        }
                        Event::Start(inner) => {
                            reader.read_to_end(inner.name())?;
                        }
                        Event::End(inner) if inner.name().as_ref() == b"layer" => break,
                        Event::Eof => {
                            return Err(Error::manifest("unterminated <layer> element"))
                        }
                        _ => {}
                    }
                }
            }
            Ok(Some(common.into_layer(
                ColorSpace::default(),
                LayerKind::Group(children),
            )))
        }
        other => {
            debug!(nodetype = other, "skipping unsupported layer type");
            diags.warn(
                None,
                format!("skipping layer with unsupported nodetype {other:?}"),
            );
            if has_body {
                reader.read_to_end(e.name())?;
            }
            Ok(None)
        }
    }
}

/// Attributes shared by every modeled layer type.
struct CommonAttrs {
    uuid: String,
    name: String,
    filename: String,
    x: u32,
    y: u32,
    opacity: u8,
    visible: bool,
}

impl CommonAttrs {
    fn into_layer(self, color_space: ColorSpace, kind: LayerKind) -> Layer {
        Layer {
            uuid: self.uuid,
            name: self.name,
            filename: self.filename,
            x: self.x,
            y: self.y,
            opacity: self.opacity,
            visible: self.visible,
            color_space,
            kind,
        }
    }
}

fn common_attrs(e: &BytesStart) -> Result<CommonAttrs> {
    Ok(CommonAttrs {
        uuid: require_attr(e, "layer", "uuid")?,
        name: require_attr(e, "layer", "name")?,
        filename: require_attr(e, "layer", "filename")?,
        x: uint_attr(e, "x")?,
        y: uint_attr(e, "y")?,
        opacity: uint_attr(e, "opacity")?.min(255) as u8,
        visible: match attr(e, "visible")?.as_deref() {
            Some("0") | Some("false") => false,
            _ => true,
        },
    })
}

/// Fetch and decode a paint layer's tile blob. Never fatal: a missing entry
/// or an unusable header leaves the layer with an empty tile set.
fn fetch_layer_data(
    source: &mut dyn BlobSource,
    doc_name: &str,
    common: &CommonAttrs,
    color_space: ColorSpace,
    diags: &mut Diagnostics,
) -> LayerData {
    let path = format!("{doc_name}/layers/{}", common.filename);
    let content = match source.entry(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!(layer = %common.name, path = %path, error = %e, "layer blob unavailable");
            diags.warn(
                Some(common.name.clone()),
                format!("layer blob {path:?} unavailable: {e}"),
            );
            return LayerData::default();
        }
    };
    match tiles::parse_layer_blob(&content, color_space, diags) {
        Ok(data) => data,
        Err(e) => {
            warn!(layer = %common.name, error = %e, "layer blob header unusable");
            diags.error(
                Some(common.name.clone()),
                format!("layer blob header unusable: {e}"),
            );
            LayerData::default()
        }
    }
}

/// Optional attribute, unescaped.
fn attr(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a?;
        if a.key.as_ref() == name.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Required attribute; absence is a manifest error naming the element.
fn require_attr(e: &BytesStart, element: &str, name: &str) -> Result<String> {
    attr(e, name)?.ok_or_else(|| Error::missing_attribute(element, name))
}

/// Unsigned attribute defaulting to 0 when absent or unparsable. These
/// attributes are positional metadata, not load-bearing sizes, so a bad
/// value is logged rather than failing the layer.
fn uint_attr(e: &BytesStart, name: &str) -> Result<u32> {
    let Some(value) = attr(e, name)? else {
        return Ok(0);
    };
    Ok(value.parse().unwrap_or_else(|_| {
        debug!(attribute = name, value = %value, "unparsable unsigned attribute, using 0");
        0
    }))
}
