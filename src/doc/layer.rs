//! Layer tree nodes and exported snapshots.

use crate::tiles::LayerData;
use crate::util::ColorSpace;

/// One node of the layer tree: common manifest attributes plus a kind tag.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Unique identifier assigned by the authoring application.
    pub uuid: String,
    pub name: String,
    /// Archive blob locator under `{documentName}/layers/`.
    pub filename: String,
    pub x: u32,
    pub y: u32,
    /// 0 (transparent) to 255 (opaque). Recorded, not applied.
    pub opacity: u8,
    pub visible: bool,
    pub color_space: ColorSpace,
    pub kind: LayerKind,
}

/// What a layer holds: decoded pixel data or an ordered list of children.
#[derive(Debug, Clone)]
pub enum LayerKind {
    Paint(LayerData),
    Group(Vec<Layer>),
}

impl Layer {
    #[inline]
    pub fn is_paint(&self) -> bool {
        matches!(self.kind, LayerKind::Paint(_))
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group(_))
    }

    /// Child layers in manifest order; empty for paint layers.
    pub fn children(&self) -> &[Layer] {
        match &self.kind {
            LayerKind::Group(children) => children,
            LayerKind::Paint(_) => &[],
        }
    }

    /// Decoded tile data, if this is a paint layer.
    pub fn layer_data(&self) -> Option<&LayerData> {
        match &self.kind {
            LayerKind::Paint(data) => Some(data),
            LayerKind::Group(_) => None,
        }
    }

    /// Materialize a read-only snapshot of this layer.
    ///
    /// Paint layers get a freshly composed raster (recomputed on every
    /// call); group layers list their child uuids without expanding them.
    pub fn export(&self) -> ExportedLayer {
        let kind = match &self.kind {
            LayerKind::Paint(data) => {
                let extent = data.extent();
                ExportedLayerKind::Paint {
                    left: extent.left,
                    top: extent.top,
                    right: extent.right,
                    bottom: extent.bottom,
                    pixel_size: data.pixel_size,
                    data: data.composed(),
                }
            }
            LayerKind::Group(children) => ExportedLayerKind::Group {
                child_uuids: children.iter().map(|c| c.uuid.clone()).collect(),
            },
        };
        ExportedLayer {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            opacity: self.opacity,
            visible: self.visible,
            color_space: self.color_space,
            kind,
        }
    }
}

/// Read-only snapshot of a layer crossing the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedLayer {
    pub uuid: String,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub opacity: u8,
    pub visible: bool,
    pub color_space: ColorSpace,
    pub kind: ExportedLayerKind,
}

/// Payload of an exported layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportedLayerKind {
    /// Flattened interleaved raster plus its tile-aligned bounding box.
    Paint {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        pixel_size: u32,
        data: Vec<u8>,
    },
    /// Ordered child uuids; children are not recursively expanded.
    Group { child_uuids: Vec<String> },
}

impl ExportedLayer {
    /// Raster width in pixels; 0 for groups and empty paint layers.
    pub fn width(&self) -> u32 {
        match &self.kind {
            ExportedLayerKind::Paint { left, right, .. } => (right - left) as u32,
            ExportedLayerKind::Group { .. } => 0,
        }
    }

    /// Raster height in pixels; 0 for groups and empty paint layers.
    pub fn height(&self) -> u32 {
        match &self.kind {
            ExportedLayerKind::Paint { top, bottom, .. } => (bottom - top) as u32,
            ExportedLayerKind::Group { .. } => 0,
        }
    }

    /// True for a paint layer with no tiles (and for empty groups).
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            ExportedLayerKind::Paint { data, .. } => data.is_empty(),
            ExportedLayerKind::Group { child_uuids } => child_uuids.is_empty(),
        }
    }

    /// Raster bytes, if this is a paint layer.
    pub fn raster(&self) -> Option<&[u8]> {
        match &self.kind {
            ExportedLayerKind::Paint { data, .. } => Some(data),
            ExportedLayerKind::Group { .. } => None,
        }
    }
}
