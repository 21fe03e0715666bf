//! The document model: manifest attributes, the layer tree, and the export
//! API over it.
//!
//! [`Document::load`] opens an archive, parses `maindoc.xml`, and eagerly
//! fetches and decodes every paint layer's tiles. Everything after load is
//! read-only and infallible except for lookups with a bad index or uuid.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

mod layer;
mod manifest;

pub use layer::{ExportedLayer, ExportedLayerKind, Layer, LayerKind};

use crate::archive::{BlobSource, KraArchive, MAIN_DOC};
use crate::util::{ColorSpace, Diagnostics, Error, Result};
use manifest::parse_manifest;

/// A loaded KRA document.
pub struct Document {
    name: String,
    width: u32,
    height: u32,
    color_space: ColorSpace,
    layers: Vec<Layer>,
    /// uuid -> child-index path from the root, deepest index last.
    layer_index: HashMap<String, Vec<usize>>,
    diagnostics: Diagnostics,
}

impl Document {
    /// Open the archive at `path` and load the whole document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut archive = KraArchive::open(path)?;
        Self::from_source(&mut archive)
    }

    /// Load a document from any blob source.
    pub fn from_source(source: &mut dyn BlobSource) -> Result<Self> {
        let xml = source.entry(MAIN_DOC)?;
        let mut diagnostics = Diagnostics::new();
        let (image, layers) = parse_manifest(&xml, source, &mut diagnostics)?;

        let mut doc = Self {
            name: image.name,
            width: image.width,
            height: image.height,
            color_space: image.color_space,
            layers,
            layer_index: HashMap::new(),
            diagnostics,
        };
        doc.build_layer_index();
        debug!(
            name = %doc.name,
            root_layers = doc.layers.len(),
            indexed = doc.layer_index.len(),
            "document loaded"
        );
        Ok(doc)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Root layers in manifest order (topmost first).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of root layers. Nested layers are reachable through groups.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Root layer by manifest position.
    pub fn layer_at(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Non-fatal problems recorded while loading.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Look up any layer, at any depth, by uuid.
    pub fn find_layer(&self, uuid: &str) -> Option<&Layer> {
        let path = self.layer_index.get(uuid)?;
        let mut layers: &[Layer] = &self.layers;
        let mut found = None;
        for &i in path {
            let layer = layers.get(i)?;
            layers = layer.children();
            found = Some(layer);
        }
        found
    }

    /// Export the root layer at `index`.
    pub fn get_exported_layer_at(&self, index: usize) -> Result<ExportedLayer> {
        let layer = self.layers.get(index).ok_or(Error::LayerOutOfBounds {
            index,
            count: self.layers.len(),
        })?;
        Ok(layer.export())
    }

    /// Export the layer with the given uuid, searching the whole tree.
    pub fn get_exported_layer_with_uuid(&self, uuid: &str) -> Result<ExportedLayer> {
        let layer = self
            .find_layer(uuid)
            .ok_or_else(|| Error::LayerNotFound(uuid.to_string()))?;
        Ok(layer.export())
    }

    /// Export every root layer in painter's order.
    ///
    /// The manifest stores root layers topmost-first; the returned sequence
    /// is reversed so a caller drawing in list order paints back-to-front.
    /// Layers are independent, so composition runs in parallel.
    pub fn get_all_exported_layers(&self) -> Vec<ExportedLayer> {
        let mut exported: Vec<ExportedLayer> = self.layers.par_iter().map(Layer::export).collect();
        exported.reverse();
        exported
    }

    fn build_layer_index(&mut self) {
        fn visit(
            layers: &[Layer],
            path: &mut Vec<usize>,
            index: &mut HashMap<String, Vec<usize>>,
            collisions: &mut Vec<String>,
        ) {
            for (i, layer) in layers.iter().enumerate() {
                path.push(i);
                if index.insert(layer.uuid.clone(), path.clone()).is_some() {
                    collisions.push(layer.uuid.clone());
                }
                visit(layer.children(), path, index, collisions);
                path.pop();
            }
        }

        let mut index = HashMap::new();
        let mut collisions = Vec::new();
        visit(&self.layers, &mut Vec::new(), &mut index, &mut collisions);

        // The format does not forbid duplicate uuids; the later layer wins.
        for uuid in collisions {
            self.diagnostics.warn(
                None,
                format!("duplicate layer uuid {uuid}: the later layer shadows the earlier one"),
            );
        }
        self.layer_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemSource(HashMap<String, Vec<u8>>);

    impl BlobSource for MemSource {
        fn has_entry(&mut self, path: &str) -> bool {
            self.0.contains_key(path)
        }

        fn entry(&mut self, path: &str) -> Result<Vec<u8>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| Error::EntryNotFound(path.to_string()))
        }
    }

    /// One-tile blob: 2x2 tiles, 1 byte per pixel, literal fill.
    fn blob(left: i32, top: i32, fill: u8) -> Vec<u8> {
        let mut out: Vec<u8> =
            b"VERSION 2\nTILEWIDTH 2\nTILEHEIGHT 2\nPIXELSIZE 1\nDATA 1\n".to_vec();
        out.extend_from_slice(format!("{left},{top},LZF,6\n").as_bytes());
        out.push(1);
        out.extend_from_slice(&[3, fill, fill, fill, fill]);
        out
    }

    /// Three root layers (A topmost, then group G holding B, then C), all in
    /// the CMYK branch so decoded bytes are the literal fills.
    fn sample_source() -> MemSource {
        let xml = br#"<DOC><IMAGE name="S" width="128" height="64" colorspacename="CMYK">
            <layers>
              <layer nodetype="paintlayer" uuid="{a}" name="A" filename="f-a"
                     colorspacename="CMYK"/>
              <layer nodetype="grouplayer" uuid="{g}" name="G" filename="f-g">
                <layers>
                  <layer nodetype="paintlayer" uuid="{b}" name="B" filename="f-b"
                         colorspacename="CMYK"/>
                </layers>
              </layer>
              <layer nodetype="paintlayer" uuid="{c}" name="C" filename="f-c"
                     colorspacename="CMYK"/>
            </layers></IMAGE></DOC>"#;
        MemSource(HashMap::from([
            ("maindoc.xml".to_string(), xml.to_vec()),
            ("S/layers/f-a".to_string(), blob(0, 0, 1)),
            ("S/layers/f-b".to_string(), blob(2, 0, 2)),
            ("S/layers/f-c".to_string(), blob(-2, 0, 3)),
        ]))
    }

    #[test]
    fn test_load_shape_and_attributes() {
        let doc = Document::from_source(&mut sample_source()).unwrap();
        assert_eq!(doc.name(), "S");
        assert_eq!((doc.width(), doc.height()), (128, 64));
        assert_eq!(doc.color_space(), ColorSpace::Cmyk);
        assert_eq!(doc.layer_count(), 3);
        assert!(doc.diagnostics().is_empty());

        assert_eq!(doc.layer_at(0).unwrap().name, "A");
        assert!(doc.layer_at(1).unwrap().is_group());
        assert_eq!(doc.layer_at(2).unwrap().name, "C");
        assert!(doc.layer_at(3).is_none());
    }

    #[test]
    fn test_find_layer_at_any_depth() {
        let doc = Document::from_source(&mut sample_source()).unwrap();
        assert_eq!(doc.find_layer("{a}").unwrap().name, "A");
        assert_eq!(doc.find_layer("{b}").unwrap().name, "B");
        assert_eq!(doc.find_layer("{g}").unwrap().name, "G");
        assert!(doc.find_layer("{missing}").is_none());
    }

    #[test]
    fn test_export_by_index_and_uuid_agree() {
        let doc = Document::from_source(&mut sample_source()).unwrap();
        let by_index = doc.get_exported_layer_at(0).unwrap();
        let by_uuid = doc.get_exported_layer_with_uuid("{a}").unwrap();
        assert_eq!(by_index, by_uuid);

        assert!(matches!(
            doc.get_exported_layer_at(3),
            Err(Error::LayerOutOfBounds { index: 3, count: 3 })
        ));
        assert!(matches!(
            doc.get_exported_layer_with_uuid("{missing}"),
            Err(Error::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_export_nested_layer_by_uuid() {
        let doc = Document::from_source(&mut sample_source()).unwrap();
        let exported = doc.get_exported_layer_with_uuid("{b}").unwrap();
        assert_eq!(exported.name, "B");
        match exported.kind {
            ExportedLayerKind::Paint { left, data, .. } => {
                assert_eq!(left, 2);
                assert_eq!(data, vec![2, 2, 2, 2]);
            }
            ExportedLayerKind::Group { .. } => panic!("expected paint"),
        }
    }

    #[test]
    fn test_all_exported_layers_reverse_manifest_order() {
        let doc = Document::from_source(&mut sample_source()).unwrap();
        let exported = doc.get_all_exported_layers();
        let names: Vec<&str> = exported.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["C", "G", "A"]);

        // Groups list children without expanding them into the sequence.
        assert_eq!(
            exported[1].kind,
            ExportedLayerKind::Group {
                child_uuids: vec!["{b}".to_string()]
            }
        );
    }

    #[test]
    fn test_duplicate_uuid_later_layer_wins() {
        let xml = br#"<DOC><IMAGE name="S" width="64" height="64" colorspacename="RGBA">
            <layers>
              <layer nodetype="paintlayer" uuid="{dup}" name="first" filename="f1"/>
              <layer nodetype="paintlayer" uuid="{dup}" name="second" filename="f2"/>
            </layers></IMAGE></DOC>"#;
        let mut source = MemSource(HashMap::from([(
            "maindoc.xml".to_string(),
            xml.to_vec(),
        )]));
        let doc = Document::from_source(&mut source).unwrap();
        assert_eq!(doc.find_layer("{dup}").unwrap().name, "second");
        assert!(doc
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("duplicate layer uuid")));
    }

    #[test]
    fn test_load_from_zip_archive() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.kra");
        let xml = br#"<DOC><IMAGE name="S" width="64" height="64" colorspacename="CMYK">
            <layers>
              <layer nodetype="paintlayer" uuid="{a}" name="A" filename="f-a"
                     colorspacename="CMYK"/>
            </layers></IMAGE></DOC>"#;

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("maindoc.xml", options).unwrap();
        writer.write_all(xml).unwrap();
        writer.start_file("S/layers/f-a", options).unwrap();
        writer.write_all(&blob(0, 0, 7)).unwrap();
        writer.finish().unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.name(), "S");
        assert!(doc.diagnostics().is_empty());
        let exported = doc.get_exported_layer_with_uuid("{a}").unwrap();
        assert_eq!(exported.raster(), Some(&[7u8, 7, 7, 7][..]));
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let mut source = MemSource(HashMap::new());
        assert!(matches!(
            Document::from_source(&mut source),
            Err(Error::EntryNotFound(_))
        ));
    }
}
