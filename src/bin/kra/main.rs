//! kra CLI - Tool for inspecting and exporting Krita .kra files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kra::prelude::{ColorSpace, Document, ExportedLayer, ExportedLayerKind, Layer, LayerKind};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // Info command - document summary
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: kra-cli info <file.kra>");
                std::process::exit(1);
            }
            cmd_info(filtered_args[1]);
        }

        // Tree command - layer hierarchy
        "tree" | "t" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: kra-cli tree <file.kra>");
                std::process::exit(1);
            }
            cmd_tree(filtered_args[1]);
        }

        // Export command - write each paint layer as PNG
        "export" | "e" => {
            let mut file = None;
            let mut out_dir = ".";
            let mut rest = filtered_args[1..].iter();
            while let Some(&arg) = rest.next() {
                match arg {
                    "-o" | "--out" => match rest.next() {
                        Some(&dir) => out_dir = dir,
                        None => {
                            eprintln!("Error: -o requires a directory argument");
                            std::process::exit(1);
                        }
                    },
                    _ => file = Some(arg),
                }
            }
            let Some(file) = file else {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: kra-cli export <file.kra> [-o out_dir]");
                std::process::exit(1);
            };
            cmd_export(file, out_dir);
        }

        // Help
        "help" | "h" | "-h" | "--help" => print_help(),

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0]);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    }
}

fn print_help() {
    println!("kra-cli - Krita .kra file toolkit");
    println!();
    println!("USAGE:");
    println!("    kra-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>            Show document info and layer counts");
    println!("    t, tree   <file>            Show the layer hierarchy");
    println!("    e, export <file> [-o dir]   Export RGBA paint layers as PNG");
    println!("    h, help                     Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Errors only");
    println!();
    println!("EXAMPLES:");
    println!("    kra-cli info painting.kra             # Quick overview");
    println!("    kra-cli tree painting.kra             # See the layer tree");
    println!("    kra-cli export painting.kra -o out/   # One PNG per paint layer");
    println!("    kra-cli -v info painting.kra          # Verbose info");
    println!();
    println!("NOTES:");
    println!("    - Passing a .kra file directly is equivalent to 'info'");
    println!("    - Export covers 8-bit RGBA layers; other spaces are skipped");
}

fn load_document(path: &str) -> Document {
    info!("Opening document: {}", path);
    match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &str) {
    let doc = load_document(path);

    println!("Document: {}", doc.name());
    println!("Size: {}x{}", doc.width(), doc.height());
    println!("Color space: {}", doc.color_space());
    println!();

    let mut counts = LayerCounts::default();
    count_layers(doc.layers(), &mut counts);

    println!("Layers:");
    println!("  Paint:  {} ({} tiles)", counts.paint, counts.tiles);
    println!("  Groups: {}", counts.group);
    println!();
    println!("Total layers: {}", counts.paint + counts.group);

    if !doc.diagnostics().is_empty() {
        println!();
        println!("Diagnostics ({}):", doc.diagnostics().len());
        for d in doc.diagnostics().iter() {
            println!("  {}", d);
        }
    }
}

/// Layer counts across the whole tree
#[derive(Default)]
struct LayerCounts {
    paint: usize,
    group: usize,
    tiles: usize,
}

fn count_layers(layers: &[Layer], counts: &mut LayerCounts) {
    for layer in layers {
        match &layer.kind {
            LayerKind::Paint(data) => {
                counts.paint += 1;
                counts.tiles += data.tiles.len();
            }
            LayerKind::Group(children) => {
                counts.group += 1;
                count_layers(children, counts);
            }
        }
    }
}

fn cmd_tree(path: &str) {
    let doc = load_document(path);

    println!("{}/", doc.name());
    print_tree(doc.layers(), 1);
}

fn print_tree(layers: &[Layer], depth: usize) {
    let indent = "  ".repeat(depth);
    for layer in layers {
        let marker = if layer.visible { "" } else { " (hidden)" };
        match &layer.kind {
            LayerKind::Paint(data) => {
                let extent = data.extent();
                println!(
                    "{}{} [Paint {} {}x{}]{}",
                    indent,
                    layer.name,
                    layer.color_space,
                    extent.width(),
                    extent.height(),
                    marker
                );
            }
            LayerKind::Group(children) => {
                println!("{}{} [Group]{}", indent, layer.name, marker);
                print_tree(children, depth + 1);
            }
        }
    }
}

fn cmd_export(path: &str, out_dir: &str) {
    let doc = load_document(path);

    if doc.color_space() != ColorSpace::Rgba {
        eprintln!(
            "Export requires an 8-bit RGBA document; {} is {}",
            doc.name(),
            doc.color_space()
        );
        std::process::exit(1);
    }

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create {}: {}", out_dir, e);
        std::process::exit(1);
    }

    let mut written = 0usize;
    let mut skipped = 0usize;
    for layer in doc.get_all_exported_layers() {
        process_layer(&doc, &layer, out_dir, &mut written, &mut skipped);
    }

    println!("Exported {} layer(s), skipped {}", written, skipped);
    if !doc.diagnostics().is_empty() {
        eprintln!("{} diagnostic(s); run 'info' for details", doc.diagnostics().len());
    }
}

/// Export one layer, descending into groups through their child uuids.
fn process_layer(
    doc: &Document,
    layer: &ExportedLayer,
    out_dir: &str,
    written: &mut usize,
    skipped: &mut usize,
) {
    if let ExportedLayerKind::Group { child_uuids } = &layer.kind {
        for uuid in child_uuids {
            match doc.get_exported_layer_with_uuid(uuid) {
                Ok(child) => process_layer(doc, &child, out_dir, written, skipped),
                Err(e) => {
                    eprintln!("Failed to export child of {:?}: {}", layer.name, e);
                    std::process::exit(1);
                }
            }
        }
        return;
    }
    match export_layer(layer, out_dir) {
        Ok(Some(file)) => {
            println!("Wrote {}", file.display());
            *written += 1;
        }
        Ok(None) => *skipped += 1,
        Err(e) => {
            eprintln!("Failed to export {:?}: {}", layer.name, e);
            std::process::exit(1);
        }
    }
}

/// Write one layer as PNG. Returns `None` for layers that cannot be encoded
/// (groups, empty layers, non-RGBA color spaces).
fn export_layer(layer: &ExportedLayer, out_dir: &str) -> Result<Option<PathBuf>, String> {
    let ExportedLayerKind::Paint { data, .. } = &layer.kind else {
        debug!(layer = %layer.name, "skipping group");
        return Ok(None);
    };
    if data.is_empty() {
        debug!(layer = %layer.name, "skipping empty layer");
        return Ok(None);
    }
    if layer.color_space != ColorSpace::Rgba {
        debug!(layer = %layer.name, space = %layer.color_space, "skipping color space");
        return Ok(None);
    }

    let image = image::RgbaImage::from_raw(layer.width(), layer.height(), data.clone())
        .ok_or_else(|| "raster size mismatch".to_string())?;

    let file_name: String = layer
        .name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let file = Path::new(out_dir).join(format!("{}.png", file_name));
    image.save(&file).map_err(|e| e.to_string())?;
    Ok(Some(file))
}
