//! Inspect command: summarize the structure of a script.

use crate::cli::common::{parse_script, print_json, read_script, CliResult, DocumentSummary};
use crate::codegen::render_mapping;
use crate::config::Config;
use crate::models::{DeviceBlock, Document, LayerBlock};
use crate::services::{device_patterns, devices_matching, has_global_mappings, layer_names};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Show the parsed structure of a script file
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Path to the script file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Only show device blocks that apply to this device identifier
    #[arg(long, value_name = "ID")]
    pub device: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response of `inspect`.
#[derive(Debug, Serialize)]
struct InspectResponse<'a> {
    summary: DocumentSummary,
    has_global_mappings: bool,
    device_patterns: Vec<&'a str>,
    layers: Vec<&'a str>,
    document: &'a Document,
}

/// JSON response of `inspect --device`.
#[derive(Debug, Serialize)]
struct DeviceMatchResponse<'a> {
    device: &'a str,
    blocks: Vec<&'a DeviceBlock>,
}

impl InspectArgs {
    /// Execute the inspect command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let text = read_script(&self.file, config)?;
        let doc = parse_script(&text, &self.file, config)?;

        if let Some(device) = &self.device {
            let blocks = devices_matching(&doc, device);
            if self.json {
                return print_json(&DeviceMatchResponse {
                    device: device.as_str(),
                    blocks,
                });
            }
            print_device_matches(device, &blocks);
            return Ok(());
        }

        if self.json {
            return print_json(&InspectResponse {
                summary: DocumentSummary::of(&doc),
                has_global_mappings: has_global_mappings(&doc),
                device_patterns: device_patterns(&doc),
                layers: layer_names(&doc),
                document: &doc,
            });
        }

        print_summary(&self.file, &doc);
        Ok(())
    }
}

fn print_summary(file: &std::path::Path, doc: &Document) {
    let summary = DocumentSummary::of(doc);

    println!("Script: {}", file.display());
    println!("  Mappings: {}", summary.mappings);
    println!("  Global mappings: {}", doc.entries.len());

    let layers = layer_names(doc);
    if layers.is_empty() {
        println!("  Layers: (none)");
    } else {
        println!("  Layers: {}", layers.join(", "));
    }

    if doc.devices.is_empty() {
        println!("  Devices: (none)");
        return;
    }

    println!("  Devices:");
    for device in &doc.devices {
        println!(
            "    \"{}\": {} mappings, {} layers",
            device.pattern,
            device.entries.len(),
            device.layers.len()
        );
    }
}

fn print_device_matches(device: &str, blocks: &[&DeviceBlock]) {
    if blocks.is_empty() {
        println!("No device block applies to \"{device}\"");
        return;
    }

    for block in blocks {
        println!("device(\"{}\")", block.pattern);
        for mapping in block.mappings() {
            println!("  {}", render_mapping(mapping));
        }
        for layer in &block.layers {
            print_layer(layer);
        }
    }
}

fn print_layer(layer: &LayerBlock) {
    println!("  layer(\"{}\")", layer.name);
    for mapping in layer.mappings() {
        println!("    {}", render_mapping(mapping));
    }
}
