//! Script generation from a [`Document`].
//!
//! Output order is fixed: global mappings, global layers, then device blocks
//! (each with its own mappings first, then its layers). The raw text is
//! passed through the formatter, so generated and hand-formatted scripts look
//! the same.

// Allow format! appended to String - more readable for building templates
#![allow(clippy::format_push_string)]

use super::formatter::{format, FormatOptions};
use crate::models::{DeviceBlock, Document, Entry, LayerBlock, Mapping};

/// Generates script text with default format options.
///
/// # Examples
///
/// ```
/// use mapsync::codegen::generate;
/// use mapsync::models::{Document, Mapping};
///
/// let doc = Document::new().with_mapping(Mapping::simple("CapsLock", "Escape"));
/// assert_eq!(generate(&doc), "map(\"CapsLock\", \"Escape\");\n");
/// ```
#[must_use]
pub fn generate(doc: &Document) -> String {
    generate_with(doc, &FormatOptions::default())
}

/// Generates script text with the given format options.
#[must_use]
pub fn generate_with(doc: &Document, options: &FormatOptions) -> String {
    format(&render_document(doc), options)
}

fn render_document(doc: &Document) -> String {
    let mut output = String::new();

    for entry in &doc.entries {
        output.push_str(&render_entry(entry, ""));
    }

    for layer in &doc.layers {
        separate_block(&mut output);
        output.push_str(&render_layer(layer, ""));
    }

    for device in &doc.devices {
        separate_block(&mut output);
        output.push_str(&render_device(device));
    }

    if !doc.trailing_comments.is_empty() {
        separate_block(&mut output);
        output.push_str(&render_comments(&doc.trailing_comments, ""));
    }

    output
}

/// Blocks are separated from preceding content by one blank line.
fn separate_block(output: &mut String) {
    if !output.is_empty() {
        output.push('\n');
    }
}

fn render_device(device: &DeviceBlock) -> String {
    let mut output = render_comments(&device.comments, "");
    output.push_str(&format!("device({}) {{\n", quote(&device.pattern)));

    let mut body = String::new();
    for entry in &device.entries {
        body.push_str(&render_entry(entry, "    "));
    }
    for layer in &device.layers {
        separate_block(&mut body);
        body.push_str(&render_layer(layer, "    "));
    }
    body.push_str(&render_comments(&device.trailing_comments, "    "));

    output.push_str(&body);
    output.push_str("}\n");
    output
}

fn render_layer(layer: &LayerBlock, indent: &str) -> String {
    let mut output = render_comments(&layer.comments, indent);
    output.push_str(&format!("{indent}layer({}) {{\n", quote(&layer.name)));

    let inner = format!("{indent}    ");
    for entry in &layer.entries {
        output.push_str(&render_entry(entry, &inner));
    }
    output.push_str(&render_comments(&layer.trailing_comments, &inner));

    output.push_str(&format!("{indent}}}\n"));
    output
}

fn render_entry(entry: &Entry, indent: &str) -> String {
    let mut output = render_comments(&entry.comments, indent);
    output.push_str(&format!("{indent}{}\n", render_mapping(&entry.mapping)));
    output
}

/// Renders one mapping statement including the semicolon.
#[must_use]
pub fn render_mapping(mapping: &Mapping) -> String {
    match mapping {
        Mapping::Simple {
            source_key,
            target_key,
        } => format!("map({}, {});", quote(source_key), quote(target_key)),
        Mapping::TapHold {
            source_key,
            tap_key,
            hold_key,
            timeout_ms,
        } => format!(
            "tap_hold({}, {}, {}, {timeout_ms});",
            quote(source_key),
            quote(tap_key),
            quote(hold_key)
        ),
        Mapping::Macro { source_key, keys } => {
            let keys: Vec<String> = keys.iter().map(|k| quote(k)).collect();
            format!("macro({}, [{}]);", quote(source_key), keys.join(", "))
        }
        Mapping::LayerSwitch {
            source_key,
            target_layer,
        } => format!("layer_switch({}, {});", quote(source_key), quote(target_layer)),
    }
}

/// Renders comment lines; text that is not already a comment is turned into
/// `//` lines.
fn render_comments(comments: &[String], indent: &str) -> String {
    let mut output = String::new();
    for comment in comments {
        let comment = comment.trim_end();
        let is_line = comment.starts_with("//") && !comment.contains('\n');
        let is_block = comment.starts_with("/*")
            && comment.ends_with("*/")
            && comment.len() >= 4
            && !comment[2..comment.len() - 2].contains("*/");

        if is_line || is_block {
            output.push_str(&format!("{indent}{comment}\n"));
        } else {
            for line in comment.lines() {
                output.push_str(&format!("{indent}// {}\n", line.trim()));
            }
        }
    }
    output
}

/// Quotes and escapes a string literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn sample() -> Document {
        Document::new()
            .with_mapping(Mapping::simple("CapsLock", "Escape"))
            .with_mapping(Mapping::layer_switch("RAlt", "nav"))
            .with_layer(LayerBlock::new("nav").with_mapping(Mapping::simple("H", "Left")))
            .with_device(
                DeviceBlock::new("SN1")
                    .with_mapping(Mapping::tap_hold("Space", "Space", "LCtrl", 200))
                    .with_layer(
                        LayerBlock::new("fn").with_mapping(Mapping::macro_sequence("F1", ["H", "I"])),
                    ),
            )
    }

    #[test]
    fn test_generate_layout() {
        let expected = "\
map(\"CapsLock\", \"Escape\");
layer_switch(\"RAlt\", \"nav\");

layer(\"nav\") {
    map(\"H\", \"Left\");
}

device(\"SN1\") {
    tap_hold(\"Space\", \"Space\", \"LCtrl\", 200);

    layer(\"fn\") {
        macro(\"F1\", [\"H\", \"I\"]);
    }
}
";
        assert_eq!(generate(&sample()), expected);
    }

    #[test]
    fn test_round_trip() {
        let doc = sample();
        let text = generate(&doc);
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed, doc);
        assert_eq!(generate(&reparsed), text);
    }

    #[test]
    fn test_comments_round_trip() {
        let mut doc = sample();
        doc.entries[0].comments.push("// escape on caps".to_string());
        doc.devices[0].comments.push("/* laptop */".to_string());
        doc.devices[0].trailing_comments.push("// end of laptop".to_string());
        doc.trailing_comments.push("// eof".to_string());

        let text = generate(&doc);
        assert!(text.starts_with("// escape on caps\nmap("));
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_escaping() {
        let doc = Document::new().with_device(DeviceBlock::new("a\"b\\c"));
        let text = generate(&doc);
        assert_eq!(text, "device(\"a\\\"b\\\\c\") {\n}\n");
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_plain_comment_text_becomes_line_comment() {
        let mut entry = Entry::new(Mapping::simple("A", "B"));
        entry.comments.push("note".to_string());
        let doc = Document {
            entries: vec![entry],
            ..Document::default()
        };
        assert_eq!(generate(&doc), "// note\nmap(\"A\", \"B\");\n");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(generate(&Document::new()), "");
    }

    #[test]
    fn test_negative_timeout_survives() {
        let doc = Document::new().with_mapping(Mapping::tap_hold("A", "A", "LShift", -5));
        let text = generate(&doc);
        assert_eq!(text, "tap_hold(\"A\", \"A\", \"LShift\", -5);\n");
        assert_eq!(parse(&text).unwrap(), doc);
    }
}
