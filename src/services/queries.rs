//! Derived read-only views of a [`Document`].

use crate::models::{DeviceBlock, Document, Mapping};
use regex::Regex;

/// Distinct device patterns in first-appearance order.
#[must_use]
pub fn device_patterns(doc: &Document) -> Vec<&str> {
    let mut patterns: Vec<&str> = Vec::new();
    for device in &doc.devices {
        if !patterns.contains(&device.pattern.as_str()) {
            patterns.push(&device.pattern);
        }
    }
    patterns
}

/// Returns true if the document has top-level mapping statements.
///
/// Mappings inside global layers do not count.
#[must_use]
pub fn has_global_mappings(doc: &Document) -> bool {
    !doc.entries.is_empty()
}

/// Direct mappings of every device block whose pattern equals `pattern`,
/// in document order. Layer mappings are not included.
#[must_use]
pub fn mappings_for_device<'a>(doc: &'a Document, pattern: &str) -> Vec<&'a Mapping> {
    doc.devices
        .iter()
        .filter(|d| d.pattern == pattern)
        .flat_map(DeviceBlock::mappings)
        .collect()
}

/// Distinct layer names (global layers first, then device layers) in
/// first-appearance order.
#[must_use]
pub fn layer_names(doc: &Document) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let layers = doc
        .layers
        .iter()
        .chain(doc.devices.iter().flat_map(|d| d.layers.iter()));
    for layer in layers {
        if !names.contains(&layer.name.as_str()) {
            names.push(&layer.name);
        }
    }
    names
}

/// Device blocks that apply to a concrete device identifier.
///
/// Patterns may use `*` (any run of characters) and `?` (one character);
/// everything else matches literally.
#[must_use]
pub fn devices_matching<'a>(doc: &'a Document, device_id: &str) -> Vec<&'a DeviceBlock> {
    doc.devices
        .iter()
        .filter(|d| pattern_matches(&d.pattern, device_id))
        .collect()
}

/// Matches a device identifier against a wildcard pattern.
#[must_use]
pub fn pattern_matches(pattern: &str, device_id: &str) -> bool {
    if !pattern.contains(['*', '?']) {
        return pattern == device_id;
    }

    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    Regex::new(&expr).is_ok_and(|re| re.is_match(device_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn sample() -> Document {
        parse(
            r#"
layer("base") { map("A", "B"); }
device("SN1") { map("C", "D"); layer("nav") { map("H", "Left"); } }
device("USB*") { map("E", "F"); }
device("SN1") { map("G", "H"); layer("base") { } }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_device_patterns_distinct_in_order() {
        assert_eq!(device_patterns(&sample()), vec!["SN1", "USB*"]);
    }

    #[test]
    fn test_has_global_mappings_ignores_layers() {
        assert!(!has_global_mappings(&sample()));
        assert!(has_global_mappings(&parse("map(\"A\", \"B\");").unwrap()));
    }

    #[test]
    fn test_mappings_for_device_collects_every_block() {
        let doc = sample();
        let mappings = mappings_for_device(&doc, "SN1");
        assert_eq!(
            mappings,
            vec![&Mapping::simple("C", "D"), &Mapping::simple("G", "H")]
        );
        assert!(mappings_for_device(&doc, "SN9").is_empty());
    }

    #[test]
    fn test_layer_names() {
        assert_eq!(layer_names(&sample()), vec!["base", "nav"]);
    }

    #[test]
    fn test_devices_matching_wildcards() {
        let doc = sample();
        let matched: Vec<&str> = devices_matching(&doc, "USB-1234")
            .iter()
            .map(|d| d.pattern.as_str())
            .collect();
        assert_eq!(matched, vec!["USB*"]);
        assert_eq!(devices_matching(&doc, "SN1").len(), 2);
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("SN?", "SN7"));
        assert!(!pattern_matches("SN?", "SN77"));
        assert!(pattern_matches("a.b*", "a.bc"));
        assert!(!pattern_matches("a.b*", "axbc"));
    }
}
