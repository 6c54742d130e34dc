//! XML utility functions for reading OSM elements and writing XML text.

use std::borrow::Cow;
use std::str::FromStr;

use lanemap_core::{AttributeMap, Id};
use roxmltree::Node;

use crate::error::{IoError, Result};

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lanemap_io::xml::get_tag_name;
///
/// let doc = Document::parse(r#"<osm><node id="1"/></osm>"#).unwrap();
/// let node = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(node), "node");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find all child elements with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lanemap_io::xml::find_children;
///
/// let doc = Document::parse(r#"<osm><node/><way/><node/></osm>"#).unwrap();
/// assert_eq!(find_children(doc.root_element(), "node").count(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Get a mandatory attribute of a record element.
///
/// # Errors
/// `MalformedRecord` naming the record if the attribute is missing.
pub fn required_attribute<'a>(
    node: Node<'a, '_>,
    name: &str,
    kind: &'static str,
    id: Option<Id>,
) -> Result<&'a str> {
    node.attribute(name)
        .ok_or_else(|| IoError::malformed(kind, id, format!("missing attribute '{name}'")))
}

/// Get and parse a mandatory attribute of a record element.
///
/// # Errors
/// `MalformedRecord` if the attribute is missing or does not parse.
pub fn parse_attribute<T: FromStr>(
    node: Node<'_, '_>,
    name: &str,
    kind: &'static str,
    id: Option<Id>,
) -> Result<T> {
    let raw = required_attribute(node, name, kind, id)?;
    raw.trim().parse().map_err(|_| {
        IoError::malformed(kind, id, format!("invalid value '{raw}' for attribute '{name}'"))
    })
}

/// Collect the `<tag k=".." v=".."/>` children of a record element.
///
/// # Errors
/// `MalformedRecord` if a tag lacks its key or value.
pub fn collect_tags(node: Node<'_, '_>, kind: &'static str, id: Id) -> Result<AttributeMap> {
    let mut attributes = AttributeMap::new();
    for tag in find_children(node, "tag") {
        let key = required_attribute(tag, "k", kind, Some(id))?;
        let value = required_attribute(tag, "v", kind, Some(id))?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// Whether every character of `text` may appear in an XML 1.0 document.
///
/// Escaping cannot help with the rest: control characters other than tab,
/// newline and carriage return, and the noncharacters U+FFFE and U+FFFF.
///
/// # Examples
/// ```
/// use lanemap_io::xml::is_xml_text;
///
/// assert!(is_xml_text("Lot & Garage\n"));
/// assert!(!is_xml_text("a\u{1}b"));
/// ```
#[must_use]
pub fn is_xml_text(text: &str) -> bool {
    text.chars().all(|c| {
        matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
            || c >= '\u{10000}'
    })
}

/// Escape text for use inside a double-quoted XML attribute.
///
/// # Examples
/// ```
/// use lanemap_io::xml::escape;
///
/// assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
/// assert_eq!(escape("plain"), "plain");
/// ```
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&', '"', '\'', '\n', '\t', '\r']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\t' => escaped.push_str("&#9;"),
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_required_attribute_missing() {
        let doc = Document::parse(r#"<node id="3"/>"#).unwrap();
        let err = required_attribute(doc.root_element(), "lat", "node", Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "node 3: missing attribute 'lat'");
    }

    #[test]
    fn test_parse_attribute() {
        let doc = Document::parse(r#"<node id="3" lat="49.5" lon="east"/>"#).unwrap();
        let node = doc.root_element();
        assert_eq!(parse_attribute::<Id>(node, "id", "node", None).unwrap(), 3);
        assert_eq!(parse_attribute::<f64>(node, "lat", "node", Some(3)).unwrap(), 49.5);
        let err = parse_attribute::<f64>(node, "lon", "node", Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "node 3: invalid value 'east' for attribute 'lon'");
    }

    #[test]
    fn test_collect_tags() {
        let xml = r#"<way id="7"><nd ref="1"/><tag k="type" v="line_thin"/><tag k="subtype" v="solid"/></way>"#;
        let doc = Document::parse(xml).unwrap();
        let tags = collect_tags(doc.root_element(), "way", 7).unwrap();
        assert_eq!(tags.value("type"), Some("line_thin"));
        assert_eq!(tags.len(), 2);

        let doc = Document::parse(r#"<way id="7"><tag k="type"/></way>"#).unwrap();
        assert!(collect_tags(doc.root_element(), "way", 7).is_err());
    }

    #[test]
    fn test_is_xml_text() {
        assert!(is_xml_text(""));
        assert!(is_xml_text("tab\tand\u{1F6A6}"));
        assert!(!is_xml_text("bell\u{7}"));
        assert!(!is_xml_text("\u{FFFF}"));
        assert!(Document::parse("<tag v=\"\u{1}\"/>").is_err());
    }

    #[test]
    fn test_escape_round_trips_through_parser() {
        let value = "<\"quoted\" & 'single'>\nnext";
        let xml = format!(r#"<tag v="{}"/>"#, escape(value));
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(doc.root_element().attribute("v"), Some(value));
    }
}
