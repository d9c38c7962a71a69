//! Metadata XML codec.
//!
//! Metadata files and SOAP payloads share one shape: elements that hold either
//! a text value or child elements, never both. [`Element`] models that shape
//! and converts to and from the flat JSON records the CRUD calls exchange:
//!
//! - objects become child elements, in key order
//! - arrays become repeated sibling elements with the same name
//! - `null` and empty arrays are omitted
//! - scalars become text
//!
//! Text values are kept exactly as written, including leading, trailing and
//! interior whitespace. Only whitespace between child elements is dropped.
//!
//! XML carries no types, so [`Element::to_value`] normalizes what it reads
//! back the same way the Metadata API does:
//!
//! - booleans and numbers come back as strings (`false` becomes `"false"`)
//! - a field that occurs once comes back as a single value, not a
//!   one-element array
//!
//! ```rust
//! use busbar_sf_metadata::xml::{write_document, Element};
//!
//! let profile = serde_json::json!({ "custom": false, "userLicense": "Salesforce" });
//! let root = Element::from_value("Profile", &profile)
//!     .with_attribute("xmlns", busbar_sf_metadata::xml::METADATA_NAMESPACE);
//! assert!(write_document(&root).contains("    <custom>false</custom>\n"));
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Namespace declared on the root element of every metadata document.
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

/// XML declaration written at the top of every metadata document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const INDENT: &str = "    ";

/// Escape a string for safe inclusion in XML content.
///
/// This escapes the five predefined XML entities.
///
/// ```rust
/// use busbar_sf_metadata::xml;
///
/// let safe = xml::escape("Hello <World> & 'Friends'");
/// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render a JSON scalar the way the Metadata API expects it in text content.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Content of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Children(Vec<Element>),
}

/// A metadata XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local element name; namespace prefixes are not kept.
    pub name: String,
    /// Attributes in document order, keys as written (`xsi:type`, `xmlns`).
    pub attributes: Vec<(String, String)>,
    pub content: Content,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Content::Empty,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Append a child element. Any text content is discarded.
    pub fn push_child(&mut self, child: Element) {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            content => *content = Content::Children(vec![child]),
        }
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.content {
            Content::Empty => self.content = Content::Text(text.to_string()),
            Content::Text(existing) => existing.push_str(text),
            Content::Children(_) => {}
        }
    }

    /// Value of the attribute `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, if this element holds text.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Child elements; empty for text or empty elements.
    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            _ => &[],
        }
    }

    /// Remove and return every child, leaving the element empty.
    pub fn drain_children(&mut self) -> Vec<Element> {
        match std::mem::take(&mut self.content) {
            Content::Children(children) => children,
            Content::Empty | Content::Text(_) => Vec::new(),
        }
    }

    /// Replace the content with `children`.
    pub fn set_children(&mut self, children: Vec<Element>) {
        self.content = Content::Children(children);
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Text of the first direct child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// All direct children named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children().iter().filter(move |c| c.name == name)
    }

    /// Remove and return all direct children named `name`.
    pub fn take_children(&mut self, name: &str) -> Vec<Element> {
        let Content::Children(children) = &mut self.content else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Element>, Vec<Element>) = std::mem::take(children)
            .into_iter()
            .partition(|c| c.name == name);
        *children = kept;
        taken
    }

    /// Depth-first search for the first descendant (or self) named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(name))
    }

    /// True when the element carries `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| (k == "nil" || k.ends_with(":nil")) && v == "true")
    }

    /// Build an element named `name` from a JSON value.
    pub fn from_value(name: impl Into<String>, value: &Value) -> Self {
        let mut element = Element::new(name);
        match value {
            Value::Object(map) => {
                for (key, field) in map {
                    append_value(&mut element, key, field);
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    element.content = Content::Text(text);
                }
            }
        }
        element
    }

    /// Convert back to JSON. Text becomes strings, repeated names become arrays.
    pub fn to_value(&self) -> Value {
        match &self.content {
            Content::Empty if self.is_nil() => Value::Null,
            Content::Empty => Value::String(String::new()),
            Content::Text(text) => Value::String(text.clone()),
            Content::Children(children) => {
                let mut map = Map::new();
                for child in children {
                    let value = child.to_value();
                    match map.get_mut(&child.name) {
                        Some(Value::Array(items)) => items.push(value),
                        Some(existing) => {
                            let first = existing.take();
                            *existing = Value::Array(vec![first, value]);
                        }
                        None => {
                            map.insert(child.name.clone(), value);
                        }
                    }
                }
                Value::Object(map)
            }
        }
    }
}

fn append_value(parent: &mut Element, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                append_value(parent, key, item);
            }
        }
        other => parent.push_child(Element::from_value(key, other)),
    }
}

/// Serialize a document: declaration, 4-space indentation, trailing newline.
pub fn write_document(root: &Element) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push_str(&format!(" {}=\"{}\"", key, escape(value)));
    }
    match &element.content {
        Content::Empty => out.push_str("/>\n"),
        Content::Text(text) => {
            out.push_str(&format!(">{}</{}>\n", escape(text), element.name));
        }
        Content::Children(children) => {
            out.push_str(">\n");
            for child in children {
                write_element(out, child, depth + 1);
            }
            out.push_str(&format!("{}</{}>\n", indent, element.name));
        }
    }
}

/// Parse a document into its root element.
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    Error::new(ErrorKind::Parse("unbalanced closing tag".to_string()))
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::new(ErrorKind::Parse(format!(
            "unclosed element <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        ))));
    }
    root.ok_or_else(|| Error::new(ErrorKind::Parse("document has no root element".to_string())))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| Error::with_source(ErrorKind::Parse(e.to_string()), e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(Error::new(ErrorKind::Parse(
            "document has more than one root element".to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape(r#""quoted" 'single'"#), "&quot;quoted&quot; &apos;single&apos;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_from_value_orders_fields_and_repeats_arrays() {
        let value = json!({
            "custom": false,
            "userLicense": "Salesforce",
            "userPermissions": [
                { "enabled": true, "name": "ViewSetup" },
                { "enabled": false, "name": "ApiEnabled" }
            ]
        });
        let element = Element::from_value("Profile", &value);
        let names: Vec<&str> = element.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["custom", "userLicense", "userPermissions", "userPermissions"]
        );
        assert_eq!(element.child_text("custom"), Some("false"));
        assert_eq!(
            element.children_named("userPermissions").nth(1).and_then(|p| p.child_text("name")),
            Some("ApiEnabled")
        );
    }

    #[test]
    fn test_from_value_omits_null_and_empty_arrays() {
        let value = json!({ "fullName": "Account", "fields": [], "description": null });
        let element = Element::from_value("CustomObject", &value);
        assert_eq!(element.children().len(), 1);
        assert_eq!(element.child_text("fullName"), Some("Account"));
    }

    #[test]
    fn test_write_document_format() {
        let root = Element::from_value(
            "CustomField",
            &json!({ "fullName": "Industry", "trackFeedHistory": false, "type": "Picklist" }),
        )
        .with_attribute("xmlns", METADATA_NAMESPACE);

        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<CustomField xmlns="http://soap.sforce.com/2006/04/metadata">
    <fullName>Industry</fullName>
    <trackFeedHistory>false</trackFeedHistory>
    <type>Picklist</type>
</CustomField>
"#;
        assert_eq!(write_document(&root), expected);
    }

    #[test]
    fn test_write_document_escapes_text() {
        let root = Element::new("CustomLabel").with_child(Element::new("value").with_text("A & B"));
        assert!(write_document(&root).contains("<value>A &amp; B</value>"));
    }

    #[test]
    fn test_parse_nested_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Profile xmlns="http://soap.sforce.com/2006/04/metadata">
    <custom>false</custom>
    <userPermissions>
        <enabled>true</enabled>
        <name>ViewSetup</name>
    </userPermissions>
</Profile>
"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "Profile");
        assert_eq!(root.attribute("xmlns"), Some(METADATA_NAMESPACE));
        assert_eq!(root.child_text("custom"), Some("false"));
        let permission = root.child("userPermissions").unwrap();
        assert_eq!(permission.child_text("name"), Some("ViewSetup"));
    }

    #[test]
    fn test_parse_strips_prefixes_and_unescapes() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><value>A &amp; B</value><nothing xsi:nil="true"/></soapenv:Body></soapenv:Envelope>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "Envelope");
        let body = root.find("Body").unwrap();
        assert_eq!(body.child_text("value"), Some("A & B"));
        assert!(body.child("nothing").unwrap().is_nil());
    }

    #[test]
    fn test_parse_rejects_unclosed_element() {
        assert!(parse("<Profile><custom>true</custom>").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_to_value_collects_repeated_elements() {
        let xml = "<Workflow><rules><fullName>A</fullName></rules><rules><fullName>B</fullName></rules><empty xsi:nil=\"true\"/></Workflow>";
        let value = parse(xml).unwrap().to_value();
        assert_eq!(
            value,
            json!({
                "rules": [{ "fullName": "A" }, { "fullName": "B" }],
                "empty": null
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_field_values() {
        let record = json!({
            "label": "Business",
            "active": "true",
            "picklistValues": [
                { "picklist": "Industry", "values": [{ "fullName": "Banking", "default": "false" }, { "fullName": "Retail", "default": "true" }] },
                { "picklist": "Rating", "values": [{ "fullName": "Hot", "default": "false" }, { "fullName": "Cold", "default": "false" }] }
            ]
        });
        let written = write_document(&Element::from_value("RecordType", &record));
        let parsed = parse(&written).unwrap();
        assert_eq!(parsed.to_value(), record);
    }

    #[test]
    fn test_round_trip_keeps_whitespace_in_values() {
        let record = json!({
            "description": "  indented\nsecond line  ",
            "label": " ",
            "formula": "IF(\n    ISBLANK(Name),\n    0,\n    1\n)"
        });
        let written = write_document(&Element::from_value("Profile", &record));
        let parsed = parse(&written).unwrap();
        assert_eq!(parsed.to_value(), record);
    }

    #[test]
    fn test_parse_drops_whitespace_between_children() {
        let xml = "<Profile>\n    <custom> false </custom>\n    <userPermissions>\n        <name>ViewSetup</name>\n    </userPermissions>\n</Profile>\n";
        let root = parse(xml).unwrap();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.child_text("custom"), Some(" false "));
        assert_eq!(
            root.child("userPermissions").unwrap().children().len(),
            1
        );
    }

    #[test]
    fn test_round_trip_normalizes_scalars_and_single_entries() {
        let record = json!({
            "custom": false,
            "userLicense": "Salesforce",
            "userPermissions": [{ "enabled": true, "name": "ViewSetup" }]
        });
        let written = write_document(&Element::from_value("Profile", &record));
        assert_eq!(
            parse(&written).unwrap().to_value(),
            json!({
                "custom": "false",
                "userLicense": "Salesforce",
                "userPermissions": { "enabled": "true", "name": "ViewSetup" }
            })
        );
    }

    #[test]
    fn test_drain_and_set_children() {
        let mut element = Element::new("Profile").with_text("stray");
        assert!(element.drain_children().is_empty());
        assert_eq!(element.content, Content::Empty);

        element.set_children(vec![Element::new("custom").with_text("true")]);
        let drained = element.drain_children();
        assert_eq!(drained.len(), 1);
        assert!(element.children().is_empty());
    }

    #[test]
    fn test_take_children() {
        let mut element = Element::new("CustomObject")
            .with_child(Element::new("label").with_text("Account"))
            .with_child(Element::new("fields").with_text("a"))
            .with_child(Element::new("fields").with_text("b"));
        let taken = element.take_children("fields");
        assert_eq!(taken.len(), 2);
        assert_eq!(element.children().len(), 1);
        assert_eq!(element.child_text("label"), Some("Account"));
    }
}
