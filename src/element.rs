//! Owned SVG element tree.
//!
//! Each shape exclusively owns its element: a tag, ordered attributes,
//! optional text content and child elements. Attribute order is insertion
//! order so serialized markup stays stable across edits.

use indexmap::IndexMap;

use crate::error::EditorError;
use crate::geometry::fmt_num;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    attrs: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Self::default() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Swap the tag in place, keeping attributes and children.
    pub fn retag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn set_num(&mut self, name: impl Into<String>, value: f64) {
        self.set_attr(name, fmt_num(value));
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attr_num(&self, name: &str) -> Option<f64> {
        self.attr(name)?.parse().ok()
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.shift_remove(name);
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn child_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .find(|c| c.attr("class") == Some(class))
    }

    /// Serialize to SVG markup. Childless elements without text self-close.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    /// Parse a single element (with children) from markup.
    pub fn from_markup(markup: &str) -> Result<Element, EditorError> {
        let doc = roxmltree::Document::parse(markup)
            .map_err(|e| EditorError::Markup(e.to_string()))?;
        Ok(from_node(doc.root_element()))
    }
}

fn from_node(node: roxmltree::Node<'_, '_>) -> Element {
    let mut el = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        el.set_attr(attr.name(), attr.value());
    }
    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    if !text.trim().is_empty() {
        el.set_text(text);
    }
    for child in node.children().filter(|c| c.is_element()) {
        el.push_child(from_node(child));
    }
    el
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_self_close() {
        let mut el = Element::new("rect");
        el.set_num("x", 10.0);
        el.set_num("width", 140.0);
        assert_eq!(el.to_markup(), r#"<rect x="10" width="140"/>"#);
    }

    #[test]
    fn text_and_attrs_are_escaped() {
        let mut el = Element::new("text");
        el.set_attr("data-label", "a<b & \"c\"");
        el.set_text("x < y & z");
        assert_eq!(
            el.to_markup(),
            r#"<text data-label="a&lt;b &amp; &quot;c&quot;">x &lt; y &amp; z</text>"#
        );
    }

    #[test]
    fn attribute_order_is_insertion_order() {
        let mut el = Element::new("line");
        el.set_num("x1", 1.0);
        el.set_num("y1", 2.0);
        el.set_num("x1", 9.0);
        assert_eq!(el.to_markup(), r#"<line x1="9" y1="2"/>"#);
    }

    #[test]
    fn markup_round_trips_through_the_parser() {
        let mut el = Element::new("g");
        el.set_attr("id", "shape-1");
        let mut body = Element::new("path");
        body.set_attr("class", "cylinder-body");
        body.set_attr("d", "M 0 0");
        el.push_child(body);
        let parsed = Element::from_markup(&el.to_markup()).unwrap();
        assert_eq!(parsed, el);
        assert_eq!(
            Element::from_markup(&el.to_markup())
                .unwrap()
                .child_by_class_mut("cylinder-body")
                .map(|c| c.tag().to_string()),
            Some("path".to_string())
        );
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(Element::from_markup("<rect").is_err());
    }
}
