use std::path::Path;

use roxmltree::ParsingOptions;

use crate::error::{QueryError, QueryResult};

/// One XML element with its attributes, direct text and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of the element's direct text children.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All descendant elements in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }

        Self {
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect(),
            text,
            children,
        }
    }
}

/// A parsed report. Read-only once built, and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    root: Element,
}

impl ReportDocument {
    /// Parses an XML report held in memory.
    pub fn parse(xml: &str) -> QueryResult<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let document = roxmltree::Document::parse_with_options(xml, options)?;
        Ok(Self {
            root: Element::from_node(document.root_element()),
        })
    }

    /// Reads and parses an XML report file.
    pub fn open(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| QueryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }
}
