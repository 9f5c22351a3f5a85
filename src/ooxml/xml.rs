//! Mutable XML tree for WordprocessingML parts
//!
//! Parts are parsed with `quick-xml` into an arena of nodes addressed by
//! [`NodeId`]. Qualified names are kept verbatim (`w:p`, `a:blip`), so
//! lookups compare prefixed names the way they are written in the part.
//! Detached nodes stay in the arena and can be re-inserted anywhere in the
//! same document.

use std::collections::HashSet;

use log::warn;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::OoxmlError;

/// Handle to a node inside one [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute as written in the source (`w:val="1"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        name: String,
        attributes: Vec<XmlAttribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct XmlDeclaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// Arena-backed XML document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
    declaration: Option<XmlDeclaration>,
}

impl XmlDocument {
    /// Create a document with a single empty root element
    pub fn new(root_name: &str) -> Self {
        let mut document = XmlDocument {
            nodes: Vec::new(),
            root: NodeId(0),
            declaration: None,
        };
        document.root = document.create_element(root_name);
        document
    }

    /// Parse a part from raw bytes (UTF-8, BOM tolerated)
    pub fn from_bytes(data: &[u8]) -> Result<Self, OoxmlError> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let xml = std::str::from_utf8(data).map_err(|e| OoxmlError::ParseError(e.to_string()))?;
        Self::parse(xml)
    }

    /// Parse a part from a string
    pub fn parse(xml: &str) -> Result<Self, OoxmlError> {
        let mut reader = Reader::from_str(xml);
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut declaration = None;

        loop {
            match reader.read_event()? {
                Event::Decl(decl) => {
                    declaration = Some(Self::read_declaration(&decl)?);
                }
                Event::Start(start) => {
                    let id = Self::push_element(&mut nodes, &stack, &start)?;
                    if stack.is_empty() && root.is_none() {
                        root = Some(id);
                    }
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = Self::push_element(&mut nodes, &stack, &start)?;
                    if stack.is_empty() && root.is_none() {
                        root = Some(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(&parent) = stack.last() {
                        let value = text.unescape()?.into_owned();
                        Self::push_leaf(&mut nodes, parent, NodeKind::Text(value));
                    }
                }
                Event::CData(data) => {
                    if let Some(&parent) = stack.last() {
                        let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        Self::push_leaf(&mut nodes, parent, NodeKind::Text(value));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(&parent) = stack.last() {
                        let value = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                        Self::push_leaf(&mut nodes, parent, NodeKind::Comment(value));
                    }
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        let root = root.ok_or_else(|| OoxmlError::Xml("document has no root element".to_string()))?;
        Ok(XmlDocument {
            nodes,
            root,
            declaration,
        })
    }

    fn read_declaration(decl: &BytesDecl<'_>) -> Result<XmlDeclaration, OoxmlError> {
        let version = String::from_utf8_lossy(&decl.version()?).into_owned();
        let encoding = match decl.encoding() {
            Some(value) => Some(String::from_utf8_lossy(&value?).into_owned()),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(value) => Some(String::from_utf8_lossy(&value?).into_owned()),
            None => None,
        };
        Ok(XmlDeclaration {
            version,
            encoding,
            standalone,
        })
    }

    fn push_element(
        nodes: &mut Vec<Node>,
        stack: &[NodeId],
        start: &BytesStart<'_>,
    ) -> Result<NodeId, OoxmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            attributes.push(XmlAttribute {
                name: String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                value: attribute.unescape_value()?.into_owned(),
            });
        }

        let id = NodeId(nodes.len());
        let parent = stack.last().copied();
        nodes.push(Node {
            kind: NodeKind::Element { name, attributes },
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    fn push_leaf(nodes: &mut Vec<Node>, parent: NodeId, kind: NodeKind) {
        let id = NodeId(nodes.len());
        nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        nodes[parent.0].children.push(id);
    }

    /// Serialize the document (declaration included when the source had one)
    pub fn to_xml_string(&self) -> Result<String, OoxmlError> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.declaration {
            let event = BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            );
            writer
                .write_event(Event::Decl(event))
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        self.write_node(&mut writer, self.root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| OoxmlError::Xml(e.to_string()))
    }

    /// Serialize a single node and its subtree, without declaration
    pub fn node_to_string(&self, id: NodeId) -> Result<String, OoxmlError> {
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, id)?;
        String::from_utf8(writer.into_inner()).map_err(|e| OoxmlError::Xml(e.to_string()))
    }

    /// Serialize to UTF-8 bytes, ready to be stored back into a package part
    pub fn to_bytes(&self) -> Result<Vec<u8>, OoxmlError> {
        Ok(self.to_xml_string()?.into_bytes())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), OoxmlError> {
        let node = &self.nodes[id.0];
        let event = match &node.kind {
            NodeKind::Text(text) => Event::Text(BytesText::new(text)),
            NodeKind::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
            NodeKind::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for attribute in attributes {
                    start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
                }
                if node.children.is_empty() {
                    Event::Empty(start)
                } else {
                    writer
                        .write_event(Event::Start(start))
                        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    Event::End(BytesEnd::new(name.as_str()))
                }
            }
        };
        writer
            .write_event(event)
            .map_err(|e| OoxmlError::Xml(e.to_string()))
    }

    // ============================================
    // Navigation
    // ============================================

    /// The document element
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Qualified name of an element, `None` for text and comments
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// True when `id` is an element with the given qualified name
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attributes.push(XmlAttribute {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            attributes.retain(|a| a.name != name);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All child nodes (elements, text and comments) in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children in document order
    pub fn elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.is_element(child))
    }

    /// First element child with the given name
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.is(child, name))
    }

    /// Element children with the given name
    pub fn children_named<'a>(&'a self, id: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.is(child, name))
    }

    /// Attribute of the first child element with `child_name`, the usual
    /// `<w:numId w:val="3"/>` shape
    pub fn child_attribute(&self, id: NodeId, child_name: &str, attribute: &str) -> Option<&str> {
        self.child(id, child_name)
            .and_then(|child| self.attribute(child, attribute))
    }

    /// Pre-order descendants, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        result
    }

    /// Pre-order descendants with `id` first
    pub fn descendants_and_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = vec![id];
        result.extend(self.descendants(id));
        result
    }

    /// Pre-order descendant elements with the given name, excluding `id`
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is(node, name))
            .collect()
    }

    /// Like [`descendants_named`](Self::descendants_named) but `id` is included when it matches
    pub fn descendants_and_self_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants_and_self(id)
            .into_iter()
            .filter(|&node| self.is(node, name))
            .collect()
    }

    /// True when `id` or any of its descendants is named `name`
    pub fn has_descendant_or_self(&self, id: NodeId, name: &str) -> bool {
        if self.is(id, name) {
            return true;
        }
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.clone();
        while let Some(current) = stack.pop() {
            if self.is(current, name) {
                return true;
            }
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
        false
    }

    /// Matching descendants-and-self that have no matching ancestor below `id`
    pub fn first_level_descendants_and_self(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let all = self.descendants_and_self_named(id, name);
        let collected: HashSet<NodeId> = all.iter().copied().collect();
        all.into_iter()
            .filter(|&node| {
                let mut current = self.parent(node);
                while let Some(ancestor) = current {
                    if collected.contains(&ancestor) {
                        return false;
                    }
                    if ancestor == id {
                        break;
                    }
                    current = self.parent(ancestor);
                }
                true
            })
            .collect()
    }

    /// Ancestors from the parent upward
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor);
        }
        result
    }

    /// True when `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).contains(&ancestor)
    }

    /// True when the node is still connected to the document element
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root, id)
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0].children.iter().position(|&child| child == id)
    }

    /// Element siblings before `id`, in document order
    pub fn elements_before(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.nodes[parent.0].children[..index]
                .iter()
                .copied()
                .filter(|&node| self.is_element(node))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Element siblings after `id`, in document order
    pub fn elements_after(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.nodes[parent.0].children[index + 1..]
                .iter()
                .copied()
                .filter(|&node| self.is_element(node))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self, id: NodeId) -> String {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Comment(_) => String::new(),
            NodeKind::Element { .. } => self
                .descendants(id)
                .into_iter()
                .filter_map(|node| match &self.nodes[node.0].kind {
                    NodeKind::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    // ============================================
    // Mutation
    // ============================================

    /// Replace every child of `id` with a single text node
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in self.nodes[id.0].children.clone() {
            self.nodes[child.0].parent = None;
        }
        self.nodes[id.0].children.clear();
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node);
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_detached(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached element carrying the given attributes
    pub fn create_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(name);
        for (key, value) in attributes {
            self.set_attribute(id, key, *value);
        }
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_detached(NodeKind::Text(text.to_string()))
    }

    fn push_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Remove a node from its parent. The subtree stays valid and can be
    /// inserted again.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.is_ancestor_or_self(child, parent) {
            warn!("refusing to append a node into its own subtree");
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` among the children of `parent`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.is_ancestor_or_self(child, parent) {
            warn!("refusing to insert a node into its own subtree");
            return;
        }
        self.detach(child);
        let index = index.min(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
    }

    /// Insert `node` right before `reference`. No-op when `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        self.insert_sibling(reference, &[node], 0);
    }

    /// Insert `node` right after `reference`. No-op when `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        self.insert_sibling(reference, &[node], 1);
    }

    /// Insert `nodes` in order right after `reference`
    pub fn insert_all_after(&mut self, reference: NodeId, nodes: &[NodeId]) {
        self.insert_sibling(reference, nodes, 1);
    }

    fn insert_sibling(&mut self, reference: NodeId, nodes: &[NodeId], offset: usize) {
        let Some(parent) = self.parent(reference) else {
            warn!("cannot insert next to a detached node");
            return;
        };
        for &node in nodes {
            self.detach(node);
        }
        let Some(index) = self.index_in_parent(reference) else {
            return;
        };
        for (i, &node) in nodes.iter().enumerate() {
            self.nodes[node.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(index + offset + i, node);
        }
    }

    /// Put `replacement` where `id` was and detach `id`
    pub fn replace_with(&mut self, id: NodeId, replacement: &[NodeId]) {
        if self.parent(id).is_none() {
            return;
        }
        self.insert_sibling(id, replacement, 0);
        self.detach(id);
    }

    /// Copy a subtree. The copy is detached and shares nothing with the source.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.push_detached(self.nodes[id.0].kind.clone());
        let mut pending = vec![(id, copy)];
        while let Some((source, target)) = pending.pop() {
            for child in self.nodes[source.0].children.clone() {
                let child_copy = self.push_detached(self.nodes[child.0].kind.clone());
                self.nodes[child_copy.0].parent = Some(target);
                self.nodes[target.0].children.push(child_copy);
                pending.push((child, child_copy));
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">Hello &amp; bye </w:t></w:r></w:p><w:p/></w:body></w:document>"#;

    #[test]
    fn test_parse_and_serialize_round_trip() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), SAMPLE);
    }

    #[test]
    fn test_navigation() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let body = doc.child(doc.root(), "w:body").unwrap();
        assert_eq!(doc.children_named(body, "w:p").count(), 2);

        let t = doc.descendants_named(body, "w:t")[0];
        assert_eq!(doc.text(t), "Hello & bye ");
        assert_eq!(doc.attribute(t, "xml:space"), Some("preserve"));
        assert_eq!(doc.ancestors(t).len(), 4);
        assert!(doc.is_ancestor_or_self(body, t));
    }

    #[test]
    fn test_first_level_descendants_skip_nested_matches() {
        let doc = XmlDocument::parse(
            r#"<root><a id="1"><a id="2"/></a><b><a id="3"/></b></root>"#,
        )
        .unwrap();
        let found = doc.first_level_descendants_and_self(doc.root(), "a");
        let ids: Vec<_> = found.iter().map(|&n| doc.attribute(n, "id").unwrap()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut doc = XmlDocument::parse(r#"<root><p><t>x</t></p></root>"#).unwrap();
        let p = doc.child(doc.root(), "p").unwrap();
        let copy = doc.deep_clone(p);
        assert!(doc.parent(copy).is_none());

        let t = doc.child(copy, "t").unwrap();
        doc.set_text(t, "y");
        doc.insert_after(p, copy);
        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<root><p><t>x</t></p><p><t>y</t></p></root>"
        );
    }

    #[test]
    fn test_replace_with_keeps_order() {
        let mut doc = XmlDocument::parse(r#"<root><a/><w><b/><c/></w><d/></root>"#).unwrap();
        let wrapper = doc.child(doc.root(), "w").unwrap();
        let inner: Vec<NodeId> = doc.children(wrapper).to_vec();
        doc.replace_with(wrapper, &inner);
        assert_eq!(doc.to_xml_string().unwrap(), "<root><a/><b/><c/><d/></root>");
        assert!(!doc.is_attached(wrapper));
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let mut doc = XmlDocument::new("root");
        let root = doc.root();
        doc.set_attribute(root, "w:val", "1");
        doc.set_attribute(root, "w:val", "2");
        assert_eq!(doc.attribute(root, "w:val"), Some("2"));
        doc.remove_attribute(root, "w:val");
        assert!(doc.attribute(root, "w:val").is_none());
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(XmlDocument::parse("").is_err());
    }
}
