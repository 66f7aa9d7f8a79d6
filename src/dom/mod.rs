//! In-memory HTML tree.
//!
//! Pages are parsed into an arena of nodes, rewritten in place (sidebar
//! grafting, active-link marking) and serialized back out. Nothing here
//! talks to a browser; the whole tree lives for one request.

mod parser;

pub use parser::{ParseError, parse};

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag_name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Elements that never take an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Document,
        };
        Dom {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub fn create_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.create_node(Some(parent), NodeKind::Element(element))
    }

    pub fn create_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_node(Some(parent), NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_node(Some(parent), NodeKind::Comment(text.to_string()))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Unlinks every child of `id`. The nodes stay in the arena but are no
    /// longer reachable from the root; the arena is request-scoped so that
    /// garbage dies with it.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            if self.element(child).is_some() {
                out.push(child);
            }
            self.collect_elements(child, out);
        }
    }

    /// Every element under `id` in document order, not including `id`.
    pub fn element_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(id, &mut out);
        out
    }

    pub fn find_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.element_descendants(self.root)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id_attr))
    }

    pub fn elements_by_tag_class(&self, root: NodeId, tag: &str, class: &str) -> Vec<NodeId> {
        self.element_descendants(root)
            .into_iter()
            .filter(|&n| self.tag_name(n) == Some(tag) && self.has_class(n, class))
            .collect()
    }

    pub fn find_by_attr(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.element_descendants(root)
            .into_iter()
            .find(|&n| self.attr(n, name) == Some(value))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    /// Reads `data-<key>`, the way `element.dataset` resolves keys.
    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        let name = format!("data-{}", key);
        self.element(id).and_then(|e| e.attr(&name))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let NodeKind::Text(text) = &self.nodes[id.0].kind {
            out.push_str(text);
        }
        for &child in &self.nodes[id.0].children {
            self.collect_text(child, out);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        match self.element(id) {
            Some(element) => class_tokens(element.attr("class"))
                .iter()
                .any(|name| name == class),
            None => false,
        }
    }

    /// Adding a class that is already present is a no-op.
    pub fn class_add(&mut self, id: NodeId, class: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let mut classes = class_tokens(element.attr("class"));
        if !classes.iter().any(|name| name == class) {
            classes.push(class.to_string());
        }
        set_class_attr(element, &classes);
    }

    pub fn class_remove(&mut self, id: NodeId, class: &str) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let mut classes = class_tokens(element.attr("class"));
        classes.retain(|name| name != class);
        set_class_attr(element, &classes);
    }

    pub fn class_list(&self, id: NodeId) -> Vec<String> {
        match self.element(id) {
            Some(element) => class_tokens(element.attr("class")),
            None => Vec::new(),
        }
    }

    /// Serializes `id` and its subtree. The document node renders its
    /// children only, with a doctype up front.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        match &self.nodes[id.0].kind {
            NodeKind::Document => {
                out.push_str("<!doctype html>\n");
                for &child in &self.nodes[id.0].children {
                    self.write_node(child, &mut out);
                }
            }
            _ => self.write_node(id, &mut out),
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Document => {
                for &child in &self.nodes[id.0].children {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&element.tag_name) {
                    return;
                }
                let raw = matches!(element.tag_name.as_str(), "script" | "style");
                for &child in &self.nodes[id.0].children {
                    if raw {
                        if let NodeKind::Text(text) = &self.nodes[child.0].kind {
                            out.push_str(text);
                            continue;
                        }
                    }
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Dom::new()
    }
}

pub(crate) fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|attr| {
            attr.split_ascii_whitespace()
                .map(|token| token.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    element.set_attr("class", &classes.join(" "));
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn decode_entities(text: &str) -> String {
    let replacements: HashMap<&str, char> = HashMap::from([
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("#39", '\''),
        ("apos", '\''),
    ]);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest[1..].find(';') {
            Some(end) if end <= 6 => {
                let name = &rest[1..end + 1];
                match replacements.get(name) {
                    Some(&c) => {
                        out.push(c);
                        rest = &rest[end + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let mut nav = Element::new("nav");
        nav.set_attr("id", "sidebar-nav");
        let nav = dom.create_element(root, nav);
        let mut link = Element::new("a");
        link.set_attr("class", "nav-item");
        link.set_attr("data-url", "dashboard");
        let link = dom.create_element(nav, link);
        dom.create_text(link, "Dashboard");
        (dom, nav, link)
    }

    #[test]
    fn class_add_is_idempotent() {
        let (mut dom, _, link) = sample();
        dom.class_add(link, "bg-brand-600");
        let once = dom.class_list(link);
        dom.class_add(link, "bg-brand-600");
        assert_eq!(dom.class_list(link), once);
        assert_eq!(once, vec!["nav-item", "bg-brand-600"]);
    }

    #[test]
    fn class_remove_drops_only_named_token() {
        let (mut dom, _, link) = sample();
        dom.class_add(link, "text-white");
        dom.class_remove(link, "nav-item");
        assert_eq!(dom.class_list(link), vec!["text-white"]);
        assert!(!dom.has_class(link, "nav-item"));
    }

    #[test]
    fn queries_find_elements_by_id_tag_and_class() {
        let (dom, nav, link) = sample();
        assert_eq!(dom.find_by_id("sidebar-nav"), Some(nav));
        assert_eq!(dom.elements_by_tag_class(nav, "a", "nav-item"), vec![link]);
        assert_eq!(dom.data(link, "url"), Some("dashboard"));
        assert!(dom.elements_by_tag_class(nav, "span", "rounded-full").is_empty());
    }

    #[test]
    fn clear_children_detaches_subtree() {
        let (mut dom, nav, link) = sample();
        dom.clear_children(nav);
        assert!(dom.children(nav).is_empty());
        assert_eq!(dom.parent(link), None);
        assert!(dom.elements_by_tag_class(nav, "a", "nav-item").is_empty());
    }

    #[test]
    fn serialization_escapes_and_closes() {
        let mut dom = Dom::new();
        let root = dom.root();
        let div = dom.create_element(root, Element::new("div"));
        dom.create_text(div, "a < b & c");
        let mut img = Element::new("img");
        img.set_attr("src", "/static/logo.png");
        dom.create_element(div, img);
        let html = dom.to_html(div);
        assert_eq!(
            html,
            "<div>a &lt; b &amp; c<img src=\"/static/logo.png\"></div>"
        );
    }

    #[test]
    fn entity_decode_handles_known_and_unknown() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;span&gt;"), "<span>");
        assert_eq!(decode_entities("50&#39;s"), "50's");
        assert_eq!(decode_entities("AT&T &unknown; x"), "AT&T &unknown; x");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }
}
