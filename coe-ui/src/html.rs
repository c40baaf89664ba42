//! 类型化 HTML 节点树 / Typed HTML node tree
//!
//! 所有文本与属性值在渲染时转义，不合法的属性名被丢弃。
//! Text and attribute values are escaped on render; illegal attribute names are dropped.

use std::fmt::Write as _;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Fragment(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// `None` 值表示布尔属性 / `None` marks a boolean attribute
    pub attrs: Vec<(String, Option<String>)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 设置属性，同名属性覆盖 / Set an attribute, replacing one with the same name
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, Some(value.into()));
        self
    }

    pub fn attr_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.set_attr(name, None);
        self
    }

    pub fn flag_if(self, name: &str, on: bool) -> Self {
        if on {
            self.flag(name)
        } else {
            self
        }
    }

    /// 追加 class，空串忽略 / Append classes, ignoring blanks
    pub fn class(mut self, class: &str) -> Self {
        let class = class.trim();
        if class.is_empty() {
            return self;
        }
        match self.attrs.iter_mut().find(|(k, _)| k == "class") {
            Some((_, Some(existing))) => {
                existing.push(' ');
                existing.push_str(class);
            }
            Some((_, slot)) => *slot = Some(class.to_string()),
            None => self.attrs.push(("class".to_string(), Some(class.to_string()))),
        }
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// 深度优先查找第一个满足条件的元素（含自身），可修改
    /// First matching element including self, depth first, mutable
    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|n| n.find_mut(pred))
    }

    /// 以单个文本节点替换全部子节点；空串清空
    /// Replace every child with one text node; an empty string clears them
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    fn set_attr(&mut self, name: &str, value: Option<String>) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

/// 创建元素 / Shorthand element constructor
pub fn el(tag: &str) -> Element {
    Element::new(tag)
}

pub fn text(s: impl Into<String>) -> Node {
    Node::Text(s.into())
}

pub fn fragment(nodes: Vec<Node>) -> Node {
    Node::Fragment(nodes)
}

impl Node {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Node::Text(t) => escape_into(out, t),
            Node::Fragment(nodes) => nodes.iter().for_each(|n| n.render_into(out)),
            Node::Element(e) => {
                let tag = if valid_name(&e.tag) { e.tag.as_str() } else { "div" };
                out.push('<');
                out.push_str(tag);
                for (name, value) in &e.attrs {
                    if !valid_name(name) {
                        tracing::debug!(attr = %name, "dropping invalid attribute name");
                        continue;
                    }
                    out.push(' ');
                    out.push_str(name);
                    if let Some(v) = value {
                        out.push_str("=\"");
                        escape_into(out, v);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                for c in &e.children {
                    c.render_into(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    /// 深度优先查找第一个满足条件的元素 / First matching element, depth first
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        match self {
            Node::Text(_) => None,
            Node::Fragment(nodes) => nodes.iter().find_map(|n| n.find(pred)),
            Node::Element(e) => {
                if pred(e) {
                    return Some(e);
                }
                e.children.iter().find_map(|n| n.find(pred))
            }
        }
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        match self {
            Node::Text(_) => None,
            Node::Fragment(nodes) => nodes.iter_mut().find_map(|n| n.find_mut(pred)),
            Node::Element(e) => e.find_mut(pred),
        }
    }

    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        match self {
            Node::Text(_) => {}
            Node::Fragment(nodes) => nodes.iter().for_each(|n| n.find_all(pred, out)),
            Node::Element(e) => {
                if pred(e) {
                    out.push(e);
                }
                e.children.iter().for_each(|n| n.find_all(pred, out));
            }
        }
    }

    /// 拼接所有文本内容 / Concatenated text content
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Fragment(nodes) => nodes.iter().map(Node::text_content).collect(),
            Node::Element(e) => e.children.iter().map(Node::text_content).collect(),
        }
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_text_and_attributes() {
        let node: Node = el("a")
            .attr("href", "/x?a=1&b=\"2\"")
            .text("<script>alert(1)</script>")
            .into();
        assert_eq!(
            node.render(),
            "<a href=\"/x?a=1&amp;b=&quot;2&quot;\">&lt;script&gt;alert(1)&lt;/script&gt;</a>"
        );
    }

    #[test]
    fn test_void_and_boolean_attributes() {
        let node: Node = el("input").attr("type", "checkbox").flag("checked").into();
        assert_eq!(node.render(), "<input type=\"checkbox\" checked>");
    }

    #[test]
    fn test_invalid_attribute_names_dropped() {
        let node: Node = el("div").attr("onclick=\"x\" data", "1").attr("data-ok", "y").into();
        assert_eq!(node.render(), "<div data-ok=\"y\"></div>");
    }

    #[test]
    fn test_class_merges() {
        let e = el("span").class("badge").class("").class("bg-success");
        assert_eq!(e.get_attr("class"), Some("badge bg-success"));
    }

    #[test]
    fn test_find_and_text_content() {
        let node: Node = el("ul")
            .child(el("li").attr("id", "a").text("one"))
            .child(el("li").attr("id", "b").text("two"))
            .into();
        let b = node.find(&|e| e.get_attr("id") == Some("b")).unwrap();
        assert_eq!(Node::Element(b.clone()).text_content(), "two");
        assert_eq!(node.text_content(), "onetwo");
    }

    #[test]
    fn test_find_mut_replaces_text() {
        let mut node: Node = el("form")
            .child(el("div").attr("data-slot", "x").child(el("ul").text("old")))
            .into();
        node.find_mut(&|e| e.has_attr("data-slot"))
            .unwrap()
            .set_text("new");
        assert_eq!(node.render(), "<form><div data-slot=\"x\">new</div></form>");

        node.find_mut(&|e| e.has_attr("data-slot")).unwrap().set_text("");
        assert_eq!(node.text_content(), "");
        assert!(node.find_mut(&|e| e.tag == "table").is_none());
    }
}
