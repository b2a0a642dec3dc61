//! XML元素树模块
//!
//! OPF、NCX与container.xml都需要"直接子元素"和"任意后代元素"两种查找方式，
//! 因此先用quick_xml的事件流构建一棵只包含元素和文本的小型树，再由各文档模块映射。
//! 序列化时反向操作：各模型先生成 `Element` 树，再统一写出。

use crate::epub::error::{EpubError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// 元素树中的节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// XML元素
///
/// `name` 与属性键均保存限定名（如 `dc:title`、`opf:role`），
/// 查找时既可以用限定名也可以只用本地名。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// 返回限定名中冒号之后的本地名部分
pub fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 无条件添加属性
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// 仅当值非空时添加属性
    pub fn with_opt_attr(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.with_attr(key, value)
        }
    }

    /// `Option` 版本的 [`Element::with_opt_attr`]
    pub fn with_maybe_attr(self, key: &str, value: Option<&str>) -> Self {
        self.with_opt_attr(key, value.unwrap_or_default())
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// 按名称查找属性
    ///
    /// 先精确匹配限定名；找不到时再按本地名匹配，
    /// 这样 `opf:role` 也能命中未加前缀的 `role`。命名空间声明不参与本地名匹配。
    pub fn attr(&self, name: &str) -> Option<&str> {
        if let Some((_, value)) = self.attributes.iter().find(|(key, _)| key == name) {
            return Some(value);
        }
        let local = local_part(name);
        self.attributes
            .iter()
            .find(|(key, _)| !key.starts_with("xmlns") && local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// 属性值，不存在时为空字符串
    pub fn attr_or_empty(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_string()
    }

    /// 属性值，不存在或为空时为 `None`
    pub fn attr_opt(&self, name: &str) -> Option<String> {
        self.attr(name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// 直接子元素（忽略文本节点）
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// 本地名为 `local` 的直接子元素
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements()
            .filter(move |element| element.local_name() == local)
    }

    /// 所有后代元素，按文档顺序（不包含自身）
    pub fn descendants(&self) -> Vec<&Element> {
        let mut result = Vec::new();
        self.collect_descendants(&mut result);
        result
    }

    fn collect_descendants<'a>(&'a self, result: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            result.push(child);
            child.collect_descendants(result);
        }
    }

    /// 第一个本地名为 `local` 的后代元素
    pub fn find_descendant(&self, local: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// 元素内全部文本（含后代），去除首尾空白
    pub fn text(&self) -> String {
        let mut buffer = String::new();
        self.collect_text(&mut buffer);
        buffer.trim().to_string()
    }

    fn collect_text(&self, buffer: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => buffer.push_str(text),
                Node::Element(element) => element.collect_text(buffer),
            }
        }
    }
}

/// 解析XML文档，返回根元素
///
/// `document` 仅用于错误信息（如 `"opf"`、`"ncx"`）。XML不是良构文档时返回
/// [`EpubError::MalformedDocument`]。
pub fn parse_document(xml_content: &str, document: &'static str) -> Result<Element> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(false);

    let malformed = |err: quick_xml::Error| EpubError::malformed(document, err.to_string());

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(ref e) => {
                stack.push(element_from_start(e, document)?);
            }
            Event::Empty(ref e) => {
                let element = element_from_start(e, document)?;
                attach(&mut stack, &mut root, element, document)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EpubError::malformed(document, "意外的结束标签"))?;
                attach(&mut stack, &mut root, element, document)?;
            }
            Event::Text(ref e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().map_err(malformed)?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(EpubError::malformed(
            document,
            format!("元素 <{}> 没有闭合", open.name),
        ));
    }

    root.ok_or_else(|| EpubError::malformed(document, "文档没有根元素"))
}

fn element_from_start(e: &BytesStart, document: &'static str) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| EpubError::malformed(document, err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| EpubError::malformed(document, err.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    document: &'static str,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_some() {
                return Err(EpubError::malformed(document, "文档包含多个根元素"));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

/// 将元素树写成带XML声明的文档
///
/// `indent` 为每层缩进的空格数，0表示不换行不缩进。
pub fn write_document(root: &Element, indent: usize) -> Result<Vec<u8>> {
    let mut writer = if indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    } else {
        Writer::new(Vec::new())
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let xml = r#"<?xml version="1.0"?>
<root xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title xml:lang="fr">  Le titre  </dc:title>
    <group><item id="a"/><item id="b">x</item></group>
</root>"#;

        let root = parse_document(xml, "test").expect("解析失败");
        assert_eq!(root.name, "root");
        assert_eq!(root.child_elements().count(), 2);

        let title = root.find_descendant("title").expect("缺少title");
        assert_eq!(title.name, "dc:title");
        assert_eq!(title.text(), "Le titre");
        assert_eq!(title.attr("xml:lang"), Some("fr"));
        assert_eq!(title.attr("lang"), Some("fr"));

        let ids: Vec<String> = root
            .descendants()
            .into_iter()
            .filter(|e| e.local_name() == "item")
            .map(|e| e.attr_or_empty("id"))
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_attr_falls_back_to_local_name() {
        let element = Element::new("dc:creator").with_attr("role", "aut");
        assert_eq!(element.attr("opf:role"), Some("aut"));
        assert_eq!(element.attr("opf:file-as"), None);

        let element = Element::new("metadata").with_attr("xmlns:dc", "uri");
        assert_eq!(element.attr("dc"), None);
    }

    #[test]
    fn test_unescapes_entities() {
        let root = parse_document("<a t=\"&quot;x&quot;\">1 &lt; 2</a>", "test").unwrap();
        assert_eq!(root.attr("t"), Some("\"x\""));
        assert_eq!(root.text(), "1 < 2");
    }

    #[test]
    fn test_malformed_documents() {
        for xml in ["<a><b></a>", "<a>", "", "<a/><b/>"] {
            let result = parse_document(xml, "test");
            assert!(
                matches!(result, Err(EpubError::MalformedDocument { .. })),
                "应当拒绝: {xml:?}"
            );
        }
    }

    #[test]
    fn test_write_then_parse() {
        let root = Element::new("list")
            .with_attr("id", "l1")
            .with_opt_attr("class", "")
            .with_child(Element::new("entry").with_text("a & b"))
            .with_child(Element::new("empty"));

        let bytes = write_document(&root, 2).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<entry>a &amp; b</entry>"));
        assert!(text.contains("<empty/>"));
        assert!(!text.contains("class"));

        let parsed = parse_document(&text, "test").unwrap();
        assert_eq!(parsed.attr("id"), Some("l1"));
        assert_eq!(parsed.find_descendant("entry").unwrap().text(), "a & b");
    }
}
