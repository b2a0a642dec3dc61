//! NCX解析器模块
//!
//! 提供NCX（Navigation Control file for XML）文件与内存模型之间的双向映射。

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{NavList, NavMap, PageList, text_of};
use crate::epub::xml::{self, Element};

/// NCX命名空间
pub const NCX_NAMESPACE: &str = "http://www.daisy.org/z3986/2005/ncx/";

/// 默认的NCX版本
pub const NCX_VERSION: &str = "2005-1";

const DOCUMENT: &str = "ncx";

/// NCX文件解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ncx {
    pub xmlns: Option<String>,
    /// NCX版本
    pub version: Option<String>,
    /// XML语言
    pub lang: Option<String>,
    /// 唯一标识符（dtb:uid）
    pub uid: Option<String>,
    /// 导航深度（dtb:depth）
    pub depth: Option<String>,
    /// 总页数（dtb:totalPageCount）
    pub total_page_count: Option<String>,
    /// 最大页码（dtb:maxPageNumber）
    pub max_page_number: Option<String>,
    /// 生成工具（dtb:generator）
    pub generator: Option<String>,
    /// 文档标题
    pub title: String,
    /// 文档作者
    pub authors: Vec<String>,
    /// 导航地图
    pub nav_map: NavMap,
    /// 页面列表（可选）
    pub page_list: Option<PageList>,
    pub nav_lists: Vec<NavList>,
}

impl Default for Ncx {
    fn default() -> Self {
        Self {
            xmlns: Some(NCX_NAMESPACE.to_string()),
            version: Some(NCX_VERSION.to_string()),
            lang: None,
            uid: None,
            depth: None,
            total_page_count: None,
            max_page_number: None,
            generator: None,
            title: String::new(),
            authors: Vec::new(),
            nav_map: NavMap::new(),
            page_list: None,
            nav_lists: Vec::new(),
        }
    }
}

impl Ncx {
    /// 创建新的NCX，命名空间与版本使用默认值
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Ncx>` - 解析后的NCX信息；head、docTitle、navMap缺失或重复时返回
    ///   [`EpubError::MalformedDocument`]
    pub fn parse_xml(xml_content: &str) -> Result<Ncx> {
        let root = xml::parse_document(xml_content, DOCUMENT)?;
        Self::from_element(&root)
    }

    /// 从 `<ncx>` 根元素构建
    pub fn from_element(root: &Element) -> Result<Ncx> {
        let head = exactly_one(root, "head")?;
        let doc_title = exactly_one(root, "docTitle")?;
        let nav_map = exactly_one(root, "navMap")?;

        let mut ncx = Ncx {
            xmlns: root.attr_opt("xmlns"),
            version: root.attr_opt("version"),
            lang: root.attr_opt("xml:lang"),
            title: text_of(doc_title, "text"),
            authors: root
                .children_named("docAuthor")
                .map(|author| text_of(author, "text"))
                .collect(),
            nav_map: NavMap::from_element(nav_map),
            page_list: at_most_one(root, "pageList")?.map(PageList::from_element),
            nav_lists: root
                .children_named("navList")
                .map(NavList::from_element)
                .collect(),
            uid: None,
            depth: None,
            total_page_count: None,
            max_page_number: None,
            generator: None,
        };

        for meta in head.children_named("meta") {
            let content = meta.attr_opt("content");
            match meta.attr("name").unwrap_or_default() {
                "dtb:uid" => ncx.uid = content,
                "dtb:depth" => ncx.depth = content,
                "dtb:totalPageCount" => ncx.total_page_count = content,
                "dtb:maxPageNumber" => ncx.max_page_number = content,
                "dtb:generator" => ncx.generator = content,
                other => tracing::debug!(name = other, "忽略未知的NCX head meta"),
            }
        }

        Ok(ncx)
    }

    /// 生成 `<ncx>` 元素树
    pub fn to_element(&self) -> Element {
        let mut head = Element::new("head");
        let metas = [
            ("dtb:uid", &self.uid),
            ("dtb:depth", &self.depth),
            ("dtb:totalPageCount", &self.total_page_count),
            ("dtb:maxPageNumber", &self.max_page_number),
            ("dtb:generator", &self.generator),
        ];
        for (name, content) in metas {
            if let Some(content) = content.as_deref().filter(|c| !c.is_empty()) {
                head.push_child(
                    Element::new("meta")
                        .with_attr("name", name)
                        .with_attr("content", content),
                );
            }
        }

        let mut root = Element::new("ncx")
            .with_maybe_attr("xmlns", self.xmlns.as_deref())
            .with_maybe_attr("version", self.version.as_deref())
            .with_maybe_attr("xml:lang", self.lang.as_deref())
            .with_child(head)
            .with_child(text_element("docTitle", &self.title));

        for author in &self.authors {
            root.push_child(text_element("docAuthor", author));
        }
        root.push_child(self.nav_map.to_element());
        if let Some(page_list) = &self.page_list {
            root.push_child(page_list.to_element());
        }
        for nav_list in &self.nav_lists {
            root.push_child(nav_list.to_element());
        }
        root
    }

    /// 序列化为NCX文档
    ///
    /// # 参数
    /// * `indent` - 每层缩进的空格数，0表示紧凑输出
    pub fn to_xml(&self, indent: usize) -> Result<Vec<u8>> {
        xml::write_document(&self.to_element(), indent)
    }

    /// 根据导航地图的实际嵌套深度更新 `dtb:depth`
    pub fn update_depth(&mut self) {
        self.depth = Some(self.nav_map.depth().to_string());
    }
}

fn text_element(tag: &str, text: &str) -> Element {
    Element::new(tag).with_child(Element::new("text").with_text(text))
}

fn exactly_one<'a>(root: &'a Element, name: &str) -> Result<&'a Element> {
    let mut matches = root.child_elements().filter(|e| e.local_name() == name);
    match (matches.next(), matches.next()) {
        (Some(element), None) => Ok(element),
        (None, _) => Err(EpubError::malformed(DOCUMENT, format!("缺少 <{}> 元素", name))),
        (Some(_), Some(_)) => Err(EpubError::malformed(
            DOCUMENT,
            format!("<{}> 元素只能出现一次", name),
        )),
    }
}

fn at_most_one<'a>(root: &'a Element, name: &str) -> Result<Option<&'a Element>> {
    let mut matches = root.child_elements().filter(|e| e.local_name() == name);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        return Err(EpubError::malformed(
            DOCUMENT,
            format!("<{}> 元素最多只能出现一次", name),
        ));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::ncx::navigation::{Label, NavPoint};
    use rstest::rstest;

    const SAMPLE_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1" xml:lang="en">
    <head>
        <meta name="dtb:uid" content="urn:uuid:0000"/>
        <meta name="dtb:depth" content="2"/>
        <meta name="dtb:totalPageCount" content="0"/>
        <meta name="dtb:maxPageNumber" content="0"/>
        <meta name="dtb:custom" content="ignored"/>
    </head>
    <docTitle><text> Testing Epub </text></docTitle>
    <docAuthor><text>Jane Doe</text></docAuthor>
    <docAuthor><text>John Doe</text></docAuthor>
    <navMap>
        <navPoint id="p1" playOrder="1">
            <navLabel><text>Chapter 1</text></navLabel>
            <content src="Text/chapter1.xhtml"/>
        </navPoint>
        <navPoint id="p2" playOrder="2" class="chapter">
            <navLabel><text>Chapter 2</text></navLabel>
            <content src="Text/chapter2.xhtml"/>
            <navPoint id="p2-1" playOrder="3">
                <navLabel><text>Section 2.1</text></navLabel>
                <content src="Text/chapter2.xhtml#s1"/>
            </navPoint>
            <navPoint id="p2-2" playOrder="4">
                <navLabel><text>Section 2.2</text></navLabel>
                <content src="Text/chapter2.xhtml#s2"/>
            </navPoint>
        </navPoint>
    </navMap>
    <pageList id="pages">
        <navLabel><text>Pages</text></navLabel>
        <pageTarget id="page1" value="1" type="normal" playOrder="5">
            <navLabel><text>1</text></navLabel>
            <content src="Text/chapter1.xhtml#page1"/>
        </pageTarget>
    </pageList>
    <navList class="lot">
        <navLabel><text>Tables</text></navLabel>
        <navTarget id="t1" value="1" playOrder="6">
            <navLabel><text>Table 1</text></navLabel>
            <content src="Text/chapter2.xhtml#t1"/>
        </navTarget>
    </navList>
    <navList class="loi"><navTarget id="i1"/></navList>
</ncx>"#;

    #[test]
    fn test_parse_sample() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX).expect("解析NCX失败");

        assert_eq!(ncx.version.as_deref(), Some(NCX_VERSION));
        assert_eq!(ncx.lang.as_deref(), Some("en"));
        assert_eq!(ncx.uid.as_deref(), Some("urn:uuid:0000"));
        assert_eq!(ncx.depth.as_deref(), Some("2"));
        assert_eq!(ncx.generator, None);
        assert_eq!(ncx.title, "Testing Epub");
        assert_eq!(ncx.authors, vec!["Jane Doe", "John Doe"]);

        assert_eq!(ncx.nav_map.children.len(), 2);
        let second = &ncx.nav_map.children[1];
        assert_eq!(second.class_name.as_deref(), Some("chapter"));
        assert_eq!(second.children.len(), 2);
        assert_eq!(second.children[1].src.as_deref(), Some("Text/chapter2.xhtml#s2"));

        let page_list = ncx.page_list.as_ref().expect("缺少pageList");
        assert_eq!(page_list.labels, vec![Label::new("Pages")]);
        assert_eq!(page_list.targets[0].target_type.as_deref(), Some("normal"));
        assert!(page_list.find_page_target_by_value("1").is_some());

        assert_eq!(ncx.nav_lists.len(), 2);
        assert_eq!(ncx.nav_lists[0].targets[0].labels[0].text, "Table 1");
        assert!(ncx.nav_lists[1].targets[0].labels.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let parsed = Ncx::parse_xml(SAMPLE_NCX).unwrap();
        let bytes = parsed.to_xml(2).unwrap();
        let reparsed = Ncx::parse_xml(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_minimal_document_keeps_optional_attributes_unset() {
        let ncx = Ncx::parse_xml(
            "<ncx><head/><docTitle><text>T</text></docTitle><navMap/></ncx>",
        )
        .unwrap();

        assert_eq!(ncx.xmlns, None);
        assert_eq!(ncx.version, None);
        assert!(ncx.page_list.is_none());
        assert!(ncx.nav_lists.is_empty());
        assert!(ncx.nav_map.is_empty());

        let element = ncx.to_element();
        assert!(element.attributes.is_empty());
        assert_eq!(element.children_named("head").next().unwrap().children.len(), 0);
    }

    #[test]
    fn test_doc_title_without_text() {
        let ncx = Ncx::parse_xml("<ncx><head/><docTitle/><navMap/></ncx>").unwrap();
        assert_eq!(ncx.title, "");
    }

    #[rstest]
    #[case::missing_head("<ncx><docTitle/><navMap/></ncx>")]
    #[case::missing_doc_title("<ncx><head/><navMap/></ncx>")]
    #[case::missing_nav_map("<ncx><head/><docTitle/></ncx>")]
    #[case::two_nav_maps("<ncx><head/><docTitle/><navMap/><navMap/></ncx>")]
    #[case::two_page_lists("<ncx><head/><docTitle/><navMap/><pageList/><pageList/></ncx>")]
    #[case::not_xml("<ncx><head>")]
    fn test_malformed(#[case] xml: &str) {
        let result = Ncx::parse_xml(xml);
        assert!(matches!(
            result,
            Err(EpubError::MalformedDocument { document: "ncx", .. })
        ));
    }

    #[test]
    fn test_serialize_head_order_and_depth() {
        let mut ncx = Ncx::new();
        ncx.generator = Some("epubforge".to_string());
        ncx.uid = Some("urn:uuid:1".to_string());
        ncx.title = "Book".to_string();
        let mut point = NavPoint::new("p1", "One", "one.xhtml");
        point.add_child(NavPoint::new("p1-1", "One.One", "one.xhtml#a"));
        ncx.nav_map.add_point(point);
        ncx.update_depth();

        let element = ncx.to_element();
        let names: Vec<String> = element
            .children_named("head")
            .next()
            .unwrap()
            .child_elements()
            .map(|meta| meta.attr_or_empty("name"))
            .collect();
        assert_eq!(names, vec!["dtb:uid", "dtb:depth", "dtb:generator"]);
        assert_eq!(ncx.depth.as_deref(), Some("2"));
        assert_eq!(element.attr("xmlns"), Some(NCX_NAMESPACE));
    }
}
