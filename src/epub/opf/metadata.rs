//! 元数据处理模块
//!
//! 提供EPUB 2.0.1 OPF元数据（Dublin Core 元素与 `meta` 标签）的结构定义和XML映射。

use crate::epub::xml::Element;

/// Dublin Core 命名空间
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// 标题
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Title {
    pub text: String,
    /// `xml:lang` 属性，空字符串表示未设置
    pub lang: String,
}

/// 创建者或贡献者信息(作者、编辑者等)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Creator {
    /// 姓名
    pub name: String,
    /// 角色(MARC relator代码，如aut、edt、oth)
    pub role: String,
    /// 排序用名称(`opf:file-as`)
    pub file_as: String,
}

/// 日期及其事件类型
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateEvent {
    pub date: String,
    /// `opf:event` 属性(如publication、modification)
    pub event: String,
}

/// 标识符信息
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identifier {
    /// 标识符值
    pub value: String,
    /// 元素ID，`package/@unique-identifier` 引用的就是它
    pub id: String,
    /// 标识符类型(如ISBN、UUID等)
    pub scheme: String,
}

/// `<meta name=".." content=".."/>` 标签
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    pub name: String,
    pub content: String,
}

/// OPF文件中的元数据信息
///
/// 可重复的元素保存为有序列表，不可重复的元素保存为 `Option`，解析时后出现的值覆盖先出现的值。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub titles: Vec<Title>,
    pub creators: Vec<Creator>,
    pub subjects: Vec<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub contributors: Vec<Creator>,
    pub dates: Vec<DateEvent>,
    pub dc_type: Option<String>,
    pub format: Option<String>,
    pub identifiers: Vec<Identifier>,
    pub source: Option<String>,
    pub languages: Vec<String>,
    pub relation: Option<String>,
    pub coverage: Option<String>,
    pub right: Option<String>,
    pub metas: Vec<Meta>,
}

impl Metadata {
    /// 创建新的元数据实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加标题
    pub fn add_title(&mut self, text: impl Into<String>, lang: impl Into<String>) {
        self.titles.push(Title {
            text: text.into(),
            lang: lang.into(),
        });
    }

    /// 添加创建者
    pub fn add_creator(
        &mut self,
        name: impl Into<String>,
        role: impl Into<String>,
        file_as: impl Into<String>,
    ) {
        self.creators.push(Creator {
            name: name.into(),
            role: role.into(),
            file_as: file_as.into(),
        });
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) {
        self.subjects.push(subject.into());
    }

    /// 添加贡献者
    pub fn add_contributor(
        &mut self,
        name: impl Into<String>,
        role: impl Into<String>,
        file_as: impl Into<String>,
    ) {
        self.contributors.push(Creator {
            name: name.into(),
            role: role.into(),
            file_as: file_as.into(),
        });
    }

    pub fn add_date(&mut self, date: impl Into<String>, event: impl Into<String>) {
        self.dates.push(DateEvent {
            date: date.into(),
            event: event.into(),
        });
    }

    /// 添加标识符
    pub fn add_identifier(
        &mut self,
        value: impl Into<String>,
        id: impl Into<String>,
        scheme: impl Into<String>,
    ) {
        self.identifiers.push(Identifier {
            value: value.into(),
            id: id.into(),
            scheme: scheme.into(),
        });
    }

    pub fn add_language(&mut self, language: impl Into<String>) {
        self.languages.push(language.into());
    }

    pub fn add_meta(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.metas.push(Meta {
            name: name.into(),
            content: content.into(),
        });
    }

    /// 获取第一个标题
    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(|title| title.text.as_str())
    }

    /// 获取第一个语言
    pub fn language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }

    /// 获取ISBN（第一个scheme为isbn的标识符，不区分大小写）
    pub fn get_isbn(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|identifier| identifier.scheme.eq_ignore_ascii_case("isbn"))
            .map(|identifier| identifier.value.as_str())
    }

    /// 根据元素ID查找标识符
    pub fn identifier_by_id(&self, id: &str) -> Option<&Identifier> {
        self.identifiers.iter().find(|identifier| identifier.id == id)
    }

    /// 根据name查找meta标签的content
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|meta| meta.name == name)
            .map(|meta| meta.content.as_str())
    }

    /// 从 `<metadata>` 元素构建
    ///
    /// 扫描全部后代元素并按本地名匹配，因此兼容把DC元素包在 `<dc-metadata>` 中的旧式写法。
    pub(crate) fn from_element(element: &Element) -> Self {
        let mut metadata = Metadata::new();

        for node in element.descendants() {
            let text = || node.text();
            match node.local_name() {
                "title" => metadata.add_title(text(), node.attr_or_empty("xml:lang")),
                "creator" => metadata.add_creator(
                    text(),
                    node.attr_or_empty("opf:role"),
                    node.attr_or_empty("opf:file-as"),
                ),
                "subject" => metadata.add_subject(text()),
                "description" => metadata.description = scalar(text()),
                "publisher" => metadata.publisher = scalar(text()),
                "contributor" => metadata.add_contributor(
                    text(),
                    node.attr_or_empty("opf:role"),
                    node.attr_or_empty("opf:file-as"),
                ),
                "date" => metadata.add_date(text(), node.attr_or_empty("opf:event")),
                "type" => metadata.dc_type = scalar(text()),
                "format" => metadata.format = scalar(text()),
                "identifier" => metadata.add_identifier(
                    text(),
                    node.attr_or_empty("id"),
                    node.attr_or_empty("opf:scheme"),
                ),
                "source" => metadata.source = scalar(text()),
                "language" => metadata.add_language(text()),
                "relation" => metadata.relation = scalar(text()),
                "coverage" => metadata.coverage = scalar(text()),
                "rights" => metadata.right = scalar(text()),
                "meta" => {
                    metadata.add_meta(node.attr_or_empty("name"), node.attr_or_empty("content"))
                }
                _ => {}
            }
        }

        metadata
    }

    /// 生成 `<metadata>` 元素，元素顺序固定，空值省略
    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("metadata")
            .with_attr("xmlns:dc", DC_NAMESPACE)
            .with_attr("xmlns:opf", super::OPF_NAMESPACE);

        for title in &self.titles {
            element.push_child(
                Element::new("dc:title")
                    .with_opt_attr("xml:lang", &title.lang)
                    .with_text(&title.text),
            );
        }
        for creator in &self.creators {
            element.push_child(creator_element("dc:creator", creator));
        }
        for subject in &self.subjects {
            element.push_child(Element::new("dc:subject").with_text(subject));
        }
        push_scalar(&mut element, "dc:description", &self.description);
        push_scalar(&mut element, "dc:publisher", &self.publisher);
        for contributor in &self.contributors {
            element.push_child(creator_element("dc:contributor", contributor));
        }
        for date in &self.dates {
            element.push_child(
                Element::new("dc:date")
                    .with_opt_attr("opf:event", &date.event)
                    .with_text(&date.date),
            );
        }
        push_scalar(&mut element, "dc:type", &self.dc_type);
        push_scalar(&mut element, "dc:format", &self.format);
        for identifier in &self.identifiers {
            element.push_child(
                Element::new("dc:identifier")
                    .with_opt_attr("id", &identifier.id)
                    .with_opt_attr("opf:scheme", &identifier.scheme)
                    .with_text(&identifier.value),
            );
        }
        push_scalar(&mut element, "dc:source", &self.source);
        for language in &self.languages {
            element.push_child(Element::new("dc:language").with_text(language));
        }
        push_scalar(&mut element, "dc:relation", &self.relation);
        push_scalar(&mut element, "dc:coverage", &self.coverage);
        push_scalar(&mut element, "dc:rights", &self.right);
        for meta in &self.metas {
            element.push_child(
                Element::new("meta")
                    .with_attr("name", &meta.name)
                    .with_attr("content", &meta.content),
            );
        }

        element
    }
}

fn creator_element(name: &str, creator: &Creator) -> Element {
    Element::new(name)
        .with_opt_attr("opf:role", &creator.role)
        .with_opt_attr("opf:file-as", &creator.file_as)
        .with_text(&creator.name)
}

/// 空白的单值元素视为未设置
fn scalar(text: String) -> Option<String> {
    Some(text).filter(|text| !text.is_empty())
}

fn push_scalar(parent: &mut Element, name: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        parent.push_child(Element::new(name).with_text(value));
    }
}
