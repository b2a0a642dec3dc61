//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）包文件与内存模型之间的双向映射。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    guide::Guide,
    manifest::{Manifest, ManifestItem},
    metadata::{Identifier, Metadata},
    spine::Spine,
};
use crate::epub::xml::{self, Element};

/// OPF命名空间
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";

/// 默认的包版本
pub const OPF_VERSION: &str = "2.0";

const DOCUMENT: &str = "opf";

/// OPF文件解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opf {
    /// `package/@unique-identifier`，指向 `metadata.identifiers` 中某一项的id
    pub uid_id: String,
    /// EPUB版本
    pub version: String,
    pub xmlns: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(文件列表)
    pub manifest: Manifest,
    /// 脊柱(阅读顺序)
    pub spine: Spine,
    pub guide: Guide,
}

impl Default for Opf {
    fn default() -> Self {
        Self {
            uid_id: String::new(),
            version: OPF_VERSION.to_string(),
            xmlns: OPF_NAMESPACE.to_string(),
            metadata: Metadata::new(),
            manifest: Manifest::new(),
            spine: Spine::new(),
            guide: Guide::new(),
        }
    }
}

impl Opf {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Opf>` - 解析后的OPF信息；缺少metadata、manifest或spine时返回
    ///   [`EpubError::MalformedDocument`]
    pub fn parse_xml(xml_content: &str) -> Result<Opf> {
        let package = xml::parse_document(xml_content, DOCUMENT)?;
        Self::from_element(&package)
    }

    /// 从 `<package>` 元素构建
    pub fn from_element(package: &Element) -> Result<Opf> {
        if package.local_name() != "package" {
            return Err(EpubError::malformed(
                DOCUMENT,
                format!("根元素应为 <package>，实际为 <{}>", package.name),
            ));
        }

        let section = |name: &str| {
            package
                .child_elements()
                .find(|child| child.local_name().to_lowercase() == name)
        };
        let required = |name: &'static str| {
            section(name)
                .ok_or_else(|| EpubError::malformed(DOCUMENT, format!("缺少 <{}> 元素", name)))
        };

        let metadata = Metadata::from_element(required("metadata")?);
        let manifest = Manifest::from_element(required("manifest")?);
        let spine = Spine::from_element(required("spine")?);
        let guide = section("guide").map(Guide::from_element).unwrap_or_default();

        Ok(Opf {
            uid_id: package.attr_or_empty("unique-identifier"),
            version: package
                .attr_opt("version")
                .unwrap_or_else(|| OPF_VERSION.to_string()),
            xmlns: package
                .attr_opt("xmlns")
                .unwrap_or_else(|| OPF_NAMESPACE.to_string()),
            metadata,
            manifest,
            spine,
            guide,
        })
    }

    /// 生成 `<package>` 元素树
    pub fn to_element(&self) -> Element {
        let mut package = Element::new("package")
            .with_opt_attr("xmlns", &self.xmlns)
            .with_opt_attr("unique-identifier", &self.uid_id)
            .with_opt_attr("version", &self.version)
            .with_child(self.metadata.to_element())
            .with_child(self.manifest.to_element())
            .with_child(self.spine.to_element());

        if !self.guide.is_empty() {
            package.push_child(self.guide.to_element());
        }
        package
    }

    /// 序列化为OPF文档
    ///
    /// # 参数
    /// * `indent` - 每层缩进的空格数，0表示紧凑输出
    pub fn to_xml(&self, indent: usize) -> Result<Vec<u8>> {
        xml::write_document(&self.to_element(), indent)
    }

    /// 规范标识符：id等于 `uid_id` 的唯一一个标识符
    ///
    /// 没有或有多个匹配项时返回 [`EpubError::MalformedDocument`]。
    pub fn uid(&self) -> Result<&Identifier> {
        let mut matches = self
            .metadata
            .identifiers
            .iter()
            .filter(|identifier| identifier.id == self.uid_id);

        match (matches.next(), matches.next()) {
            (Some(identifier), None) => Ok(identifier),
            (None, _) => Err(EpubError::malformed(
                DOCUMENT,
                format!("unique-identifier \"{}\" 没有对应的dc:identifier", self.uid_id),
            )),
            (Some(_), Some(_)) => Err(EpubError::malformed(
                DOCUMENT,
                format!("unique-identifier \"{}\" 对应多个dc:identifier", self.uid_id),
            )),
        }
    }

    /// 脊柱 `toc` 引用的NCX清单项
    pub fn toc_item(&self) -> Option<&ManifestItem> {
        self.manifest.get(&self.spine.toc)
    }

    /// 获取所有章节清单项(按阅读顺序，仅线性项)
    ///
    /// 无法在清单中解析的idref被跳过。
    pub fn chapter_items(&self) -> Vec<&ManifestItem> {
        self.spine_items(true)
    }

    /// 获取非线性的脊柱清单项
    pub fn extra_chapter_items(&self) -> Vec<&ManifestItem> {
        self.spine_items(false)
    }

    fn spine_items(&self, linear: bool) -> Vec<&ManifestItem> {
        self.spine
            .iter()
            .filter(|itemref| itemref.linear == linear)
            .filter_map(|itemref| {
                let item = self.manifest.get(&itemref.idref);
                if item.is_none() {
                    tracing::debug!(idref = %itemref.idref, "脊柱引用的清单项不存在");
                }
                item
            })
            .collect()
    }
}
