use crate::epub::error::{EpubError, Result};
use crate::epub::xml::{self, Element};

/// container.xml在压缩包中的路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// OPF包文件的rootfile媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

const CONTAINER_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

const DOCUMENT: &str = "container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerXml {
    pub rootfiles: Vec<RootFile>,
}

impl ContainerXml {
    /// 只包含一个OPF rootfile的container.xml
    pub fn for_opf(opf_path: &str) -> Self {
        Self {
            rootfiles: vec![RootFile {
                full_path: opf_path.to_string(),
                media_type: OPF_MEDIA_TYPE.to_string(),
            }],
        }
    }

    /// 解析container.xml内容
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<ContainerXml>` - 解析后的Container信息
    pub fn parse_xml(xml_content: &str) -> Result<ContainerXml> {
        let root = xml::parse_document(xml_content, DOCUMENT)?;

        let rootfiles: Vec<RootFile> = root
            .descendants()
            .into_iter()
            .filter(|element| element.local_name() == "rootfile")
            .filter_map(|element| {
                let full_path = element.attr_opt("full-path")?;
                Some(RootFile {
                    full_path,
                    media_type: element.attr_or_empty("media-type"),
                })
            })
            .collect();

        if rootfiles.is_empty() {
            return Err(EpubError::malformed(DOCUMENT, "没有找到任何rootfile条目"));
        }

        Ok(ContainerXml { rootfiles })
    }

    /// 获取OPF文件路径
    ///
    /// 只认第一个媒体类型为 `application/oebps-package+xml` 的rootfile。
    pub fn get_opf_path(&self) -> Result<&str> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .map(|rootfile| rootfile.full_path.as_str())
            .ok_or_else(|| EpubError::malformed(DOCUMENT, "没有找到OPF类型的rootfile"))
    }

    /// 序列化为container.xml文档
    pub fn to_xml(&self, indent: usize) -> Result<Vec<u8>> {
        let mut rootfiles = Element::new("rootfiles");
        for rootfile in &self.rootfiles {
            rootfiles.push_child(
                Element::new("rootfile")
                    .with_attr("full-path", &rootfile.full_path)
                    .with_attr("media-type", &rootfile.media_type),
            );
        }

        let container = Element::new("container")
            .with_attr("version", "1.0")
            .with_attr("xmlns", CONTAINER_NAMESPACE)
            .with_child(rootfiles);
        xml::write_document(&container, indent)
    }
}
