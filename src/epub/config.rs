//! EPUB读写配置模块
//!
//! 提供新建EPUB时使用的默认路径、序列化缩进、压缩方式等配置，支持从YAML文件加载。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zip::CompressionMethod;

/// 内容条目的压缩方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// 不压缩
    Stored,
    /// Deflate压缩
    Deflated,
}

impl Compression {
    pub(crate) fn method(self) -> CompressionMethod {
        match self {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// EPUB读写配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    /// 新建EPUB时OPF文件在压缩包中的路径
    pub opf_path: String,
    /// 新建EPUB时NCX清单项的ID
    pub ncx_id: String,
    /// 新建EPUB时NCX清单项的href（相对于OPF目录）
    pub ncx_href: String,
    /// 新建EPUB时唯一标识符的ID
    pub uid_id: String,
    /// 序列化OPF/NCX/container.xml时每层缩进的空格数，0表示紧凑输出
    pub indent: usize,
    /// 内容条目与元数据文档的压缩方式（mimetype始终不压缩）
    pub compression: Compression,
    /// 读取时是否严格校验mimetype条目
    pub strict_mimetype: bool,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            opf_path: "OEBPS/content.opf".to_string(),
            ncx_id: "ncx".to_string(),
            ncx_href: "toc.ncx".to_string(),
            uid_id: "BookId".to_string(),
            indent: 4,
            compression: Compression::Deflated,
            strict_mimetype: false,
        }
    }
}

impl EpubConfig {
    /// 从YAML配置文件加载
    ///
    /// 文件中缺失的字段使用默认值。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 将默认配置写入指定路径
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# EPUB读写配置文件\n# 定义新建EPUB时的默认路径、序列化缩进与压缩方式\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 尝试从配置文件加载，文件不存在时返回默认配置
    ///
    /// 文件存在但格式错误时仍然返回错误。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "配置文件不存在，使用默认配置");
            Ok(Self::default())
        }
    }

    /// 新建EPUB时NCX文件在压缩包中的完整路径
    pub fn ncx_path(&self) -> String {
        crate::epub::archive::join_content_path(&parent_dir(&self.opf_path), &self.ncx_href)
    }
}

/// 压缩包内路径的父目录（`OEBPS/content.opf` → `OEBPS`，`content.opf` → 空）
pub(crate) fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}
