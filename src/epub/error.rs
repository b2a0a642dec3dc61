use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    /// zip 容器本身损坏或条目不存在，原样向上传递
    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// 必需的XML结构缺失（OPF缺少metadata/manifest/spine，NCX缺少docTitle/navMap等）
    #[error("文档格式错误 ({document}): {reason}")]
    MalformedDocument {
        document: &'static str,
        reason: String,
    },

    #[error("多个清单项共享同一个href: {href} (共 {count} 项)")]
    AmbiguousHref { href: String, count: usize },

    #[error("清单键与清单项ID不一致: 键 {key}, 清单项ID {identifier}")]
    ManifestKeyMismatch { key: String, identifier: String },

    #[error("EPUB以只读模式打开，无法写入")]
    WriteOnReadOnly,

    #[error("EPUB已关闭")]
    UseAfterClose,

    #[error("缺少mimetype文件")]
    MissingMimetype,

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}

impl EpubError {
    pub(crate) fn malformed(document: &'static str, reason: impl Into<String>) -> Self {
        EpubError::MalformedDocument {
            document,
            reason: reason.into(),
        }
    }
}
