pub mod archive;
pub mod book;
pub mod config;
pub mod container;
pub mod error;
pub mod ncx;
pub mod opf;
pub mod xml;

/// EPUB压缩包mimetype条目的内容
pub const MIMETYPE_EPUB: &str = "application/epub+zip";

/// NCX文档的媒体类型
pub const MIMETYPE_NCX: &str = "application/x-dtbncx+xml";

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出容器相关
pub use archive::{Container, Epub, OpenMode};
pub use config::{Compression, EpubConfig};
pub use container::{ContainerXml, RootFile};

// 重新导出书籍视图
pub use book::{Book, BookChapter};

// 重新导出OPF相关
pub use opf::{
    Creator, DateEvent, Guide, GuideReference, HasHref, HasIdentifier, Identifier, Manifest,
    ManifestItem, Meta, Metadata, Opf, Spine, SpineItem, Title,
};

// 重新导出NCX相关
pub use ncx::{
    Label, NavList, NavMap, NavPoint, NavTarget, Ncx, PageList, PageTarget, TocStatistics,
    TocTree, TocTreeNode, TocTreeStyle,
};
