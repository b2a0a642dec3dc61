pub mod epub;

// === 核心API重新导出 ===

/// EPUB容器（主要接口）
pub use epub::{Container, Epub, OpenMode};

/// 错误处理
pub use epub::{EpubError, Result};

/// 配置
pub use epub::{Compression, EpubConfig};

/// 书籍视图
pub use epub::{Book, BookChapter};

// === 底层组件（高级用法） ===

/// container.xml组件
pub use epub::{ContainerXml, RootFile};

/// OPF组件
pub use epub::{
    Creator, DateEvent, Guide, GuideReference, HasHref, HasIdentifier, Identifier, Manifest,
    ManifestItem, Meta, Metadata, Opf, Spine, SpineItem, Title,
};

/// NCX组件
pub use epub::{
    Label, NavList, NavMap, NavPoint, NavTarget, Ncx, PageList, PageTarget, TocStatistics,
    TocTree, TocTreeNode, TocTreeStyle,
};

// === 库信息 ===

/// EpubForge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// EpubForge库的描述
pub const DESCRIPTION: &str = "EPUB 2.0.1 文件的读取、修改与写回";

// === 便捷函数 ===

/// 快速打开EPUB文件
///
/// 这是 `Epub::open` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
/// * `mode` - 打开模式
///
/// # 返回值
/// * `Result<Epub>` - EPUB实例
///
/// # 示例
///
/// ```no_run
/// use epubforge::OpenMode;
///
/// let mut epub = epubforge::open("book.epub", OpenMode::Read)?;
/// if let Some(title) = epub.opf.metadata.title() {
///     println!("书名: {}", title);
/// }
/// epub.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P, mode: OpenMode) -> Result<Epub> {
    Epub::open(path, mode)
}

/// 使用指定配置打开EPUB文件
pub fn open_with_config<P: AsRef<std::path::Path>>(
    path: P,
    mode: OpenMode,
    config: EpubConfig,
) -> Result<Epub> {
    Epub::open_with_config(path, mode, config)
}
