//! 书籍视图模块
//!
//! 在 `Epub` 之上提供更简单的只读视图：元数据直通访问，以及按脊柱顺序排列的章节。

use crate::epub::archive::Epub;
use crate::epub::error::Result;
use crate::epub::opf::{Creator, DateEvent, Identifier, ManifestItem, Meta, Metadata, Title};

/// 脊柱中的一个章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookChapter {
    item: ManifestItem,
    linear: bool,
}

impl BookChapter {
    /// 章节对应的清单项ID
    pub fn identifier(&self) -> &str {
        &self.item.identifier
    }

    pub fn href(&self) -> &str {
        &self.item.href
    }

    pub fn manifest_item(&self) -> &ManifestItem {
        &self.item
    }

    pub fn is_linear(&self) -> bool {
        self.linear
    }

    /// 读取章节的原始字节
    pub fn read(&self, epub: &mut Epub) -> Result<Vec<u8>> {
        epub.read_item(&self.item)
    }
}

/// EPUB的书籍视图
pub struct Book<'a> {
    epub: &'a mut Epub,
}

impl<'a> Book<'a> {
    pub fn new(epub: &'a mut Epub) -> Self {
        Self { epub }
    }

    fn metadata(&self) -> &Metadata {
        &self.epub.opf.metadata
    }

    pub fn titles(&self) -> &[Title] {
        &self.metadata().titles
    }

    pub fn creators(&self) -> &[Creator] {
        &self.metadata().creators
    }

    pub fn contributors(&self) -> &[Creator] {
        &self.metadata().contributors
    }

    pub fn subjects(&self) -> &[String] {
        &self.metadata().subjects
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata().description.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.metadata().publisher.as_deref()
    }

    pub fn dates(&self) -> &[DateEvent] {
        &self.metadata().dates
    }

    pub fn dc_type(&self) -> Option<&str> {
        self.metadata().dc_type.as_deref()
    }

    pub fn dc_format(&self) -> Option<&str> {
        self.metadata().format.as_deref()
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.metadata().identifiers
    }

    pub fn isbn(&self) -> Option<&str> {
        self.metadata().get_isbn()
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata().source.as_deref()
    }

    pub fn languages(&self) -> &[String] {
        &self.metadata().languages
    }

    pub fn relation(&self) -> Option<&str> {
        self.metadata().relation.as_deref()
    }

    pub fn coverage(&self) -> Option<&str> {
        self.metadata().coverage.as_deref()
    }

    pub fn right(&self) -> Option<&str> {
        self.metadata().right.as_deref()
    }

    pub fn metas(&self) -> &[Meta] {
        &self.metadata().metas
    }

    /// 线性章节（按脊柱顺序）
    pub fn chapters(&self) -> Vec<BookChapter> {
        self.collect_chapters(true)
    }

    /// 非线性章节（注释、附录等）
    pub fn extra_chapters(&self) -> Vec<BookChapter> {
        self.collect_chapters(false)
    }

    fn collect_chapters(&self, linear: bool) -> Vec<BookChapter> {
        let opf = &self.epub.opf;
        let items = if linear {
            opf.chapter_items()
        } else {
            opf.extra_chapter_items()
        };
        items
            .into_iter()
            .map(|item| BookChapter {
                item: item.clone(),
                linear,
            })
            .collect()
    }

    /// 读取章节内容
    pub fn read(&mut self, chapter: &BookChapter) -> Result<Vec<u8>> {
        chapter.read(self.epub)
    }
}
