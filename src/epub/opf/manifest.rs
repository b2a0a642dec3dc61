//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及按ID索引、保持插入顺序的清单存储。

use crate::epub::error::{EpubError, Result};
use crate::epub::xml::Element;
use std::collections::HashMap;

/// 能提供href的对象（清单项或直接的路径字符串）
pub trait HasHref {
    fn href(&self) -> &str;
}

/// 能提供清单ID的对象（清单项或直接的ID字符串）
pub trait HasIdentifier {
    fn identifier(&self) -> &str;
}

impl HasHref for str {
    fn href(&self) -> &str {
        self
    }
}

impl HasHref for String {
    fn href(&self) -> &str {
        self
    }
}

impl<T: HasHref + ?Sized> HasHref for &T {
    fn href(&self) -> &str {
        (**self).href()
    }
}

impl HasIdentifier for str {
    fn identifier(&self) -> &str {
        self
    }
}

impl HasIdentifier for String {
    fn identifier(&self) -> &str {
        self
    }
}

impl<T: HasIdentifier + ?Sized> HasIdentifier for &T {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}

/// 清单项信息
///
/// 可选属性以空字符串表示"未设置"，序列化时省略。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestItem {
    /// 项目ID
    pub identifier: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    pub fallback: String,
    pub required_namespace: String,
    pub required_modules: String,
    pub fallback_style: String,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(
        identifier: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            href: href.into(),
            media_type: media_type.into(),
            ..Self::default()
        }
    }

    /// 检查是否为NCX导航文件
    pub fn is_ncx(&self) -> bool {
        self.media_type == crate::epub::MIMETYPE_NCX
    }

    /// 检查是否为图片文件
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// 检查是否为CSS文件
    pub fn is_css(&self) -> bool {
        self.media_type == "text/css"
    }

    /// 检查是否为XHTML文件
    pub fn is_xhtml(&self) -> bool {
        self.media_type == "application/xhtml+xml"
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            identifier: element.attr_or_empty("id"),
            href: element.attr_or_empty("href"),
            media_type: element.attr_or_empty("media-type"),
            fallback: element.attr_or_empty("fallback"),
            required_namespace: element.attr_or_empty("required-namespace"),
            required_modules: element.attr_or_empty("required-modules"),
            fallback_style: element.attr_or_empty("fallback-style"),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        Element::new("item")
            .with_attr("id", &self.identifier)
            .with_attr("href", &self.href)
            .with_opt_attr("media-type", &self.media_type)
            .with_opt_attr("fallback", &self.fallback)
            .with_opt_attr("required-namespace", &self.required_namespace)
            .with_opt_attr("required-modules", &self.required_modules)
            .with_opt_attr("fallback-style", &self.fallback_style)
    }
}

impl HasHref for ManifestItem {
    fn href(&self) -> &str {
        &self.href
    }
}

impl HasIdentifier for ManifestItem {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// 清单
///
/// 以ID为键、保持插入顺序的清单项集合。键必须等于清单项自身的ID。
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for Manifest {}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 `identifier` 为键插入清单项
    ///
    /// 键与 `item.identifier` 不一致时返回 [`EpubError::ManifestKeyMismatch`]。
    /// 已存在相同ID时原位替换，保持原有顺序。
    pub fn insert(&mut self, identifier: &str, item: ManifestItem) -> Result<()> {
        if item.identifier != identifier {
            return Err(EpubError::ManifestKeyMismatch {
                key: identifier.to_string(),
                identifier: item.identifier,
            });
        }

        match self.index.get(identifier) {
            Some(&position) => self.items[position] = item,
            None => {
                self.index.insert(identifier.to_string(), self.items.len());
                self.items.push(item);
            }
        }
        Ok(())
    }

    /// 以清单项自身的ID为键插入
    pub fn append(&mut self, item: ManifestItem) {
        let position = self.index.get(&item.identifier).copied();
        match position {
            Some(position) => self.items[position] = item,
            None => {
                self.index.insert(item.identifier.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// 创建并插入清单项
    pub fn add_item(
        &mut self,
        identifier: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) {
        self.append(ManifestItem::new(identifier, href, media_type));
    }

    /// 根据ID获取清单项
    pub fn get(&self, identifier: &str) -> Option<&ManifestItem> {
        self.index.get(identifier).map(|&position| &self.items[position])
    }

    /// 根据href获取清单项
    ///
    /// 多个清单项共享同一href时返回 [`EpubError::AmbiguousHref`]。
    pub fn get_by_href(&self, href: &str) -> Result<Option<&ManifestItem>> {
        let mut matches = self.items.iter().filter(|item| item.href == href);
        let first = matches.next();
        let others = matches.count();

        if others > 0 {
            return Err(EpubError::AmbiguousHref {
                href: href.to_string(),
                count: others + 1,
            });
        }
        Ok(first)
    }

    /// 是否包含指定ID（可以传入ID字符串或清单项）
    pub fn contains<I: HasIdentifier + ?Sized>(&self, item: &I) -> bool {
        self.index.contains_key(item.identifier())
    }

    /// 移除并返回清单项
    pub fn remove(&mut self, identifier: &str) -> Option<ManifestItem> {
        let position = self.index.remove(identifier)?;
        let item = self.items.remove(position);
        for value in self.index.values_mut() {
            if *value > position {
                *value -= 1;
            }
        }
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按插入顺序遍历清单项
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    /// 按插入顺序遍历 (ID, 清单项)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestItem)> {
        self.items.iter().map(|item| (item.identifier.as_str(), item))
    }

    /// 所有图片清单项
    pub fn images(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter().filter(|item| item.is_image())
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        let mut manifest = Manifest::new();
        for child in element.child_elements() {
            if child.local_name() == "item" {
                let item = ManifestItem::from_element(child);
                if manifest.contains(&item) {
                    tracing::warn!(id = %item.identifier, "清单中存在重复的item id，后者覆盖前者");
                }
                manifest.append(item);
            } else {
                tracing::debug!(tag = %child.name, "忽略manifest中的非item元素");
            }
        }
        manifest
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("manifest");
        for item in &self.items {
            element.push_child(item.to_element());
        }
        element
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestItem;
    type IntoIter = std::slice::Iter<'a, ManifestItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
