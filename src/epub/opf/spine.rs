//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。

use crate::epub::xml::Element;

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读
    pub linear: bool,
}

impl SpineItem {
    /// 创建指定线性属性的脊柱项
    pub fn new(idref: impl Into<String>, linear: bool) -> Self {
        Self {
            idref: idref.into(),
            linear,
        }
    }

    /// 检查是否为线性阅读
    pub fn is_linear(&self) -> bool {
        self.linear
    }
}

/// 脊柱
///
/// `toc` 为NCX清单项的ID；`itemrefs` 中的idref在查找时才解析，不做提前校验。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Spine {
    pub toc: String,
    pub itemrefs: Vec<SpineItem>,
}

impl Spine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加脊柱项
    pub fn add_itemref(&mut self, idref: impl Into<String>, linear: bool) {
        self.itemrefs.push(SpineItem::new(idref, linear));
    }

    pub fn len(&self) -> usize {
        self.itemrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemrefs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpineItem> {
        self.itemrefs.iter()
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        let itemrefs = element
            .children_named("itemref")
            .map(|itemref| {
                let linear = itemref
                    .attr("linear")
                    .is_none_or(|value| value.to_lowercase() != "no");
                SpineItem::new(itemref.attr_or_empty("idref"), linear)
            })
            .collect();

        Self {
            toc: element.attr_or_empty("toc"),
            itemrefs,
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("spine").with_opt_attr("toc", &self.toc);
        for itemref in &self.itemrefs {
            let mut child = Element::new("itemref").with_attr("idref", &itemref.idref);
            if !itemref.linear {
                child = child.with_attr("linear", "no");
            }
            element.push_child(child);
        }
        element
    }
}
