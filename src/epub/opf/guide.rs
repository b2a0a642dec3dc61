//! 指南模块
//!
//! `<guide>` 中的引用与清单相互独立，只按顺序保存。

use crate::epub::xml::Element;

/// 指南引用
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuideReference {
    pub href: String,
    /// 引用类型(如cover、toc、text)
    pub reference_type: String,
    pub title: String,
}

/// 指南
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Guide {
    pub references: Vec<GuideReference>,
}

impl Guide {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加引用
    pub fn add_reference(
        &mut self,
        href: impl Into<String>,
        reference_type: impl Into<String>,
        title: impl Into<String>,
    ) {
        self.references.push(GuideReference {
            href: href.into(),
            reference_type: reference_type.into(),
            title: title.into(),
        });
    }

    /// 查找指定类型的第一个引用
    pub fn find(&self, reference_type: &str) -> Option<&GuideReference> {
        self.references
            .iter()
            .find(|reference| reference.reference_type == reference_type)
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        let references = element
            .children_named("reference")
            .map(|reference| GuideReference {
                href: reference.attr_or_empty("href"),
                reference_type: reference.attr_or_empty("type"),
                title: reference.attr_or_empty("title"),
            })
            .collect();
        Self { references }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("guide");
        for reference in &self.references {
            element.push_child(
                Element::new("reference")
                    .with_opt_attr("type", &reference.reference_type)
                    .with_opt_attr("title", &reference.title)
                    .with_attr("href", &reference.href),
            );
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_element() {
        let mut guide = Guide::new();
        guide.add_reference("cover.xhtml", "cover", "Cover");
        guide.add_reference("toc.xhtml", "toc", "");

        let element = guide.to_element();
        let keys: Vec<Vec<&str>> = element
            .child_elements()
            .map(|e| e.attributes.iter().map(|(k, _)| k.as_str()).collect())
            .collect();
        assert_eq!(keys, vec![vec!["type", "title", "href"], vec!["type", "href"]]);

        let parsed = Guide::from_element(&element);
        assert_eq!(parsed, guide);
        assert_eq!(parsed.find("toc").unwrap().href, "toc.xhtml");
        assert!(parsed.find("text").is_none());
    }
}
