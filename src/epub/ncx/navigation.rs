//! NCX导航元素数据结构定义
//!
//! 定义NCX文件中的各种导航元素，包括导航地图与导航点、页面列表、辅助导航列表，
//! 以及它们与XML元素之间的映射。

use crate::epub::xml::Element;

/// 导航标签或导航说明（`navLabel` / `navInfo`）
///
/// `lang` 与 `dir` 为空字符串时表示未设置，序列化时省略。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Label {
    /// 标签文本
    pub text: String,
    pub lang: String,
    /// 书写方向（ltr/rtl）
    pub dir: String,
}

impl Label {
    /// 创建新的导航标签
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    fn from_element(element: &Element) -> Self {
        Self {
            text: text_of(element, "text"),
            lang: element.attr_or_empty("xml:lang"),
            dir: element.attr_or_empty("dir"),
        }
    }

    fn to_element(&self, tag: &str) -> Element {
        Element::new(tag)
            .with_opt_attr("xml:lang", &self.lang)
            .with_opt_attr("dir", &self.dir)
            .with_child(Element::new("text").with_text(&self.text))
    }
}

/// 第一个名为 `name` 的后代元素的文本，去除首尾空白；找不到时为空字符串
pub fn text_of(element: &Element, name: &str) -> String {
    element
        .find_descendant(name)
        .map(Element::text)
        .unwrap_or_default()
}

fn labels_of(element: &Element, tag: &str) -> Vec<Label> {
    element.children_named(tag).map(Label::from_element).collect()
}

fn push_labels(element: &mut Element, tag: &str, labels: &[Label]) {
    for label in labels {
        element.push_child(label.to_element(tag));
    }
}

fn content_src(element: &Element) -> Option<String> {
    element
        .children_named("content")
        .next()
        .and_then(|content| content.attr_opt("src"))
}

fn push_content(element: &mut Element, src: &Option<String>) {
    if let Some(src) = src.as_deref().filter(|src| !src.is_empty()) {
        element.push_child(Element::new("content").with_attr("src", src));
    }
}

/// 导航点
///
/// 每个导航点独占其子导航点，嵌套深度不限。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavPoint {
    /// 唯一标识符
    pub id: Option<String>,
    /// CSS类名
    pub class_name: Option<String>,
    /// 播放顺序
    pub play_order: Option<String>,
    /// 导航标签
    pub labels: Vec<Label>,
    /// 内容引用
    pub src: Option<String>,
    /// 子导航点
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    /// 创建新的导航点
    pub fn new(id: impl Into<String>, label: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            labels: vec![Label::new(label)],
            src: Some(src.into()),
            ..Self::default()
        }
    }

    /// 添加子导航点
    pub fn add_child(&mut self, child: NavPoint) {
        self.children.push(child);
    }

    /// 第一个标签的文本
    pub fn label(&self) -> &str {
        self.labels.first().map(|label| label.text.as_str()).unwrap_or_default()
    }

    /// 获取所有导航点（包括自身与子导航点）的深度优先平铺列表
    pub fn get_all_nav_points(&self) -> Vec<&NavPoint> {
        let mut points = vec![self];
        for child in &self.children {
            points.extend(child.get_all_nav_points());
        }
        points
    }

    /// 获取导航深度（没有子导航点时为1）
    pub fn get_depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NavPoint::get_depth)
            .max()
            .unwrap_or(0)
    }

    fn assign_play_order(&mut self, next: usize) -> usize {
        self.play_order = Some(next.to_string());
        let mut next = next + 1;
        for child in &mut self.children {
            next = child.assign_play_order(next);
        }
        next
    }

    fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            class_name: element.attr_opt("class"),
            play_order: element.attr_opt("playOrder"),
            labels: labels_of(element, "navLabel"),
            src: content_src(element),
            children: element
                .children_named("navPoint")
                .map(NavPoint::from_element)
                .collect(),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("navPoint")
            .with_maybe_attr("id", self.id.as_deref())
            .with_maybe_attr("class", self.class_name.as_deref())
            .with_maybe_attr("playOrder", self.play_order.as_deref());

        push_labels(&mut element, "navLabel", &self.labels);
        push_content(&mut element, &self.src);
        for child in &self.children {
            element.push_child(child.to_element());
        }
        element
    }
}

/// 导航地图
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavMap {
    pub id: Option<String>,
    /// 地图级别的导航标签
    pub labels: Vec<Label>,
    pub infos: Vec<Label>,
    /// 顶层导航点
    pub children: Vec<NavPoint>,
}

impl NavMap {
    /// 创建新的导航地图
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加顶层导航点
    pub fn add_point(&mut self, point: NavPoint) {
        self.children.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 获取所有导航点的深度优先平铺列表
    pub fn get_all_nav_points(&self) -> Vec<&NavPoint> {
        self.children
            .iter()
            .flat_map(NavPoint::get_all_nav_points)
            .collect()
    }

    /// 获取导航深度（空地图为0）
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(NavPoint::get_depth)
            .max()
            .unwrap_or(0)
    }

    /// 按深度优先顺序为所有导航点重新编号playOrder
    ///
    /// # 参数
    /// * `start` - 第一个导航点的编号
    ///
    /// # 返回值
    /// * `usize` - 下一个可用的编号
    pub fn assign_play_order(&mut self, start: usize) -> usize {
        let mut next = start;
        for point in &mut self.children {
            next = point.assign_play_order(next);
        }
        next
    }

    /// 根据ID查找导航点
    pub fn find_nav_point_by_id(&self, id: &str) -> Option<&NavPoint> {
        self.get_all_nav_points()
            .into_iter()
            .find(|point| point.id.as_deref() == Some(id))
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            labels: labels_of(element, "navLabel"),
            infos: labels_of(element, "navInfo"),
            children: element
                .children_named("navPoint")
                .map(NavPoint::from_element)
                .collect(),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("navMap").with_maybe_attr("id", self.id.as_deref());
        push_labels(&mut element, "navLabel", &self.labels);
        push_labels(&mut element, "navInfo", &self.infos);
        for point in &self.children {
            element.push_child(point.to_element());
        }
        element
    }
}

/// 页面目标
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageTarget {
    /// 唯一标识符
    pub id: Option<String>,
    /// 页面值
    pub value: Option<String>,
    /// 页面类型（normal, front, special）
    pub target_type: Option<String>,
    pub class_name: Option<String>,
    /// 播放顺序
    pub play_order: Option<String>,
    /// 导航标签
    pub labels: Vec<Label>,
    /// 内容引用
    pub src: Option<String>,
}

impl PageTarget {
    fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            value: element.attr_opt("value"),
            target_type: element.attr_opt("type"),
            class_name: element.attr_opt("class"),
            play_order: element.attr_opt("playOrder"),
            labels: labels_of(element, "navLabel"),
            src: content_src(element),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("pageTarget")
            .with_maybe_attr("id", self.id.as_deref())
            .with_maybe_attr("value", self.value.as_deref())
            .with_maybe_attr("type", self.target_type.as_deref())
            .with_maybe_attr("class", self.class_name.as_deref())
            .with_maybe_attr("playOrder", self.play_order.as_deref());
        push_labels(&mut element, "navLabel", &self.labels);
        push_content(&mut element, &self.src);
        element
    }
}

/// 页面列表
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageList {
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub labels: Vec<Label>,
    pub infos: Vec<Label>,
    /// 页面目标列表
    pub targets: Vec<PageTarget>,
}

impl PageList {
    /// 创建新的页面列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加页面目标
    pub fn add_target(&mut self, target: PageTarget) {
        self.targets.push(target);
    }

    /// 根据页面值查找页面目标
    pub fn find_page_target_by_value(&self, value: &str) -> Option<&PageTarget> {
        self.targets
            .iter()
            .find(|target| target.value.as_deref() == Some(value))
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            class_name: element.attr_opt("class"),
            labels: labels_of(element, "navLabel"),
            infos: labels_of(element, "navInfo"),
            targets: element
                .children_named("pageTarget")
                .map(PageTarget::from_element)
                .collect(),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("pageList")
            .with_maybe_attr("id", self.id.as_deref())
            .with_maybe_attr("class", self.class_name.as_deref());
        push_labels(&mut element, "navLabel", &self.labels);
        push_labels(&mut element, "navInfo", &self.infos);
        for target in &self.targets {
            element.push_child(target.to_element());
        }
        element
    }
}

/// 辅助导航目标
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavTarget {
    pub id: Option<String>,
    pub value: Option<String>,
    pub class_name: Option<String>,
    pub play_order: Option<String>,
    pub labels: Vec<Label>,
    pub src: Option<String>,
}

impl NavTarget {
    fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            value: element.attr_opt("value"),
            class_name: element.attr_opt("class"),
            play_order: element.attr_opt("playOrder"),
            labels: labels_of(element, "navLabel"),
            src: content_src(element),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("navTarget")
            .with_maybe_attr("id", self.id.as_deref())
            .with_maybe_attr("value", self.value.as_deref())
            .with_maybe_attr("class", self.class_name.as_deref())
            .with_maybe_attr("playOrder", self.play_order.as_deref());
        push_labels(&mut element, "navLabel", &self.labels);
        push_content(&mut element, &self.src);
        element
    }
}

/// 辅助导航列表（插图列表、表格列表等），一个NCX中可以有多个
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavList {
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub labels: Vec<Label>,
    pub infos: Vec<Label>,
    pub targets: Vec<NavTarget>,
}

impl NavList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: NavTarget) {
        self.targets.push(target);
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            id: element.attr_opt("id"),
            class_name: element.attr_opt("class"),
            labels: labels_of(element, "navLabel"),
            infos: labels_of(element, "navInfo"),
            targets: element
                .children_named("navTarget")
                .map(NavTarget::from_element)
                .collect(),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("navList")
            .with_maybe_attr("id", self.id.as_deref())
            .with_maybe_attr("class", self.class_name.as_deref());
        push_labels(&mut element, "navLabel", &self.labels);
        push_labels(&mut element, "navInfo", &self.infos);
        for target in &self.targets {
            element.push_child(target.to_element());
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::xml::parse_document;

    fn sample_map() -> NavMap {
        let mut first = NavPoint::new("p1", "Chapter 1", "ch1.xhtml");
        first.add_child(NavPoint::new("p1-1", "Section 1.1", "ch1.xhtml#s1"));
        let mut section = NavPoint::new("p1-2", "Section 1.2", "ch1.xhtml#s2");
        section.add_child(NavPoint::new("p1-2-1", "Detail", "ch1.xhtml#d"));
        first.add_child(section);

        let mut map = NavMap::new();
        map.add_point(first);
        map.add_point(NavPoint::new("p2", "Chapter 2", "ch2.xhtml"));
        map
    }

    #[test]
    fn test_depth_and_flatten() {
        let map = sample_map();
        assert_eq!(map.depth(), 3);
        assert_eq!(NavMap::new().depth(), 0);

        let ids: Vec<&str> = map
            .get_all_nav_points()
            .iter()
            .filter_map(|p| p.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["p1", "p1-1", "p1-2", "p1-2-1", "p2"]);
        assert_eq!(map.find_nav_point_by_id("p1-2-1").unwrap().label(), "Detail");
        assert!(map.find_nav_point_by_id("p3").is_none());
    }

    #[test]
    fn test_assign_play_order_depth_first() {
        let mut map = sample_map();
        assert_eq!(map.assign_play_order(1), 6);

        let orders: Vec<&str> = map
            .get_all_nav_points()
            .iter()
            .filter_map(|p| p.play_order.as_deref())
            .collect();
        assert_eq!(orders, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_labels_only_from_direct_children() {
        let xml = r#"<navMap id="map">
            <navLabel xml:lang="fr" dir="ltr"><text> Table </text></navLabel>
            <navInfo><text>Info</text></navInfo>
            <navPoint id="p1" playOrder="1">
                <navLabel><text>One</text></navLabel>
                <content src="one.xhtml"/>
            </navPoint>
        </navMap>"#;

        let map = NavMap::from_element(&parse_document(xml, "ncx").unwrap());
        assert_eq!(map.id.as_deref(), Some("map"));
        assert_eq!(map.labels, vec![Label::new("Table").with_lang("fr").with_dir("ltr")]);
        assert_eq!(map.infos, vec![Label::new("Info")]);
        assert_eq!(map.children.len(), 1);
        assert_eq!(map.children[0].src.as_deref(), Some("one.xhtml"));
        assert_eq!(map.children[0].play_order.as_deref(), Some("1"));
    }

    #[test]
    fn test_text_of_missing_tag() {
        let element = parse_document("<navLabel/>", "ncx").unwrap();
        assert_eq!(text_of(&element, "text"), "");
    }

    #[test]
    fn test_page_target_element() {
        let target = PageTarget {
            id: Some("page1".to_string()),
            value: Some("1".to_string()),
            target_type: Some("normal".to_string()),
            play_order: Some("7".to_string()),
            labels: vec![Label::new("1")],
            src: Some("ch1.xhtml#page1".to_string()),
            ..PageTarget::default()
        };

        let element = target.to_element();
        let keys: Vec<&str> = element.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "value", "type", "playOrder"]);
        assert_eq!(PageTarget::from_element(&element), target);
    }
}
