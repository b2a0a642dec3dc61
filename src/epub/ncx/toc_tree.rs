//! 目录树（Table of Contents Tree）模块
//!
//! 提供NCX导航地图的树形文本表示和统计功能。

use crate::epub::ncx::{NavMap, NavPoint, Ncx};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocTreeStyle {
    /// 使用树状符号（├── └──）
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 目录树节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocTreeNode {
    /// 播放顺序
    pub play_order: Option<String>,
    /// 标题
    pub title: String,
    /// 源文件路径
    pub src: String,
    /// 节点ID
    pub id: String,
    /// 子节点
    pub children: Vec<TocTreeNode>,
    /// 节点深度（根节点为0）
    pub depth: usize,
}

impl TocTreeNode {
    /// 从导航点递归构建
    fn from_nav_point(point: &NavPoint, depth: usize) -> Self {
        Self {
            play_order: point.play_order.clone(),
            title: point.label().to_string(),
            src: point.src.clone().unwrap_or_default(),
            id: point.id.clone().unwrap_or_default(),
            children: point
                .children
                .iter()
                .map(|child| Self::from_nav_point(child, depth + 1))
                .collect(),
            depth,
        }
    }

    /// 获取节点的最大深度
    pub fn get_max_depth(&self) -> usize {
        self.children
            .iter()
            .map(TocTreeNode::get_max_depth)
            .fold(self.depth, usize::max)
    }

    /// 获取节点及其所有子节点的数量
    pub fn get_total_nodes(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TocTreeNode::get_total_nodes)
            .sum::<usize>()
    }

    /// 收集所有叶子节点（没有子节点的节点）
    pub fn collect_leaf_nodes(&self) -> Vec<&TocTreeNode> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children
            .iter()
            .flat_map(TocTreeNode::collect_leaf_nodes)
            .collect()
    }

    /// 根据源文件路径查找节点（忽略 `#` 之后的片段）
    pub fn find_by_src(&self, src: &str) -> Option<&TocTreeNode> {
        let path = self.src.split('#').next().unwrap_or_default();
        if self.src == src || path == src {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_src(src))
    }

    fn label(&self, show_paths: bool) -> String {
        let order = self
            .play_order
            .as_deref()
            .map(|order| format!("[{}] ", order))
            .unwrap_or_default();
        if show_paths && !self.src.is_empty() {
            format!("{}{} → {}", order, self.title, self.src)
        } else {
            format!("{}{}", order, self.title)
        }
    }
}

/// 目录树结构
#[derive(Debug, Clone)]
pub struct TocTree {
    /// 文档标题
    pub title: Option<String>,
    /// 根节点列表
    pub roots: Vec<TocTreeNode>,
    /// 显示样式
    pub style: TocTreeStyle,
    /// 是否显示文件路径
    pub show_paths: bool,
    /// 最大显示深度（None表示显示所有）
    pub max_depth: Option<usize>,
}

impl TocTree {
    /// 从导航地图创建目录树
    pub fn from_nav_map(nav_map: &NavMap) -> Self {
        Self {
            title: None,
            roots: nav_map
                .children
                .iter()
                .map(|point| TocTreeNode::from_nav_point(point, 0))
                .collect(),
            style: TocTreeStyle::TreeSymbols,
            show_paths: true,
            max_depth: None,
        }
    }

    /// 从NCX创建目录树，标题取自 `docTitle`
    pub fn from_ncx(ncx: &Ncx) -> Self {
        let title = Some(ncx.title.clone()).filter(|title| !title.is_empty());
        Self::from_nav_map(&ncx.nav_map).with_title(title)
    }

    /// 设置文档标题
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TocTreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示文件路径
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 获取目录树的统计信息
    pub fn get_statistics(&self) -> TocStatistics {
        TocStatistics {
            total_nodes: self.roots.iter().map(TocTreeNode::get_total_nodes).sum(),
            max_depth: self
                .roots
                .iter()
                .map(|root| root.get_max_depth() + 1)
                .max()
                .unwrap_or(0),
            leaf_count: self
                .roots
                .iter()
                .map(|root| root.collect_leaf_nodes().len())
                .sum(),
            root_count: self.roots.len(),
        }
    }

    /// 根据源文件路径查找节点
    pub fn find_by_src(&self, src: &str) -> Option<&TocTreeNode> {
        self.roots.iter().find_map(|root| root.find_by_src(src))
    }

    /// 根据路径数组获取节点
    ///
    /// 路径数组表示从根节点开始的索引路径，例如 `[1, 0]` 表示第二个根节点的第一个子节点。
    /// 如果对应的节点不存在，则返回 None
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&TocTreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max_depth| depth >= max_depth)
    }

    /// 渲染树状符号风格
    fn render_tree_style(&self, node: &TocTreeNode, is_last: bool, prefix: &str, result: &mut String) {
        if self.exceeds_depth(node.depth) {
            return;
        }

        let branch = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, branch, node.label(self.show_paths)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (index, child) in node.children.iter().enumerate() {
            let is_child_last = index == node.children.len() - 1;
            self.render_tree_style(child, is_child_last, &child_prefix, result);
        }
    }

    /// 渲染缩进风格
    fn render_indent_style(&self, node: &TocTreeNode, result: &mut String) {
        if self.exceeds_depth(node.depth) {
            return;
        }

        let indent = "  ".repeat(node.depth);
        result.push_str(&format!("{}• {}\n", indent, node.label(self.show_paths)));

        for child in &node.children {
            self.render_indent_style(child, result);
        }
    }
}

impl Display for TocTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        if let Some(ref title) = self.title {
            let depth_info = match self.max_depth {
                Some(max_depth) => format!(" (深度限制: {})", max_depth),
                None => String::new(),
            };
            result.push_str(&format!("📖 {}{}\n", title, depth_info));
            result.push_str("═══════════════════════════════════════\n\n");
        }

        for (index, root) in self.roots.iter().enumerate() {
            match self.style {
                TocTreeStyle::TreeSymbols => {
                    let is_last = index == self.roots.len() - 1;
                    self.render_tree_style(root, is_last, "", &mut result);
                }
                TocTreeStyle::Indented => self.render_indent_style(root, &mut result),
            }
        }

        write!(f, "{}", result)
    }
}

/// 目录树统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocStatistics {
    /// 总节点数
    pub total_nodes: usize,
    /// 最大层数
    pub max_depth: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 根节点数
    pub root_count: usize,
}

impl Display for TocStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "目录统计: {} 个导航点, {} 个根节点, {} 个叶子节点, 最大深度: {}",
            self.total_nodes, self.root_count, self.leaf_count, self.max_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ncx() -> Ncx {
        let mut ncx = Ncx::new();
        ncx.title = "Testing Epub".to_string();

        let mut second = NavPoint::new("p2", "Chapter 2", "ch2.xhtml");
        second.add_child(NavPoint::new("p2-1", "Section 2.1", "ch2.xhtml#s1"));
        second.add_child(NavPoint::new("p2-2", "Section 2.2", "ch2.xhtml#s2"));
        ncx.nav_map.add_point(NavPoint::new("p1", "Chapter 1", "ch1.xhtml"));
        ncx.nav_map.add_point(second);
        ncx.nav_map.assign_play_order(1);
        ncx
    }

    #[test]
    fn test_statistics() {
        let tree = TocTree::from_ncx(&sample_ncx());
        assert_eq!(
            tree.get_statistics(),
            TocStatistics {
                total_nodes: 4,
                max_depth: 2,
                leaf_count: 3,
                root_count: 2,
            }
        );
        assert_eq!(TocTree::from_nav_map(&NavMap::new()).get_statistics().max_depth, 0);
    }

    #[test]
    fn test_tree_symbols_rendering() {
        let tree = TocTree::from_ncx(&sample_ncx()).with_show_paths(false);
        let rendered = tree.to_string();

        assert!(rendered.starts_with("📖 Testing Epub\n"));
        assert!(rendered.contains("├── [1] Chapter 1\n"));
        assert!(rendered.contains("└── [2] Chapter 2\n"));
        assert!(rendered.contains("    ├── [3] Section 2.1\n"));
        assert!(rendered.contains("    └── [4] Section 2.2\n"));
    }

    #[test]
    fn test_indented_rendering_with_depth_limit() {
        let tree = TocTree::from_ncx(&sample_ncx())
            .with_title(None)
            .with_style(TocTreeStyle::Indented)
            .with_max_depth(Some(1));
        let rendered = tree.to_string();

        assert_eq!(
            rendered,
            "• [1] Chapter 1 → ch1.xhtml\n• [2] Chapter 2 → ch2.xhtml\n"
        );
    }

    #[test]
    fn test_lookup() {
        let tree = TocTree::from_ncx(&sample_ncx());
        assert_eq!(tree.get_node_by_path(&[1, 1]).unwrap().id, "p2-2");
        assert!(tree.get_node_by_path(&[1, 2]).is_none());
        assert!(tree.get_node_by_path(&[]).is_none());
        assert_eq!(tree.find_by_src("ch2.xhtml").unwrap().id, "p2");
        assert_eq!(tree.find_by_src("ch2.xhtml#s2").unwrap().id, "p2-2");
    }
}
