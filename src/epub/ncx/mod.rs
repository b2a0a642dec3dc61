//! NCX（Navigation Control file for XML）文件模块
//!
//! 此模块提供EPUB文件中NCX导航控制文件的数据模型与XML映射，包括导航地图、页面列表与辅助导航列表，
//! 以及目录树的文本展示。

pub mod navigation;
pub mod parser;
pub mod toc_tree;

pub use navigation::{Label, NavList, NavMap, NavPoint, NavTarget, PageList, PageTarget};
pub use parser::{NCX_NAMESPACE, NCX_VERSION, Ncx};
pub use toc_tree::{TocStatistics, TocTree, TocTreeNode, TocTreeStyle};
