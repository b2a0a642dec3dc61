//! OPF（Open Packaging Format）文件模块
//!
//! 此模块提供EPUB文件中OPF包文件的数据模型，包括元数据、清单、脊柱、指南，以及它们与XML之间的映射。

mod guide;
mod manifest;
mod metadata;
mod parser;
mod spine;

pub use guide::{Guide, GuideReference};
pub use manifest::{HasHref, HasIdentifier, Manifest, ManifestItem};
pub use metadata::{Creator, DC_NAMESPACE, DateEvent, Identifier, Meta, Metadata, Title};
pub use parser::{OPF_NAMESPACE, OPF_VERSION, Opf};
pub use spine::{Spine, SpineItem};
