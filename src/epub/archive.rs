//! EPUB容器模块
//!
//! `Epub` 持有zip压缩包句柄，负责在打开时依次解析container.xml、OPF与NCX，
//! 在关闭时按相反顺序把内存中的模型写回压缩包。
//!
//! 写入与追加模式不会原地修改目标文件：新的压缩包先在目标文件同目录下的临时文件中
//! 组装，`close()` 成功后才替换目标文件。

use crate::epub::config::{EpubConfig, parent_dir};
use crate::epub::container::{CONTAINER_PATH, ContainerXml};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::Ncx;
use crate::epub::opf::{HasHref, ManifestItem, Opf};
use crate::epub::{MIMETYPE_EPUB, MIMETYPE_NCX};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MIMETYPE_PATH: &str = "mimetype";

/// 压缩包条目：(路径, 内容)
type Document = (String, Vec<u8>);

/// 打开模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// 只读
    Read,
    /// 新建（覆盖已有文件）
    Write,
    /// 追加：文件不存在或为空时等同于新建，否则保留已有内容
    Append,
}

/// 压缩包内路径拼接（目录为空时直接返回href）
pub(crate) fn join_content_path(dir: &str, href: &str) -> String {
    if dir.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", dir, href)
    }
}

/// 表示一个打开的EPUB文件
pub struct Epub {
    path: PathBuf,
    mode: OpenMode,
    config: EpubConfig,
    opf_path: String,
    content_path: String,
    /// OPF包文档
    pub opf: Opf,
    /// NCX导航文档
    pub toc: Ncx,
    handle: Option<Handle>,
}

/// 同一目标文件的container别名
pub type Container = Epub;

enum Handle {
    Reader(ZipArchive<File>),
    Writer(WriteSession),
}

/// 一次写入/追加会话
///
/// mimetype在会话开始时立即写入临时压缩包；其余内容条目保存在内存中，
/// 同一路径再次写入时覆盖之前的内容，关闭时统一落盘。
struct WriteSession {
    writer: ZipWriter<NamedTempFile>,
    source: Option<ZipArchive<File>>,
    staged: Vec<Document>,
}

impl WriteSession {
    fn begin(target: &Path, source: Option<ZipArchive<File>>) -> Result<Self> {
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staging = NamedTempFile::new_in(dir)?;

        let mut writer = ZipWriter::new(staging);
        writer.start_file(
            MIMETYPE_PATH,
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )?;
        writer.write_all(MIMETYPE_EPUB.as_bytes())?;

        Ok(Self {
            writer,
            source,
            staged: vec![(MIMETYPE_PATH.to_string(), MIMETYPE_EPUB.as_bytes().to_vec())],
        })
    }

    fn stage(&mut self, name: String, data: Vec<u8>) {
        match self.staged.iter_mut().find(|(staged, _)| *staged == name) {
            Some(entry) => entry.1 = data,
            None => self.staged.push((name, data)),
        }
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        if let Some((_, data)) = self.staged.iter().find(|(staged, _)| staged == name) {
            return Ok(data.clone());
        }
        match self.source.as_mut() {
            Some(source) => read_entry(source, name),
            None => Err(EpubError::Zip(zip::result::ZipError::FileNotFound)),
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .source
            .as_ref()
            .map(|source| source.file_names().map(str::to_string).collect())
            .unwrap_or_default();
        for (name, _) in &self.staged {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// 组装最终的压缩包并替换目标文件
    ///
    /// 条目顺序：mimetype、container.xml、保留的已有条目、本次写入的条目、OPF与NCX。
    fn finish(
        self,
        target: &Path,
        container: Document,
        documents: Vec<Document>,
        method: CompressionMethod,
    ) -> Result<()> {
        let WriteSession {
            mut writer,
            mut source,
            staged,
        } = self;
        let options = SimpleFileOptions::default().compression_method(method);

        writer.start_file(container.0.as_str(), options)?;
        writer.write_all(&container.1)?;

        let mut generated: HashSet<&str> = documents.iter().map(|(name, _)| name.as_str()).collect();
        generated.insert(container.0.as_str());
        generated.insert(MIMETYPE_PATH);

        let staged: Vec<&Document> = staged
            .iter()
            .filter(|(name, _)| {
                let collides = generated.contains(name.as_str());
                if collides && name != MIMETYPE_PATH {
                    tracing::warn!(entry = %name, "条目与关闭时生成的文档同名，以生成的文档为准");
                }
                !collides
            })
            .collect();

        let mut replaced = generated.clone();
        replaced.extend(staged.iter().copied().map(|(name, _)| name.as_str()));

        if let Some(source) = source.as_mut() {
            for index in 0..source.len() {
                let entry = source.by_index_raw(index)?;
                if replaced.contains(entry.name()) {
                    continue;
                }
                tracing::debug!(entry = entry.name(), "保留已有条目");
                writer.raw_copy_file(entry)?;
            }
        }

        for (name, data) in staged.into_iter().chain(documents.iter()) {
            tracing::debug!(entry = %name, bytes = data.len(), "写入条目");
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        let staging = writer.finish()?;
        drop(source);
        staging
            .persist(target)
            .map_err(|err| EpubError::Io(err.error))?;
        Ok(())
    }
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn read_document(archive: &mut ZipArchive<File>, name: &str, document: &'static str) -> Result<String> {
    let bytes = read_entry(archive, name)?;
    String::from_utf8(bytes)
        .map_err(|err| EpubError::malformed(document, format!("{} 不是有效的UTF-8: {}", name, err)))
}

/// 把压缩包内的条目名映射到 `base` 之下
///
/// 空段与 `.` 被忽略；`..`、盘符等不是普通文件名的段直接拒绝。
fn enclosed_path(base: &Path, name: &str) -> Result<PathBuf> {
    let mut destination = base.to_path_buf();
    for segment in name.split('/').filter(|s| !s.is_empty() && *s != ".") {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => destination.push(part),
            _ => {
                return Err(EpubError::malformed(
                    "opf",
                    format!("条目路径 \"{}\" 会解压到目标目录之外", name),
                ));
            }
        }
    }
    Ok(destination)
}

/// 从已有压缩包中读出的包结构
struct Loaded {
    opf_path: String,
    opf: Opf,
    toc: Ncx,
}

fn load(archive: &mut ZipArchive<File>, config: &EpubConfig) -> Result<Loaded> {
    check_mimetype(archive, config.strict_mimetype)?;

    let container = ContainerXml::parse_xml(&read_document(archive, CONTAINER_PATH, "container.xml")?)?;
    let opf_path = container.get_opf_path()?.to_string();

    let opf = Opf::parse_xml(&read_document(archive, &opf_path, "opf")?)?;
    opf.uid()?;

    let toc_href = opf
        .toc_item()
        .map(|item| item.href.clone())
        .ok_or_else(|| {
            EpubError::malformed(
                "opf",
                format!("spine的toc \"{}\" 在清单中不存在", opf.spine.toc),
            )
        })?;
    let ncx_path = join_content_path(&parent_dir(&opf_path), &toc_href);
    let toc = Ncx::parse_xml(&read_document(archive, &ncx_path, "ncx")?)?;

    Ok(Loaded { opf_path, opf, toc })
}

fn check_mimetype(archive: &mut ZipArchive<File>, strict: bool) -> Result<()> {
    let problem = match read_entry(archive, MIMETYPE_PATH) {
        Ok(bytes) => {
            let found = String::from_utf8_lossy(&bytes).trim().to_string();
            if found == MIMETYPE_EPUB {
                return Ok(());
            }
            EpubError::InvalidMimetype {
                expected: MIMETYPE_EPUB.to_string(),
                found,
            }
        }
        Err(EpubError::Zip(zip::result::ZipError::FileNotFound)) => EpubError::MissingMimetype,
        Err(err) => return Err(err),
    };

    if strict {
        return Err(problem);
    }
    tracing::warn!(error = %problem, "mimetype校验未通过，继续读取");
    Ok(())
}

/// 新建EPUB时的最小OPF与NCX
fn seed(config: &EpubConfig) -> (Opf, Ncx) {
    let uid = format!("urn:uuid:{}", Uuid::new_v4());

    let mut opf = Opf::new();
    opf.uid_id = config.uid_id.clone();
    opf.metadata
        .add_identifier(uid.as_str(), config.uid_id.as_str(), "uuid");
    opf.manifest
        .add_item(config.ncx_id.as_str(), config.ncx_href.as_str(), MIMETYPE_NCX);
    opf.spine.toc = config.ncx_id.clone();

    let mut toc = Ncx::new();
    toc.uid = Some(uid);

    (opf, toc)
}

impl Epub {
    /// 使用默认配置打开EPUB文件
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    /// * `mode` - 打开模式
    ///
    /// # 返回值
    /// * `Result<Epub>` - 成功返回Epub实例，失败返回错误
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Epub> {
        Self::open_with_config(path, mode, EpubConfig::default())
    }

    /// 使用指定配置打开EPUB文件
    pub fn open_with_config<P: AsRef<Path>>(path: P, mode: OpenMode, config: EpubConfig) -> Result<Epub> {
        let path = path.as_ref().to_path_buf();

        let epub = match mode {
            OpenMode::Read => {
                let mut archive = ZipArchive::new(File::open(&path)?)?;
                let loaded = load(&mut archive, &config)?;
                Self::assemble(path, mode, config, loaded, Handle::Reader(archive))
            }
            OpenMode::Write => Self::create(path, mode, config)?,
            OpenMode::Append => {
                let existing = fs::metadata(&path).map(|meta| meta.len() > 0).unwrap_or(false);
                if existing {
                    let mut archive = ZipArchive::new(File::open(&path)?)?;
                    let loaded = load(&mut archive, &config)?;
                    let session = WriteSession::begin(&path, Some(archive))?;
                    Self::assemble(path, mode, config, loaded, Handle::Writer(session))
                } else {
                    Self::create(path, mode, config)?
                }
            }
        };

        tracing::info!(
            path = %epub.path.display(),
            mode = ?epub.mode,
            opf = %epub.opf_path,
            items = epub.opf.manifest.len(),
            "已打开EPUB"
        );
        Ok(epub)
    }

    fn create(path: PathBuf, mode: OpenMode, config: EpubConfig) -> Result<Epub> {
        let session = WriteSession::begin(&path, None)?;
        let (opf, toc) = seed(&config);
        let loaded = Loaded {
            opf_path: config.opf_path.clone(),
            opf,
            toc,
        };
        Ok(Self::assemble(path, mode, config, loaded, Handle::Writer(session)))
    }

    fn assemble(path: PathBuf, mode: OpenMode, config: EpubConfig, loaded: Loaded, handle: Handle) -> Epub {
        Epub {
            path,
            mode,
            config,
            content_path: parent_dir(&loaded.opf_path),
            opf_path: loaded.opf_path,
            opf: loaded.opf,
            toc: loaded.toc,
            handle: Some(handle),
        }
    }

    /// 打开模式
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// OPF文件在压缩包中的路径
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// 内容目录（OPF文件所在目录），清单中的href都相对于它
    pub fn content_path(&self) -> &str {
        &self.content_path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// 根据ID获取清单项
    ///
    /// 只查询内存中的OPF模型，不访问压缩包，因此 `close()` 之后仍然可用。
    pub fn get_item(&self, identifier: &str) -> Option<&ManifestItem> {
        self.opf.manifest.get(identifier)
    }

    /// 根据href获取清单项，多个清单项共享该href时返回 [`EpubError::AmbiguousHref`]
    ///
    /// 与 [`Epub::get_item`] 一样只查询内存模型。
    pub fn get_item_by_href(&self, href: &str) -> Result<Option<&ManifestItem>> {
        self.opf.manifest.get_by_href(href)
    }

    fn entry_name(&self, href: &str) -> String {
        join_content_path(&self.content_path, href)
    }

    /// 当前压缩包中的条目名称
    ///
    /// 写入模式下包含本次会话已写入的条目（新建时只有mimetype），
    /// container.xml、OPF与NCX在 `close()` 时才写入。
    pub fn namelist(&self) -> Result<Vec<String>> {
        match self.handle.as_ref() {
            None => Err(EpubError::UseAfterClose),
            Some(Handle::Reader(archive)) => Ok(archive.file_names().map(str::to_string).collect()),
            Some(Handle::Writer(session)) => Ok(session.names()),
        }
    }

    /// 读取文件并作为清单项加入EPUB
    ///
    /// # 参数
    /// * `src` - 本地文件路径
    /// * `item` - 清单项，文件写入 `content_path/href`
    /// * `append_to_spine` - 是否追加到脊柱末尾
    /// * `is_linear` - 追加到脊柱时的线性属性
    pub fn add_item<P: AsRef<Path>>(
        &mut self,
        src: P,
        item: ManifestItem,
        append_to_spine: bool,
        is_linear: bool,
    ) -> Result<()> {
        self.session()?;
        let data = fs::read(src.as_ref())?;
        self.add_item_bytes(&data, item, append_to_spine, is_linear)
    }

    /// 将内存中的数据作为清单项加入EPUB
    pub fn add_item_bytes(
        &mut self,
        data: &[u8],
        item: ManifestItem,
        append_to_spine: bool,
        is_linear: bool,
    ) -> Result<()> {
        let name = self.entry_name(&item.href);
        self.session()?.stage(name.clone(), data.to_vec());
        tracing::debug!(entry = %name, id = %item.identifier, "加入清单项");

        if append_to_spine {
            self.opf.spine.add_itemref(item.identifier.as_str(), is_linear);
        }
        self.opf.manifest.append(item);
        Ok(())
    }

    fn session(&mut self) -> Result<&mut WriteSession> {
        match self.handle.as_mut() {
            None => Err(EpubError::UseAfterClose),
            Some(Handle::Reader(_)) => Err(EpubError::WriteOnReadOnly),
            Some(Handle::Writer(session)) => Ok(session),
        }
    }

    /// 读取清单项（或直接以href指定）的原始字节
    ///
    /// href必须与清单中的写法完全一致，不允许带 `#` 片段。
    pub fn read_item<H: HasHref + ?Sized>(&mut self, item: &H) -> Result<Vec<u8>> {
        let name = self.entry_name(item.href());
        match self.handle.as_mut() {
            None => Err(EpubError::UseAfterClose),
            Some(Handle::Reader(archive)) => read_entry(archive, &name),
            Some(Handle::Writer(session)) => session.read(&name),
        }
    }

    /// 将清单项解压到 `to_path/content_path/href`
    ///
    /// # 返回值
    /// * `Result<PathBuf>` - 写出的文件路径
    ///
    /// 条目名中含有 `..` 等无法留在 `to_path` 之内的路径段时返回
    /// [`EpubError::MalformedDocument`]，不会写出任何文件。
    pub fn extract_item<H: HasHref + ?Sized, P: AsRef<Path>>(&mut self, item: &H, to_path: P) -> Result<PathBuf> {
        let destination = enclosed_path(to_path.as_ref(), &self.entry_name(item.href()))?;
        let data = self.read_item(item)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&destination, data)?;

        tracing::debug!(path = %destination.display(), "已解压清单项");
        Ok(destination)
    }

    /// 关闭EPUB
    ///
    /// 只读模式下只释放句柄；写入与追加模式下依次写出container.xml、OPF与NCX并替换目标文件。
    /// 重复调用是安全的。无论写出是否成功，调用后容器都处于关闭状态。
    pub fn close(&mut self) -> Result<()> {
        let session = match self.handle.take() {
            None => return Ok(()),
            Some(Handle::Reader(_)) => {
                tracing::debug!(path = %self.path.display(), "已关闭只读EPUB");
                return Ok(());
            }
            Some(Handle::Writer(session)) => session,
        };

        let ncx_href = match self.opf.toc_item() {
            Some(item) => item.href.clone(),
            None => {
                tracing::warn!(toc = %self.opf.spine.toc, "spine的toc不在清单中，NCX写入默认位置");
                self.config.ncx_href.clone()
            }
        };

        let indent = self.config.indent;
        let container = (
            CONTAINER_PATH.to_string(),
            ContainerXml::for_opf(&self.opf_path).to_xml(indent)?,
        );
        let documents = vec![
            (self.opf_path.clone(), self.opf.to_xml(indent)?),
            (self.entry_name(&ncx_href), self.toc.to_xml(indent)?),
        ];

        session.finish(&self.path, container, documents, self.config.compression.method())?;
        tracing::info!(path = %self.path.display(), items = self.opf.manifest.len(), "已写入EPUB");
        Ok(())
    }
}

impl Drop for Epub {
    fn drop(&mut self) {
        if let Some(Handle::Writer(_)) = self.handle.take() {
            tracing::warn!(path = %self.path.display(), "EPUB未调用close()即被丢弃，放弃本次写入");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("OEBPS/Text/a.xhtml", &["OEBPS", "Text", "a.xhtml"])]
    #[case("OEBPS/./Text//a.xhtml", &["OEBPS", "Text", "a.xhtml"])]
    #[case("/OEBPS/a.xhtml", &["OEBPS", "a.xhtml"])]
    fn test_enclosed_path_stays_under_base(#[case] name: &str, #[case] parts: &[&str]) {
        let base = Path::new("out");
        let expected: PathBuf = parts.iter().fold(base.to_path_buf(), |path, part| path.join(part));
        assert_eq!(enclosed_path(base, name).unwrap(), expected);
    }

    #[rstest]
    #[case("OEBPS/../../escaped.txt")]
    #[case("../escaped.txt")]
    #[case("OEBPS/Text/..")]
    fn test_enclosed_path_rejects_parent_segments(#[case] name: &str) {
        assert!(matches!(
            enclosed_path(Path::new("out"), name),
            Err(EpubError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_join_content_path() {
        assert_eq!(join_content_path("", "toc.ncx"), "toc.ncx");
        assert_eq!(join_content_path("OEBPS", "Text/a.xhtml"), "OEBPS/Text/a.xhtml");
    }

    #[test]
    fn test_seed_is_consistent() {
        let config = EpubConfig::default();
        let (opf, toc) = seed(&config);

        let uid = opf.uid().expect("新建的OPF应当有唯一标识符");
        assert!(uid.value.starts_with("urn:uuid:"));
        assert_eq!(uid.scheme, "uuid");
        assert_eq!(toc.uid.as_deref(), Some(uid.value.as_str()));
        assert_eq!(opf.manifest.len(), 1);
        assert_eq!(opf.toc_item().unwrap().href, "toc.ncx");
        assert!(opf.spine.is_empty());
    }

    #[test]
    fn test_write_session_replaces_staged_entries() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book.epub");
        let mut session = WriteSession::begin(&target, None).unwrap();

        session.stage("OEBPS/a.xhtml".to_string(), b"first".to_vec());
        session.stage("OEBPS/a.xhtml".to_string(), b"second".to_vec());

        assert_eq!(session.read("OEBPS/a.xhtml").unwrap(), b"second");
        assert_eq!(session.names(), vec!["mimetype", "OEBPS/a.xhtml"]);
        assert!(matches!(
            session.read("OEBPS/missing.xhtml"),
            Err(EpubError::Zip(zip::result::ZipError::FileNotFound))
        ));
        assert!(!target.exists());
    }
}
