use clap::{Parser, Subcommand};
use epubforge::{Book, Epub, EpubConfig, ManifestItem, OpenMode, Result, TocTree, TocTreeStyle};
use std::path::PathBuf;

/// 📚 EpubForge - EPUB 2.0.1 文件处理工具
#[derive(Parser)]
#[command(name = "epubforge")]
#[command(about = "读取、检查与修改EPUB 2.0.1 文件")]
#[command(version)]
struct Args {
    /// YAML配置文件路径（不存在时使用默认配置）
    #[arg(short, long, global = true, default_value = "epubforge.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 显示元数据、清单与脊柱信息
    Info {
        epub_file: PathBuf,
        /// 列出每个清单项
        #[arg(short, long)]
        verbose: bool,
    },
    /// 显示NCX目录树
    Toc {
        epub_file: PathBuf,
        /// 显示每个导航点的文件路径
        #[arg(short = 'p', long)]
        show_paths: bool,
        /// 使用缩进风格而不是树状符号
        #[arg(short, long)]
        indented: bool,
        /// 最大显示深度
        #[arg(short, long)]
        depth: Option<usize>,
    },
    /// 列出压缩包中的所有条目
    Ls { epub_file: PathBuf },
    /// 输出清单项的内容（href相对于OPF目录）
    Cat { epub_file: PathBuf, href: String },
    /// 把清单项解压到指定目录
    Extract {
        epub_file: PathBuf,
        href: String,
        to_dir: PathBuf,
    },
    /// 向EPUB中加入文件（文件不存在时新建EPUB）
    Add {
        epub_file: PathBuf,
        file: PathBuf,
        /// 清单项ID
        #[arg(long)]
        id: String,
        /// 清单项href（相对于OPF目录）
        #[arg(long)]
        href: String,
        /// 媒体类型
        #[arg(long, default_value = "application/xhtml+xml")]
        media_type: String,
        /// 同时追加到脊柱
        #[arg(long)]
        spine: bool,
        /// 追加到脊柱时标记为非线性
        #[arg(long, requires = "spine")]
        non_linear: bool,
    },
    /// 生成默认配置文件
    InitConfig,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("❌ 错误: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Command::InitConfig = args.command {
        EpubConfig::write_default(&args.config)?;
        println!("✅ 已生成默认配置文件: {}", args.config.display());
        return Ok(());
    }

    let config = EpubConfig::load_or_default(&args.config)?;

    match args.command {
        Command::Info { epub_file, verbose } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Read, config)?;
            display_info(&mut epub, verbose);
            epub.close()
        }
        Command::Toc {
            epub_file,
            show_paths,
            indented,
            depth,
        } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Read, config)?;
            let style = if indented {
                TocTreeStyle::Indented
            } else {
                TocTreeStyle::TreeSymbols
            };
            let tree = TocTree::from_ncx(&epub.toc)
                .with_style(style)
                .with_show_paths(show_paths)
                .with_max_depth(depth);
            println!("📊 {}\n", tree.get_statistics());
            println!("{}", tree);
            epub.close()
        }
        Command::Ls { epub_file } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Read, config)?;
            for name in epub.namelist()? {
                println!("{}", name);
            }
            epub.close()
        }
        Command::Cat { epub_file, href } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Read, config)?;
            let data = epub.read_item(href.as_str())?;
            println!("{}", String::from_utf8_lossy(&data));
            epub.close()
        }
        Command::Extract {
            epub_file,
            href,
            to_dir,
        } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Read, config)?;
            let written = epub.extract_item(href.as_str(), &to_dir)?;
            println!("📁 已解压到: {}", written.display());
            epub.close()
        }
        Command::Add {
            epub_file,
            file,
            id,
            href,
            media_type,
            spine,
            non_linear,
        } => {
            let mut epub = Epub::open_with_config(&epub_file, OpenMode::Append, config)?;
            let item = ManifestItem::new(id.as_str(), href.as_str(), media_type.as_str());
            epub.add_item(&file, item, spine, !non_linear)?;
            epub.close()?;
            println!("✅ 已加入 {} → {}", file.display(), href);
            Ok(())
        }
        Command::InitConfig => Ok(()),
    }
}

/// 显示EPUB元数据信息
fn display_info(epub: &mut Epub, verbose: bool) {
    println!("📦 OPF文件路径: {}", epub.opf_path());
    println!("📖 EPUB版本: {}", epub.opf.version);

    let item_count = epub.opf.manifest.len();
    let spine_count = epub.opf.spine.len();
    let book = Book::new(epub);

    println!("\n  📚 基本信息:");
    for title in book.titles() {
        if title.lang.is_empty() {
            println!("    标题: {}", title.text);
        } else {
            println!("    标题: {} [{}]", title.text, title.lang);
        }
    }

    for (i, creator) in book.creators().iter().enumerate() {
        let mut author_info = format!("    作者 {}: {}", i + 1, creator.name);
        if !creator.role.is_empty() {
            author_info.push_str(&format!(" ({})", creator.role));
        }
        if !creator.file_as.is_empty() {
            author_info.push_str(&format!(" [排序: {}]", creator.file_as));
        }
        println!("{}", author_info);
    }

    if !book.languages().is_empty() {
        println!("    语言: {}", book.languages().join(", "));
    }
    if let Some(publisher) = book.publisher() {
        println!("    出版社: {}", publisher);
    }
    for date in book.dates() {
        if date.event.is_empty() {
            println!("    日期: {}", date.date);
        } else {
            println!("    日期: {} ({})", date.date, date.event);
        }
    }
    if let Some(description) = book.description() {
        println!("    描述: {}", description);
    }

    let identifiers = book.identifiers();
    if !identifiers.is_empty() {
        println!("\n  🔖 标识符:");
        for (i, identifier) in identifiers.iter().enumerate() {
            let mut id_info = format!("    {}. {}", i + 1, identifier.value);
            if !identifier.scheme.is_empty() {
                id_info.push_str(&format!(" ({})", identifier.scheme));
            }
            if !identifier.id.is_empty() {
                id_info.push_str(&format!(" [ID: {}]", identifier.id));
            }
            println!("{}", id_info);
        }
    }

    if !book.subjects().is_empty() {
        println!("\n  🏷️  主题: {}", book.subjects().join(", "));
    }
    if let Some(rights) = book.right() {
        println!("  ⚖️  版权: {}", rights);
    }

    let chapters = book.chapters();
    let extra = book.extra_chapters();
    println!("\n  📁 文件统计:");
    println!("    清单项目: {} 个", item_count);
    println!("    脊柱项目: {} 个（线性 {}，非线性 {}）", spine_count, chapters.len(), extra.len());

    if verbose {
        println!("\n  📄 章节:");
        for (i, chapter) in chapters.iter().chain(extra.iter()).enumerate() {
            let marker = if chapter.is_linear() { "" } else { " [非线性]" };
            println!("    {}. {} → {}{}", i + 1, chapter.identifier(), chapter.href(), marker);
        }
        println!("\n  🗂️  清单:");
        for item in &epub.opf.manifest {
            println!("    {} → {} ({})", item.identifier, item.href, item.media_type);
        }
    }
}
