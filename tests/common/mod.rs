use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

pub const TESTING_EPUB_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:title>Testing Epub</dc:title>
        <dc:creator opf:role="aut" opf:file-as="Tester, Jane">Jane Tester</dc:creator>
        <dc:language>en</dc:language>
        <dc:identifier id="BookId" opf:scheme="ISBN">9780000000001</dc:identifier>
        <dc:date opf:event="publication">2010-05-01</dc:date>
        <meta name="cover" content="cover-image"/>
    </metadata>
    <manifest>
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
        <item id="cover" href="Text/cover.xhtml" media-type="application/xhtml+xml"/>
        <item id="chapter1" href="Text/chapter1.xhtml" media-type="application/xhtml+xml"/>
        <item id="chapter2" href="Text/chapter2.xhtml" media-type="application/xhtml+xml"/>
        <item id="notes" href="Text/notes.xhtml" media-type="application/xhtml+xml"/>
        <item id="style" href="Styles/style.css" media-type="text/css"/>
        <item id="cover-image" href="Images/cover.png" media-type="image/png"/>
    </manifest>
    <spine toc="ncx">
        <itemref idref="cover"/>
        <itemref idref="chapter1"/>
        <itemref idref="chapter2"/>
        <itemref idref="notes" linear="no"/>
    </spine>
    <guide>
        <reference type="cover" title="Cover" href="Text/cover.xhtml"/>
    </guide>
</package>"#;

pub const TESTING_EPUB_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <head>
        <meta name="dtb:uid" content="9780000000001"/>
        <meta name="dtb:depth" content="2"/>
        <meta name="dtb:totalPageCount" content="0"/>
        <meta name="dtb:maxPageNumber" content="0"/>
    </head>
    <docTitle><text>Testing Epub</text></docTitle>
    <docAuthor><text>Jane Tester</text></docAuthor>
    <navMap>
        <navPoint id="np-1" playOrder="1">
            <navLabel><text>Chapter 1</text></navLabel>
            <content src="Text/chapter1.xhtml"/>
        </navPoint>
        <navPoint id="np-2" playOrder="2">
            <navLabel><text>Chapter 2</text></navLabel>
            <content src="Text/chapter2.xhtml"/>
            <navPoint id="np-3" playOrder="3">
                <navLabel><text>Section 2.1</text></navLabel>
                <content src="Text/chapter2.xhtml#s1"/>
            </navPoint>
            <navPoint id="np-4" playOrder="4">
                <navLabel><text>Section 2.2</text></navLabel>
                <content src="Text/chapter2.xhtml#s2"/>
            </navPoint>
        </navPoint>
    </navMap>
</ncx>"#;

pub fn chapter(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{0}</title></head><body><h1>{0}</h1></body></html>"#,
        title
    )
}

/// 按给定顺序写出一个zip压缩包，mimetype条目（若有）不压缩
pub fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        let method = if *name == "mimetype" {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        zip.start_file(*name, SimpleFileOptions::default().compression_method(method))
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// 创建包含7个清单项的测试EPUB
pub fn create_testing_epub(path: &Path, mimetype: &str) {
    write_archive(
        path,
        &[
            ("mimetype", mimetype.as_bytes().to_vec()),
            ("META-INF/container.xml", CONTAINER_XML.as_bytes().to_vec()),
            ("OEBPS/content.opf", TESTING_EPUB_OPF.as_bytes().to_vec()),
            ("OEBPS/toc.ncx", TESTING_EPUB_NCX.as_bytes().to_vec()),
            ("OEBPS/Text/cover.xhtml", chapter("Cover").into_bytes()),
            ("OEBPS/Text/chapter1.xhtml", chapter("Chapter 1").into_bytes()),
            ("OEBPS/Text/chapter2.xhtml", chapter("Chapter 2").into_bytes()),
            ("OEBPS/Text/notes.xhtml", chapter("Notes").into_bytes()),
            ("OEBPS/Styles/style.css", b"body { margin: 0; }".to_vec()),
            ("OEBPS/Images/cover.png", vec![0x89, b'P', b'N', b'G']),
        ],
    );
}

/// 创建只有一个清单项（NCX）、语言为fr的最小EPUB，共5个条目
pub fn create_french_epub(path: &Path) {
    let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:title>Livre</dc:title>
        <dc:language>fr</dc:language>
        <dc:identifier id="BookId" opf:scheme="uuid">urn:uuid:00000000-0000-4000-8000-000000000000</dc:identifier>
    </metadata>
    <manifest>
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    </manifest>
    <spine toc="ncx"/>
</package>"#;
    let ncx = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <head><meta name="dtb:uid" content="urn:uuid:00000000-0000-4000-8000-000000000000"/></head>
    <docTitle><text>Livre</text></docTitle>
    <navMap/>
</ncx>"#;

    write_archive(
        path,
        &[
            ("mimetype", b"application/epub+zip".to_vec()),
            ("META-INF/container.xml", CONTAINER_XML.as_bytes().to_vec()),
            ("OEBPS/content.opf", opf.as_bytes().to_vec()),
            ("OEBPS/toc.ncx", ncx.as_bytes().to_vec()),
            ("OEBPS/Text/preface.xhtml", chapter("Préface").into_bytes()),
        ],
    );
}
