#![allow(dead_code)]

use rs_docx::document::Paragraph;
use rs_docx::Docx;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const REFS_BIB: &str = r#"
@book{knuth,
  author = {Knuth, Donald E.},
  title = {The Art of Computer Programming},
  publisher = {Addison-Wesley},
  year = 1968
}

@article{dijkstra,
  author = {Edsger W. Dijkstra},
  title = {Go To Statement Considered Harmful},
  journal = {Communications of the ACM},
  volume = 11,
  pages = {147--148},
  year = 1968
}

@misc{adams,
  author = {Adams, Douglas},
  title = {Mostly Harmless},
  year = 1992
}
"#;

/// Writes a document with one paragraph per entry of `paragraphs`.
pub fn write_docx(path: &Path, paragraphs: &[&str]) {
    let mut docx = Docx::default();
    for text in paragraphs {
        docx.document.push(Paragraph::default().push_text(*text));
    }
    docx.write_file(path).expect("failed to write test docx");
}

pub fn write_bib(dir: &Path) -> PathBuf {
    let path = dir.join("refs.bib");
    std::fs::write(&path, REFS_BIB).expect("failed to write test bib");
    path
}

pub fn document_xml(path: &Path) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).expect("open docx")).expect("zip");
    let mut entry = archive.by_name("word/document.xml").expect("document part");
    let mut xml = String::new();
    entry.read_to_string(&mut xml).expect("read document part");
    xml
}
