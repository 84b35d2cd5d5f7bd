use super::DocumentContainer;
use crate::error::{Error, Result};
use rs_docx::DocxFile;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archive path of the WordprocessingML main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// A `.docx` package on disk.
#[derive(Debug, Clone)]
pub struct DocxContainer {
    path: PathBuf,
}

impl DocxContainer {
    /// Opens `path`, failing early when it is not a ZIP archive.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let container = Self { path: path.into() };
        container.archive()?;
        Ok(container)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> Result<ZipArchive<File>> {
        let file = File::open(&self.path)?;
        ZipArchive::new(file)
            .map_err(|e| Error::DocxParse(format!("Failed to open DOCX as ZIP: {}", e)))
    }
}

fn missing_part(e: ZipError) -> Error {
    match e {
        ZipError::FileNotFound => Error::MissingPart(DOCUMENT_PART.to_string()),
        other => Error::Zip(other),
    }
}

impl DocumentContainer for DocxContainer {
    fn read_document(&self) -> Result<String> {
        let mut archive = self.archive()?;
        let mut entry = archive.by_name(DOCUMENT_PART).map_err(missing_part)?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        Ok(xml)
    }

    fn write_document(&self, document: &str, output: &Path) -> Result<()> {
        let mut archive = self.archive()?;
        // Built in memory so `output` may be the input path.
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut replaced = false;

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.name() == DOCUMENT_PART {
                drop(entry);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(document.as_bytes())?;
                replaced = true;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        if !replaced {
            return Err(Error::MissingPart(DOCUMENT_PART.to_string()));
        }

        let bytes = writer.finish()?.into_inner();
        fs::write(output, bytes)?;
        Ok(())
    }
}

/// Checks that `path` still loads as a WordprocessingML package.
pub fn verify_docx(path: &Path) -> Result<()> {
    let docx_file =
        DocxFile::from_file(path).map_err(|e| Error::DocxParse(format!("{:?}", e)))?;
    docx_file
        .parse()
        .map_err(|e| Error::DocxParse(format!("{:?}", e)))?;
    Ok(())
}
