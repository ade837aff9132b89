//! `.docx` package access.
//!
//! A `.docx` file is a zip archive; only `word/document.xml` is interpreted.
//! Every other part is carried through byte-for-byte. The document body is kept
//! as a sequence of raw markup and `Paragraph` segments so paragraphs can be
//! rewritten, inserted or removed without touching the surrounding XML.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::TailorError;

pub mod emphasis;
pub mod paragraph;

pub use emphasis::TermMatcher;
pub use paragraph::Paragraph;

/// The main document part of a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Self-closing paragraphs first; otherwise the lazy body would run to the next `</w:p>`.
/// Paragraphs nested in text boxes are not supported.
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?/>|<w:p(?:\s[^>]*)?>.*?</w:p>").expect("valid paragraph regex")
});

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("package I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("package has no {DOCUMENT_PART} part")]
    MissingDocument,

    #[error("{DOCUMENT_PART} is not valid UTF-8")]
    NotUtf8,
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

#[derive(Debug, Clone)]
enum Segment {
    Markup(String),
    Paragraph(Paragraph),
}

/// An in-memory `.docx` package. Never written back to where it was read from.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<Part>,
    document_index: usize,
    body: Vec<Segment>,
}

impl DocxPackage {
    /// Reads and parses a template. Any failure is a template error.
    pub fn open(path: &Path) -> Result<Self, TailorError> {
        let bytes = fs::read(path)
            .map_err(|e| TailorError::template(path, format!("cannot read template: {e}")))?;
        let package =
            Self::from_bytes(bytes).map_err(|e| TailorError::template(path, e.to_string()))?;

        debug!(
            "Opened template {} ({} parts, {} paragraphs)",
            path.display(),
            package.parts.len(),
            package.paragraphs().count()
        );
        Ok(package)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackageError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let document_index = parts
            .iter()
            .position(|p| p.name == DOCUMENT_PART)
            .ok_or(PackageError::MissingDocument)?;
        let xml = std::str::from_utf8(&parts[document_index].data)
            .map_err(|_| PackageError::NotUtf8)?;
        let body = split_body(xml);

        Ok(Self {
            parts,
            document_index,
            body,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|s| match s {
            Segment::Paragraph(p) => Some(p),
            Segment::Markup(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|s| match s {
            Segment::Paragraph(p) => Some(p),
            Segment::Markup(_) => None,
        })
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs().nth(index)
    }

    /// Visible text of each paragraph, in document order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// Replaces the paragraphs at `range` (paragraph indices) with `replacement`.
    ///
    /// Markup between the removed paragraphs stays where it was; the new
    /// paragraphs go where the first removed one stood.
    pub fn splice_paragraphs(&mut self, range: Range<usize>, replacement: Vec<Paragraph>) {
        let positions: Vec<usize> = self
            .body
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Segment::Paragraph(_)))
            .map(|(i, _)| i)
            .collect();

        let insert_at = match positions.get(range.start) {
            Some(&at) => at,
            None => positions.last().map_or(self.body.len(), |&last| last + 1),
        };

        let end = range.end.min(positions.len());
        let start = range.start.min(end);
        for &at in positions[start..end].iter().rev() {
            self.body.remove(at);
        }

        self.body.splice(
            insert_at..insert_at,
            replacement.into_iter().map(Segment::Paragraph),
        );
    }

    /// Serializes the body back into `word/document.xml`.
    pub fn document_xml(&self) -> String {
        let mut xml = String::new();
        for segment in &self.body {
            match segment {
                Segment::Markup(m) => xml.push_str(m),
                Segment::Paragraph(p) => xml.push_str(p.xml()),
            }
        }
        xml
    }

    /// Reassembles the package, parts in their original order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let document_xml = self.document_xml();

        for (i, part) in self.parts.iter().enumerate() {
            let compression = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);

            if part.is_dir {
                writer.add_directory(part.name.as_str(), options)?;
                continue;
            }

            writer.start_file(part.name.as_str(), options)?;
            if i == self.document_index {
                writer.write_all(document_xml.as_bytes())?;
            } else {
                writer.write_all(&part.data)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Writes the package to `path`, creating parent directories as needed.
    ///
    /// The bytes go to a temporary file in the destination directory which is
    /// renamed over `path` only once fully written, so a failure never leaves a
    /// partial document behind.
    pub fn save(&self, path: &Path) -> Result<(), TailorError> {
        let bytes = self
            .to_bytes()
            .map_err(|e| TailorError::io(path, std::io::Error::other(e)))?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| TailorError::io(parent, e))?;

        let mut staged = staging_file(parent).map_err(|e| TailorError::io(parent, e))?;
        staged
            .write_all(&bytes)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| TailorError::io(path, e))?;
        staged
            .persist(path)
            .map_err(|e| TailorError::io(path, e.error))?;

        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// A temporary file in `dir` created with the same mode a plain `File::create`
/// would get (0666 less the umask), since `persist` keeps it.
fn staging_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn split_body(xml: &str) -> Vec<Segment> {
    let mut body = Vec::new();
    let mut cursor = 0;

    for m in PARAGRAPH.find_iter(xml) {
        if m.start() > cursor {
            body.push(Segment::Markup(xml[cursor..m.start()].to_string()));
        }
        body.push(Segment::Paragraph(Paragraph::from_xml(m.as_str())));
        cursor = m.end();
    }
    if cursor < xml.len() {
        body.push(Segment::Markup(xml[cursor..].to_string()));
    }

    body
}

/// In-memory `.docx` fixtures for tests.
#[cfg(test)]
pub mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::paragraph::escape;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    /// A plain paragraph holding `text` in one run.
    pub fn paragraph_xml(text: &str) -> String {
        if text.is_empty() {
            return "<w:p/>".to_string();
        }
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", escape(text))
    }

    /// A complete `word/document.xml` whose body holds the given paragraph markup.
    pub fn document_xml(paragraphs: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/></w:sectPr></w:body></w:document>",
            paragraphs.concat()
        )
    }

    pub fn docx_with_document(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", document_xml),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// A `.docx` with one plain paragraph per entry of `texts`.
    pub fn docx(texts: &[&str]) -> Vec<u8> {
        let paragraphs: Vec<String> = texts.iter().map(|t| paragraph_xml(t)).collect();
        docx_with_document(&document_xml(&paragraphs))
    }
}
