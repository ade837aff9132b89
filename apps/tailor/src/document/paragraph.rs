//! Paragraph-level WordprocessingML operations.
//!
//! Works on the raw `<w:p>` markup. Paragraph properties (`w:pPr`) and the first
//! run's properties (`w:rPr`) survive a rewrite; any other per-run formatting
//! inside a rewritten paragraph is flattened.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::emphasis::TermMatcher;

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<w:p(\s[^>]*?)?/?>").expect("valid paragraph tag regex"));

static PARAGRAPH_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:pPr\b[^>]*/>|<w:pPr\b[^>]*>.*?</w:pPr>").expect("valid pPr regex")
});

/// A run start tag and, when present, the `w:rPr` that must open it.
static RUN_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:r(?:\s[^>]*)?>\s*(<w:rPr\b[^>]*/>|<w:rPr\b[^>]*>.*?</w:rPr>)?")
        .expect("valid run regex")
});

static TEXT_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br\b[^>]*/>")
        .expect("valid text regex")
});

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:b(?:\s[^>]*)?/>").expect("valid bold regex"));

/// `w:b` must follow `w:rStyle` and `w:rFonts` inside `w:rPr`.
static BOLD_INSERTION_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<w:rPr\b[^>]*>\s*(?:<w:rStyle\b[^>]*/>\s*)?(?:<w:rFonts\b[^>]*/>\s*)?")
        .expect("valid rPr prefix regex")
});

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity regex"));

/// Elements whose structure a flattening rewrite would destroy.
const COMPLEX_CONTENT: &[&str] = &[
    "<w:hyperlink",
    "<w:fldChar",
    "<w:fldSimple",
    "<w:instrText",
    "<w:drawing",
    "<w:pict",
    "<w:object",
    "<w:sdt",
    "<mc:AlternateContent",
    "<w:footnoteReference",
    "<w:endnoteReference",
    "<w:commentReference",
    "<w:noBreakHyphen",
    "<w:softHyphen",
    "<w:sym",
    "<w:ptab",
];

/// One `<w:p>` element of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    xml: String,
    generated: bool,
}

impl Paragraph {
    pub fn from_xml(xml: impl Into<String>) -> Self {
        Self {
            xml: xml.into(),
            generated: false,
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// True for paragraphs built by `with_text` rather than read from the template.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Visible text: `w:t` content with entities decoded, tabs and breaks as `\t` and `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for caps in TEXT_CONTENT.captures_iter(&self.xml) {
            match caps.get(1) {
                Some(content) => text.push_str(&unescape(content.as_str())),
                None if caps[0].starts_with("<w:tab") => text.push('\t'),
                None => text.push('\n'),
            }
        }
        text
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Contains hyperlinks, fields, drawings, content controls or run content
    /// (note references, special hyphens, symbols) that has no text form.
    pub fn is_complex(&self) -> bool {
        COMPLEX_CONTENT.iter().any(|tag| self.xml.contains(tag))
    }

    /// A new paragraph with this one's paragraph and run formatting holding `text`.
    pub fn with_text(&self, text: &str) -> Paragraph {
        let run_properties = self.run_properties();
        let mut xml = self.open_tag();
        xml.push_str(self.properties().unwrap_or_default());
        if !text.is_empty() {
            xml.push_str(&run_xml(run_properties, text));
        }
        xml.push_str("</w:p>");

        Paragraph {
            xml,
            generated: true,
        }
    }

    /// Rewrites the paragraph so every match of `matcher` sits in its own bold run.
    /// Returns false (and leaves the paragraph alone) when nothing matched or the
    /// paragraph holds complex content.
    pub fn emphasize(&mut self, matcher: &TermMatcher) -> bool {
        if self.is_complex() {
            return false;
        }

        let text = self.text();
        let spans = matcher.find_all(&text);
        if spans.is_empty() {
            return false;
        }

        let plain = self.run_properties().map(str::to_string);
        let bold = embolden(plain.as_deref());

        let mut xml = self.open_tag();
        xml.push_str(self.properties().unwrap_or_default());

        let mut cursor = 0;
        for span in spans {
            if span.start > cursor {
                xml.push_str(&run_xml(plain.as_deref(), &text[cursor..span.start]));
            }
            xml.push_str(&run_xml(Some(&bold), &text[span.clone()]));
            cursor = span.end;
        }
        if cursor < text.len() {
            xml.push_str(&run_xml(plain.as_deref(), &text[cursor..]));
        }
        xml.push_str("</w:p>");

        self.xml = xml;
        true
    }

    /// The `<w:p ...>` start tag, reopened if the paragraph was self-closing.
    fn open_tag(&self) -> String {
        let attributes = OPEN_TAG
            .captures(&self.xml)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str().trim_end());
        format!("<w:p{attributes}>")
    }

    fn properties(&self) -> Option<&str> {
        PARAGRAPH_PROPERTIES.find(&self.xml).map(|m| m.as_str())
    }

    /// Properties of the first run, if that run has any. `w:pPr` may hold its
    /// own `w:rPr` for the paragraph mark, so the search starts after it.
    fn run_properties(&self) -> Option<&str> {
        let from = PARAGRAPH_PROPERTIES.find(&self.xml).map_or(0, |m| m.end());
        RUN_START
            .captures_at(&self.xml, from)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// A single run holding `text`, with tabs and newlines as `w:tab` and `w:br`.
fn run_xml(run_properties: Option<&str>, text: &str) -> String {
    let mut run = String::from("<w:r>");
    run.push_str(run_properties.unwrap_or_default());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.push_str("<w:br/>");
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                run.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                run.push_str("<w:t xml:space=\"preserve\">");
                run.push_str(&escape(piece));
                run.push_str("</w:t>");
            }
        }
    }
    run.push_str("</w:r>");
    run
}

/// Run properties with bold switched on.
fn embolden(run_properties: Option<&str>) -> String {
    let Some(rpr) = run_properties else {
        return "<w:rPr><w:b/></w:rPr>".to_string();
    };
    if !rpr.contains("</w:rPr>") {
        return "<w:rPr><w:b/></w:rPr>".to_string();
    }

    // Drops any existing toggle, including an explicit `w:val="0"`.
    let rpr = BOLD.replace_all(rpr, "");
    let at = BOLD_INSERTION_POINT
        .find(&rpr)
        .map_or("<w:rPr>".len(), |m| m.end());
    format!("{}<w:b/>{}", &rpr[..at], &rpr[at..])
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn unescape(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
