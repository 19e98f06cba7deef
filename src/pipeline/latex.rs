//! LaTeX generation: escape OCR text and assemble the final document.
//!
//! OCR output is arbitrary text. A stray `%` comments out the rest of a line,
//! an `_` or `^` outside math mode is a hard error, and a lone `{` breaks
//! grouping for the rest of the document. Everything that came from the
//! engine (text and file names) therefore goes through [`escape_latex`];
//! only the fixed template below emits raw LaTeX.
//!
//! Output is a pure function of its inputs: no timestamps are inserted
//! (`\today` is resolved by the typesetting engine), so the same sections
//! always produce byte-identical documents.

use crate::config::ConversionConfig;
use crate::output::ImageResult;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// One section of the document buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section heading, unescaped (normally the image file name).
    pub title: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    /// Raw extracted text, unescaped.
    Text(String),
    /// Extraction failed; rendered as an error marker.
    Failed,
}

impl Section {
    pub fn text(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Text(text.into()),
        }
    }

    pub fn failed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Failed,
        }
    }
}

impl From<&ImageResult> for Section {
    fn from(r: &ImageResult) -> Self {
        if r.is_success() {
            Section::text(r.file_name.clone(), r.text.clone())
        } else {
            Section::failed(r.file_name.clone())
        }
    }
}

/// Title page settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: String,
    pub author: String,
    pub include_intro: bool,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self::from_config(&ConversionConfig::default())
    }
}

impl DocumentMeta {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            title: config.title.clone(),
            author: config.author.clone(),
            include_intro: config.include_intro,
        }
    }
}

const PREAMBLE: &str = r"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}
\geometry{margin=1in}
";

const INTRO: &str = r"\section*{Introduction}
This document contains text extracted from handwritten notes using OCR (Optical Character Recognition).
";

const EMPTY_BODY: &str = r"\textit{[No text extracted from this image]}";

/// Assemble a complete LaTeX document with one `\section` per entry, in order.
pub fn build_document(sections: &[Section], meta: &DocumentMeta) -> String {
    let mut doc = String::with_capacity(1024 + sections.len() * 512);

    doc.push_str(PREAMBLE);
    doc.push('\n');
    doc.push_str(&format!(r"\title{{{}}}", escape_inline(&meta.title)));
    doc.push('\n');
    doc.push_str(&format!(r"\author{{{}}}", escape_inline(&meta.author)));
    doc.push('\n');
    doc.push_str("\\date{\\today}\n\n");
    doc.push_str("\\begin{document}\n\n\\maketitle\n\n");

    if meta.include_intro {
        doc.push_str(INTRO);
        doc.push('\n');
    }

    for section in sections {
        doc.push_str(&format!(r"\section{{{}}}", escape_inline(&section.title)));
        doc.push_str("\n\n");
        match &section.body {
            SectionBody::Text(text) => doc.push_str(&render_text_body(text)),
            SectionBody::Failed => doc.push_str(&format!(
                r"\textit{{[Error processing image: {}]}}",
                escape_inline(&section.title)
            )),
        }
        doc.push_str("\n\n");
    }

    doc.push_str("\\end{document}\n");
    doc
}

// ── Escaping ─────────────────────────────────────────────────────────────────

static RE_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\{}#$%&_^~]").unwrap());

/// Escape the ten LaTeX special characters so `text` typesets literally.
///
/// Replacement is a single pass: the backslashes introduced for one
/// character are never re-escaped. Line endings are normalised to `\n`,
/// tabs become spaces and other control characters are dropped, since TeX
/// rejects or reinterprets them. Latin ligatures (U+FB00 to U+FB06), which
/// Tesseract emits often and `inputenc` cannot typeset, are spelled out.
pub fn escape_latex(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.replace("\r\n", "\n").chars() {
        match c {
            '\r' | '\n' => cleaned.push('\n'),
            '\t' => cleaned.push(' '),
            c if c.is_control() => {}
            c => match ligature(c) {
                Some(spelled) => cleaned.push_str(spelled),
                None => cleaned.push(c),
            },
        }
    }

    RE_SPECIAL
        .replace_all(&cleaned, |caps: &Captures| -> String {
            match &caps[0] {
                "\\" => r"\textbackslash{}".to_string(),
                "~" => r"\textasciitilde{}".to_string(),
                "^" => r"\textasciicircum{}".to_string(),
                other => format!(r"\{other}"),
            }
        })
        .into_owned()
}

fn ligature(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{FB00}' => "ff",
        '\u{FB01}' => "fi",
        '\u{FB02}' => "fl",
        '\u{FB03}' => "ffi",
        '\u{FB04}' => "ffl",
        '\u{FB05}' | '\u{FB06}' => "st",
        _ => return None,
    })
}

/// Escape for single-line contexts (titles, author): newlines become spaces.
fn escape_inline(text: &str) -> String {
    escape_latex(text).replace('\n', " ")
}

/// Blank lines separate paragraphs; single line breaks are kept with
/// `\newline`, which unlike `\\` never swallows a following `[`.
fn render_text_body(text: &str) -> String {
    let escaped = escape_latex(text);

    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in escaped.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    if paragraphs.is_empty() {
        return EMPTY_BODY.to_string();
    }

    paragraphs
        .iter()
        .map(|lines| lines.join("\\newline\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
