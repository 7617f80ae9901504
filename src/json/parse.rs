//! Purpose: Provide the internal JSON decode entrypoints used by loading.
//! Exports: `from_slice`, `ParseFailureCategory`, `categorize_error`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Category labels are stable; hints never echo document content.
//! Notes: Error mapping into `Error` is done by callsites so path context stays explicit.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

pub(crate) fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(input)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Truncated,
    Utf8,
    DepthLimit,
    Shape,
    Unknown,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Truncated => "truncated",
            ParseFailureCategory::Utf8 => "utf8",
            ParseFailureCategory::DepthLimit => "depth-limit",
            ParseFailureCategory::Shape => "shape",
            ParseFailureCategory::Unknown => "unknown",
        }
    }
}

pub(crate) fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    match categorize_message(&err.to_string()) {
        ParseFailureCategory::Unknown => match err.classify() {
            Category::Syntax => ParseFailureCategory::Syntax,
            Category::Eof => ParseFailureCategory::Truncated,
            Category::Data => ParseFailureCategory::Shape,
            Category::Io => ParseFailureCategory::Unknown,
        },
        category => category,
    }
}

pub(crate) fn categorize_message(message: &str) -> ParseFailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("recursion limit") {
        return ParseFailureCategory::DepthLimit;
    }
    if lower.contains("utf-8") || lower.contains("utf8") || lower.contains("unicode") {
        return ParseFailureCategory::Utf8;
    }
    ParseFailureCategory::Unknown
}

pub(crate) fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    let category = categorize_error(err);
    let advice = match category {
        ParseFailureCategory::Syntax => "the file is not valid JSON",
        ParseFailureCategory::Truncated => "the file ends early; it may be truncated or empty",
        ParseFailureCategory::Utf8 => "the file is not valid UTF-8 text",
        ParseFailureCategory::DepthLimit => "the document nests too deeply",
        ParseFailureCategory::Shape => "the document does not have the expected shape",
        ParseFailureCategory::Unknown => "the document could not be decoded",
    };
    format!(
        "{advice} (parse category: {}; line {}, column {}; context: {context})",
        category.label(),
        err.line(),
        err.column()
    )
}
