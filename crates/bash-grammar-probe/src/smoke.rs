//! Smoke parsing: run a loaded grammar over sample scripts.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

use crate::adapter::LanguageHandle;
use crate::error::SmokeError;

/// A named Bash source with the expected parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeSample {
    pub name: String,
    pub source: String,
    /// The sample is broken on purpose and must produce error nodes.
    #[serde(default)]
    pub expect_error: bool,
    /// Kind of the root node.
    #[serde(default)]
    pub root_kind: Option<String>,
    /// Kind of the first named node under the root.
    #[serde(default)]
    pub first_statement: Option<String>,
}

impl SmokeSample {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            expect_error: false,
            root_kind: None,
            first_statement: None,
        }
    }
}

/// Location of the first error or missing node (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
    pub byte_range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    pub root_kind: String,
    pub first_statement: Option<String>,
    pub has_error: bool,
    pub error: Option<ErrorLocation>,
}

/// Result of checking one sample.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ParseSummary>,
}

/// Parses `source` once with a fresh parser.
pub fn smoke_parse(handle: &LanguageHandle, source: &str) -> Result<ParseSummary, SmokeError> {
    let mut parser = Parser::new();
    parser
        .set_language(handle.language())
        .map_err(SmokeError::ParserInit)?;
    let tree = parser.parse(source, None).ok_or(SmokeError::NoTree)?;
    Ok(summarize(&tree))
}

/// Parses a sample and checks it against its expectation.
pub fn check_sample(
    handle: &LanguageHandle,
    sample: &SmokeSample,
) -> Result<ParseSummary, SmokeError> {
    let summary = smoke_parse(handle, &sample.source)?;

    if sample.expect_error {
        if !summary.has_error {
            return Err(SmokeError::UnexpectedSuccess {
                name: sample.name.clone(),
            });
        }
        return Ok(summary);
    }

    if let Some(error) = &summary.error {
        return Err(SmokeError::SyntaxError {
            name: sample.name.clone(),
            line: error.line,
            column: error.column,
            byte_range: error.byte_range.clone(),
        });
    }

    if let Some(expected) = &sample.root_kind {
        if summary.root_kind != *expected {
            return Err(SmokeError::KindMismatch {
                name: sample.name.clone(),
                what: "root",
                expected: expected.clone(),
                actual: summary.root_kind.clone(),
            });
        }
    }

    if let Some(expected) = &sample.first_statement {
        let actual = summary.first_statement.as_deref().unwrap_or("");
        if actual != expected {
            return Err(SmokeError::KindMismatch {
                name: sample.name.clone(),
                what: "first statement",
                expected: expected.clone(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(summary)
}

/// Checks every sample, collecting one outcome per sample.
pub fn run_samples(handle: &LanguageHandle, samples: &[SmokeSample]) -> Vec<SmokeOutcome> {
    samples
        .iter()
        .map(|sample| match check_sample(handle, sample) {
            Ok(summary) => SmokeOutcome {
                name: sample.name.clone(),
                passed: true,
                message: None,
                summary: Some(summary),
            },
            Err(e) => SmokeOutcome {
                name: sample.name.clone(),
                passed: false,
                message: Some(e.to_string()),
                summary: None,
            },
        })
        .collect()
}

fn summarize(tree: &Tree) -> ParseSummary {
    let root = tree.root_node();
    let mut cursor = root.walk();
    let first_statement = root
        .named_children(&mut cursor)
        .next()
        .map(|node| node.kind().to_string());

    let has_error = root.has_error();
    let error = has_error.then(|| locate_error(root));

    ParseSummary {
        root_kind: root.kind().to_string(),
        first_statement,
        has_error,
        error,
    }
}

fn locate_error(root: Node) -> ErrorLocation {
    fn find_error_recursive(node: Node) -> Option<Node> {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(error_node) = find_error_recursive(child) {
                return Some(error_node);
            }
        }
        None
    }

    let node = find_error_recursive(root).unwrap_or(root);
    let pos = node.start_position();
    ErrorLocation {
        line: pos.row + 1,
        column: pos.column + 1,
        byte_range: node.start_byte()..node.end_byte(),
    }
}
