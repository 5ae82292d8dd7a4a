use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::types::{Percentage, SummaryError};

/// Overall percentages from a `ctcpost -x` report.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcSummary {
    pub statement: Percentage,
    pub multicondition: Percentage,
}

pub fn read_summary(path: &Path) -> Result<CtcSummary, SummaryError> {
    let text = fs::read_to_string(path).map_err(|source| SummaryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = Document::parse(&text).map_err(|source| SummaryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    parse_summary(&doc)
}

/// Reads `<overall_summary><statement_ter>` and `<overall_summary><ter>` below the root.
pub fn parse_summary(doc: &Document) -> Result<CtcSummary, SummaryError> {
    let overall = child(doc.root_element(), "overall_summary")?;
    Ok(CtcSummary {
        statement: percent(overall, "statement_ter")?,
        multicondition: percent(overall, "ter")?,
    })
}

fn child<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> Result<Node<'a, 'input>, SummaryError> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .ok_or(SummaryError::MissingElement(tag))
}

fn percent(node: Node, tag: &'static str) -> Result<Percentage, SummaryError> {
    let value = child(node, tag)?.text().unwrap_or("").trim();
    Percentage::parse(value).ok_or_else(|| SummaryError::InvalidPercentage {
        element: tag,
        value: value.to_string(),
    })
}
