//! Subset of the Docs v1 document resource and the batch requests built
//! from it.
//!
//! Only the parts needed to locate tag markers and named ranges are
//! modelled; everything else in the response is ignored.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use serde_json::{Value, json};

use docflow_core::traits::{DocumentContent, NamedRange};
use docflow_core::types::find_tags;

/// A document as returned by `GET documents/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsDocument {
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub named_ranges: HashMap<String, NamedRangeGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StructuralElement {
    #[serde(default)]
    pub paragraph: Option<Paragraph>,
    #[serde(default)]
    pub table: Option<Table>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRangeGroup {
    #[serde(default)]
    pub named_ranges: Vec<DocsNamedRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsNamedRange {
    pub named_range_id: String,
    pub name: String,
}

/// Contiguous text of one paragraph and its body index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub start_index: usize,
    pub text: String,
}

impl DocsDocument {
    /// Paragraph texts in reading order, descending into tables.
    pub fn segments(&self) -> Vec<TextSegment> {
        let mut out = Vec::new();
        if let Some(body) = &self.body {
            collect_segments(&body.content, &mut out);
        }
        out
    }

    /// Structural view handed to callers of the store.
    pub fn to_content(&self) -> DocumentContent {
        let mut named_ranges: Vec<NamedRange> = self
            .named_ranges
            .values()
            .flat_map(|group| group.named_ranges.iter())
            .map(|r| NamedRange {
                name: r.name.clone(),
                range_id: r.named_range_id.clone(),
            })
            .collect();
        named_ranges.sort_by(|a, b| a.name.cmp(&b.name).then(a.range_id.cmp(&b.range_id)));

        let body_text = self.segments().into_iter().map(|s| s.text).collect();
        DocumentContent {
            named_ranges,
            body_text,
        }
    }

    /// One `createNamedRange` request per tag marker in the body whose
    /// name has no named range yet.
    pub fn tag_range_requests(&self) -> Vec<Value> {
        self.segments()
            .iter()
            .flat_map(|segment| {
                find_tags(&segment.text)
                    .into_iter()
                    .filter(|tag| !self.named_ranges.contains_key(&tag.name))
                    .map(move |tag| {
                        json!({
                            "createNamedRange": {
                                "name": tag.name,
                                "range": {
                                    "startIndex": segment.start_index + tag.utf16_start,
                                    "endIndex": segment.start_index + tag.utf16_end,
                                }
                            }
                        })
                    })
            })
            .collect()
    }

    /// One `deleteNamedRange` request per distinct range name.
    pub fn clear_range_requests(&self) -> Vec<Value> {
        let names: BTreeSet<&str> = self
            .named_ranges
            .values()
            .flat_map(|group| group.named_ranges.iter())
            .map(|r| r.name.as_str())
            .chain(self.named_ranges.keys().map(String::as_str))
            .collect();
        names
            .into_iter()
            .map(|name| json!({ "deleteNamedRange": { "name": name } }))
            .collect()
    }
}

fn collect_segments(elements: &[StructuralElement], out: &mut Vec<TextSegment>) {
    for element in elements {
        if let Some(paragraph) = &element.paragraph {
            let start_index = paragraph
                .elements
                .iter()
                .find_map(|e| e.start_index)
                .unwrap_or(0);
            let text: String = paragraph
                .elements
                .iter()
                .filter_map(|e| e.text_run.as_ref())
                .map(|run| run.content.as_str())
                .collect();
            if !text.is_empty() {
                out.push(TextSegment { start_index, text });
            }
        }
        if let Some(table) = &element.table {
            for row in &table.table_rows {
                for cell in &row.table_cells {
                    collect_segments(&cell.content, out);
                }
            }
        }
    }
}

/// Request replacing the text of every range called `name`.
pub fn replace_range_request(name: &str, text: &str) -> Value {
    json!({
        "replaceNamedRangeContent": {
            "namedRangeName": name,
            "text": text,
        }
    })
}
