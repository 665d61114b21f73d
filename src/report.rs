// WHY: tabular dump of every classified newline for inspection and threshold calibration

use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::label::{BreakKind, Label};
use crate::predictor::ClassifiedNewline;

const HEADER: &[&str] = &[
    "document_id",
    "offset",
    "preceding_len",
    "following_len",
    "length_ratio",
    "next_starts_upper",
    "next_starts_lower",
    "next_starts_marker",
    "prev_ends_terminal",
    "prev_ends_continuation",
    "prev_is_heading",
    "next_is_blank",
    "prev_is_near_empty",
    "is_document_end",
    "label",
    "confidence",
    "source",
];

/// One classified newline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub document_id: String,
    pub offset: usize,
    pub preceding_len: usize,
    pub following_len: usize,
    pub length_ratio: f64,
    pub next_starts_upper: bool,
    pub next_starts_lower: bool,
    pub next_starts_marker: bool,
    pub prev_ends_terminal: bool,
    pub prev_ends_continuation: bool,
    pub prev_is_heading: bool,
    pub next_is_blank: bool,
    pub prev_is_near_empty: bool,
    pub is_document_end: bool,
    pub label: Label,
}

impl ReportRow {
    pub fn from_classified(item: &ClassifiedNewline<'_>) -> Self {
        let f = &item.features;
        Self {
            document_id: item.event.document_id.to_string(),
            offset: item.event.offset,
            preceding_len: f.preceding_len,
            following_len: f.following_len,
            length_ratio: f.length_ratio,
            next_starts_upper: f.next_starts_upper,
            next_starts_lower: f.next_starts_lower,
            next_starts_marker: f.next_starts_marker,
            prev_ends_terminal: f.prev_ends_terminal,
            prev_ends_continuation: f.prev_ends_continuation,
            prev_is_heading: f.prev_is_heading,
            next_is_blank: f.next_is_blank,
            prev_is_near_empty: f.prev_is_near_empty,
            is_document_end: f.is_document_end,
            label: item.label,
        }
    }

    fn tsv_line(&self) -> String {
        let flag = |b: bool| if b { "1" } else { "0" };
        // Ids are file paths or host identifiers; tabs would break the columns
        let id = self.document_id.replace(['\t', '\n'], " ");
        format!(
            "{}\t{}\t{}\t{}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{}",
            id,
            self.offset,
            self.preceding_len,
            self.following_len,
            self.length_ratio,
            flag(self.next_starts_upper),
            flag(self.next_starts_lower),
            flag(self.next_starts_marker),
            flag(self.prev_ends_terminal),
            flag(self.prev_ends_continuation),
            flag(self.prev_is_heading),
            flag(self.next_is_blank),
            flag(self.prev_is_near_empty),
            flag(self.is_document_end),
            self.label.kind,
            self.label.confidence,
            self.label.source,
        )
    }
}

/// Rows for every newline of a training run or a prediction batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: &ClassifiedNewline<'_>) {
        self.rows.push(ReportRow::from_classified(item));
    }

    pub fn extend<'a>(&mut self, items: impl IntoIterator<Item = ClassifiedNewline<'a>>) {
        self.rows
            .extend(items.into_iter().map(|item| ReportRow::from_classified(&item)));
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (space, end_line) counts
    pub fn label_counts(&self) -> (usize, usize) {
        let end_lines = self
            .rows
            .iter()
            .filter(|row| row.label.kind == BreakKind::EndLine)
            .count();
        (self.rows.len() - end_lines, end_lines)
    }

    /// Header line followed by one line per row, each newline-terminated
    pub fn to_tsv(&self) -> String {
        let mut out = HEADER.join("\t");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.tsv_line());
            out.push('\n');
        }
        out
    }

    /// Write the TSV form to `path`
    pub async fn write_tsv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = tokio::fs::File::create(path.as_ref()).await?;
        let mut writer = BufWriter::new(file);

        writer.write_all(HEADER.join("\t").as_bytes()).await?;
        writer.write_all(b"\n").await?;
        for row in &self.rows {
            writer.write_all(row.tsv_line().as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }

        writer.flush().await?;
        Ok(())
    }
}
