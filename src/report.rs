use crate::config::{ColumnKind, ColumnSpec};
use crate::error::LogTagError;
use crate::input::LogLine;
use crate::matcher::{MatchResult, TagMatcher};
use comfy_table::Table;
use comfy_table::presets::NOTHING;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Separator used between multiple tags or categories in one cell.
pub const JOIN_SEPARATOR: &str = ", ";

/// One output row: display title to rendered value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    cells: Vec<(String, String)>,
}

impl ReportRow {
    pub fn get(&self, title: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, v)| v.as_str())
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(t, _)| t.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// Serialised as an object whose keys keep column order.
impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (title, value) in &self.cells {
            map.serialize_entry(title, value)?;
        }
        map.end()
    }
}

fn column_value(kind: ColumnKind, line: &LogLine, result: &MatchResult<'_>) -> String {
    match kind {
        ColumnKind::Tag => result.messages().collect::<Vec<_>>().join(JOIN_SEPARATOR),
        ColumnKind::Category => result
            .category_names()
            .collect::<Vec<_>>()
            .join(JOIN_SEPARATOR),
        ColumnKind::File => line.file.display().to_string(),
        ColumnKind::Log => line.text.clone(),
    }
}

/// Build the row for one line. Disabled columns are left out entirely.
pub fn build_row(line: &LogLine, result: &MatchResult<'_>, columns: &[ColumnSpec]) -> ReportRow {
    let cells = columns
        .iter()
        .filter(|col| col.enabled)
        .map(|col| (col.title.clone(), column_value(col.kind, line, result)))
        .collect();
    ReportRow { cells }
}

/// The finished table: headers plus rows in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Render as plain aligned text: no borders, two spaces between columns.
    ///
    /// The last column is appended as-is, so LOG text keeps its exact
    /// whitespace.
    pub fn to_table(&self) -> String {
        let Some((last_header, lead_headers)) = self.headers.split_last() else {
            return String::new();
        };
        let lead_len = lead_headers.len();

        let leads: Vec<String> = if lead_len == 0 {
            vec![String::new(); self.rows.len() + 1]
        } else {
            let mut table = Table::new();
            table.load_preset(NOTHING);
            table.set_header(lead_headers.to_vec());
            for row in &self.rows {
                table.add_row(row.values().take(lead_len).collect::<Vec<_>>());
            }
            for column in table.column_iter_mut() {
                column.set_padding((0, 2));
            }
            table.to_string().lines().map(str::to_string).collect()
        };

        let lasts = std::iter::once(last_header.as_str())
            .chain(self.rows.iter().map(|row| row.values().nth(lead_len).unwrap_or("")));
        leads
            .iter()
            .zip(lasts)
            .map(|(lead, last)| format!("{lead}{last}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render as a JSON array of row objects.
    pub fn to_json(&self) -> Result<String, LogTagError> {
        serde_json::to_string_pretty(&self.rows).map_err(|e| LogTagError::Render(e.to_string()))
    }
}

/// Turns lines into report rows.
#[derive(Debug, Clone)]
pub struct ReportBuilder<'a> {
    columns: &'a [ColumnSpec],
    /// Only keep lines with at least one match.
    uniq: bool,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(columns: &'a [ColumnSpec]) -> Self {
        Self {
            columns,
            uniq: false,
        }
    }

    pub fn uniq(mut self, uniq: bool) -> Self {
        self.uniq = uniq;
        self
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|col| col.enabled)
            .map(|col| col.title.clone())
            .collect()
    }

    /// Match every line in order and build its row.
    pub fn build(&self, lines: &[LogLine], matcher: &TagMatcher<'_>) -> Report {
        let mut rows = Vec::with_capacity(lines.len());
        let mut tagged = 0usize;

        for line in lines {
            let result = matcher.match_line(line);
            if !result.is_empty() {
                tagged += 1;
            } else if self.uniq {
                continue;
            }
            rows.push(build_row(line, &result, self.columns));
        }

        tracing::info!(lines = lines.len(), tagged, rows = rows.len(), "built report");

        Report {
            headers: self.headers(),
            rows,
        }
    }
}
