use tabled::{settings::Style, Table, Tabled};

use crate::{BackendStats, DialogueGroup, DialogueLine};

const PREVIEW_CHARS: usize = 60;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Text")]
    text: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Elements")]
    elements: usize,
    #[tabled(rename = "First")]
    first: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &BackendStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Lines stored", &stats.stored_lines.to_string());
    builder.add_row("Lines cached", &stats.cached_lines.to_string());
    builder.add_row("Groups stored", &stats.stored_groups.to_string());
    builder.add_row("Groups cached", &stats.cached_groups.to_string());
    builder.add_row("Line reloads", &stats.line_generation.to_string());
    builder.add_row("Group reloads", &stats.group_generation.to_string());
    builder.build()
}

pub fn lines_table(lines: &[DialogueLine]) -> String {
    let rows: Vec<LineRow> = lines
        .iter()
        .map(|line| LineRow {
            id: line.id,
            text: preview(&line.text),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn groups_table(groups: &[DialogueGroup]) -> String {
    let rows: Vec<GroupRow> = groups
        .iter()
        .map(|group| GroupRow {
            id: group.id.clone(),
            elements: group.len(),
            first: group.elements.first().map(|s| preview(s)).unwrap_or_default(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// First line of `text`, truncated for table cells
fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let mut out: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("two\nlines"), "two…");
        let long = "x".repeat(PREVIEW_CHARS + 5);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_lines_table_contains_rows() {
        let table = lines_table(&[DialogueLine::new(1, "Hello"), DialogueLine::new(2, "World")]);
        assert!(table.contains("Hello"));
        assert!(table.contains("World"));
    }

    #[test]
    fn test_stats_table_includes_reloads() {
        let table = stats_table(&BackendStats {
            stored_lines: 3,
            stored_groups: 2,
            cached_lines: 3,
            cached_groups: 2,
            line_generation: 7,
            group_generation: 5,
        });
        assert!(table.contains("Line reloads"));
        assert!(table.contains("Group reloads"));
        assert!(table.contains('7'));
        assert!(table.contains('5'));
    }

    #[test]
    fn test_empty_stats_builder() {
        assert!(TableBuilder::new().build().is_empty());
    }
}
