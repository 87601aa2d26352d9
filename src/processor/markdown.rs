use crate::table::Table;

use super::TableProcessor;

/// Markdown pipe table with a header and a `|---|` divider row.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTableProcessor;

fn render_line<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        // Pipes inside a cell would split it.
        line.push_str(&cell.as_ref().replace('|', "\\|"));
        line.push_str(" |");
    }
    line
}

impl TableProcessor for MarkdownTableProcessor {
    fn serialize_table(&self, table: &Table) -> String {
        if table.columns().is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(table.len() + 2);
        lines.push(render_line(table.columns()));
        lines.push(format!("|{}", "---|".repeat(table.columns().len())));
        for row in table.rows() {
            lines.push(render_line(row.iter().map(ToString::to_string)));
        }
        lines.join("\n")
    }
}
