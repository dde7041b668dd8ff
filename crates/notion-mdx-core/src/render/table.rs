//! Table rule
//!
//! Rows arrive as already-translated cell strings. Output is always a
//! well-formed pipe table: short rows are padded to the widest row, and a
//! blank header is synthesized when the source has none.

/// Escape pipes so cell text can't split a cell
pub fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Render rows to table lines, framed by blank lines.
///
/// Returns nothing for zero rows or rows that are all zero-width.
pub fn render_table(mut rows: Vec<Vec<String>>, has_column_header: bool) -> Vec<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Vec::new();
    }

    for row in &mut rows {
        row.resize(width, String::new());
    }

    let separator = row_line(&vec!["---".to_string(); width]);
    let mut out = vec![String::new()];

    let header = if has_column_header {
        rows.remove(0)
    } else {
        vec![String::new(); width]
    };
    out.push(row_line(&header));
    out.push(separator);
    out.extend(rows.iter().map(|row| row_line(row)));

    out.push(String::new());
    out
}

fn row_line(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}
