//! Aligned plain-text table rendering for terminal reports.

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    output.push_str(&format_row(headers, &widths));
    output.push('\n');
    let separators: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    output.push_str(&format_row(&separators, &widths));
    output.push('\n');
    for row in rows {
        output.push_str(&format_row(row, &widths));
        output.push('\n');
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        let mut cell = sanitize_cell(value);
        let padding = width.saturating_sub(cell.chars().count());
        cell.push_str(&" ".repeat(padding));
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

/// Control characters would break the alignment, so they render as spaces.
fn sanitize_cell(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn aligns_columns_and_trims_trailing_spaces() {
        let headers = owned(&["column", "type"]);
        let rows = vec![owned(&["id", "integer"]), owned(&["name", "text"])];
        let rendered = render_table(&headers, &rows);
        assert_eq!(
            rendered,
            "column  type\n\
             ------  -------\n\
             id      integer\n\
             name    text\n"
        );
    }

    #[test]
    fn short_headers_still_get_a_separator() {
        let rendered = render_table(&owned(&["a"]), &[owned(&["x"])]);
        assert!(rendered.starts_with("a\n---\n"));
    }

    #[test]
    fn sanitizes_control_characters() {
        let rendered = render_table(&owned(&["v"]), &[owned(&["a\tb"])]);
        assert!(rendered.contains("a b"));
    }
}
