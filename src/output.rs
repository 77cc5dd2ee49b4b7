use dbdesk::TabularResult;

/// Render a result set as left-aligned text columns with a header rule.
pub fn render_table(result: &TabularResult) -> String {
    if result.columns.is_empty() {
        return String::from("(no columns)\n");
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&result.columns));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!("({} row{})\n", cells.len(), if cells.len() == 1 { "" } else { "s" }));
    out
}

pub fn print_table(result: &TabularResult) {
    print!("{}", render_table(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbdesk::SqlValue;

    #[test]
    fn aligns_columns_and_shows_nulls() {
        let result = TabularResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![SqlValue::Int(1), SqlValue::Text("ada".into())],
                vec![SqlValue::Int(10), SqlValue::Null],
            ],
        };
        assert_eq!(
            render_table(&result),
            "id | name\n---+-----\n1  | ada\n10 | NULL\n(2 rows)\n"
        );
    }

    #[test]
    fn empty_result_keeps_header() {
        let result = TabularResult {
            columns: vec!["a".into()],
            rows: vec![],
        };
        assert_eq!(render_table(&result), "a\n-\n(0 rows)\n");
    }
}
