/// Extra width every header gets beyond its own text.
const HEADER_PADDING: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(i64),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// Org-mode table: text columns left aligned, numeric columns right aligned.
#[derive(Debug, Default)]
pub struct OrgTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl OrgTable {
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// A column is numeric when it has rows and every cell in it is a number.
    fn is_numeric(&self, column: usize) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|row| matches!(row.get(column), Some(Cell::Number(_))))
    }

    #[must_use]
    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                (0..columns)
                    .map(|i| row.get(i).map(Cell::render).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..columns)
            .map(|i| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(self.headers[i].chars().count() + HEADER_PADDING))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let numeric: Vec<bool> = (0..columns).map(|i| self.is_numeric(i)).collect();

        let format_line = |cells: &[String]| -> String {
            let body: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if numeric[i] {
                        format!(" {:>width$} ", cell, width = widths[i])
                    } else {
                        format!(" {:<width$} ", cell, width = widths[i])
                    }
                })
                .collect();
            format!("|{}|", body.join("|"))
        };

        let separator = format!(
            "|{}|",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );

        let mut lines = Vec::with_capacity(rendered.len() + 2);
        lines.push(format_line(&self.headers));
        lines.push(separator);
        lines.extend(rendered.iter().map(|row| format_line(row)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_text_left_and_numbers_right() {
        let mut table = OrgTable::new(["URI", "Ping"]);
        table.push_row(vec![Cell::Text("tcp://a:1".into()), Cell::Number(5)]);
        table.push_row(vec![Cell::Text("tls://bb:22".into()), Cell::Number(-1)]);

        let expected = "\
| URI         |   Ping |
|-------------+--------|
| tcp://a:1   |      5 |
| tls://bb:22 |     -1 |";
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn empty_table_has_header_and_separator() {
        let table = OrgTable::new(["URI"]);
        assert_eq!(table.render(), "| URI   |\n|-------|");
    }
}
