//! Borderless fixed-width text tables for monospace chat blocks.

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A table whose cells may span several lines.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<(String, Align)>,
    rows: Vec<Vec<Vec<String>>>,
}

impl TextTable {
    pub fn new(headers: &[(&str, Align)]) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|(name, align)| (name.to_string(), *align))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row; each cell is a list of lines.
    pub fn add_row(&mut self, cells: Vec<Vec<String>>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, (name, _))| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .flatten()
                    .map(|line| line.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render with one space of padding around every cell.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = Vec::new();

        let header: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        lines.push(self.render_line(&header, &widths));

        for row in &self.rows {
            let height = row.iter().map(Vec::len).max().unwrap_or(0).max(1);
            for i in 0..height {
                let cells: Vec<&str> = (0..self.headers.len())
                    .map(|col| {
                        row.get(col)
                            .and_then(|cell| cell.get(i))
                            .map(String::as_str)
                            .unwrap_or("")
                    })
                    .collect();
                lines.push(self.render_line(&cells, &widths));
            }
        }

        lines.join("\n")
    }

    fn render_line(&self, cells: &[&str], widths: &[usize]) -> String {
        let mut line = String::new();
        for ((cell, width), (_, align)) in cells.iter().zip(widths).zip(&self.headers) {
            let padded = match align {
                Align::Left => format!(" {:<width$} ", cell, width = *width),
                Align::Right => format!(" {:>width$} ", cell, width = *width),
            };
            line.push_str(&padded);
        }
        line.trim_end().to_string()
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_words() {
        assert_eq!(
            wrap("The Matrix 1999 1080p BluRay x264", 18),
            vec!["The Matrix 1999", "1080p BluRay x264"]
        );
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(
            wrap("The.Matrix.1999.1080p.BluRay", 10),
            vec!["The.Matrix", ".1999.1080", "p.BluRay"]
        );
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("   ", 18).is_empty());
    }

    #[test]
    fn test_render_multiline_rows() {
        let mut table = TextTable::new(&[("No.", Align::Right), ("Title", Align::Left)]);
        table.add_row(vec![vec!["1".into()], vec!["first".into(), "second".into()]]);

        assert_eq!(table.render(), " No.  Title\n   1  first\n      second");
    }
}
