use crate::metrics::{TextFont, TextMetrics, wrap};

use super::cursor::PageCursor;

/// Padding kept between a cell's wrapped text and the next column.
const CELL_PADDING: f32 = 5.0;

pub(super) struct GridCell<'a> {
    pub(super) label: String,
    pub(super) text: &'a str,
}

/// Text drawn once, on the first line of a row.
pub(super) struct RowLead<'a> {
    pub(super) x: f32,
    pub(super) text: &'a str,
    pub(super) font: TextFont,
}

/// Wrapped lines stacked at a fixed x.
pub(super) struct RowColumn<'a> {
    pub(super) x: f32,
    pub(super) lines: &'a [String],
    pub(super) font: TextFont,
}

/// Top-aligned row of side-by-side columns.
pub(super) struct Row<'a> {
    pub(super) leads: Vec<RowLead<'a>>,
    pub(super) columns: Vec<RowColumn<'a>>,
    pub(super) line_height: f32,
    /// Space that must be free before the row starts, on top of its height.
    pub(super) min_space: f32,
}

impl Row<'_> {
    fn line_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.lines.len())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Place the row at the cursor and leave the cursor `gap` below it.
    ///
    /// A row that fits on a page moves to a new page as a whole when it would
    /// cross the bottom margin. A row taller than a whole page is placed line
    /// by line instead, each line index checking the bottom margin, so its
    /// remaining lines continue on the next page.
    pub(super) fn place(&self, cursor: &mut PageCursor, gap: f32) {
        let geometry = *cursor.geometry();
        let count = self.line_count();
        let height = count as f32 * self.line_height;
        let room = geometry.bottom_limit() - geometry.margin;

        if height.max(self.min_space) <= room {
            cursor.ensure_space(height.max(self.min_space));
            let y = cursor.y();
            for lead in &self.leads {
                cursor.text(lead.x, y, lead.text, lead.font);
            }
            for column in &self.columns {
                for (i, line) in column.lines.iter().enumerate() {
                    cursor.text(column.x, y + i as f32 * self.line_height, line, column.font);
                }
            }
            cursor.advance(height + gap);
            return;
        }

        cursor.ensure_space(self.min_space);
        for i in 0..count {
            if i > 0 {
                cursor.advance(self.line_height);
            }
            cursor.ensure_space(0.0);
            let y = cursor.y();
            if i == 0 {
                for lead in &self.leads {
                    cursor.text(lead.x, y, lead.text, lead.font);
                }
            }
            for column in &self.columns {
                if let Some(line) = column.lines.get(i) {
                    cursor.text(column.x, y, line, column.font);
                }
            }
        }
        cursor.advance(self.line_height + gap);
    }
}

/// Equal-width columns filled row-major. Each cell is a label followed by
/// wrapped text; cells in a row share the row's top baseline.
pub(super) struct Grid {
    pub(super) x: f32,
    pub(super) width: f32,
    pub(super) columns: usize,
    pub(super) line_height: f32,
    pub(super) row_gap: f32,
    pub(super) label_font: TextFont,
    pub(super) text_font: TextFont,
}

struct CellLayout {
    label: String,
    label_width: f32,
    lines: Vec<String>,
}

impl Grid {
    fn column_width(&self) -> f32 {
        self.width / self.columns as f32
    }

    /// First pass: wrap every cell. Row heights follow from the tallest cell.
    fn measure(&self, metrics: &dyn TextMetrics, cells: &[GridCell]) -> Vec<CellLayout> {
        let col_w = self.column_width();
        cells
            .iter()
            .map(|cell| {
                let label_width = metrics.measure_width(&format!("{} ", cell.label), self.label_font);
                let lines = wrap(metrics, cell.text, col_w - label_width - CELL_PADDING, self.text_font);
                CellLayout {
                    label: cell.label.clone(),
                    label_width,
                    lines,
                }
            })
            .collect()
    }

    /// Second pass: place rows top to bottom starting at the cursor. Leaves
    /// the cursor below the last row's gap.
    pub(super) fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics, cells: &[GridCell]) {
        if cells.is_empty() || self.columns == 0 {
            return;
        }
        let col_w = self.column_width();
        let layouts = self.measure(metrics, cells);

        for row_cells in layouts.chunks(self.columns) {
            let row = Row {
                leads: row_cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| RowLead {
                        x: self.x + col as f32 * col_w,
                        text: &cell.label,
                        font: self.label_font,
                    })
                    .collect(),
                columns: row_cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| RowColumn {
                        x: self.x + col as f32 * col_w + cell.label_width,
                        lines: &cell.lines,
                        font: self.text_font,
                    })
                    .collect(),
                line_height: self.line_height,
                min_space: 0.0,
            };
            row.place(cursor, self.row_gap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FontStyle;
    use crate::pdf::PageGeometry;

    const FONT: TextFont = TextFont::new(FontStyle::Normal, 12.0);

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn short_row_moves_to_the_next_page_whole() {
        let mut cursor = PageCursor::new(PageGeometry::A4);
        cursor.advance(250.0);
        let text = lines(3);
        let row = Row {
            leads: vec![RowLead { x: 20.0, text: "1.", font: FONT }],
            columns: vec![RowColumn { x: 30.0, lines: &text, font: FONT }],
            line_height: 6.0,
            min_space: 20.0,
        };
        row.place(&mut cursor, 2.0);

        let pages = cursor.finish();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].ops.is_empty());
        let ys: Vec<f32> = pages[1].texts().map(|(_, y, _, _)| y).collect();
        assert_eq!(ys, vec![20.0, 20.0, 26.0, 32.0]);
    }

    #[test]
    fn oversized_row_continues_line_by_line() {
        let mut cursor = PageCursor::new(PageGeometry::A4);
        let left = lines(60);
        let right = lines(2);
        let row = Row {
            leads: vec![RowLead { x: 20.0, text: "1.", font: FONT }],
            columns: vec![
                RowColumn { x: 30.0, lines: &left, font: FONT },
                RowColumn { x: 105.0, lines: &right, font: FONT },
            ],
            line_height: 6.0,
            min_space: 20.0,
        };
        row.place(&mut cursor, 2.0);
        let pages = cursor.finish();

        assert_eq!(pages.len(), 2);
        let placed: usize = pages.iter().map(|p| p.texts().count()).sum();
        assert_eq!(placed, 1 + 60 + 2);
        for page in &pages {
            assert!(page.texts().all(|(_, y, _, _)| y <= 277.0));
        }
        // Lead and both columns start on the same baseline.
        let first: Vec<f32> = pages[0].texts().take(3).map(|(_, y, _, _)| y).collect();
        assert_eq!(first, vec![20.0, 20.0, 20.0]);
    }
}
