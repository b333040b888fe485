use crate::metrics::{FontStyle, TextFont, TextMetrics, wrap};
use crate::model::{
    MatchSection, McqSection, MemoryVerseSection, PartSection, QaSection, Section, section_title,
};

use super::cursor::PageCursor;
use super::draw_centered;
use super::grid::{Grid, GridCell, Row, RowColumn, RowLead};

const TITLE_FONT: TextFont = TextFont::new(FontStyle::Bold, 14.0);
const BODY_FONT: TextFont = TextFont::new(FontStyle::Normal, 12.0);
const LABEL_FONT: TextFont = TextFont::new(FontStyle::Bold, 12.0);

/// Space reserved before a section starts, so a title is never left alone
/// at the bottom of a page.
const SECTION_LEAD: f32 = 50.0;
const PART_LEAD: f32 = 30.0;
/// Space reserved before each free-response question or matching pair.
const ITEM_LEAD: f32 = 20.0;

const TITLE_GAP: f32 = 8.0;
const SECTION_GAP: f32 = 8.0;
const LINE_HEIGHT: f32 = 5.5;

const MCQ_ESTIMATE_BASE: f32 = 20.0;
const MCQ_ESTIMATE_PER_OPTION: f32 = 6.0;
const MCQ_MAX_COLUMNS: usize = 4;
const OPTION_ROW_GAP: f32 = 2.0;
const MCQ_QUESTION_GAP: f32 = 3.0;

const QA_QUESTION_GAP: f32 = 7.0;

const PAIR_LINE_HEIGHT: f32 = 6.0;
const PAIR_LEFT_INDENT: f32 = 10.0;
const PAIR_LEFT_SHARE: f32 = 0.35;
const PAIR_DASH_AT: f32 = 0.4;
const PAIR_RIGHT_AT: f32 = 0.5;
const PAIR_RIGHT_SHARE: f32 = 0.5;
const PAIR_GAP: f32 = 2.0;

const VERSE_COLUMNS: usize = 4;
const VERSE_LINE_HEIGHT: f32 = 5.0;
const VERSE_ROW_GAP: f32 = 1.0;
const VERSE_TRAILING_GAP: f32 = 6.0;
const VERSE_SECTION_GAP: f32 = 2.0;

const PART_GAP: f32 = 10.0;

/// One renderer per section kind. Each draws at the cursor and leaves it
/// below the section.
pub(crate) trait RenderSection {
    /// Height that must fit on the page before the section starts.
    fn lead_space(&self) -> f32 {
        SECTION_LEAD
    }

    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics);
}

impl RenderSection for Section<'_> {
    fn lead_space(&self) -> f32 {
        match self {
            Section::MultipleChoice(s) => s.lead_space(),
            Section::FreeResponse(s) => s.lead_space(),
            Section::Matching(s) => s.lead_space(),
            Section::MemoryVerse(s) => s.lead_space(),
            Section::PartTitle(s) => s.lead_space(),
        }
    }

    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        match self {
            Section::MultipleChoice(s) => s.render(cursor, metrics),
            Section::FreeResponse(s) => s.render(cursor, metrics),
            Section::Matching(s) => s.render(cursor, metrics),
            Section::MemoryVerse(s) => s.render(cursor, metrics),
            Section::PartTitle(s) => s.render(cursor, metrics),
        }
    }
}

/// Bold title at the margin with the marks label right-aligned on the same
/// baseline.
fn render_title(cursor: &mut PageCursor, metrics: &dyn TextMetrics, title: &str, marks: &str) {
    let geometry = *cursor.geometry();
    let y = cursor.y();
    cursor.text(geometry.margin, y, title, TITLE_FONT);
    if !marks.is_empty() {
        let width = metrics.measure_width(marks, TITLE_FONT);
        cursor.text(geometry.width - geometry.margin - width, y, marks, TITLE_FONT);
    }
    cursor.advance(TITLE_GAP);
}

fn number_label(number: usize) -> String {
    format!("{number}.")
}

/// Width taken by a question number, including the space after it.
fn number_indent(metrics: &dyn TextMetrics, number: usize) -> f32 {
    metrics.measure_width(&format!("{} ", number_label(number)), BODY_FONT)
}

/// Draws `"<n>."` at the margin and the wrapped text after it, continuation
/// lines aligned under the first line of text. Each line re-checks the page
/// bottom before it is drawn. The cursor is left on the last line's baseline.
fn render_numbered_text(
    cursor: &mut PageCursor,
    metrics: &dyn TextMetrics,
    number: usize,
    lines: &[String],
) {
    let margin = cursor.geometry().margin;
    let indent = number_indent(metrics, number);
    cursor.text(margin, cursor.y(), &number_label(number), BODY_FONT);
    for (i, line) in lines.iter().enumerate() {
        cursor.ensure_space(0.0);
        cursor.text(margin + indent, cursor.y(), line, BODY_FONT);
        if i + 1 < lines.len() {
            cursor.advance(LINE_HEIGHT);
        }
    }
}

fn question_lines(cursor: &PageCursor, metrics: &dyn TextMetrics, number: usize, text: &str) -> Vec<String> {
    let width = cursor.geometry().usable_width() - number_indent(metrics, number);
    wrap(metrics, text, width, BODY_FONT)
}

fn option_label(index: usize) -> String {
    format!("({})", char::from(b'a' + index as u8))
}

impl RenderSection for McqSection {
    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        let title = section_title(&self.section_number, &self.heading, &self.subtitle);
        render_title(cursor, metrics, &title, &self.marks_calculation);

        for (idx, question) in self.questions.iter().filter(|q| q.is_valid()).enumerate() {
            let number = idx + 1;
            let options = question.valid_options();

            // Heuristic only; each text line and grid row checks again.
            let estimate = MCQ_ESTIMATE_BASE + options.len() as f32 * MCQ_ESTIMATE_PER_OPTION;
            cursor.ensure_space(estimate);

            let lines = question_lines(cursor, metrics, number, &question.question);
            render_numbered_text(cursor, metrics, number, &lines);
            cursor.advance(LINE_HEIGHT);

            if !options.is_empty() {
                let geometry = *cursor.geometry();
                let indent = number_indent(metrics, number);
                let cells: Vec<GridCell> = options
                    .iter()
                    .enumerate()
                    .map(|(i, &text)| GridCell {
                        label: option_label(i),
                        text,
                    })
                    .collect();
                let grid = Grid {
                    x: geometry.margin + indent,
                    width: geometry.usable_width() - indent,
                    columns: options.len().min(MCQ_MAX_COLUMNS),
                    line_height: LINE_HEIGHT,
                    row_gap: OPTION_ROW_GAP,
                    label_font: LABEL_FONT,
                    text_font: BODY_FONT,
                };
                grid.render(cursor, metrics, &cells);
            }

            cursor.advance(MCQ_QUESTION_GAP);
        }

        cursor.advance(SECTION_GAP);
    }
}

impl RenderSection for QaSection {
    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        let title = section_title(&self.section_number, &self.heading, &self.instruction);
        render_title(cursor, metrics, &title, &self.marks_calculation);

        for (idx, question) in self.questions.iter().filter(|q| q.is_valid()).enumerate() {
            let number = idx + 1;
            cursor.ensure_space(ITEM_LEAD);
            let lines = question_lines(cursor, metrics, number, &question.question);
            render_numbered_text(cursor, metrics, number, &lines);
            cursor.advance(QA_QUESTION_GAP);
        }

        cursor.advance(SECTION_GAP);
    }
}

impl RenderSection for MatchSection {
    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        let title = section_title(&self.section_number, &self.heading, &self.instruction);
        render_title(cursor, metrics, &title, &self.marks_calculation);

        let geometry = *cursor.geometry();
        let usable = geometry.usable_width();
        let left_x = geometry.margin + PAIR_LEFT_INDENT;
        let dash_x = geometry.margin + usable * PAIR_DASH_AT;
        let right_x = geometry.margin + usable * PAIR_RIGHT_AT;

        for (idx, pair) in self.pairs.iter().filter(|p| p.is_valid()).enumerate() {
            let label = number_label(idx + 1);
            let left = wrap(metrics, &pair.left_item, usable * PAIR_LEFT_SHARE, BODY_FONT);
            let right = wrap(metrics, &pair.right_item, usable * PAIR_RIGHT_SHARE, BODY_FONT);
            let row = Row {
                leads: vec![
                    RowLead {
                        x: geometry.margin,
                        text: &label,
                        font: BODY_FONT,
                    },
                    RowLead {
                        x: dash_x,
                        text: "-",
                        font: BODY_FONT,
                    },
                ],
                columns: vec![
                    RowColumn {
                        x: left_x,
                        lines: &left,
                        font: BODY_FONT,
                    },
                    RowColumn {
                        x: right_x,
                        lines: &right,
                        font: BODY_FONT,
                    },
                ],
                line_height: PAIR_LINE_HEIGHT,
                min_space: ITEM_LEAD,
            };
            row.place(cursor, PAIR_GAP);
        }

        cursor.advance(SECTION_GAP);
    }
}

impl RenderSection for MemoryVerseSection {
    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        let title = section_title(&self.section_number, &self.heading, &self.instruction);
        render_title(cursor, metrics, &title, &self.marks_calculation);

        let cells: Vec<GridCell> = self
            .verses
            .iter()
            .filter(|v| v.is_valid())
            .enumerate()
            .map(|(idx, v)| GridCell {
                label: number_label(idx + 1),
                text: &v.verse,
            })
            .collect();

        if !cells.is_empty() {
            let geometry = *cursor.geometry();
            let grid = Grid {
                x: geometry.margin,
                width: geometry.usable_width(),
                columns: VERSE_COLUMNS,
                line_height: VERSE_LINE_HEIGHT,
                row_gap: VERSE_ROW_GAP,
                label_font: LABEL_FONT,
                text_font: BODY_FONT,
            };
            grid.render(cursor, metrics, &cells);
            cursor.advance(VERSE_TRAILING_GAP);
        }

        cursor.advance(VERSE_SECTION_GAP);
    }
}

impl RenderSection for PartSection {
    fn lead_space(&self) -> f32 {
        PART_LEAD
    }

    fn render(&self, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
        draw_centered(cursor, metrics, &self.title, TITLE_FONT);
        cursor.advance(PART_GAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_labels_are_lowercase_letters() {
        let labels: Vec<String> = (0..4).map(option_label).collect();
        assert_eq!(labels, ["(a)", "(b)", "(c)", "(d)"]);
    }
}
