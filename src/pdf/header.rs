use crate::metrics::{FontStyle, TextFont, TextMetrics};
use crate::model::Header;

use super::cursor::PageCursor;
use super::draw_centered;

/// Institution lines printed on every paper that has a header block.
pub const INSTITUTION_LINES: [&str; 2] = [
    "THE PENTECOSTAL MISSION",
    "SUNDAY SCHOOL CENTRAL ORGANIZATION, BARODA",
];

const BANNER_FONT: TextFont = TextFont::new(FontStyle::Italic, 13.0);
const INSTITUTION_FONTS: [TextFont; 2] = [
    TextFont::new(FontStyle::Normal, 16.0),
    TextFont::new(FontStyle::Normal, 14.0),
];
const EXAM_TITLE_FONT: TextFont = TextFont::new(FontStyle::Bold, 13.0);
const INFO_FONT: TextFont = TextFont::new(FontStyle::Bold, 12.0);

/// Centered header lines followed by the time / class / marks row.
/// Draws nothing unless the banner or the exam title is set.
pub(super) fn render_header(header: &Header, cursor: &mut PageCursor, metrics: &dyn TextMetrics) {
    if !header.has_block() {
        return;
    }
    let geometry = *cursor.geometry();

    if !header.title.is_empty() {
        draw_centered(cursor, metrics, &header.title, BANNER_FONT);
        cursor.advance(7.0);
    }

    draw_centered(cursor, metrics, INSTITUTION_LINES[0], INSTITUTION_FONTS[0]);
    cursor.advance(7.0);
    draw_centered(cursor, metrics, INSTITUTION_LINES[1], INSTITUTION_FONTS[1]);
    cursor.advance(8.0);

    if !header.subject.is_empty() {
        let title = header.subject.to_uppercase();
        let width = metrics.measure_width(&title, EXAM_TITLE_FONT);
        let x = draw_centered(cursor, metrics, &title, EXAM_TITLE_FONT);
        let underline_y = cursor.y() + 1.0;
        cursor.line(x, underline_y, x + width, underline_y);
        cursor.advance(10.0);
    }

    cursor.advance(6.0);
    let y = cursor.y();
    if !header.time.is_empty() {
        cursor.text(geometry.margin, y, &format!("Time : {}", header.time), INFO_FONT);
    }
    if !header.class_name.is_empty() {
        draw_centered(cursor, metrics, &header.class_name.to_uppercase(), INFO_FONT);
    }
    if !header.max_marks.is_empty() {
        let marks = format!("Marks : {}", header.max_marks);
        let width = metrics.measure_width(&marks, INFO_FONT);
        cursor.text(geometry.width - geometry.margin - width, y, &marks, INFO_FONT);
    }
    cursor.advance(8.0);
}
