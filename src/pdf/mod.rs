mod cursor;
mod grid;
mod header;
mod sections;
mod writer;

use std::collections::{BTreeMap, BTreeSet};

use crate::asset::DecorativeImage;
use crate::error::Error;
use crate::fonts::FontSet;
use crate::metrics::{FontStyle, TextFont, TextMetrics};
use crate::model::Paper;

pub use cursor::PageCursor;
pub use header::INSTITUTION_LINES;
use sections::RenderSection;

/// Gap left between the last section and the decorative image.
const DECORATION_GAP: f32 = 15.0;
/// Room the decorative image needs above the bottom margin.
const DECORATION_LEAD: f32 = 20.0;
pub const DECORATION_WIDTH: f32 = 30.0;
pub const DECORATION_HEIGHT: f32 = 5.5;

/// Portrait page size and uniform margin, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
        margin: 20.0,
    };

    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest baseline allowed on a page.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// A positioned drawing instruction. Coordinates are millimetres from the
/// top-left corner of the page.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: TextFont,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    /// `y` is the top edge of the image box.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text ops on this page as `(x, y, text, font)`.
    pub fn texts(&self) -> impl Iterator<Item = (f32, f32, &str, TextFont)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { x, y, text, font } => Some((*x, *y, text.as_str(), *font)),
            _ => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// The finished layout: every page with its draw ops, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct LaidOutPaper {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl LaidOutPaper {
    /// Characters drawn in each style, for font subsetting.
    pub(crate) fn used_chars(&self) -> BTreeMap<FontStyle, BTreeSet<char>> {
        let mut used: BTreeMap<FontStyle, BTreeSet<char>> = BTreeMap::new();
        for page in &self.pages {
            for (_, _, text, font) in page.texts() {
                let chars = used.entry(font.style).or_default();
                chars.insert(' ');
                chars.extend(text.chars());
            }
        }
        used
    }
}

/// Draw `text` centred between the page edges on the cursor's baseline.
/// Returns the x it was drawn at.
fn draw_centered(cursor: &mut PageCursor, metrics: &dyn TextMetrics, text: &str, font: TextFont) -> f32 {
    let width = metrics.measure_width(text, font);
    let x = (cursor.geometry().width - width) / 2.0;
    cursor.text(x, cursor.y(), text, font);
    x
}

/// Lay the paper out across pages. Deterministic in its inputs: the same
/// paper, metrics and decoration always produce the same pages.
pub fn layout(
    paper: &Paper,
    metrics: &dyn TextMetrics,
    geometry: PageGeometry,
    decoration: Option<&DecorativeImage>,
) -> LaidOutPaper {
    let mut cursor = PageCursor::new(geometry);

    header::render_header(&paper.header, &mut cursor, metrics);

    for section in paper.ordered_sections() {
        cursor.ensure_space(section.lead_space());
        section.render(&mut cursor, metrics);
    }

    if cursor.y() > geometry.margin {
        cursor.advance(DECORATION_GAP);
        if decoration.is_some() {
            if cursor.y() > geometry.bottom_limit() - DECORATION_LEAD {
                cursor.new_page();
                cursor.advance(DECORATION_GAP);
            }
            let x = (geometry.width - DECORATION_WIDTH) / 2.0;
            cursor.image(x, cursor.y(), DECORATION_WIDTH, DECORATION_HEIGHT);
        }
    }

    LaidOutPaper {
        geometry,
        pages: cursor.finish(),
    }
}

/// Every character the paper can draw, for resolving glyph widths before
/// layout. Covers upper-casing, numbering and the fixed header strings.
pub fn paper_chars(paper: &Paper) -> BTreeSet<char> {
    let mut chars: BTreeSet<char> = BTreeSet::new();
    let mut add = |text: &str| chars.extend(text.chars());

    add(" 0123456789.()-:abcdefghijklmnopqrstuvwxyz");
    add("Time : Marks : ");
    for line in INSTITUTION_LINES {
        add(line);
    }

    let h = &paper.header;
    for field in [&h.title, &h.subject, &h.class_name, &h.time, &h.max_marks] {
        add(field);
        add(&field.to_uppercase());
    }
    for s in &paper.mcq_sections {
        for text in [&s.section_number, &s.heading, &s.subtitle, &s.marks_calculation] {
            add(text);
        }
        for q in &s.questions {
            add(&q.question);
            q.options.iter().for_each(|o| add(o));
        }
    }
    for s in &paper.qa_sections {
        for text in [&s.section_number, &s.heading, &s.instruction, &s.marks_calculation] {
            add(text);
        }
        s.questions.iter().for_each(|q| add(&q.question));
    }
    for s in &paper.match_sections {
        for text in [&s.section_number, &s.heading, &s.instruction, &s.marks_calculation] {
            add(text);
        }
        for p in &s.pairs {
            add(&p.left_item);
            add(&p.right_item);
        }
    }
    for s in &paper.memory_verse_sections {
        for text in [&s.section_number, &s.heading, &s.instruction, &s.marks_calculation] {
            add(text);
        }
        s.verses.iter().for_each(|v| add(&v.verse));
    }
    for s in &paper.part_sections {
        add(&s.title);
    }
    chars
}

/// Lay out and serialize a paper to PDF bytes.
pub fn render(
    paper: &Paper,
    fonts: &FontSet,
    decoration: Option<&DecorativeImage>,
) -> Result<Vec<u8>, Error> {
    render_with(paper, fonts, fonts, decoration)
}

/// As `render`, with layout measured by `metrics` instead of the font set.
pub(crate) fn render_with(
    paper: &Paper,
    metrics: &dyn TextMetrics,
    fonts: &FontSet,
    decoration: Option<&DecorativeImage>,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();

    let laid_out = layout(paper, metrics, PageGeometry::A4, decoration);
    let t_layout = t0.elapsed();

    let bytes = writer::write_pdf(&laid_out, fonts, decoration)?;
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: layout={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        laid_out.pages.len(),
        bytes.len(),
    );

    Ok(bytes)
}
