#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use qpaper_pdf::metrics::{FontStyle, TextFont};
use qpaper_pdf::model::{
    Header, MatchPair, MatchSection, McqQuestion, McqSection, MemoryVerse, MemoryVerseSection,
    PartSection, QaQuestion, QaSection, SectionKind, SectionRef,
};
use qpaper_pdf::pdf::{self, DrawOp, LaidOutPaper, PageGeometry};
use qpaper_pdf::{DecorativeImage, FontSet, Paper};

pub const BOTTOM_LIMIT: f32 = 277.0;
pub const MARGIN: f32 = 20.0;

/// Natural order: "paper2" before "paper10".
fn natural_cmp(a: &Path, b: &Path) -> std::cmp::Ordering {
    let a_name = a.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let b_name = b.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let extract = |s: &str| -> (String, u64) {
        let i = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let digits: String = s[i..].chars().take_while(|c| c.is_ascii_digit()).collect();
        (s[..i].to_string(), digits.parse().unwrap_or(0))
    };
    extract(a_name)
        .cmp(&extract(b_name))
        .then_with(|| a_name.cmp(b_name))
}

/// Discover JSON paper fixtures. Filter with QPAPER_CASE (file stem).
pub fn discover_fixtures() -> io::Result<Vec<PathBuf>> {
    let case_filter = std::env::var("QPAPER_CASE").ok();
    let mut fixtures: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir("tests/fixtures")? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(ref case) = case_filter
            && path.file_stem().and_then(|s| s.to_str()) != Some(case.as_str())
        {
            continue;
        }
        fixtures.push(path);
    }
    fixtures.sort_by(|a, b| natural_cmp(a, b));
    Ok(fixtures)
}

pub fn display_name(fixture: &Path) -> String {
    fixture
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn load_fixture(path: &Path) -> Paper {
    Paper::from_path(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Lay out with the built-in Times metrics so results do not depend on
/// installed fonts.
pub fn layout(paper: &Paper) -> LaidOutPaper {
    pdf::layout(paper, &FontSet::builtin(), PageGeometry::A4, None)
}

pub fn layout_with_image(paper: &Paper, image: &DecorativeImage) -> LaidOutPaper {
    pdf::layout(paper, &FontSet::builtin(), PageGeometry::A4, Some(image))
}

/// A text op flattened with its page index.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedText {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font: TextFont,
}

pub fn texts(laid_out: &LaidOutPaper) -> Vec<PlacedText> {
    laid_out
        .pages
        .iter()
        .enumerate()
        .flat_map(|(page, p)| {
            p.texts().map(move |(x, y, text, font)| PlacedText {
                page,
                x,
                y,
                text: text.to_string(),
                font,
            })
        })
        .collect()
}

pub fn find_text<'a>(all: &'a [PlacedText], text: &str) -> Option<&'a PlacedText> {
    all.iter().find(|t| t.text == text)
}

pub fn find_all<'a>(all: &'a [PlacedText], text: &str) -> Vec<&'a PlacedText> {
    all.iter().filter(|t| t.text == text).collect()
}

pub fn image_ops(laid_out: &LaidOutPaper) -> Vec<(usize, f32, f32)> {
    laid_out
        .pages
        .iter()
        .enumerate()
        .flat_map(|(page, p)| {
            p.ops.iter().filter_map(move |op| match op {
                DrawOp::Image { x, y, .. } => Some((page, *x, *y)),
                _ => None,
            })
        })
        .collect()
}

pub fn is_bold(t: &PlacedText) -> bool {
    t.font.style == FontStyle::Bold
}

/// A small opaque PNG encoded in memory.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 2, image::Rgb([40, 80, 160]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn decoration() -> DecorativeImage {
    DecorativeImage::from_png_bytes(&png_bytes()).expect("decode png")
}

// Builders for papers assembled in code.

pub fn s(text: &str) -> String {
    text.to_string()
}

pub fn mcq(id: &str, questions: &[(&str, [&str; 4])]) -> McqSection {
    McqSection {
        id: s(id),
        section_number: s("I"),
        heading: s("Choose the correct answer"),
        marks_calculation: s("5 × 1 = 5"),
        questions: questions
            .iter()
            .enumerate()
            .map(|(i, (q, opts))| McqQuestion {
                id: format!("{id}-{i}"),
                question: s(q),
                options: opts.map(s),
            })
            .collect(),
        ..McqSection::default()
    }
}

pub fn qa(id: &str, questions: &[&str]) -> QaSection {
    QaSection {
        id: s(id),
        section_number: s("II"),
        heading: s("Answer the following"),
        marks_calculation: s("5 × 2 = 10"),
        questions: questions
            .iter()
            .enumerate()
            .map(|(i, q)| QaQuestion {
                id: format!("{id}-{i}"),
                question: s(q),
            })
            .collect(),
        ..QaSection::default()
    }
}

pub fn matching(id: &str, pairs: &[(&str, &str)]) -> MatchSection {
    MatchSection {
        id: s(id),
        section_number: s("III"),
        heading: s("Match the following"),
        pairs: pairs
            .iter()
            .enumerate()
            .map(|(i, (l, r))| MatchPair {
                id: format!("{id}-{i}"),
                left_item: s(l),
                right_item: s(r),
            })
            .collect(),
        ..MatchSection::default()
    }
}

pub fn verses(id: &str, refs: &[&str]) -> MemoryVerseSection {
    MemoryVerseSection {
        id: s(id),
        section_number: s("IV"),
        heading: s("Write the memory verses"),
        verses: refs
            .iter()
            .enumerate()
            .map(|(i, v)| MemoryVerse {
                id: format!("{id}-{i}"),
                verse: s(v),
            })
            .collect(),
        ..MemoryVerseSection::default()
    }
}

pub fn part(id: &str, title: &str) -> PartSection {
    PartSection {
        id: s(id),
        title: s(title),
    }
}

/// A paper with no header block and the given sections in `order`.
pub fn bare_paper(order: &[(SectionKind, &str)]) -> Paper {
    Paper {
        header: Header::default(),
        section_order: order
            .iter()
            .map(|&(kind, id)| SectionRef::new(kind, id))
            .collect(),
        ..Paper::default()
    }
}
