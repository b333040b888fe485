use std::collections::HashMap;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::asset::DecorativeImage;
use crate::error::Error;
use crate::fonts::{FontSet, embed_face, encode_as_gids, to_winansi_bytes};
use crate::metrics::{FontStyle, TextFont, mm_to_pt};

use super::{DrawOp, LaidOutPaper, Page, PageGeometry};

const IMAGE_NAME: &str = "Im1";
/// Stroke width of rules, in millimetres.
const RULE_WIDTH: f32 = 0.2;

struct EmbeddedFont {
    pdf_name: String,
    font_ref: Ref,
    /// Present for CID fonts, which are shown by glyph id instead of WinAnsi.
    char_to_gid: Option<HashMap<char, u16>>,
}

impl EmbeddedFont {
    fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

fn pdf_font_name(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Normal => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
    }
}

/// Write the image XObject (and its soft mask, if any) under `xobj_ref`.
fn embed_image(pdf: &mut Pdf, image: &DecorativeImage, xobj_ref: Ref, alloc: &mut impl FnMut() -> Ref) {
    let (w, h) = (image.pixel_width as i32, image.pixel_height as i32);
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&image.rgb, 6);

    let smask_ref = image.alpha.as_ref().map(|alpha| {
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w);
        mask.height(h);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask_ref
    });

    let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w);
    xobj.height(h);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask_ref {
        xobj.s_mask(mask_ref);
    }
}

/// Build one page's content stream. Consecutive text ops share a BT/ET block
/// and only switch fonts when the style or size changes.
fn page_content(
    page: &Page,
    geometry: &PageGeometry,
    fonts: &HashMap<FontStyle, EmbeddedFont>,
    has_image: bool,
) -> Content {
    let mut content = Content::new();
    let to_y = |y: f32| mm_to_pt(geometry.height - y);

    let mut in_text = false;
    let mut current_font: Option<TextFont> = None;
    let mut last_pos = (0.0f32, 0.0f32);

    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, text, font } => {
                let Some(embedded) = fonts.get(&font.style) else {
                    continue;
                };
                if !in_text {
                    content.begin_text();
                    in_text = true;
                    current_font = None;
                    last_pos = (0.0, 0.0);
                }
                if current_font != Some(*font) {
                    content.set_font(Name(embedded.pdf_name.as_bytes()), font.size);
                    current_font = Some(*font);
                }
                // Td is relative to the start of the previous line.
                let pos = (mm_to_pt(*x), to_y(*y));
                content.next_line(pos.0 - last_pos.0, pos.1 - last_pos.1);
                last_pos = pos;
                content.show(Str(&embedded.encode(text)));
            }
            DrawOp::Line { x1, y1, x2, y2 } => {
                if in_text {
                    content.end_text();
                    in_text = false;
                }
                content.set_line_width(mm_to_pt(RULE_WIDTH));
                content.move_to(mm_to_pt(*x1), to_y(*y1));
                content.line_to(mm_to_pt(*x2), to_y(*y2));
                content.stroke();
            }
            DrawOp::Image { x, y, width, height } => {
                if in_text {
                    content.end_text();
                    in_text = false;
                }
                if !has_image {
                    continue;
                }
                content.save_state();
                content.transform([
                    mm_to_pt(*width),
                    0.0,
                    0.0,
                    mm_to_pt(*height),
                    mm_to_pt(*x),
                    to_y(*y + *height),
                ]);
                content.x_object(Name(IMAGE_NAME.as_bytes()));
                content.restore_state();
            }
        }
    }
    if in_text {
        content.end_text();
    }
    content
}

/// Serialize a laid-out paper. Only styles that are actually drawn get a
/// font resource.
pub(super) fn write_pdf(
    paper: &LaidOutPaper,
    fonts: &FontSet,
    decoration: Option<&DecorativeImage>,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let mut embedded: HashMap<FontStyle, EmbeddedFont> = HashMap::new();
    for (style, chars) in paper.used_chars() {
        let face = fonts.face(style);
        let font_ref = alloc();
        let char_to_gid = embed_face(&mut pdf, face, font_ref, &chars, &mut alloc)?;
        log::debug!(
            "Font {} {style:?}: {} chars, embedded={}",
            pdf_font_name(style),
            chars.len(),
            face.is_embedded(),
        );
        embedded.insert(
            style,
            EmbeddedFont {
                pdf_name: pdf_font_name(style).to_string(),
                font_ref,
                char_to_gid,
            },
        );
    }
    let t_fonts = t0.elapsed();

    let image_ref = match decoration {
        Some(image) if paper.pages.iter().any(Page::has_image) => {
            let xobj_ref = alloc();
            embed_image(&mut pdf, image, xobj_ref, &mut alloc);
            Some(xobj_ref)
        }
        _ => None,
    };

    let geometry = paper.geometry;
    let n = paper.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in paper.pages.iter().enumerate() {
        let raw = page_content(page, &geometry, &embedded, image_ref.is_some()).finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let mut font_pairs: Vec<(&str, Ref)> = embedded
        .values()
        .map(|f| (f.pdf_name.as_str(), f.font_ref))
        .collect();
    font_pairs.sort_unstable_by_key(|&(name, _)| name);

    let media_box = Rect::new(0.0, 0.0, mm_to_pt(geometry.width), mm_to_pt(geometry.height));
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for &(name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), font_ref);
            }
        }
        if let Some(xobj_ref) = image_ref {
            resources
                .x_objects()
                .pair(Name(IMAGE_NAME.as_bytes()), xobj_ref);
        }
    }

    log::debug!(
        "PDF assembly: fonts={:.1}ms, total={:.1}ms",
        t_fonts.as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}
