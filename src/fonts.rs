use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;
use crate::metrics::{FontStyle, TextFont, TextMetrics, pt_to_mm};

/// Where the glyphs of a face come from.
pub(crate) enum FaceSource {
    /// A TrueType/OpenType face found on the system, embedded subsetted.
    TrueType {
        family: String,
        data: Vec<u8>,
        face_index: u32,
    },
    /// One of the PDF standard 14 Times faces, referenced by name.
    Builtin { base_font: &'static str },
}

pub(crate) struct FontFace {
    pub(crate) style: FontStyle,
    pub(crate) source: FaceSource,
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontFace {
    fn builtin(style: FontStyle) -> Self {
        let base_font = match style {
            FontStyle::Normal => "Times-Roman",
            FontStyle::Bold => "Times-Bold",
            FontStyle::Italic => "Times-Italic",
        };
        Self {
            style,
            source: FaceSource::Builtin { base_font },
            widths_1000: times_widths(style),
            char_widths_1000: None,
        }
    }

    fn truetype(
        style: FontStyle,
        family: &str,
        data: Vec<u8>,
        face_index: u32,
        used_chars: &BTreeSet<char>,
    ) -> Option<Self> {
        let face = Face::parse(&data, face_index).ok()?;
        let units = face.units_per_em() as f32;
        let advance_1000 = |ch: char| {
            face.glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / units * 1000.0)
        };
        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| advance_1000(winansi_to_char(byte)).unwrap_or(0.0))
            .collect();
        let char_widths_1000: HashMap<char, f32> = used_chars
            .iter()
            .filter_map(|&ch| advance_1000(ch).map(|w| (ch, w)))
            .collect();
        Some(Self {
            style,
            source: FaceSource::TrueType {
                family: family.to_string(),
                data,
                face_index,
            },
            widths_1000,
            char_widths_1000: Some(char_widths_1000),
        })
    }

    /// Width of a single character in 1000-units. Uses the per-char cache (covers
    /// all chars seen in the paper), falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    /// Width in points.
    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn is_embedded(&self) -> bool {
        matches!(self.source, FaceSource::TrueType { .. })
    }
}

/// The serif family used for a whole paper: one face per style.
pub struct FontSet {
    normal: FontFace,
    bold: FontFace,
    italic: FontFace,
}

impl FontSet {
    /// Standard Times faces with built-in widths. Needs no installed fonts.
    pub fn builtin() -> Self {
        Self {
            normal: FontFace::builtin(FontStyle::Normal),
            bold: FontFace::builtin(FontStyle::Bold),
            italic: FontFace::builtin(FontStyle::Italic),
        }
    }

    /// Resolve each style against the `;`-separated family candidates.
    /// Styles with no installed match fall back to the built-in Times face.
    pub fn load(families: &str, used_chars: &BTreeSet<char>) -> Self {
        let load_style = |style: FontStyle| {
            let t0 = std::time::Instant::now();
            for candidate in families.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                let Some((path, face_index)) = find_font_file(candidate, style) else {
                    continue;
                };
                let Ok(data) = std::fs::read(&path) else {
                    continue;
                };
                if let Some(face) = FontFace::truetype(style, candidate, data, face_index, used_chars) {
                    log::debug!(
                        "load_font: {candidate} {style:?} from {} → {:.1}ms",
                        path.display(),
                        t0.elapsed().as_secs_f64() * 1000.0,
                    );
                    return face;
                }
            }
            log::warn!("Font not found: {families} {style:?}, using built-in Times");
            FontFace::builtin(style)
        };
        Self {
            normal: load_style(FontStyle::Normal),
            bold: load_style(FontStyle::Bold),
            italic: load_style(FontStyle::Italic),
        }
    }

    pub(crate) fn face(&self, style: FontStyle) -> &FontFace {
        match style {
            FontStyle::Normal => &self.normal,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

impl TextMetrics for FontSet {
    fn family(&self) -> &str {
        match &self.normal.source {
            FaceSource::TrueType { family, .. } => family,
            FaceSource::Builtin { .. } => "Times",
        }
    }

    fn measure_width(&self, text: &str, font: TextFont) -> f32 {
        pt_to_mm(self.face(font.style).text_width(text, font.size))
    }
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    // 1. User-configured directories via QPAPER_FONTS env var
    if let Ok(val) = std::env::var("QPAPER_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    // 2. Platform-specific system font directories
    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited_dirs: HashSet<PathBuf> = HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited_dirs.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        visited_dirs.len(),
        files_scanned,
        index.len(),
    );

    index
}

/// Look up a font file by family name and style.
/// Falls back to the regular variant if the requested style is not available.
fn find_font_file(font_name: &str, style: FontStyle) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = font_name.to_lowercase();
    let (bold, italic) = match style {
        FontStyle::Normal => (false, false),
        FontStyle::Bold => (true, false),
        FontStyle::Italic => (false, true),
    };
    index
        .get(&(key.clone(), bold, italic))
        .or_else(|| {
            if bold || italic {
                index.get(&(key, false, false))
            } else {
                None
            }
        })
        .cloned()
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable chars are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

// Times advance widths (1000 units/em) for A-Z and a-z per style.
const TIMES_UPPER: [[u16; 26]; 3] = [
    [
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667,
        556, 611, 722, 722, 944, 722, 722, 611,
    ],
    [
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, 611, 778, 722,
        556, 667, 722, 722, 1000, 722, 722, 667,
    ],
    [
        611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722, 611, 722, 611,
        500, 556, 722, 611, 833, 611, 556, 556,
    ],
];

const TIMES_LOWER: [[u16; 26]; 3] = [
    [
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333,
        389, 278, 500, 500, 722, 500, 500, 444,
    ],
    [
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444,
        389, 333, 556, 500, 722, 500, 500, 444,
    ],
    [
        500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389,
        389, 278, 500, 444, 667, 444, 444, 389,
    ],
];

/// Approximate Times widths at 1000 units/em for WinAnsi chars 32..=255.
fn times_widths(style: FontStyle) -> Vec<f32> {
    let s = match style {
        FontStyle::Normal => 0,
        FontStyle::Bold => 1,
        FontStyle::Italic => 2,
    };
    (32u8..=255u8)
        .map(|b| match b {
            b'A'..=b'Z' => TIMES_UPPER[s][(b - b'A') as usize] as f32,
            b'a'..=b'z' => TIMES_LOWER[s][(b - b'a') as usize] as f32,
            b'0'..=b'9' => 500.0,
            b' ' | b',' | b'.' => 250.0,
            b'\'' => 180.0,
            b'|' => 200.0,
            b'!' | b'(' | b')' | b'-' | b'[' | b']' | b'`' => 333.0,
            b':' | b';' => if s == 1 { 333.0 } else { 278.0 },
            b'/' | b'\\' => 278.0,
            b'"' => 408.0,
            b'?' => 444.0,
            b'{' | b'}' => 480.0,
            b'#' | b'$' | b'*' | b'_' => 500.0,
            b'~' => 541.0,
            b'+' | b'<' | b'=' | b'>' | 0xD7 => 564.0,
            b'&' => 778.0,
            b'%' => 833.0,
            b'@' => 921.0,
            0x96 => 500.0,
            0x97 => 1000.0,
            _ => 500.0,
        })
        .collect()
}

/// Write the PDF font objects for one face under `font_ref`.
/// Returns the char → glyph map used to encode text for embedded faces.
pub(crate) fn embed_face(
    pdf: &mut Pdf,
    face: &FontFace,
    font_ref: Ref,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Option<HashMap<char, u16>>, Error> {
    let (family, data, face_index) = match &face.source {
        FaceSource::Builtin { base_font } => {
            pdf.type1_font(font_ref)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            return Ok(None);
        }
        FaceSource::TrueType {
            family,
            data,
            face_index,
        } => (family, data, *face_index),
    };

    let parsed = Face::parse(data, face_index)
        .map_err(|e| Error::Font(format!("{family}: {e}")))?;
    let units = parsed.units_per_em() as f32;
    let ascent = parsed.ascender() as f32 / units * 1000.0;
    let descent = parsed.descender() as f32 / units * 1000.0;
    let cap_height = parsed
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);
    let bb = parsed.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = parsed.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            if char_to_gid.insert(ch, new_gid).is_none() {
                gid_widths.push((new_gid, face.char_width_1000(ch)));
            }
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {family}: {e}, embedding full font");
        data.clone()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{family}: font program too large")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = format!("{}{}", family.replace(' ', ""), face.style.ps_suffix());

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(if face.style == FontStyle::Italic { -12.0 } else { 0.0 })
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(if face.style == FontStyle::Bold { 140.0 } else { 80.0 })
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    let mut pairs: Vec<(char, u16)> = char_to_gid.iter().map(|(&c, &g)| (c, g)).collect();
    pairs.sort_unstable();
    for (ch, gid) in pairs {
        cmap.pair(gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(Some(char_to_gid))
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}
