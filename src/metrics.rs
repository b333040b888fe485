//! Text measurement and greedy line wrapping.
//!
//! Widths are millimetres, matching the page geometry; font sizes are points.

const MM_PER_PT: f32 = 25.4 / 72.0;

pub(crate) fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

pub(crate) fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

impl FontStyle {
    pub(crate) fn ps_suffix(self) -> &'static str {
        match self {
            FontStyle::Normal => "",
            FontStyle::Bold => ",Bold",
            FontStyle::Italic => ",Italic",
        }
    }
}

/// Style and point size of a piece of text. The family is fixed per provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextFont {
    pub style: FontStyle,
    pub size: f32,
}

impl TextFont {
    pub const fn new(style: FontStyle, size: f32) -> Self {
        Self { style, size }
    }
}

pub trait TextMetrics {
    /// Family name the provider measures with.
    fn family(&self) -> &str;

    /// Rendered width of `text` in millimetres.
    fn measure_width(&self, text: &str, font: TextFont) -> f32;
}

impl<'m> dyn TextMetrics + 'm {
    /// Greedy word wrap. Lines break at whitespace; a single word wider than
    /// `max_width` is broken between characters. Explicit newlines always
    /// break. Empty input yields one empty line.
    pub fn wrap_to_width<'a>(&'a self, text: &'a str, max_width: f32, font: TextFont) -> WrapLines<'a, Self> {
        WrapLines::new(self, text, max_width, font)
    }
}

/// Lazily produced wrapped lines. Pure in (text, width, font): calling
/// `wrap_to_width` again restarts with an identical sequence.
pub struct WrapLines<'a, M: ?Sized> {
    metrics: &'a M,
    font: TextFont,
    max_width: f32,
    paragraphs: std::str::Split<'a, char>,
    current: Option<&'a str>,
    emitted: bool,
}

impl<'a, M: TextMetrics + ?Sized> WrapLines<'a, M> {
    pub fn new(metrics: &'a M, text: &'a str, max_width: f32, font: TextFont) -> Self {
        Self {
            metrics,
            font,
            max_width,
            paragraphs: text.split('\n'),
            current: None,
            emitted: false,
        }
    }

    fn width(&self, text: &str) -> f32 {
        self.metrics.measure_width(text, self.font)
    }

    /// Take one line off the front of `text`, returning it with the remainder.
    fn take_line(&self, text: &'a str) -> (String, &'a str) {
        let mut line = String::new();
        let mut rest = text;
        loop {
            let trimmed = rest.trim_start();
            if trimmed.is_empty() {
                return (line, trimmed);
            }
            let word_len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let word = &trimmed[..word_len];
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if self.width(&candidate) <= self.max_width {
                line = candidate;
                rest = &trimmed[word_len..];
                continue;
            }
            if !line.is_empty() {
                return (line, trimmed);
            }
            let split = self.fit_prefix(word);
            return (word[..split].to_string(), &trimmed[split..]);
        }
    }

    /// Byte length of the longest prefix of `word` that fits, at least one char.
    fn fit_prefix(&self, word: &str) -> usize {
        let mut end = 0;
        let mut width = 0.0;
        for (idx, ch) in word.char_indices() {
            let mut buf = [0u8; 4];
            width += self.width(ch.encode_utf8(&mut buf));
            if width > self.max_width && end > 0 {
                break;
            }
            end = idx + ch.len_utf8();
        }
        end
    }
}

impl<M: TextMetrics + ?Sized> Iterator for WrapLines<'_, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.current {
                Some(paragraph) if !paragraph.trim().is_empty() => {
                    let (line, rest) = self.take_line(paragraph);
                    self.current = Some(rest);
                    self.emitted = true;
                    return Some(line);
                }
                Some(_) => {
                    self.current = None;
                    if !self.emitted {
                        self.emitted = true;
                        return Some(String::new());
                    }
                }
                None => {
                    self.current = Some(self.paragraphs.next()?);
                    self.emitted = false;
                }
            }
        }
    }
}

/// Collect the wrapped lines of `text`.
pub fn wrap(metrics: &dyn TextMetrics, text: &str, max_width: f32, font: TextFont) -> Vec<String> {
    metrics.wrap_to_width(text, max_width, font).collect()
}
