use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// Header fields of a paper. Every field is free text and may be empty.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    /// Italic banner line above the institution names.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub class_name: String,
    /// Exam title, drawn upper-cased and underlined. Also names the output file.
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub max_marks: String,
}

impl Header {
    /// The header block is drawn only when the banner or the exam title is set.
    pub fn has_block(&self) -> bool {
        !self.title.is_empty() || !self.subject.is_empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McqQuestion {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(deserialize_with = "option_texts")]
    pub options: [String; 4],
}

impl McqQuestion {
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.question)
    }

    /// Options with non-blank text, in their original order.
    pub fn valid_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| !is_blank(o))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McqSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub section_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub marks_calculation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub questions: Vec<McqQuestion>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QaQuestion {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub question: String,
}

impl QaQuestion {
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.question)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QaSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub section_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub marks_calculation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub questions: Vec<QaQuestion>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchPair {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub left_item: String,
    #[serde(deserialize_with = "null_as_default")]
    pub right_item: String,
}

impl MatchPair {
    /// A pair is kept when at least one side has text.
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.left_item) || !is_blank(&self.right_item)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub section_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub marks_calculation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pairs: Vec<MatchPair>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryVerse {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub verse: String,
}

impl MemoryVerse {
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.verse)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryVerseSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub section_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub marks_calculation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub verses: Vec<MemoryVerse>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum SectionKind {
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "qa")]
    FreeResponse,
    #[serde(rename = "match")]
    Matching,
    #[serde(rename = "memoryverse")]
    MemoryVerse,
    #[serde(rename = "part")]
    PartTitle,
    /// A kind this engine does not draw. Resolves to nothing.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SectionRef {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub id: String,
}

impl SectionRef {
    pub fn new(kind: SectionKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A complete paper description. The per-kind lists are unordered storage;
/// `section_order` alone decides what is rendered and in which order.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paper {
    #[serde(deserialize_with = "null_as_default")]
    pub header: Header,
    #[serde(deserialize_with = "null_as_default")]
    pub mcq_sections: Vec<McqSection>,
    #[serde(deserialize_with = "null_as_default")]
    pub qa_sections: Vec<QaSection>,
    #[serde(deserialize_with = "null_as_default")]
    pub match_sections: Vec<MatchSection>,
    #[serde(deserialize_with = "null_as_default")]
    pub memory_verse_sections: Vec<MemoryVerseSection>,
    #[serde(deserialize_with = "null_as_default")]
    pub part_sections: Vec<PartSection>,
    #[serde(deserialize_with = "null_as_default")]
    pub section_order: Vec<SectionRef>,
}

/// A section resolved from the order sequence.
#[derive(Clone, Copy, Debug)]
pub enum Section<'a> {
    MultipleChoice(&'a McqSection),
    FreeResponse(&'a QaSection),
    Matching(&'a MatchSection),
    MemoryVerse(&'a MemoryVerseSection),
    PartTitle(&'a PartSection),
}

impl Paper {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn resolve(&self, entry: &SectionRef) -> Option<Section<'_>> {
        let id = entry.id.as_str();
        match entry.kind {
            SectionKind::MultipleChoice => self
                .mcq_sections
                .iter()
                .find(|s| s.id == id)
                .map(Section::MultipleChoice),
            SectionKind::FreeResponse => self
                .qa_sections
                .iter()
                .find(|s| s.id == id)
                .map(Section::FreeResponse),
            SectionKind::Matching => self
                .match_sections
                .iter()
                .find(|s| s.id == id)
                .map(Section::Matching),
            SectionKind::MemoryVerse => self
                .memory_verse_sections
                .iter()
                .find(|s| s.id == id)
                .map(Section::MemoryVerse),
            SectionKind::PartTitle => self
                .part_sections
                .iter()
                .find(|s| s.id == id)
                .map(Section::PartTitle),
            SectionKind::Unknown => None,
        }
    }

    /// Sections in render order. Dangling order entries are skipped.
    pub fn ordered_sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.section_order.iter().filter_map(|entry| {
            let section = self.resolve(entry);
            if section.is_none() {
                log::debug!("Skipping dangling section reference {:?} {}", entry.kind, entry.id);
            }
            section
        })
    }

    /// The paper the editor loads from its "Load Sample" button.
    pub fn sample() -> Self {
        let question = |id: &str, text: &str, options: [&str; 4]| McqQuestion {
            id: id.to_string(),
            question: text.to_string(),
            options: options.map(str::to_string),
        };
        let mcq = McqSection {
            id: "sample-mcq".to_string(),
            section_number: "I".to_string(),
            heading: "Multiple Choice Questions".to_string(),
            subtitle: "(Choose the correct answer)".to_string(),
            marks_calculation: "25 × 2 = 50".to_string(),
            questions: vec![
                question(
                    "1",
                    "What is the capital of India?",
                    ["Mumbai", "New Delhi", "Kolkata", "Chennai"],
                ),
                question(
                    "2",
                    "Which planet is known as the Red Planet?",
                    ["Venus", "Mars", "Jupiter", "Saturn"],
                ),
                question(
                    "3",
                    "Who wrote the national anthem of India?",
                    [
                        "Rabindranath Tagore",
                        "Mahatma Gandhi",
                        "Jawaharlal Nehru",
                        "Subhash Chandra Bose",
                    ],
                ),
            ],
        };
        Paper {
            header: Header {
                title: "St. Mary's High School".to_string(),
                class_name: "Class 10".to_string(),
                subject: "General Knowledge".to_string(),
                date: "March 15, 2024".to_string(),
                time: "2 Hours".to_string(),
                max_marks: "50".to_string(),
                ..Header::default()
            },
            section_order: vec![SectionRef::new(SectionKind::MultipleChoice, &mcq.id)],
            mcq_sections: vec![mcq],
            ..Paper::default()
        }
    }
}

/// The editor sends `null` for fields it never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Up to four option texts; missing or `null` entries become empty.
fn option_texts<'de, D>(deserializer: D) -> Result<[String; 4], D::Error>
where
    D: Deserializer<'de>,
{
    let texts: Vec<Option<String>> = null_as_default(deserializer)?;
    let mut options: [String; 4] = Default::default();
    for (slot, text) in options.iter_mut().zip(texts) {
        *slot = text.unwrap_or_default();
    }
    Ok(options)
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// `"<ordinal>. <heading> <extra>"` with empty segments dropped.
pub(crate) fn section_title(number: &str, heading: &str, extra: &str) -> String {
    let mut title = String::new();
    if !number.is_empty() {
        title.push_str(number);
        title.push_str(". ");
    }
    title.push_str(heading);
    if !extra.is_empty() {
        title.push(' ');
        title.push_str(extra);
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_editor_json() {
        let json = r#"{
            "header": { "title": "Praise the Lord!", "subject": "Annual Exam", "className": "Class 10" },
            "mcqSections": [{
                "id": "m1", "sectionNumber": "I", "heading": "Choose",
                "marksCalculation": "5 x 1 = 5",
                "questions": [{ "id": "q", "question": "Pick", "options": ["a", "", " ", "d"] }]
            }],
            "partSections": [{ "id": "p1", "title": "PART A" }],
            "sectionOrder": [{ "type": "part", "id": "p1" }, { "type": "mcq", "id": "m1" }]
        }"#;
        let paper = Paper::from_json(json).unwrap();
        assert_eq!(paper.header.class_name, "Class 10");
        assert!(paper.header.has_block());
        let order: Vec<_> = paper.ordered_sections().collect();
        assert!(matches!(order[0], Section::PartTitle(p) if p.title == "PART A"));
        assert!(matches!(order[1], Section::MultipleChoice(_)));
        assert_eq!(paper.mcq_sections[0].questions[0].valid_options(), vec!["a", "d"]);
    }

    #[test]
    fn dangling_references_are_skipped() {
        let mut paper = Paper::sample();
        paper
            .section_order
            .insert(0, SectionRef::new(SectionKind::FreeResponse, "missing"));
        assert_eq!(paper.ordered_sections().count(), 1);
    }

    #[test]
    fn unknown_section_kinds_are_skipped() {
        let json = r#"{
            "qaSections": [{ "id": "q", "questions": [{ "id": "1", "question": "Why?" }] }],
            "sectionOrder": [{ "type": "essay", "id": "e" }, { "type": "qa", "id": "q" }]
        }"#;
        let paper = Paper::from_json(json).unwrap();
        assert_eq!(paper.section_order[0].kind, SectionKind::Unknown);
        let order: Vec<_> = paper.ordered_sections().collect();
        assert_eq!(order.len(), 1);
        assert!(matches!(order[0], Section::FreeResponse(s) if s.id == "q"));
    }

    #[test]
    fn nulls_read_as_empty() {
        let json = r#"{
            "header": { "title": null, "subject": "Annual Exam" },
            "matchSections": [{ "id": "m", "instruction": null, "pairs": null }],
            "mcqSections": [{
                "id": "c", "marksCalculation": null,
                "questions": [{ "id": "q", "question": "Pick", "options": ["a", null, "c"] }]
            }],
            "partSections": null
        }"#;
        let paper = Paper::from_json(json).unwrap();
        assert!(paper.header.title.is_empty());
        assert!(paper.match_sections[0].instruction.is_empty());
        assert!(paper.match_sections[0].pairs.is_empty());
        assert!(paper.part_sections.is_empty());
        let question = &paper.mcq_sections[0].questions[0];
        assert_eq!(question.valid_options(), vec!["a", "c"]);
    }

    #[test]
    fn pair_validity_needs_one_side() {
        let pair = |l: &str, r: &str| MatchPair {
            left_item: l.to_string(),
            right_item: r.to_string(),
            ..MatchPair::default()
        };
        assert!(pair("Moses", "").is_valid());
        assert!(pair(" ", "Exodus").is_valid());
        assert!(!pair("  ", "\t").is_valid());
    }

    #[test]
    fn section_title_drops_empty_segments() {
        assert_eq!(section_title("II", "Answer", "(any five)"), "II. Answer (any five)");
        assert_eq!(section_title("", "Answer", ""), "Answer");
    }
}
