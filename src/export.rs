use std::panic::AssertUnwindSafe;

use chrono::NaiveDate;
use serde::Serialize;

use crate::asset::DecorativeImage;
use crate::config::ExportConfig;
use crate::error::Error;
use crate::fonts::FontSet;
use crate::metrics::TextMetrics;
use crate::model::{Header, Paper};
use crate::pdf;

/// Outcome reported back to the caller of an export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    pub fn saved(filename: String) -> Self {
        Self {
            success: true,
            filename: Some(filename),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            filename: None,
            error: Some(error),
        }
    }
}

/// `Question_Paper_<subject>_<class>_<YYYY-MM-DD>.pdf`, with every run of
/// whitespace collapsed to a single underscore. An empty subject becomes `MCQ`.
pub fn paper_filename(header: &Header, date: NaiveDate) -> String {
    let subject = if header.subject.is_empty() {
        "MCQ"
    } else {
        &header.subject
    };
    let raw = format!(
        "Question_Paper_{subject}_{}_{}.pdf",
        header.class_name,
        date.format("%Y-%m-%d"),
    );

    let mut name = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    name
}

/// Lay out, serialize and save a paper. Never fails past this point: every
/// error, including a panic inside layout, comes back as a failed result.
pub fn export_paper(paper: &Paper, config: &ExportConfig) -> ExportResult {
    guarded(|| {
        let fonts = if config.use_system_fonts {
            FontSet::load(&config.font_family, &pdf::paper_chars(paper))
        } else {
            FontSet::builtin()
        };
        export_with(paper, &fonts, &fonts, config)
    })
}

/// Parse the editor's JSON and export it.
pub fn export_paper_json(json: &str, config: &ExportConfig) -> ExportResult {
    match Paper::from_json(json) {
        Ok(paper) => export_paper(&paper, config),
        Err(e) => {
            log::error!("Export failed: {e}");
            ExportResult::failed(e.to_string())
        }
    }
}

/// Run an export, turning both errors and panics into a result.
fn guarded(export: impl FnOnce() -> Result<String, Error>) -> ExportResult {
    match std::panic::catch_unwind(AssertUnwindSafe(export)) {
        Ok(Ok(filename)) => ExportResult::saved(filename),
        Ok(Err(e)) => {
            log::error!("Export failed: {e}");
            ExportResult::failed(e.to_string())
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Export panicked: {message}");
            ExportResult::failed(Error::Render(message).to_string())
        }
    }
}

/// Lay out with `metrics`, write with `fonts`. The file is written only after
/// the whole document is in memory.
fn export_with(
    paper: &Paper,
    metrics: &dyn TextMetrics,
    fonts: &FontSet,
    config: &ExportConfig,
) -> Result<String, Error> {
    let t0 = std::time::Instant::now();

    let decoration = config
        .decorative_image
        .as_deref()
        .and_then(DecorativeImage::load);
    let t_asset = t0.elapsed();

    let bytes = pdf::render_with(paper, metrics, fonts, decoration.as_ref())?;
    let t_render = t0.elapsed();

    let filename = paper_filename(&paper.header, config.export_date());
    std::fs::create_dir_all(&config.output_dir)?;
    std::fs::write(config.output_dir.join(&filename), &bytes)?;

    log::info!(
        "Timing: asset={:.1}ms, render={:.1}ms, write={:.1}ms (output {} bytes, {}, {})",
        t_asset.as_secs_f64() * 1000.0,
        (t_render - t_asset).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_render).as_secs_f64() * 1000.0,
        bytes.len(),
        metrics.family(),
        filename,
    );

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(subject: &str, class_name: &str) -> Header {
        Header {
            subject: subject.to_string(),
            class_name: class_name.to_string(),
            ..Header::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn filename_collapses_whitespace_runs() {
        assert_eq!(
            paper_filename(&header("Annual  Exam", "Class\t10"), date()),
            "Question_Paper_Annual_Exam_Class_10_2024-03-15.pdf"
        );
    }

    #[test]
    fn filename_defaults_subject_and_class() {
        assert_eq!(
            paper_filename(&header("", ""), date()),
            "Question_Paper_MCQ__2024-03-15.pdf"
        );
    }

    /// Measures like a monospace face until it sees the trigger word.
    struct Exploding;

    impl TextMetrics for Exploding {
        fn family(&self) -> &str {
            "Exploding"
        }

        fn measure_width(&self, text: &str, _font: crate::metrics::TextFont) -> f32 {
            if text.contains("detonate") {
                panic!("width table missing for {text:?}");
            }
            text.chars().count() as f32 * 2.0
        }
    }

    #[test]
    fn panic_during_layout_is_a_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().to_path_buf(),
            use_system_fonts: false,
            date: Some(date()),
            ..ExportConfig::default()
        };
        let mut paper = Paper::sample();
        paper.header.title = "Please detonate".to_string();

        let fonts = FontSet::builtin();
        let result = guarded(|| export_with(&paper, &Exploding, &fonts, &config));

        assert!(!result.success);
        assert!(result.filename.is_none());
        let error = result.error.unwrap();
        assert!(error.contains("width table missing"), "{error}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn export_with_saves_through_the_given_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().to_path_buf(),
            use_system_fonts: false,
            date: Some(date()),
            ..ExportConfig::default()
        };
        let paper = Paper::sample();
        let fonts = FontSet::builtin();
        let result = guarded(|| export_with(&paper, &Exploding, &fonts, &config));
        assert!(result.success, "{:?}", result.error);
        let filename = result.filename.unwrap();
        assert!(dir.path().join(filename).is_file());
    }

    #[test]
    fn result_omits_absent_fields() {
        let json = serde_json::to_string(&ExportResult::saved("a.pdf".to_string())).unwrap();
        assert_eq!(json, r#"{"success":true,"filename":"a.pdf"}"#);
        let json = serde_json::to_string(&ExportResult::failed("boom".to_string())).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }
}
