use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

/// Serif families tried in order for each style.
pub const DEFAULT_FONT_FAMILY: &str = "Times New Roman;Liberation Serif;DejaVu Serif";

/// Options for one export. Everything has a default, so a config file only
/// needs the fields it changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Directory the PDF is written into.
    pub output_dir: PathBuf,
    /// PNG drawn centred after the last section. `None` means no decoration.
    pub decorative_image: Option<PathBuf>,
    /// `;`-separated family candidates.
    pub font_family: String,
    /// When false, the built-in Times faces are used and no font directories
    /// are scanned.
    pub use_system_fonts: bool,
    /// Date stamped into the filename. Defaults to today in UTC.
    pub date: Option<NaiveDate>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            decorative_image: None,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            use_system_fonts: true,
            date: None,
        }
    }
}

impl ExportConfig {
    pub fn export_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{ "outputDir": "/tmp/out", "date": "2024-03-15" }"#).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.font_family, DEFAULT_FONT_FAMILY);
        assert!(config.use_system_fonts);
        assert_eq!(
            config.export_date(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }
}
