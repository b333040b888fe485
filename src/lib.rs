mod asset;
mod config;
mod error;
mod export;
mod fonts;
pub mod metrics;
pub mod model;
pub mod pdf;

pub use asset::{AssetSource, DecorativeImage};
pub use config::{DEFAULT_FONT_FAMILY, ExportConfig};
pub use error::Error;
pub use export::{ExportResult, export_paper, export_paper_json, paper_filename};
pub use fonts::FontSet;
pub use model::Paper;

use std::path::Path;
use std::time::Instant;

/// Render a paper description file straight to PDF bytes, skipping the
/// filename and output directory handling of [`export_paper`].
pub fn render_paper_file(input: &Path, fonts: &FontSet) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let paper = Paper::from_path(input)?;
    let t_parse = t0.elapsed();

    let bytes = pdf::render(&paper, fonts, None)?;

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_parse).as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}
