use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use qpaper_pdf::{ExportConfig, ExportResult, Paper, export_paper, export_paper_json};

#[derive(Parser)]
#[command(name = "qpaper-pdf")]
#[command(version)]
#[command(about = "Lay out examination question papers as A4 PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a paper description (JSON) to PDF
    Render {
        /// Paper description file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Decorative PNG drawn after the last section
        #[arg(long, value_name = "PATH", default_value = "image.png", conflicts_with = "no_image")]
        image: PathBuf,

        /// Do not draw the decorative image
        #[arg(long)]
        no_image: bool,

        /// `;`-separated font family candidates
        #[arg(long, value_name = "NAME")]
        font: Option<String>,

        /// Use the built-in Times faces instead of scanning for installed fonts
        #[arg(long)]
        builtin_fonts: bool,

        /// Date used in the output filename (defaults to today, UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Render the built-in sample paper
    Sample {
        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
}

fn report(result: &ExportResult) -> ExitCode {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            image,
            no_image,
            font,
            builtin_fonts,
            date,
        } => {
            let mut config = ExportConfig {
                output_dir: output,
                decorative_image: (!no_image).then_some(image),
                use_system_fonts: !builtin_fonts,
                date,
                ..ExportConfig::default()
            };
            if let Some(font) = font {
                config.font_family = font;
            }
            let result = match std::fs::read_to_string(&input) {
                Ok(json) => export_paper_json(&json, &config),
                Err(e) => ExportResult::failed(format!("{}: {e}", input.display())),
            };
            report(&result)
        }
        Commands::Sample { output } => {
            let config = ExportConfig {
                output_dir: output,
                decorative_image: None,
                ..ExportConfig::default()
            };
            report(&export_paper(&Paper::sample(), &config))
        }
    }
}
