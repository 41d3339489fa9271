use anyhow::Context;
use cda::{mapping, ClinicalDocument, DateFormats, ReportConfig, ReportOptions};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cda")]
#[command(about = "HL7 CDA document inspection and HTML reporting")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a CDA document as an HTML report
    Report {
        /// CDA XML file
        file: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Logo image URL shown beside the heading
        #[arg(long, env = "CDA_REPORT_LOGO_URL")]
        logo: Option<String>,
        /// External stylesheet URL
        #[arg(long, env = "CDA_REPORT_STYLESHEET_URL")]
        stylesheet: Option<String>,
        /// chrono pattern for dates, e.g. %d/%m/%Y
        #[arg(long, env = "CDA_DATE_FORMAT")]
        date_format: Option<String>,
        /// chrono pattern for date-times, e.g. "%d/%m/%Y %H:%M"
        #[arg(long, env = "CDA_DATE_TIME_FORMAT")]
        date_time_format: Option<String>,
        /// Replacement for \.br\ line-break markers in narrative text
        #[arg(long, env = "CDA_LINE_BREAK")]
        line_break: Option<String>,
        /// Fail if the document lacks patient, custodian or effective time details
        #[arg(long)]
        strict: bool,
    },
    /// Parse a CDA document and print the model as JSON
    Inspect {
        /// CDA XML file
        file: PathBuf,
    },
    /// Print the element mapping tables
    Mapping,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cda=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(command) => run(command, &mut std::io::stdout().lock()),
        None => {
            println!("Use 'cda --help' for commands");
            Ok(())
        }
    }
}

fn run(command: Commands, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Report {
            file,
            output,
            logo,
            stylesheet,
            date_format,
            date_time_format,
            line_break,
            strict,
        } => {
            let config = report_config(
                logo,
                stylesheet,
                date_format,
                date_time_format,
                line_break,
                strict,
            )?;
            let raw = read_document(&file)?;
            let html = cda::generate_report(&raw, &config)
                .with_context(|| format!("Failed to render report for {}", file.display()))?;

            match output {
                Some(path) => {
                    std::fs::write(&path, html)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(output = %path.display(), "wrote report");
                }
                None => out.write_all(html.as_bytes())?,
            }
        }
        Commands::Inspect { file } => {
            let raw = read_document(&file)?;
            let document = ClinicalDocument::parse(&raw)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            serde_json::to_writer_pretty(&mut *out, &document)?;
            writeln!(out)?;
        }
        Commands::Mapping => {
            mapping::validate_schema()?;
            for table in mapping::schema() {
                writeln!(out, "{}", table.entity)?;
                for binding in table.bindings {
                    writeln!(
                        out,
                        "  {:<28} {:<10} {}",
                        binding.field, binding.cardinality, binding.path
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Resolve flag and environment values into a pipeline configuration.
fn report_config(
    logo: Option<String>,
    stylesheet: Option<String>,
    date_format: Option<String>,
    date_time_format: Option<String>,
    line_break: Option<String>,
    strict: bool,
) -> anyhow::Result<ReportConfig> {
    let mut options = ReportOptions::new();
    if let Some(url) = logo {
        options = options.with_logo_url(url);
    }
    if let Some(url) = stylesheet {
        options = options.with_stylesheet_url(url);
    }

    let mut config = ReportConfig::new().with_options(options).strict(strict);

    match (date_format, date_time_format) {
        (Some(date), Some(date_time)) => {
            let formats = DateFormats::new(date, date_time).context("Invalid date format")?;
            config = config.with_date_formats(formats);
        }
        (None, None) => {}
        _ => tracing::warn!(
            "both --date-format and --date-time-format are needed; dates left unformatted"
        ),
    }

    if let Some(replacement) = line_break {
        config = config.with_line_break(replacement);
    }

    Ok(config)
}
