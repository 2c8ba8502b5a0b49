//! pdfdesk command-line tool
//!
//! Each subcommand builds one tool request, runs it through the shared
//! dispatcher and writes the results to the output directory.

mod cli;
mod config;
mod sink;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pdfdesk_core::{
    accept_files, inspect, run, CompressionLevel, InputFile, OutputSink, PdfInfo, ToolOptions,
    ToolRequest,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use config::Config;
use sink::{DirectorySink, TerminalStatus};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout only lists written files
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    if let Commands::Info { file, json } = &cli.command {
        return print_info(file, *json);
    }

    let Some(action) = cli.command.action() else {
        return Ok(ExitCode::SUCCESS);
    };

    let mut status = TerminalStatus;
    let files = read_inputs(&cli.command.inputs())?;
    let Ok(files) = accept_files(files, &mut status) else {
        return Ok(ExitCode::FAILURE);
    };

    let options = tool_options(&cli.command, &config);
    let request = ToolRequest::new(files, action, options);
    tracing::debug!(%action, files = request.files.len(), "Running tool");

    let Ok(outputs) = run(&request, &mut status) else {
        return Ok(ExitCode::FAILURE);
    };

    let out_dir = cli.out_dir.clone().unwrap_or_else(|| config.output_dir());
    let mut sink = DirectorySink::new(&out_dir);
    for output in outputs {
        let filename = output.filename.clone();
        sink.deliver(output)
            .with_context(|| format!("Failed to write {} to {}", filename, out_dir.display()))?;
    }
    for path in sink.written() {
        println!("{}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn read_inputs(paths: &[std::path::PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(InputFile::new(name, bytes))
        })
        .collect()
}

/// Config values first, then whatever the subcommand's flags set.
fn tool_options(command: &Commands, config: &Config) -> ToolOptions {
    let mut options = config.tool_options();
    match command {
        Commands::Split { pages, .. } => options.split_pages = pages.clone(),
        Commands::Reorder { order, .. } => options.reorder_pages = order.clone(),
        Commands::Delete { pages, .. } => options.delete_pages = pages.clone(),
        Commands::Compress { level, .. } => {
            if let Some(level) = level {
                options.compress_level = CompressionLevel::new(*level);
            }
        }
        Commands::Watermark { text, .. } => {
            if let Some(text) = text {
                options.watermark_text = text.clone();
            }
        }
        Commands::Text { format, .. } => {
            if let Some(format) = format {
                options.export_format = (*format).into();
            }
        }
        Commands::Number { start, pages, .. } => {
            if let Some(start) = start {
                options.page_number_start = *start;
            }
            if let Some(pages) = pages {
                options.number_pages = pages.clone();
            }
        }
        Commands::Rotate { degrees, .. } => {
            if let Some(degrees) = degrees {
                options.rotation = *degrees;
            }
        }
        Commands::Merge { .. }
        | Commands::Images { .. }
        | Commands::FromImages { .. }
        | Commands::Flatten { .. }
        | Commands::Info { .. } => {}
    }
    options
}

fn print_info(path: &Path, json: bool) -> anyhow::Result<ExitCode> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let info = inspect(&bytes).with_context(|| format!("Cannot inspect {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", describe(&info));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(info: &PdfInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("Pages:     {}\n", info.page_count));
    out.push_str(&format!("Version:   {}\n", info.version));
    out.push_str(&format!("Size:      {} bytes\n", info.size_bytes));
    out.push_str(&format!("Encrypted: {}\n", if info.encrypted { "yes" } else { "no" }));
    if let Some(title) = &info.title {
        out.push_str(&format!("Title:     {}\n", title));
    }
    if let Some(author) = &info.author {
        out.push_str(&format!("Author:    {}\n", author));
    }
    for page in &info.pages {
        out.push_str(&format!(
            "Page {}: {} x {} pt, rotated {}, {:?}\n",
            page.page_num, page.width, page.height, page.rotation, page.orientation
        ));
    }
    out
}
