use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pdfdesk_core::{ExportFormat, ToolAction};

/// Merge, split, compress, watermark and otherwise edit PDF files.
#[derive(Debug, Parser)]
#[command(name = "pdfdesk", about, version)]
pub struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file. Default: ./pdfdesk.toml when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for output files. Default: [output] dir from the config, else .
    #[arg(short, long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Combine PDFs into merged.pdf, in the order given
    Merge {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Extract pages into split.pdf
    Split {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1-3,5,9-10')
        #[arg(long)]
        pages: String,
    },

    /// Strip metadata and compress streams into compressed.pdf
    Compress {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Compression level, 1-9. Levels below 5 also drop XMP metadata and thumbnails
        #[arg(long)]
        level: Option<u8>,
    },

    /// Stamp diagonal text across every page into watermarked.pdf
    Watermark {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Watermark text
        #[arg(long)]
        text: Option<String>,
    },

    /// Export page text as export.txt, export.md or export.html
    Text {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Save embedded images as page-<n>-<k>.jpg/png
    Images {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Build images.pdf from JPEG and PNG files, one page per image
    FromImages {
        #[arg(value_name = "IMAGE", required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Rearrange pages into reordered.pdf
    Reorder {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// New page order (e.g. '3,1,2')
        #[arg(long)]
        order: String,
    },

    /// Add page numbers at the bottom of each page into paged.pdf
    Number {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number shown on the first page
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,

        /// Page range to number. Default: all pages
        #[arg(long)]
        pages: Option<String>,
    },

    /// Burn form field appearances into the page into flattened.pdf
    Flatten {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Remove pages into trimmed.pdf
    Delete {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range to delete (e.g. '2,4-5')
        #[arg(long)]
        pages: String,
    },

    /// Set page rotation into rotated.pdf
    Rotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Degrees clockwise, a multiple of 90
        #[arg(long, allow_hyphen_values = true)]
        degrees: Option<i64>,
    },

    /// Show document and page information
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// The tool this subcommand runs. `info` runs none.
    pub fn action(&self) -> Option<ToolAction> {
        Some(match self {
            Commands::Merge { .. } => ToolAction::Merge,
            Commands::Split { .. } => ToolAction::Split,
            Commands::Compress { .. } => ToolAction::Compress,
            Commands::Watermark { .. } => ToolAction::Watermark,
            Commands::Text { .. } => ToolAction::PdfText,
            Commands::Images { .. } => ToolAction::PdfImages,
            Commands::FromImages { .. } => ToolAction::ImagesPdf,
            Commands::Reorder { .. } => ToolAction::Reorder,
            Commands::Number { .. } => ToolAction::PageNumbers,
            Commands::Flatten { .. } => ToolAction::Flatten,
            Commands::Delete { .. } => ToolAction::DeletePages,
            Commands::Rotate { .. } => ToolAction::Rotate,
            Commands::Info { .. } => return None,
        })
    }

    /// Input paths, in the order given.
    pub fn inputs(&self) -> Vec<PathBuf> {
        match self {
            Commands::Merge { files } | Commands::FromImages { files } => files.clone(),
            Commands::Split { file, .. }
            | Commands::Compress { file, .. }
            | Commands::Watermark { file, .. }
            | Commands::Text { file, .. }
            | Commands::Images { file }
            | Commands::Reorder { file, .. }
            | Commands::Number { file, .. }
            | Commands::Flatten { file }
            | Commands::Delete { file, .. }
            | Commands::Rotate { file, .. }
            | Commands::Info { file, .. } => vec![file.clone()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Markdown,
    Html,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Html => ExportFormat::Html,
        }
    }
}
