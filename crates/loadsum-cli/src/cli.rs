use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use loadsum_core::InputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "loadsum-cli",
    about = "Summarize JMeter and k6 load-test results",
    version
)]
pub struct Cli {
    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (TOML, JSON or YAML); missing files are ignored
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a result file
    Summarize {
        /// JMeter CSV/JTL table or k6 JSON summary
        file: PathBuf,

        /// Input format; `auto` detects it from the file name and content type
        #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,

        /// Declared content type, instead of guessing from the extension
        #[arg(long)]
        content_type: Option<String>,

        /// Output encoding
        #[arg(short, long, value_enum, default_value_t = OutputArg::Json)]
        output: OutputArg,

        /// Write output here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the tool a result file would be parsed as
    Detect {
        file: PathBuf,
    },

    /// Summarize a result file and print its health assessment
    Assess {
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Auto,
    Jmeter,
    K6,
}

impl FormatArg {
    /// The forced format, or `None` for detection.
    pub fn forced(self) -> Option<InputFormat> {
        match self {
            Self::Auto => None,
            Self::Jmeter => Some(InputFormat::Jmeter),
            Self::K6 => Some(InputFormat::K6),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputArg {
    Json,
    Csv,
}
