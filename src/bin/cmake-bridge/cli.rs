//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// cmake-bridge - Convert CMake subprojects into declarative build statements
#[derive(Parser)]
#[command(name = "cmake-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure a CMake subproject and print the equivalent build statements
    Convert(ConvertArgs),

    /// Convert a saved code model without running CMake
    Translate(TranslateArgs),

    /// Print the raw code model of a CMake subproject
    Codemodel(CodemodelArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// How converted projects are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Build statements
    Text,
    /// Converted targets as JSON
    Json,
}

/// Where a subproject lives and how CMake is run on it.
#[derive(Args)]
pub struct SessionArgs {
    /// CMake source directory of the subproject
    pub source: PathBuf,

    /// Build root (defaults to <SOURCE>/build)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Subproject directory relative to the build root
    #[arg(long)]
    pub subdir: Option<PathBuf>,

    /// Installation prefix passed to CMake
    #[arg(long, default_value = "/usr/local")]
    pub install_prefix: PathBuf,

    /// Backend selecting the CMake generator (ninja, xcode, vs2010, vs2015, vs2017)
    #[arg(long, env = "CMAKE_BRIDGE_BACKEND")]
    pub backend: Option<String>,

    /// Extra CMake definitions (e.g. -D BUILD_TESTING=OFF)
    #[arg(short = 'D', value_name = "OPT")]
    pub defines: Vec<String>,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct TranslateArgs {
    /// Saved code model (JSON, as printed by `cmake-bridge codemodel`)
    pub codemodel: PathBuf,

    /// CMake source directory the code model was produced from
    #[arg(long)]
    pub source_dir: PathBuf,

    /// Build root paths are rebased against
    #[arg(long)]
    pub build_root: PathBuf,

    /// Subproject directory relative to the build root
    #[arg(long)]
    pub subdir: Option<PathBuf>,

    /// Installation prefix install directories are rebased against
    #[arg(long, default_value = "/usr/local")]
    pub install_prefix: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct CodemodelArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
