use clap::{Parser, Subcommand, ValueEnum};
use forge_reasoning::StepKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forge")]
#[command(about = "Reasoning chat and multi-agent project generation", long_about = None)]
pub struct Cli {
    /// Path to forge.toml
    #[arg(long, global = true, env = "FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send one chat message
    Chat {
        message: String,

        /// Model id (defaults to the configured default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Think before answering: `thought` or `draft`
        #[arg(short, long)]
        reasoning: Option<StepKind>,

        /// Print events as they arrive
        #[arg(long)]
        stream: bool,

        /// Print the stream in the legacy marker protocol (implies --stream)
        #[arg(long)]
        legacy_markers: bool,

        /// Continue an existing thread
        #[arg(long)]
        thread: Option<String>,

        #[arg(short, long, default_value = "cli_user")]
        user_id: String,
    },

    /// Run the four-stage agent pipeline over a set of requirements
    Pipeline {
        requirements: String,

        /// File whose contents are passed to every stage as project context
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Project id used for step records and file versions (random when unset)
        #[arg(long)]
        project: Option<String>,
    },

    /// List known models and whether their provider is available
    Models {
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
}
