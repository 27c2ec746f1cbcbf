use clap::Subcommand;
use std::path::PathBuf;

pub mod compile;
pub mod info;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a graph document to a Ren'Py script
    Compile {
        /// Source graph document (.json)
        source: PathBuf,

        /// Output script file (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Character records file (JSON array) for cast declarations
        #[arg(short, long)]
        characters: Option<PathBuf>,
    },

    /// Summarize a graph document
    Info {
        /// Source graph document (.json)
        source: PathBuf,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Compile {
                source,
                output,
                characters,
            } => compile::execute(source, output.as_deref(), characters.as_deref()),
            Commands::Info { source } => info::execute(source),
        }
    }
}
