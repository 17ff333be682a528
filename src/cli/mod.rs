//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod documents;

pub use documents::{load_documents, Document};

#[derive(Parser, Debug)]
#[command(
    name = "rag-pipeline",
    version,
    about = "Retrieval-Augmented Generation over a directory of text files",
    long_about = "Splits the .txt files of a directory into overlapping passages, embeds them, \
                  and answers questions or writes summaries with an Azure OpenAI deployment. \
                  The index lives in memory, so every command indexes the directory it is given."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/rag-pipeline/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply from the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the documents of a directory and report what was indexed
    Index {
        /// Directory containing .txt documents
        dir: PathBuf,
    },

    /// Show the passages most similar to a query, with scores
    Search {
        /// Directory containing .txt documents
        dir: PathBuf,

        /// Search query text
        query: String,

        /// Number of passages to show (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Answer a question from the documents of a directory
    Ask {
        /// Directory containing .txt documents
        dir: PathBuf,

        /// Question to ask
        question: String,

        /// Number of passages given to the model (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Summarize every document of a directory
    Summarize {
        /// Directory containing .txt documents
        dir: PathBuf,

        /// Word ceiling per summary (defaults to generation.summary_max_length)
        #[arg(short, long)]
        max_length: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["rag-pipeline", "ask", "docs", "What is RAG?", "-k", "3"]).unwrap();
        match cli.command {
            Commands::Ask {
                dir,
                question,
                top_k,
            } => {
                assert_eq!(dir, PathBuf::from("docs"));
                assert_eq!(question, "What is RAG?");
                assert_eq!(top_k, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
