use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indexer::build_index;
use search_core::{store, StemLanguage, StopWords, TokenizerConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect boolean inverted indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StopWordsArg {
    None,
    English,
    Spanish,
}

#[derive(Clone, Copy, ValueEnum)]
enum StemArg {
    English,
    Spanish,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from crawled JSON/JSONL/HTML/text files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index file
        #[arg(long, default_value = "./index.bqix")]
        output: PathBuf,
        /// Drop terms shorter than this many characters
        #[arg(long, default_value_t = 1)]
        min_token_len: usize,
        /// Stop-word list to remove
        #[arg(long, value_enum, default_value_t = StopWordsArg::None)]
        stopwords: StopWordsArg,
        /// Stem terms for this language
        #[arg(long, value_enum)]
        stem: Option<StemArg>,
        /// Keep diacritics instead of folding them away
        #[arg(long, default_value_t = false)]
        keep_accents: bool,
    },
    /// Print header and statistics of an existing index as JSON
    Stats {
        #[arg(long, default_value = "./index.bqix")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, min_token_len, stopwords, stem, keep_accents } => {
            let config = TokenizerConfig {
                min_token_len,
                stopwords: match stopwords {
                    StopWordsArg::None => StopWords::None,
                    StopWordsArg::English => StopWords::English,
                    StopWordsArg::Spanish => StopWords::Spanish,
                },
                fold_accents: !keep_accents,
                stemmer: stem.map(|s| match s {
                    StemArg::English => StemLanguage::English,
                    StemArg::Spanish => StemLanguage::Spanish,
                }),
            };
            let report = build_index(&input, &output, config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stats { index } => {
            let (header, idx) = store::load_with_header(&index)?;
            let out = serde_json::json!({
                "created_at": header.created_at,
                "tokenizer": header.tokenizer,
                "stats": idx.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
