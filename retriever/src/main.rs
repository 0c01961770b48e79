use anyhow::Result;
use clap::{Parser, Subcommand};
use retriever::{BatchReport, Retriever, SearchResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "retriever")]
#[command(about = "Answer boolean AND/OR/NOT queries against a built index", long_about = None)]
struct Cli {
    /// Index file path
    #[arg(long, global = true, default_value = "./index.bqix")]
    index: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single query, e.g. "universidad AND NOT privado"
    Query {
        query: String,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate one query per line of a file; bad lines are reported, not fatal
    Batch {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Serve queries over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { query, json } => {
            let retriever = Retriever::open(&cli.index)?;
            let result = retriever.search(&query)?;
            print_result(&retriever, &result, json)?;
        }
        Commands::Batch { file, json } => {
            let retriever = Retriever::open(&cli.index)?;
            let report = retriever.search_file(&file)?;
            print_batch(&retriever, &report, json)?;
        }
        Commands::Serve { host, port } => {
            let app = retriever::http::build_app(cli.index.clone())?;
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}

fn print_result(retriever: &Retriever, result: &SearchResult, json: bool) -> Result<()> {
    let hits = retriever.resolve(&result.doc_ids);
    let total_hits = hits.len();
    if json {
        let out = serde_json::json!({ "query": result.query, "total_hits": total_hits, "results": hits });
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("{} ({} hits)", result.query, total_hits);
        for hit in hits {
            println!("  {}\t{}\t{}", hit.doc_id, hit.url, hit.title);
        }
    }
    Ok(())
}

fn print_batch(retriever: &Retriever, report: &BatchReport, json: bool) -> Result<()> {
    for entry in &report.entries {
        match &entry.outcome {
            Ok(result) => print_result(retriever, result, json)?,
            Err(e) if json => {
                let out = serde_json::json!({ "query": entry.query, "line": entry.line, "error": e.to_string() });
                println!("{}", serde_json::to_string(&out)?);
            }
            Err(e) => println!("{} (line {}): error: {e}", entry.query, entry.line),
        }
    }
    eprintln!(
        "solved {} queries ({} failed) in {:.3}s",
        report.entries.len(),
        report.failures(),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
