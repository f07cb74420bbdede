use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use dsnlinks::config::{get_config_path, load_config, save_config, LinkerConfig};
use dsnlinks::db::Database;
use dsnlinks::linker::DatasetLinker;

/// Dataset links from FTP and CDSEND scripts in JCL job steps.
#[derive(Parser)]
#[command(name = "dsnlinks", about = "Dataset links from FTP and CDSEND scripts in JCL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dataset links into a host graph database
    Extract {
        /// Path to the host graph database
        db: PathBuf,
        /// Project directory holding `.dsnlinks/config.json` (default: current directory)
        #[arg(short, long)]
        project: Option<String>,
        /// Print the run report as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// List the dataset links stored in a host graph database
    Links {
        /// Path to the host graph database
        db: PathBuf,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Write a default configuration file
    InitConfig {
        /// Project path (default: current directory)
        path: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> dsnlinks::errors::Result<()> {
    match cli.command {
        Commands::Extract { db, project, json } => {
            let config = load_config(&resolve_path(project))?;
            let mut database = Database::open(&db)?;
            let report = DatasetLinker::new(&mut database, config).run()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Scanned {} links ({} skipped): {} references, {} links created, {} placeholder datasets",
                    report.links_scanned,
                    report.links_skipped,
                    report.references,
                    report.edges_created,
                    report.placeholders_created
                );
                for failure in &report.failures {
                    println!(
                        "  failed [{}] {} -> {}: {}",
                        failure.family.as_str(),
                        failure.caller,
                        failure.callee,
                        failure.message
                    );
                }
            }
        }
        Commands::Links { db, json } => {
            let database = Database::open(&db)?;
            let links = database.get_reference_links()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&links)?);
            } else if links.is_empty() {
                println!("No dataset links");
            } else {
                for link in &links {
                    let target = database
                        .get_object(&link.target)?
                        .map(|o| o.name)
                        .unwrap_or_else(|| link.target.clone());
                    println!(
                        "{} {} -> {} ({}:{}-{})",
                        link.kind.as_str(),
                        link.source,
                        target,
                        link.bookmark.file,
                        link.bookmark.begin_line,
                        link.bookmark.end_line
                    );
                }
            }
        }
        Commands::InitConfig { path } => {
            let project_path = resolve_path(path);
            save_config(&project_path, &LinkerConfig::default())?;
            println!("Wrote {}", get_config_path(&project_path).display());
        }
    }
    Ok(())
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
