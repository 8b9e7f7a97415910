use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use tracing::{debug, info};

use vnode_query::{fixture, serialize, Projector, QueryNode, VNode};

#[derive(Parser)]
#[command(name = "vnode-query")]
#[command(about = "Run vnode selector queries against an HTML fragment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node(s) matched by a chain of selectors
    Query {
        /// HTML file path, or '-' for stdin
        input: String,

        /// Selectors applied in turn, each searching below the previous match
        #[arg(required = true)]
        selectors: Vec<String>,

        /// Return every match of the last selector instead of the first
        #[arg(short, long)]
        all: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the text content of the matched node (or of the whole fragment)
    Text {
        /// HTML file path, or '-' for stdin
        input: String,

        /// Selectors applied in turn
        selectors: Vec<String>,
    },

    /// Print the vnode tree built from the fragment
    Tree {
        /// HTML file path, or '-' for stdin
        input: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            input,
            selectors,
            all,
            format,
        } => {
            info!(input = %input, selectors = ?selectors, all = all, "query command");
            let projector = projector_for(&input)?;
            let (last, chain) = selectors
                .split_last()
                .context("at least one selector is required")?;
            let matches = match chain_queries(&projector, chain)? {
                Some(parent) if all => parent.query_all(last.as_str())?.execute()?,
                None if all => projector.query_all(last.as_str())?.execute()?,
                Some(parent) => vec![parent.query(last.as_str())?.execute()?],
                None => vec![projector.query(last.as_str())?.execute()?],
            };
            info!(matches = matches.len(), "query complete");
            print_nodes(&matches, &format)
        }
        Commands::Text { input, selectors } => {
            info!(input = %input, selectors = ?selectors, "text command");
            let projector = projector_for(&input)?;
            let text = match chain_queries(&projector, &selectors)? {
                Some(query) => query.text_content()?,
                None => projector.root().text_content()?,
            };
            println!("{text}");
            Ok(())
        }
        Commands::Tree { input, format } => {
            info!(input = %input, "tree command");
            let projector = projector_for(&input)?;
            let tree = projector.root().execute()?;
            print_nodes(&[tree], &format)
        }
    }
}

fn projector_for(input: &str) -> Result<Projector> {
    let tree = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        fixture::parse(&buf)?
    } else {
        fixture::load(input)?
    };
    debug!(selector = %tree.selector, "fixture loaded");
    Ok(Projector::with_render(move || Some(tree.clone())))
}

/// First selector runs from the projector, later ones below the previous match.
fn chain_queries(projector: &Projector, selectors: &[String]) -> Result<Option<QueryNode>> {
    let mut current: Option<QueryNode> = None;
    for selector in selectors {
        current = Some(match &current {
            Some(query) => query.query(selector.as_str())?,
            None => projector.query(selector.as_str())?,
        });
    }
    Ok(current)
}

fn print_nodes(nodes: &[VNode], format: &str) -> Result<()> {
    let output = match format {
        "json" => serde_json::to_string_pretty(nodes)?,
        "text" => serialize::list_to_compact_text(nodes),
        other => bail!("unknown format {other:?}, expected text or json"),
    };
    print!("{output}");
    if format == "json" {
        println!();
    }
    Ok(())
}
