use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::wiki::WikiView;
use commands::*;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "dossier_cli=info",
        1 => "dossier_cli=debug,dossier_core=debug",
        _ => "dossier_cli=trace,dossier_core=trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Commands::Docs { action } => docs::run(&cli, action).await,
        Commands::Web {
            query,
            region,
            safesearch,
            timelimit,
            max_results,
            page,
            backend,
        } => {
            web::run(
                &cli,
                query,
                region,
                (*safesearch).into(),
                timelimit.as_deref(),
                *max_results,
                *page,
                backend,
            )
            .await
        }
        Commands::Qa {
            text,
            tag,
            top,
            site,
        } => qa::run(&cli, text, tag.as_deref(), *top, site.as_deref()).await,
        Commands::Wiki {
            title,
            summary,
            sections,
            url,
            lang,
            html,
        } => {
            let view = if *summary {
                WikiView::Summary
            } else if *sections {
                WikiView::Sections
            } else if *url {
                WikiView::Url
            } else {
                WikiView::Page
            };
            wiki::run(&cli, title, view, lang.as_deref(), *html).await
        }
        Commands::Classify { text } => classify::run(&cli, text),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("{} {}", "hint:".dimmed(), hint);
        }
        process::exit(1);
    }
}
