use crate::cli::Cli;
use crate::commands::{finish, load_clients, spinner, CommandError, Result};
use crate::output::{format_output, OutputData};
use dossier_core::{SafeSearch, SearchOptions, TimeLimit};

pub async fn run(
    cli: &Cli,
    query: &str,
    region: &str,
    safesearch: SafeSearch,
    timelimit: Option<&str>,
    max_results: usize,
    page: u32,
    backend: &str,
) -> Result<()> {
    if max_results == 0 {
        return Err(CommandError::InvalidArgument(
            "--max-results must be at least 1".into(),
        ));
    }
    let timelimit = timelimit.map(str::parse::<TimeLimit>).transpose()?;
    let options = SearchOptions {
        region: region.to_string(),
        safesearch,
        timelimit,
        max_results,
        page: page.max(1),
        backend: backend.to_string(),
    };

    let clients = load_clients(cli)?;
    let progress = spinner(cli, format!("Searching the web for '{}'...", query));
    let results = clients.metasearch.search(query, &options).await;
    finish(progress);

    let output = OutputData::WebResults {
        query: query.to_string(),
        results: results?,
    };
    format_output(&output, &cli.output)
}
