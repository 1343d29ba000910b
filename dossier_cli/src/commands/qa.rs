use crate::cli::Cli;
use crate::commands::{finish, load_config, spinner, CommandError, Result};
use crate::output::{format_output, OutputData};
use dossier_core::build_clients;

pub async fn run(
    cli: &Cli,
    text: &str,
    tag: Option<&str>,
    top: Option<usize>,
    site: Option<&str>,
) -> Result<()> {
    if top == Some(0) {
        return Err(CommandError::InvalidArgument("--top must be at least 1".into()));
    }
    let mut config = load_config(cli)?;
    if let Some(top) = top {
        config.stackexchange.top_n = top;
    }
    if let Some(site) = site {
        config.stackexchange.site = site.to_string();
    }
    let clients = build_clients(&config)?;

    let progress = spinner(cli, format!("Researching on {}...", clients.qa.site()));
    let output = match tag {
        Some(tag) => clients
            .qa
            .build_dossier(text, Some(tag))
            .await
            .map(|items| OutputData::Dossier {
                query: text.trim().to_string(),
                tagged: Some(tag.to_string()),
                items,
            }),
        None => clients.qa.research(text).await.map(OutputData::Research),
    };
    finish(progress);

    format_output(&output?, &cli.output)
}
