use crate::cli::{Cli, DocsAction};
use crate::commands::{finish, load_clients, spinner, Result};
use crate::output::{format_output, OutputData};
use dossier_core::DocsOptions;

pub async fn run(cli: &Cli, action: &DocsAction) -> Result<()> {
    let clients = load_clients(cli)?;

    let output = match action {
        DocsAction::Search { query } => {
            let progress = spinner(cli, format!("Searching libraries for '{}'...", query));
            let results = clients.docs.search(query).await;
            finish(progress);
            OutputData::Libraries {
                query: query.clone(),
                results: results?,
            }
        }
        DocsAction::Get {
            library,
            topic,
            tokens,
            text,
            limit,
        } => {
            let mut options = if *text {
                DocsOptions::text()
            } else {
                DocsOptions::default()
            };
            options.topic = topic.clone();
            options.tokens = *tokens;

            let progress = spinner(cli, format!("Fetching docs for {}...", library));
            let docs = clients.docs.get_docs(library, &options).await;
            finish(progress);
            OutputData::Docs {
                library: library.clone(),
                docs: docs?,
                limit: *limit,
            }
        }
    };

    format_output(&output, &cli.output)
}
