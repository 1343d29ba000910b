use crate::cli::Cli;
use crate::commands::{finish, load_config, spinner, Result};
use crate::output::{format_output, OutputData};
use dossier_core::{build_clients, ExtractFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiView {
    Page,
    Summary,
    Sections,
    Url,
}

pub async fn run(
    cli: &Cli,
    title: &str,
    view: WikiView,
    lang: Option<&str>,
    html: bool,
) -> Result<()> {
    let mut config = load_config(cli)?;
    if let Some(lang) = lang {
        config.wikipedia.language = lang.to_string();
    }
    if html {
        config.wikipedia.extract_format = ExtractFormat::Html;
    }
    let clients = build_clients(&config)?;
    let wiki = &clients.wiki;

    let progress = spinner(cli, format!("Reading '{}' on Wikipedia...", title));
    let output = match view {
        WikiView::Page => wiki.get_page(title).await.map(OutputData::WikiPage),
        WikiView::Summary => wiki
            .get_page_summary(title)
            .await
            .map(|summary| OutputData::WikiSummary {
                title: title.to_string(),
                summary,
            }),
        WikiView::Sections => {
            wiki.get_page_sections(title)
                .await
                .map(|sections| OutputData::WikiSections {
                    title: title.to_string(),
                    sections,
                })
        }
        WikiView::Url => wiki
            .get_page_url(title)
            .await
            .map(|url| OutputData::WikiUrl {
                title: title.to_string(),
                url,
            }),
    };
    finish(progress);

    format_output(&output?, &cli.output)
}
