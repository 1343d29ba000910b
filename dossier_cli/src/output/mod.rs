use crate::cli::OutputFormat;
use crate::commands::Result;
use dossier_core::{
    Classification, DocsResponse, DossierItem, Research, SearchResult, WebResult, WikiPage,
    WikiSection,
};
use serde::Serialize;

mod pretty;
pub use pretty::format_pretty;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutputData {
    Libraries {
        query: String,
        results: Vec<SearchResult>,
    },
    Docs {
        library: String,
        docs: DocsResponse,
        /// Pretty output only shows this many snippets
        #[serde(skip)]
        limit: Option<usize>,
    },
    WebResults {
        query: String,
        results: Vec<WebResult>,
    },
    Research(Research),
    Dossier {
        query: String,
        tagged: Option<String>,
        items: Vec<DossierItem>,
    },
    WikiPage(WikiPage),
    WikiSummary {
        title: String,
        summary: Option<String>,
    },
    WikiUrl {
        title: String,
        url: Option<String>,
    },
    WikiSections {
        title: String,
        sections: Option<Vec<WikiSection>>,
    },
    Classification {
        text: String,
        classification: Classification,
    },
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => {
            print!("{}", format_text(data));
        }
        OutputFormat::Pretty => {
            print!("{}", format_pretty(data));
        }
    }
    Ok(())
}

fn format_text(data: &OutputData) -> String {
    let mut out = String::new();
    match data {
        OutputData::Libraries { results, .. } => {
            for r in results {
                out.push_str(&format!("{}\t{}\t{}\n", r.id, r.title, r.description));
            }
        }
        OutputData::Docs { docs, .. } => match docs {
            DocsResponse::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            DocsResponse::Entries(entries) => {
                for entry in entries {
                    out.push_str(&format!("{}\n{}\n", entry.title, entry.description));
                    for snippet in &entry.code_list {
                        out.push_str(&snippet.code);
                        out.push('\n');
                    }
                    out.push('\n');
                }
            }
        },
        OutputData::WebResults { results, .. } => {
            for r in results {
                out.push_str(&format!("{}\t{}\n", r.title, r.href));
            }
        }
        OutputData::Research(research) => {
            out.push_str(&format!(
                "language: {}\n",
                research.classification.language
            ));
            if let Some(error_type) = &research.classification.error_type {
                out.push_str(&format!("error: {}\n", error_type));
            }
            push_items_text(&mut out, &research.items);
        }
        OutputData::Dossier { items, .. } => push_items_text(&mut out, items),
        OutputData::WikiPage(page) => {
            if page.exists {
                out.push_str(&format!("{}\n\n{}\n", page.title, page.text));
            } else {
                out.push_str(&format!("{}: page does not exist\n", page.title));
            }
        }
        OutputData::WikiSummary { summary, .. } => {
            out.push_str(summary.as_deref().unwrap_or_default());
            out.push('\n');
        }
        OutputData::WikiUrl { url, .. } => {
            out.push_str(url.as_deref().unwrap_or_default());
            out.push('\n');
        }
        OutputData::WikiSections { sections, .. } => {
            for s in sections.iter().flatten() {
                out.push_str(&format!("{} {}\n", s.number, s.title));
                if !s.text.is_empty() {
                    out.push_str(&s.text);
                    out.push_str("\n\n");
                }
            }
        }
        OutputData::Classification { classification, .. } => {
            out.push_str(&format!(
                "{}\t{}\n",
                classification.language,
                classification.error_type.as_deref().unwrap_or("-")
            ));
        }
    }
    out
}

fn push_items_text(out: &mut String, items: &[DossierItem]) {
    for item in items {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            item.question().score,
            item.question().title,
            item.answer_link()
        ));
    }
}
