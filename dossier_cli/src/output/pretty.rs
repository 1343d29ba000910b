//! Pretty formatter for terminal output.
//!
//! Results render as numbered cards: bold title, clickable link, dimmed
//! snippet and metadata. Long text is wrapped to the terminal width.

use super::OutputData;
use dossier_core::{
    Classification, DocEntry, DocsResponse, DossierItem, SearchResult, WebResult, WikiPage,
    WikiSection,
};
use htmd::HtmlToMarkdown;
use owo_colors::OwoColorize;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: &str = "      ";

/// Answer bodies longer than this many lines are cut.
const MAX_ANSWER_LINES: usize = 12;

/// Lines of section text shown under each heading.
const MAX_SECTION_LINES: usize = 4;

pub fn format_pretty(data: &OutputData) -> String {
    let width = terminal_width();
    match data {
        OutputData::Libraries { query, results } => format_libraries(query, results, width),
        OutputData::Docs { library, docs, limit } => format_docs(library, docs, *limit, width),
        OutputData::WebResults { query, results } => format_web(query, results, width),
        OutputData::Research(research) => {
            let mut out = format_classification(&research.query, &research.classification);
            out.push('\n');
            out.push_str(&format_dossier(&research.items, width));
            out
        }
        OutputData::Dossier { query, tagged, items } => {
            let mut out = format!("{} {}\n", "Query:".bold().cyan(), query);
            if let Some(tag) = tagged {
                out.push_str(&format!("{} {}\n", "Tag:".bold().cyan(), tag.yellow()));
            }
            out.push('\n');
            out.push_str(&format_dossier(items, width));
            out
        }
        OutputData::WikiPage(page) => format_wiki_page(page, width),
        OutputData::WikiSummary { title, summary } => match summary {
            Some(summary) => format!("{}\n\n{}\n", title.bold(), wrap(summary, width, "")),
            None => missing_page(title),
        },
        OutputData::WikiUrl { title, url } => match url {
            Some(url) => format!("{}\n", format_hyperlink(url, url).blue()),
            None => missing_page(title),
        },
        OutputData::WikiSections { title, sections } => match sections {
            Some(sections) => format_sections(title, sections, width),
            None => missing_page(title),
        },
        OutputData::Classification {
            text,
            classification,
        } => format_classification(text, classification),
    }
}

// ============================================================================
// Per-result formatting
// ============================================================================

fn format_libraries(query: &str, results: &[SearchResult], width: usize) -> String {
    if results.is_empty() {
        return no_results(query);
    }
    let mut out = format_section_header("libraries", Some(results.len()), width);
    out.push('\n');
    for (i, r) in results.iter().enumerate() {
        out.push_str(&card_title(i + 1, &r.title));
        out.push_str(&format!("{}{}\n", CARD_INDENT, r.id.yellow()));
        if !r.description.is_empty() {
            out.push_str(&format!(
                "{}\n",
                wrap(&clean_snippet(&r.description), width, CARD_INDENT).dimmed()
            ));
        }
        let mut meta = vec![
            format!("stars: {}", r.stars),
            format!("trust: {:.1}", r.trust_score),
        ];
        if !r.versions.is_empty() {
            meta.push(format!("versions: {}", r.versions.join(", ")));
        }
        out.push_str(&format!("{}{}\n", CARD_INDENT, meta.join("  ").dimmed()));
    }
    out
}

fn format_docs(library: &str, docs: &DocsResponse, limit: Option<usize>, width: usize) -> String {
    match docs {
        DocsResponse::Text(text) => format!(
            "{}\n\n{}\n",
            format_section_header(library, None, width),
            text
        ),
        DocsResponse::Entries(entries) if entries.is_empty() => no_results(library),
        DocsResponse::Entries(entries) => {
            let shown: Vec<&DocEntry> = match limit {
                Some(n) => docs.top_by_relevance(n),
                None => entries.iter().collect(),
            };
            let mut out = format_section_header(library, Some(shown.len()), width);
            out.push('\n');
            for (i, entry) in shown.iter().enumerate() {
                out.push_str(&card_title(i + 1, &entry.title));
                if !entry.description.is_empty() {
                    out.push_str(&format!(
                        "{}\n",
                        wrap(&entry.description, width, CARD_INDENT).dimmed()
                    ));
                }
                for snippet in &entry.code_list {
                    out.push_str(&format!(
                        "{}{}\n",
                        CARD_INDENT,
                        format!("```{}", snippet.language).dimmed()
                    ));
                    for line in snippet.code.lines() {
                        out.push_str(&format!("{}{}\n", CARD_INDENT, line));
                    }
                    out.push_str(&format!("{}{}\n", CARD_INDENT, "```".dimmed()));
                }
                if !entry.source_id.is_empty() {
                    out.push_str(&format!(
                        "{}{}\n",
                        CARD_INDENT,
                        format_hyperlink(&entry.source_id, &entry.source_id).blue()
                    ));
                }
            }
            out
        }
    }
}

fn format_web(query: &str, results: &[WebResult], width: usize) -> String {
    if results.is_empty() {
        return no_results(query);
    }
    let mut out = format_section_header("web", Some(results.len()), width);
    out.push('\n');
    for (i, r) in results.iter().enumerate() {
        out.push_str(&card_title(i + 1, &r.title));
        out.push_str(&format!(
            "{}{}\n",
            CARD_INDENT,
            format_hyperlink(&r.href, &r.href).blue()
        ));
        let snippet = clean_snippet(&r.body);
        if !snippet.is_empty() {
            out.push_str(&format!("{}\n", wrap(&snippet, width, CARD_INDENT).dimmed()));
        }
    }
    out
}

fn format_dossier(items: &[DossierItem], width: usize) -> String {
    if items.is_empty() {
        return format!("{}\n", "No questions with accepted answers found.".yellow());
    }
    let mut out = format_section_header("dossier", Some(items.len()), width);
    out.push('\n');
    for (i, item) in items.iter().enumerate() {
        let question = item.question();
        let answer = item.answer();
        out.push_str(&card_title(i + 1, &question.title));
        out.push_str(&format!(
            "{}{}\n",
            CARD_INDENT,
            format_hyperlink(item.answer_link(), item.answer_link()).blue()
        ));

        let mut meta = vec![
            format!("score: {}", question.score),
            format!("answer score: {}", answer.score),
        ];
        if let Some(created) = answer.created_at() {
            meta.push(format!("answered: {}", created.format("%Y-%m-%d")));
        }
        if !question.tags.is_empty() {
            meta.push(format!("tags: {}", question.tags.join(", ")));
        }
        out.push_str(&format!("{}{}\n", CARD_INDENT, meta.join("  ").dimmed()));

        let body = html_to_markdown(&answer.body);
        let wrapped = wrap(&body, width, CARD_INDENT);
        let mut lines = wrapped.lines();
        for line in lines.by_ref().take(MAX_ANSWER_LINES) {
            out.push_str(line);
            out.push('\n');
        }
        if lines.next().is_some() {
            out.push_str(&format!("{}{}\n", CARD_INDENT, "…".dimmed()));
        }
        out.push('\n');
    }
    out
}

fn format_wiki_page(page: &WikiPage, width: usize) -> String {
    if !page.exists {
        return missing_page(&page.title);
    }
    let mut out = format!("{}\n", page.title.bold().cyan());
    if let Some(url) = &page.full_url {
        out.push_str(&format!("{}\n", format_hyperlink(url, url).blue()));
    }
    out.push('\n');
    if !page.summary.is_empty() {
        out.push_str(&format!("{}\n\n", wrap(&page.summary, width, "").bold()));
    }
    out.push_str(&page.text);
    out.push('\n');
    out
}

fn format_sections(title: &str, sections: &[WikiSection], width: usize) -> String {
    let mut out = format_section_header(title, None, width);
    out.push('\n');
    for section in sections {
        let indent = "  ".repeat(section.level.saturating_sub(1) as usize);
        out.push_str(&format!(
            "{}{} {}\n",
            indent,
            section.number.dimmed(),
            section.title.bold()
        ));
        if section.text.is_empty() {
            continue;
        }
        let body_indent = format!("{}  ", indent);
        let wrapped = wrap(&section.text, width.saturating_sub(body_indent.len()), "");
        let mut lines = wrapped.lines();
        for line in lines.by_ref().take(MAX_SECTION_LINES) {
            out.push_str(&format!("{}{}\n", body_indent, line.dimmed()));
        }
        if lines.next().is_some() {
            out.push_str(&format!("{}{}\n", body_indent, "…".dimmed()));
        }
        out.push('\n');
    }
    out
}

fn format_classification(text: &str, classification: &Classification) -> String {
    let language = if classification.is_known() {
        classification.language.green().bold().to_string()
    } else {
        classification.language.yellow().to_string()
    };
    let mut out = format!("{} {}\n", "Query:".bold().cyan(), text);
    out.push_str(&format!("{} {}\n", "Language:".bold().cyan(), language));
    if let Some(error_type) = &classification.error_type {
        out.push_str(&format!("{} {}\n", "Error:".bold().cyan(), error_type.red()));
    }
    out
}

// ============================================================================
// Building blocks
// ============================================================================

fn card_title(index: usize, title: &str) -> String {
    let title = if title.is_empty() { "(no title)" } else { title };
    format!(
        "{}{}\n",
        format!(" {:>3}. ", index).cyan().bold(),
        title.bold()
    )
}

fn no_results(query: &str) -> String {
    format!("{} '{}'\n", "No results for".yellow(), query)
}

fn missing_page(title: &str) -> String {
    format!("{} '{}'\n", "No Wikipedia page named".yellow(), title)
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

fn wrap(text: &str, width: usize, indent: &str) -> String {
    let options = textwrap::Options::new(width.max(40))
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::fill(text, &options)
}

fn clean_snippet(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Answer bodies arrive as HTML. Render them as Markdown so code blocks keep
/// their layout, blank lines included.
fn html_to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "img"])
        .build();
    converter
        .convert(html)
        .unwrap_or_else(|_| html.to_string())
        .trim()
        .to_string()
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}
