use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dossier")]
#[command(about = "Dossier - research errors, docs and topics across Context7, the web, Stack Exchange and Wikipedia")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  dossier qa \"TypeError: unsupported operand type(s)\"   Build an answer dossier for an error
  dossier docs search next.js                            Find a library on Context7
  dossier docs get /vercel/next.js --topic routing        Fetch doc snippets
  dossier web \"tokio select macro\"                        Metasearch the web
  dossier wiki \"Rust (programming language)\"             Read a Wikipedia page
  dossier classify \"Uncaught ReferenceError: x\"          Detect the error's language

\x1b[1;36mConfiguration:\x1b[0m
  ~/.config/dossier/config.toml, or --config <path>
  CONTEXT7_API_KEY, STACKEXCHANGE_KEY, DOSSIER_METASEARCH_URL override the file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search and fetch library documentation from Context7
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  dossier docs search \"react query\"
  dossier docs get /tanstack/query --topic mutations --tokens 4000
  dossier docs get vercel/next.js --text")]
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Metasearch the web through a DDGS-compatible endpoint
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  dossier web \"rust async trait\"
  dossier web \"cve-2024-3094\" --timelimit w --max-results 10")]
    Web {
        /// Search query
        query: String,
        /// Region code such as us-en or de-de
        #[arg(long, default_value = "us-en")]
        region: String,
        /// Safe search level
        #[arg(long, value_enum, default_value_t = SafeSearchArg::On)]
        safesearch: SafeSearchArg,
        /// Only results from the last day, week, month or year (d, w, m, y)
        #[arg(long)]
        timelimit: Option<String>,
        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 5)]
        max_results: usize,
        /// Result page
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Search backend passed to the metasearch service
        #[arg(long, default_value = "auto")]
        backend: String,
    },

    /// Find similar Stack Exchange questions with accepted answers
    ///
    /// The error text is classified first and the detected language is used
    /// as a tag filter, unless --tag is given.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  dossier qa \"KeyError: 'user_id'\"
  dossier qa \"borrowed value does not live long enough\" --tag rust
  dossier qa \"NullPointerException in onCreate\" --top 3")]
    Qa {
        /// Error message or question text
        text: String,
        /// Tag filter; overrides the detected language
        #[arg(short, long)]
        tag: Option<String>,
        /// Number of dossier items to keep
        #[arg(long)]
        top: Option<usize>,
        /// Stack Exchange site (e.g. stackoverflow, serverfault)
        #[arg(long)]
        site: Option<String>,
    },

    /// Read a Wikipedia page
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  dossier wiki \"Python (programming language)\"
  dossier wiki \"Borrow checker\" --summary
  dossier wiki \"Tokio\" --sections --lang de")]
    Wiki {
        /// Page title
        title: String,
        /// Only the intro summary
        #[arg(long, conflicts_with_all = ["sections", "url"])]
        summary: bool,
        /// Only the table of contents
        #[arg(long, conflicts_with = "url")]
        sections: bool,
        /// Only the canonical page URL
        #[arg(long)]
        url: bool,
        /// Wikipedia language edition
        #[arg(long)]
        lang: Option<String>,
        /// Return extracts as HTML instead of plain text
        #[arg(long)]
        html: bool,
    },

    /// Detect the language and error type of an error message (offline)
    Classify {
        /// Error message
        text: String,
    },
}

#[derive(Subcommand)]
pub enum DocsAction {
    /// Find libraries matching a name or description
    Search {
        /// Library name or keywords
        query: String,
    },
    /// Fetch documentation snippets for a library id
    Get {
        /// Library id as returned by `docs search` (e.g. /vercel/next.js)
        library: String,
        /// Narrow the documentation to a topic
        #[arg(long)]
        topic: Option<String>,
        /// Token budget for the returned documentation
        #[arg(long)]
        tokens: Option<u32>,
        /// Ask for plain text instead of JSON snippets
        #[arg(long)]
        text: bool,
        /// Show only the N most relevant snippets (pretty output)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SafeSearchArg {
    On,
    Moderate,
    Off,
}

impl From<SafeSearchArg> for dossier_core::SafeSearch {
    fn from(arg: SafeSearchArg) -> Self {
        match arg {
            SafeSearchArg::On => dossier_core::SafeSearch::On,
            SafeSearchArg::Moderate => dossier_core::SafeSearch::Moderate,
            SafeSearchArg::Off => dossier_core::SafeSearch::Off,
        }
    }
}
