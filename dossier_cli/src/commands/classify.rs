use crate::cli::Cli;
use crate::commands::Result;
use crate::output::{format_output, OutputData};
use dossier_core::ErrorClassifier;

pub fn run(cli: &Cli, text: &str) -> Result<()> {
    let classification = ErrorClassifier::new().analyze(text);
    let output = OutputData::Classification {
        text: text.to_string(),
        classification,
    };
    format_output(&output, &cli.output)
}
