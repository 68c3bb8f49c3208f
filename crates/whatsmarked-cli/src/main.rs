//! whatsmarked CLI.
//!
//! Renders WhatsApp-flavoured Markdown from a file or stdin and prints the
//! HTML to stdout.

mod error;
mod output;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use whatsmarked::{ParseOptions, Whatsmarked, escape_html};

use error::CliError;
use output::Output;

/// Render WhatsApp-flavoured Markdown to HTML.
#[derive(Parser, Debug)]
#[command(name = "whatsmarked", version, about)]
struct Cli {
    /// Input file. Reads stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Render as a single line: no paragraphs, lists or quotes.
    #[arg(long)]
    oneline: bool,

    /// Class of the wrapping element.
    #[arg(long, value_name = "NAME", env = "WHATSMARKED_CLASS")]
    class: Option<String>,

    /// Print only the rendered markup, without the wrapping element.
    #[arg(long)]
    fragment: bool,

    /// Resolve `@[...]` mentions by showing this field of their payload.
    #[arg(long, value_name = "KEY", env = "WHATSMARKED_MENTION_FIELD")]
    mention_field: Option<String>,

    /// Disable tables, task boxes, strikethrough and bare URL links.
    #[arg(long)]
    no_gfm: bool,

    /// Keep single newlines inside paragraphs as they are.
    #[arg(long)]
    no_breaks: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &Output) -> Result<(), CliError> {
    let text = read_input(cli.file.as_deref())?;
    let pipeline = pipeline(cli);

    let Some(container) = pipeline.render(Some(&text), cli.oneline, cli.class.as_deref()) else {
        tracing::debug!("Empty input, nothing to render");
        return Ok(());
    };

    if cli.fragment {
        output.markup(&container.html)?;
    } else {
        output.markup(&container.to_html())?;
    }
    Ok(())
}

fn pipeline(cli: &Cli) -> Whatsmarked {
    let options = ParseOptions::default()
        .with_gfm(!cli.no_gfm)
        .with_breaks(!cli.no_breaks);
    let pipeline = Whatsmarked::with_options(options);
    match cli.mention_field.clone() {
        Some(field) => {
            pipeline.with_mention_resolver(move |payload: &Value| mention_span(payload, &field))
        }
        None => pipeline,
    }
}

fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn mention_span(payload: &Value, field: &str) -> String {
    let label = match payload.get(field) {
        Some(Value::String(label)) => label.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    format!(r#"<span class="mention">@{}</span>"#, escape_html(&label))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "whatsmarked",
            "msg.txt",
            "--oneline",
            "--class",
            "bubble",
            "--mention-field",
            "name",
        ])
        .unwrap();
        assert_eq!(cli.file.as_deref(), Some(Path::new("msg.txt")));
        assert!(cli.oneline);
        assert_eq!(cli.class.as_deref(), Some("bubble"));
        assert_eq!(cli.mention_field.as_deref(), Some("name"));
        assert!(!cli.fragment);
    }

    #[test]
    fn test_mention_span() {
        assert_eq!(
            mention_span(&json!({"name": "Ann <3"}), "name"),
            r#"<span class="mention">@Ann &lt;3</span>"#
        );
        assert_eq!(
            mention_span(&json!({"id": 7}), "id"),
            r#"<span class="mention">@7</span>"#
        );
        assert_eq!(
            mention_span(&json!({}), "name"),
            r#"<span class="mention">@</span>"#
        );
    }

    #[test]
    fn test_pipeline_uses_mention_field() {
        let cli = Cli::try_parse_from(["whatsmarked", "--mention-field", "name"]).unwrap();
        // base64 of {"name":"X"}
        assert_eq!(
            pipeline(&cli).parse_inline("@[eyJuYW1lIjoiWCJ9]"),
            r#"<span class="mention">@X</span>"#
        );
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_input(Some(Path::new("/nonexistent/whatsmarked.txt"))).unwrap_err();
        assert!(err.to_string().starts_with("failed to read /nonexistent/whatsmarked.txt"));
    }
}
