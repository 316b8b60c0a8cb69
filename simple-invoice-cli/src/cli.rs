use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use simple_invoice::{Invoice, Lang, error::AddContext};

fn read_until_eof() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

#[derive(Debug, Parser)]
#[command(version, about = "Render invoices to PDF")]
pub struct Cli {
    /// Language of the printed labels (en, cs, sk). Defaults to $INVOICE_LANG
    #[arg(short, long, global = true)]
    pub lang: Option<Lang>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render invoices read from JSON
    Render(RenderArgs),
    /// Build one of the sample invoices, print its totals and render it
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Path to the JSON file with invoice data to print
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Path to the directory where PDF outputs should be saved. Without it the PDF is written to
    /// stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Embed a QR payment code
    #[arg(long)]
    pub qr: bool,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    pub scenario: Scenario,

    /// Directory for the generated PDF
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Embed a QR payment code
    #[arg(long)]
    pub qr: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scenario {
    /// Totals only, no PDF
    Smoke,
    /// Czech invoice with three untaxed items
    Generate,
    /// Slovak invoice with taxed items and a note
    Note,
    /// Slovak translation of the generate scenario
    Slovak,
}

impl RenderArgs {
    pub fn get_invoices(&self) -> Result<Vec<Invoice>, simple_invoice::Error> {
        let raw = match &self.data {
            Some(path) => fs::read_to_string(path)
                .map_err(simple_invoice::Error::from)
                .add_context(&format!(
                    "reading invoice data from file '{}'",
                    path.to_str().unwrap_or("UNKNOWN")
                ))?,
            None => read_until_eof()
                .map_err(simple_invoice::Error::from)
                .add_context("reading invoice data from stdin")?,
        };

        serde_json::from_str(&raw)
            .map_err(simple_invoice::Error::from)
            .add_context("parsing invoice JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_arguments() {
        let cli = Cli::parse_from(["simple-invoice-cli", "render", "-d", "in.json", "--qr"]);
        assert!(cli.lang.is_none());
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.data, Some(PathBuf::from("in.json")));
                assert!(args.out.is_none());
                assert!(args.qr);
            }
            Commands::Demo(_) => panic!("expected render"),
        }
    }

    #[test]
    fn parses_demo_with_global_lang() {
        let cli = Cli::parse_from(["simple-invoice-cli", "demo", "slovak", "--lang", "sk"]);
        assert_eq!(cli.lang, Some(Lang::Sk));
        match cli.command {
            Commands::Demo(args) => {
                assert!(matches!(args.scenario, Scenario::Slovak));
                assert_eq!(args.out, PathBuf::from("."));
            }
            Commands::Render(_) => panic!("expected demo"),
        }
    }

    #[test]
    fn rejects_unknown_language() {
        let parsed = Cli::try_parse_from(["simple-invoice-cli", "--lang", "de", "demo", "smoke"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn reads_invoices_from_file() {
        let path = std::env::temp_dir()
            .join(format!("simple-invoice-cli-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"[{
                "client": { "summary": "Client" },
                "provider": { "summary": "Provider" },
                "creator": { "name": "Creator" },
                "number": "2026001",
                "items": [{ "count": "2", "price": "1500.00", "description": "Work" }]
            }]"#,
        )
        .unwrap();
        let args = RenderArgs {
            data: Some(path.clone()),
            out: None,
            qr: false,
        };
        let invoices = args.get_invoices().unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].number(), Some("2026001"));
        assert_eq!(invoices[0].items().len(), 1);
    }

    #[test]
    fn malformed_json_is_reported() {
        let path = std::env::temp_dir()
            .join(format!("simple-invoice-cli-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let args = RenderArgs {
            data: Some(path.clone()),
            out: None,
            qr: false,
        };
        let err = args.get_invoices().unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(err.to_string().starts_with("parsing invoice JSON"));
    }
}
