use std::{io::Write, process::Child, process::ExitCode};

use clap::Parser;
use simple_invoice::{Invoice, Lang, SimpleInvoice, error::AddContext, start_chromedriver};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, DemoArgs, RenderArgs, Scenario};

mod cli;
mod demo;

/// Log to stderr so PDFs written to stdout stay intact. Filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn kill_chrome(chrome_process: &mut Child) -> Result<(), simple_invoice::Error> {
    chrome_process
        .kill()
        .map_err(simple_invoice::Error::from)
        .add_context("killing chromedriver process from cli")?;
    Ok(())
}

async fn write_invoice_pdf(
    invoice: Invoice,
    index: usize,
    args: &RenderArgs,
    lang: Lang,
) -> Result<(), simple_invoice::Error> {
    let name = invoice
        .number()
        .map(str::to_string)
        .unwrap_or_else(|| format!("invoice-{}", index + 1));
    let pdf = SimpleInvoice::new(invoice).with_lang(lang);
    match &args.out {
        Some(out) => {
            let path = out.join(format!("{name}.pdf"));
            pdf.save(&path, args.qr)
                .await
                .add_context(&format!("invoice: {name}"))?;
            info!(path = %path.display(), "invoice written");
            Ok(())
        }
        None => {
            let buf = pdf
                .generate(args.qr)
                .await
                .add_context("generating invoice pdf")
                .add_context("printing to stdout")?;
            let mut stdout = std::io::stdout();
            stdout
                .write_all(&buf)
                .map_err(simple_invoice::Error::from)
                .add_context("writing invoice pdf to stdout")?;
            stdout
                .flush()
                .map_err(simple_invoice::Error::from)
                .add_context("flushing stdout")
                .add_context("printing to stdout")
        }
    }
}

async fn render(args: &RenderArgs, lang: Lang) -> Result<(), simple_invoice::Error> {
    let invoices = args
        .get_invoices()
        .add_context("deserializing invoices from cli")?;
    let mut chrome_process = start_chromedriver().add_context("starting chromedriver in cli")?;
    let mut result = Ok(());
    for (index, invoice) in invoices.into_iter().enumerate() {
        result = write_invoice_pdf(invoice, index, args, lang).await;
        if result.is_err() {
            break;
        }
    }
    first_error(result, kill_chrome(&mut chrome_process))
}

/// The render outcome wins over a cleanup failure, which is only logged.
fn first_error(
    result: Result<(), simple_invoice::Error>,
    cleanup: Result<(), simple_invoice::Error>,
) -> Result<(), simple_invoice::Error> {
    if let Err(e) = cleanup {
        match &result {
            Ok(()) => return Err(e),
            Err(_) => error!("{e}"),
        }
    }
    result
}

async fn demo(args: &DemoArgs, lang: Option<Lang>) -> bool {
    let lang = lang.unwrap_or(args.scenario.lang());
    let mut chrome_process = match args.scenario {
        Scenario::Smoke => None,
        _ => match start_chromedriver() {
            Ok(child) => Some(child),
            Err(e) => {
                error!("{}", e.add_context("starting chromedriver in cli"));
                return false;
            }
        },
    };
    let passed = demo::run(args.scenario, &args.out, lang, args.qr).await;
    if let Some(child) = chrome_process.as_mut() {
        if let Err(e) = kill_chrome(child) {
            error!("{e}");
        }
    }
    passed
}

#[tokio::main]
async fn main() -> Result<ExitCode, simple_invoice::Error> {
    init_tracing();
    let cli = Cli::parse();
    match &cli.command {
        Commands::Render(args) => {
            let lang = cli.lang.unwrap_or_else(Lang::from_env);
            render(args, lang).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Demo(args) => {
            if demo(args, cli.lang).await {
                info!("TEST PASSED");
                Ok(ExitCode::SUCCESS)
            } else {
                error!("TEST FAILED");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(msg: &str) -> Result<(), simple_invoice::Error> {
        Err(simple_invoice::Error::from(String::from(msg)))
    }

    #[test]
    fn render_error_survives_a_failed_kill() {
        let err = first_error(failed("printing pdf"), failed("killing chromedriver")).unwrap_err();
        assert_eq!(err.to_string(), "printing pdf");
    }

    #[test]
    fn kill_failure_is_reported_after_a_clean_render() {
        let err = first_error(Ok(()), failed("killing chromedriver")).unwrap_err();
        assert_eq!(err.to_string(), "killing chromedriver");
        assert!(first_error(Ok(()), Ok(())).is_ok());
    }
}
