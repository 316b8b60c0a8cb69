//! PDF rendering through a headless Chrome(ium) session.
//!
//! The invoice is rendered to HTML, loaded into the browser as a data URL and printed to PDF
//! over WebDriver. A chromedriver instance must be listening on [`CHROMEDRIVER_PORT`];
//! [`start_chromedriver`] can spawn one.

use std::{
    fs::{self, File},
    io::Write,
    net::TcpListener,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::Duration,
};

use base64::{Engine, engine::general_purpose};
use fantoccini::{
    Client, ClientBuilder,
    wd::{PrintConfigurationBuilder, PrintMargins, PrintSize},
};
use serde_json::Map;
use tracing::{debug, warn};

use crate::{
    error::AddContext,
    invoice::Invoice,
    lang::Lang,
    qr::{payment_payload, qr_svg},
    template_env::{Attachments, render_template, setup_template_env},
};

pub const CHROMEDRIVER_PORT: u16 = 4444;

/// Starts ChromeDriver as a child process on [`CHROMEDRIVER_PORT`]
///
/// # Returns
/// - [`Child`] if ChromeDriver successfully starts and the port is available
///
/// # Errors
/// - [`crate::Error`] if the chromedriver binary is not in the path, or if the port is not
/// available, or if the chromedriver process fails to start for any other reason
pub fn start_chromedriver() -> Result<Child, crate::Error> {
    if is_port_in_use(CHROMEDRIVER_PORT) {
        return Err(crate::Error::from(format!(
            "Port {CHROMEDRIVER_PORT} is already in use"
        ))
        .add_context("starting chromedriver"));
    }

    let mut child = Command::new("chromedriver")
        .arg(format!("--port={CHROMEDRIVER_PORT}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(crate::Error::from)
        .add_context("spawning chromedriver")?;

    for _ in 0..100 {
        if is_port_in_use(CHROMEDRIVER_PORT) {
            debug!(port = CHROMEDRIVER_PORT, "chromedriver is listening");
            return Ok(child);
        }

        if child
            .try_wait()
            .map_err(crate::Error::from)
            .add_context("starting chromedriver")?
            .is_some()
        {
            return Err(
                crate::Error::from(String::from("Chromedriver has stopped unexpectedly"))
                    .add_context("starting chromedriver"),
            );
        }

        thread::sleep(Duration::from_millis(10));
    }

    if !is_port_in_use(CHROMEDRIVER_PORT) {
        child.kill()?;
        return Err(crate::Error::from(format!(
            "Chromedriver failed to bind to port {CHROMEDRIVER_PORT}"
        ))
        .add_context("starting chromedriver"));
    }

    Ok(child)
}

/// Check if a given port is currently in use on localhost
fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(format!("localhost:{port}")).is_err()
}

async fn connect_to_client() -> Result<Client, fantoccini::error::NewSessionError> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({
            "args": ["--headless"]
        }),
    );
    ClientBuilder::native()
        .capabilities(caps)
        .connect(&format!("http://localhost:{CHROMEDRIVER_PORT}"))
        .await
}

/// Load `html` in the browser and print it as an A4 PDF.
async fn print_html(client: &Client, html: &str) -> Result<Vec<u8>, crate::Error> {
    let encoded = general_purpose::STANDARD.encode(html.as_bytes());
    let data_url = format!("data:text/html;base64,{encoded}");
    client
        .goto(&data_url)
        .await
        .map_err(crate::Error::from)
        .add_context("navigating to address")?;
    client
        .print(
            PrintConfigurationBuilder::default()
                .margins(PrintMargins {
                    top: 1.0,
                    left: 1.5,
                    right: 1.5,
                    bottom: 1.0,
                })
                .size(PrintSize::A4)
                .build()
                .map_err(crate::Error::from)
                .add_context("configuring printer")?,
        )
        .await
        .map_err(crate::Error::from)
}

/// Read an image into a `data:` URL so the browser can show it without file access.
fn image_data_url(path: &Path) -> Result<String, crate::Error> {
    let bytes = fs::read(path)
        .map_err(crate::Error::from)
        .add_context(&format!("reading image '{}'", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/png",
    };
    let encoded = general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Renders one [`Invoice`] to HTML or PDF
pub struct SimpleInvoice {
    invoice: Invoice,
    lang: Lang,
}

impl SimpleInvoice {
    /// Wrap a completed invoice. The language is taken from `INVOICE_LANG`.
    pub fn new(invoice: Invoice) -> Self {
        Self {
            invoice,
            lang: Lang::from_env(),
        }
    }

    /// Override the language picked up from the environment.
    pub fn with_lang(self, lang: Lang) -> Self {
        Self { lang, ..self }
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    /// Render the invoice as a standalone HTML document.
    ///
    /// When `generate_qr_code` is set the SPAYD payment code is inlined as SVG. An invoice whose
    /// provider has no IBAN is rendered without it. The provider logo and creator stamp are
    /// embedded as data URLs, so a missing image file is an error.
    pub fn render_html(&self, generate_qr_code: bool) -> Result<String, crate::Error> {
        let qr = if generate_qr_code {
            match payment_payload(&self.invoice) {
                Some(payload) => Some(
                    qr_svg(&payload)
                        .add_context("encoding qr payment code")
                        .add_context("rendering html")?,
                ),
                None => {
                    warn!("provider has no IBAN, rendering invoice without QR payment code");
                    None
                }
            }
        } else {
            None
        };
        let logo = self
            .invoice
            .provider()
            .logo()
            .map(|path| image_data_url(path))
            .transpose()
            .add_context("embedding provider logo")
            .add_context("rendering html")?;
        let stamp = self
            .invoice
            .creator()
            .stamp()
            .map(|path| image_data_url(path))
            .transpose()
            .add_context("embedding creator stamp")
            .add_context("rendering html")?;

        let env = setup_template_env()
            .map_err(crate::Error::from)
            .add_context("setting up templating environment")
            .add_context("rendering html")?;
        render_template(
            &env,
            &self.invoice,
            self.lang,
            Attachments {
                qr_svg: qr,
                logo,
                stamp,
            },
        )
        .map_err(crate::Error::from)
        .add_context("rendering html template")
        .add_context("rendering html")
    }

    /// Generate the PDF as a byte array.
    ///
    /// # Errors
    ///
    /// Returns `Err(crate::Error)` if any step fails:
    /// - rendering the HTML (template or QR code)
    /// - connecting to chromedriver
    /// - navigating the browser to the generated data URL
    /// - configuring the print job or printing to PDF
    /// - the browser returning an empty document
    pub async fn generate(&self, generate_qr_code: bool) -> Result<Vec<u8>, crate::Error> {
        let html = self
            .render_html(generate_qr_code)
            .add_context("generating pdf")?;
        debug!(bytes = html.len(), lang = %self.lang, "rendered invoice html");
        let client = connect_to_client()
            .await
            .map_err(crate::Error::from)
            .add_context("connecting to client")
            .add_context("generating pdf")?;
        let printed = print_html(&client, &html)
            .await
            .add_context("printing pdf")
            .add_context("generating pdf");
        if let Err(e) = client.close().await {
            warn!("failed to close browser session: {e}");
        }
        let pdf = printed?;
        if pdf.is_empty() {
            return Err(
                crate::Error::from(String::from("browser returned an empty document"))
                    .add_context("generating pdf"),
            );
        }
        debug!(bytes = pdf.len(), "printed invoice pdf");
        Ok(pdf)
    }

    /// Write the invoice PDF to `output_path`.
    ///
    /// The PDF is written to a hidden `.<name>.partial` file next to `output_path`, created before
    /// anything is rendered so an unwritable directory fails fast. Only a complete PDF is renamed
    /// over `output_path`; on failure the partial file is removed and any existing file is left
    /// as it was.
    ///
    /// # Arguments
    /// - `output_path`: where to write the PDF. An existing file is replaced on success.
    /// - `generate_qr_code`: embed a QR payment code for the tax-inclusive total
    pub async fn save(
        &self,
        output_path: impl AsRef<Path>,
        generate_qr_code: bool,
    ) -> Result<(), crate::Error> {
        let path = output_path.as_ref();
        let ctx = format!("writing invoice pdf to '{}'", path.display());
        let partial = partial_path(path);
        let mut file = File::create(&partial)
            .map_err(crate::Error::from)
            .add_context("creating output file")
            .add_context(&ctx)?;

        let written = match self.generate(generate_qr_code).await {
            Ok(pdf) => file
                .write_all(&pdf)
                .and_then(|_| file.sync_all())
                .map_err(crate::Error::from)
                .add_context("writing pdf bytes"),
            Err(e) => Err(e),
        };
        drop(file);

        let moved = written.and_then(|_| {
            fs::rename(&partial, path)
                .map_err(crate::Error::from)
                .add_context("moving pdf into place")
        });
        if let Err(e) = moved {
            if let Err(rm) = fs::remove_file(&partial) {
                warn!(path = %partial.display(), "failed to remove incomplete pdf: {rm}");
            }
            return Err(e.add_context(&ctx));
        }
        debug!(path = %path.display(), "invoice pdf written");
        Ok(())
    }
}

/// Sibling of `path` the PDF is written to before it replaces `path`, so a failed save never
/// touches an existing file.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("invoice.pdf"));
    path.with_file_name(format!(".{name}.partial"))
}

/// Generate a PDF byte array from [`Invoice`] in the language selected by `INVOICE_LANG`
pub async fn generate_pdf(
    invoice: &Invoice,
    generate_qr_code: bool,
) -> Result<Vec<u8>, crate::Error> {
    SimpleInvoice::new(invoice.clone())
        .generate(generate_qr_code)
        .await
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, thread::sleep};

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::invoice::{
        AddressBuilder, BankAccountBuilder, Creator, InvoiceBuilder, ItemBuilder, PartyBuilder,
        ProviderBuilder,
    };

    fn make_invoice() -> Invoice {
        InvoiceBuilder::default()
            .client(
                PartyBuilder::default()
                    .summary("Client Company s.r.o.")
                    .address(
                        AddressBuilder::default()
                            .address("456 Client Avenue")
                            .city("Brno")
                            .zip_code("602 00")
                            .country("Czech Republic")
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .provider(
                ProviderBuilder::default()
                    .party(
                        PartyBuilder::default()
                            .summary("My Company Ltd.")
                            .tax_id("CZ12345678")
                            .build()
                            .unwrap(),
                    )
                    .bank(
                        BankAccountBuilder::default()
                            .bank_name("Test Bank")
                            .bank_account("1234567890")
                            .bank_code("0100")
                            .iban("CZ65 0800 0000 1920 0014 5399")
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .creator(Creator::new("John Accountant"))
            .number("2026001")
            .variable_symbol("2026001")
            .add_item(
                ItemBuilder::default()
                    .count(2)
                    .price(BigDecimal::from_str("1500.00").unwrap())
                    .description("Web Development Services")
                    .unit("hours")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("simple-invoice-{}-{name}", std::process::id()))
    }

    #[test]
    fn render_html_with_and_without_qr() {
        let pdf = SimpleInvoice::new(make_invoice()).with_lang(Lang::En);
        let plain = pdf.render_html(false).unwrap();
        assert!(plain.contains("My Company Ltd."));
        assert!(!plain.contains("<svg"));

        let with_qr = pdf.render_html(true).unwrap();
        assert!(with_qr.contains("<svg"));
        assert!(with_qr.contains("QR payment"));
    }

    #[test]
    fn qr_is_skipped_without_iban() {
        let inv = InvoiceBuilder::default()
            .client(make_invoice().client().clone())
            .provider(
                ProviderBuilder::default()
                    .party(PartyBuilder::default().summary("No Bank").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .creator(Creator::new("C"))
            .build()
            .unwrap();
        let html = SimpleInvoice::new(inv)
            .with_lang(Lang::Cs)
            .render_html(true)
            .unwrap();
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn images_are_embedded_as_data_urls() {
        let path = scratch_path("stamp.svg");
        fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>").unwrap();
        let url = image_data_url(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));

        let missing = image_data_url(&scratch_path("missing.png")).unwrap_err();
        assert!(matches!(missing.kind(), crate::error::ErrorKind::Io(_)));
    }

    #[test]
    fn missing_logo_fails_rendering() {
        let inv = make_invoice();
        let provider = ProviderBuilder::default()
            .party(inv.provider().party().clone())
            .logo(scratch_path("no-logo.png"))
            .build()
            .unwrap();
        let inv = InvoiceBuilder::default()
            .client(inv.client().clone())
            .provider(provider)
            .creator(inv.creator().clone())
            .build()
            .unwrap();
        let err = SimpleInvoice::new(inv).render_html(false).unwrap_err();
        assert!(err.to_string().starts_with("rendering html -> embedding provider logo"));
    }

    #[tokio::test]
    async fn unwritable_path_fails_without_leaving_a_file() {
        let dir = scratch_path("missing-dir");
        let path = dir.join("invoice.pdf");
        let result = SimpleInvoice::new(make_invoice()).save(&path, false).await;
        let err = result.unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::Io(_)));
        assert!(err.to_string().contains("creating output file"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_generation_removes_the_output_file() {
        if is_port_in_use(CHROMEDRIVER_PORT) {
            // a live chromedriver would make generation succeed
            return;
        }
        let path = scratch_path("no-browser.pdf");
        let result = SimpleInvoice::new(make_invoice()).save(&path, false).await;
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_existing_file() {
        if is_port_in_use(CHROMEDRIVER_PORT) {
            return;
        }
        let path = scratch_path("previous.pdf");
        fs::write(&path, b"%PDF-previous").unwrap();
        let result = SimpleInvoice::new(make_invoice()).save(&path, false).await;
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-previous");
        assert!(!partial_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn partial_file_sits_next_to_the_output() {
        let path = Path::new("/tmp/out/2026001.pdf");
        assert_eq!(
            partial_path(path),
            PathBuf::from("/tmp/out/.2026001.pdf.partial")
        );
    }

    #[tokio::test]
    #[ignore = "requires chromedriver on PATH"]
    async fn test_generate_pdf() {
        let mut c = start_chromedriver().unwrap();
        sleep(Duration::from_millis(500));
        let path = scratch_path("generated.pdf");
        let invoice = SimpleInvoice::new(make_invoice());
        invoice.save(&path, false).await.unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        invoice.save(&path, true).await.unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_file(&path).unwrap();
        c.kill().unwrap();
    }
}
