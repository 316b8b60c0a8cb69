//! Sample invoices exercising the library end to end: build, print totals, render, check the
//! output file.

use std::{fmt::Display, path::Path, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{Days, Local};
use simple_invoice::{
    AddressBuilder, BankAccountBuilder, Creator, Invoice, InvoiceBuilder, Item, Lang,
    Party, PartyBuilder, ProviderBuilder, SimpleInvoice, error::AddContext,
};
use tracing::{error, info};

use crate::cli::Scenario;

fn builder_error(e: impl Display) -> simple_invoice::Error {
    simple_invoice::Error::from(e.to_string())
}

fn item(
    count: i32,
    price: &str,
    description: &str,
    unit: &str,
    tax: i32,
) -> Result<Item, simple_invoice::Error> {
    let price = BigDecimal::from_str(price)
        .map_err(builder_error)
        .add_context(&format!("parsing price of '{description}'"))?;
    Ok(Item::new(count, price, description, unit, tax))
}

fn party(
    summary: &str,
    street: &str,
    city: &str,
    zip_code: &str,
    country: Option<&str>,
) -> Result<PartyBuilder, simple_invoice::Error> {
    let mut address = AddressBuilder::default()
        .address(street)
        .city(city)
        .zip_code(zip_code);
    if let Some(country) = country {
        address = address.country(country);
    }
    Ok(PartyBuilder::default()
        .summary(summary)
        .address(
            address
                .build()
                .map_err(builder_error)
                .add_context(&format!("building address of '{summary}'"))?,
        ))
}

impl Scenario {
    /// Language the sample was written for
    pub fn lang(&self) -> Lang {
        match self {
            Scenario::Smoke => Lang::Cs,
            Scenario::Generate | Scenario::Note | Scenario::Slovak => Lang::Sk,
        }
    }

    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            Scenario::Smoke => None,
            Scenario::Generate => Some("test_invoice_output.pdf"),
            Scenario::Note => Some("test_invoice_with_note.pdf"),
            Scenario::Slovak => Some("test_invoice_slovak.pdf"),
        }
    }

    /// Build the sample invoice, dated today
    pub fn invoice(&self) -> Result<Invoice, simple_invoice::Error> {
        self.build_invoice()
            .add_context(&format!("building {self:?} invoice"))
    }

    fn build_invoice(&self) -> Result<Invoice, simple_invoice::Error> {
        let today = Local::now().date_naive();
        let due = today + Days::new(14);
        let invoice = match self {
            Scenario::Smoke => InvoiceBuilder::default()
                .provider(
                    ProviderBuilder::default()
                        .party(
                            party("Test Company Ltd.", "123 Test Street", "Prague", "120 00", None)?
                                .phone("+420 123 456 789")
                                .email("info@testcompany.cz")
                                .vat_id("CZ12345678")
                                .ir("12345678")
                                .tax_id("CZ12345678")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .bank(
                            BankAccountBuilder::default()
                                .bank_name("Test Bank")
                                .bank_account("123456789")
                                .bank_code("0100")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .build()
                        .map_err(builder_error)?,
                )
                .client(
                    party("Client Company", "456 Client St", "Brno", "602 00", None)?
                        .build()
                        .map_err(builder_error)?,
                )
                .creator(Creator::new("Test Accountant"))
                .title("Test Invoice")
                .number("2026001")
                .date(today)
                .payback(due)
                .use_tax(true)
                .add_item(item(2, "100.50", "Test Product 1", "pcs", 21)?)
                .add_item(item(1, "500", "Test Service", "hrs", 21)?),
            Scenario::Generate => InvoiceBuilder::default()
                .provider(
                    ProviderBuilder::default()
                        .party(
                            party(
                                "My Company Ltd.",
                                "123 Business Street",
                                "Prague",
                                "120 00",
                                Some("Czech Republic"),
                            )?
                            .phone("+420 123 456 789")
                            .email("invoice@mycompany.cz")
                            .vat_id("CZ12345678")
                            .ir("12345678")
                            .tax_id("CZ12345678")
                            .build()
                            .map_err(builder_error)?,
                        )
                        .bank(
                            BankAccountBuilder::default()
                                .bank_name("Test Bank")
                                .bank_account("1234567890")
                                .bank_code("0100")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .build()
                        .map_err(builder_error)?,
                )
                .client(client_company()?)
                .creator(Creator::new("John Accountant"))
                .title("Invoice")
                .number("2026001")
                .variable_symbol("2026001")
                .specific_symbol("123")
                .date(today)
                .payback(due)
                .taxable_date(today)
                .currency("Kč")
                .currency_locale("cs_CZ.UTF-8")
                .use_tax(true)
                .add_item(item(2, "1500.00", "Web Development Services", "hours", 0)?)
                .add_item(item(1, "5000.00", "Server Setup and Configuration", "pcs", 0)?)
                .add_item(item(10, "250.00", "Consulting Hours", "hours", 0)?),
            Scenario::Note => InvoiceBuilder::default()
                .provider(
                    ProviderBuilder::default()
                        .party(
                            party("Moja firma s.r.o.", "Obchodná 456", "Košice", "040 01", None)?
                                .phone("+421 900 654 321")
                                .email("firma@example.sk")
                                .ir("87654321")
                                .vat_id("SK0987654321")
                                .tax_id("SK1234509876")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .bank(
                            BankAccountBuilder::default()
                                .bank_name("Slovenská sporiteľňa")
                                .bank_account("1234567890")
                                .bank_code("0900")
                                .iban("SK89 0900 0000 0001 2345 6789")
                                .swift("GIBASKBX")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .build()
                        .map_err(builder_error)?,
                )
                .client(
                    party(
                        "Testovací zákazník s.r.o.",
                        "Hlavná 123",
                        "Bratislava",
                        "811 01",
                        None,
                    )?
                    .phone("+421 900 123 456")
                    .email("zakaznik@example.sk")
                    .ir("12345678")
                    .vat_id("SK1234567890")
                    .tax_id("SK9876543210")
                    .build()
                    .map_err(builder_error)?,
                )
                .creator(Creator::new("Ján Novák"))
                .title("Faktúra")
                .number("2026001")
                .use_tax(true)
                .currency_locale("sk_SK.UTF-8")
                .date(today)
                .payback(due)
                .taxable_date(today)
                .variable_symbol("2026001")
                .paytype("Bankový prevod")
                .note("Poznámka: Ďakujeme za vaše podnikanie!\nV prípade otázok nás kontaktujte.")
                .add_item(item(2, "150.00", "Webový dizajn - úvodná stránka", "ks", 20)?)
                .add_item(item(5, "80.00", "Programovanie - podstránky", "hodín", 20)?)
                .add_item(item(1, "250.00", "SEO optimalizácia", "ks", 20)?),
            Scenario::Slovak => InvoiceBuilder::default()
                .provider(
                    ProviderBuilder::default()
                        .party(
                            party(
                                "Moja Firma s.r.o.",
                                "Hlavná ulica 123",
                                "Bratislava",
                                "811 01",
                                Some("Slovenská republika"),
                            )?
                            .phone("+421 2 1234 5678")
                            .email("faktura@mojafirma.sk")
                            .vat_id("SK2021234567")
                            .ir("12345678")
                            .tax_id("SK2021234567")
                            .build()
                            .map_err(builder_error)?,
                        )
                        .bank(
                            BankAccountBuilder::default()
                                .bank_name("Slovenská sporiteľňa")
                                .bank_account("SK31 1200 0000 1987 4263 7541")
                                .build()
                                .map_err(builder_error)?,
                        )
                        .build()
                        .map_err(builder_error)?,
                )
                .client(
                    party(
                        "Klientská Firma s.r.o.",
                        "Obchodná 456",
                        "Košice",
                        "040 01",
                        Some("Slovenská republika"),
                    )?
                    .phone("+421 55 987 6543")
                    .email("kontakt@klient.sk")
                    .vat_id("SK2020987654")
                    .ir("87654321")
                    .build()
                    .map_err(builder_error)?,
                )
                .creator(Creator::new("Ján Účtovník"))
                .title("Faktúra")
                .number("2026001")
                .variable_symbol("2026001")
                .specific_symbol("123")
                .date(today)
                .payback(due)
                .taxable_date(today)
                .currency("€")
                .currency_locale("sk_SK.UTF-8")
                .use_tax(true)
                .add_item(item(2, "1500.00", "Vývoj webových stránok", "hodín", 0)?)
                .add_item(item(1, "5000.00", "Konfigurácia servera", "ks", 0)?)
                .add_item(item(10, "250.00", "Konzultačné hodiny", "hodín", 0)?),
        };
        invoice.build().map_err(builder_error)
    }
}

fn client_company() -> Result<Party, simple_invoice::Error> {
    party(
        "Client Company s.r.o.",
        "456 Client Avenue",
        "Brno",
        "602 00",
        Some("Czech Republic"),
    )?
    .phone("+420 987 654 321")
    .email("contact@clientcompany.cz")
    .vat_id("CZ87654321")
    .ir("87654321")
    .build()
    .map_err(builder_error)
}

/// Run one sample. Every failure is logged and reported as `false`; nothing is propagated.
pub async fn run(scenario: Scenario, out: &Path, lang: Lang, generate_qr_code: bool) -> bool {
    info!(?scenario, %lang, "building invoice");
    let invoice = match scenario.invoice() {
        Ok(invoice) => invoice,
        Err(e) => {
            error!("{e}");
            return false;
        }
    };

    let provider = invoice.provider().party();
    info!(provider = provider.summary(), tax_id = ?provider.tax_id(), "provider");
    info!(client = invoice.client().summary(), "client");
    info!(creator = invoice.creator().name(), "creator");
    info!(
        number = ?invoice.number(),
        date = %invoice.date(),
        due = ?invoice.payback(),
        "invoice"
    );
    for (n, item) in invoice.items().iter().enumerate() {
        info!(
            "item {}: {} ({} {} @ {} {})",
            n + 1,
            item.description(),
            item.count(),
            item.unit(),
            item.price(),
            invoice.currency()
        );
    }
    info!(
        price = %invoice.price(),
        price_tax = %invoice.price_tax(),
        items = invoice.items().len(),
        currency = invoice.currency(),
        "totals"
    );
    if let Some(note) = invoice.note() {
        info!(note, "note");
    }

    let Some(file_name) = scenario.file_name() else {
        return true;
    };
    let path = out.join(file_name);
    info!(path = %path.display(), "generating pdf");
    let pdf = SimpleInvoice::new(invoice).with_lang(lang);
    if let Err(e) = pdf.save(&path, generate_qr_code).await {
        error!("error generating pdf: {e}");
        return false;
    }
    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > 0 => {
            info!(path = %path.display(), bytes = meta.len(), "pdf generated");
            true
        }
        Ok(_) => {
            error!(path = %path.display(), "pdf file is empty");
            false
        }
        Err(e) => {
            error!(path = %path.display(), "pdf file was not created: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn smoke_totals() {
        let inv = Scenario::Smoke.invoice().unwrap();
        assert_eq!(inv.price(), dec("701.00"));
        assert_eq!(inv.price_tax(), dec("848.21"));
        assert_eq!(inv.items().len(), 2);
        assert_eq!(inv.provider().party().tax_id(), Some("CZ12345678"));
    }

    #[test]
    fn generate_and_slovak_totals_match() {
        for scenario in [Scenario::Generate, Scenario::Slovak] {
            let inv = scenario.invoice().unwrap();
            assert_eq!(inv.price(), dec("10500.00"));
            assert_eq!(inv.price_tax(), dec("10500.00"));
            assert_eq!(inv.items().len(), 3);
        }
    }

    #[test]
    fn note_scenario() {
        let inv = Scenario::Note.invoice().unwrap();
        // 2*150 + 5*80 + 250 = 950, plus 20 %
        assert_eq!(inv.price(), dec("950"));
        assert_eq!(inv.price_tax(), dec("1140"));
        assert!(inv.note().unwrap().contains('\n'));
        assert_eq!(inv.currency(), "Kč");
        assert_eq!(inv.currency_locale(), "sk_SK.UTF-8");
    }

    #[test]
    fn scenario_languages() {
        assert_eq!(Scenario::Smoke.lang(), Lang::Cs);
        assert_eq!(Scenario::Generate.lang(), Lang::Sk);
        assert_eq!(Scenario::Note.lang(), Lang::Sk);
        assert_eq!(Scenario::Slovak.lang(), Lang::Sk);
    }

    #[test]
    fn bad_price_literal_is_an_error() {
        let err = item(1, "12,50", "Broken", "pcs", 0).unwrap_err();
        assert!(err.to_string().starts_with("parsing price of 'Broken'"));
    }

    #[tokio::test]
    async fn smoke_run_needs_no_browser() {
        assert!(run(Scenario::Smoke, Path::new("."), Lang::En, false).await);
    }

    #[tokio::test]
    async fn unwritable_output_reports_failure() {
        let out = std::env::temp_dir()
            .join(format!("simple-invoice-demo-{}", std::process::id()))
            .join("missing");
        assert!(!run(Scenario::Generate, &out, Lang::Cs, false).await);
        assert!(!out.join("test_invoice_output.pdf").exists());
    }
}
