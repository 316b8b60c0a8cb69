use bigdecimal::BigDecimal;
use minijinja::{Value, context};
use serde::Serialize;

use crate::{
    invoice::{Invoice, Item, TaxBreakdown, round_amount},
    lang::Lang,
};

const TEMPLATE_NAME: &str = "invoice.html";
const ITEMS_PER_PAGE: usize = 21;

/// Counts and rates without trailing zeros: `2`, `1.5`, `21`.
fn plain(value: &BigDecimal) -> String {
    if value.is_integer() {
        value.with_scale(0).to_string()
    } else {
        value.normalized().to_string()
    }
}

/// Item row with derived amounts already formatted
#[derive(Serialize)]
struct ItemRow<'a> {
    description: &'a str,
    unit: &'a str,
    count: String,
    price: String,
    tax: String,
    total: String,
    total_tax: String,
}

impl<'a> From<&'a Item> for ItemRow<'a> {
    fn from(item: &'a Item) -> Self {
        ItemRow {
            description: item.description(),
            unit: item.unit(),
            count: plain(item.count()),
            price: round_amount(item.price()).to_string(),
            tax: plain(item.tax()),
            total: round_amount(&item.total()).to_string(),
            total_tax: round_amount(&item.total_tax()).to_string(),
        }
    }
}

#[derive(Serialize)]
struct TaxRow {
    rate: String,
    total: String,
    tax: String,
    total_tax: String,
}

impl From<&TaxBreakdown> for TaxRow {
    fn from(row: &TaxBreakdown) -> Self {
        TaxRow {
            rate: plain(&row.rate),
            total: round_amount(&row.total).to_string(),
            tax: round_amount(&row.tax).to_string(),
            total_tax: round_amount(&row.total_tax).to_string(),
        }
    }
}

/// Markup and images rendered next to the invoice data
#[derive(Debug, Default)]
pub struct Attachments {
    /// Inline SVG of the QR payment code
    pub qr_svg: Option<String>,
    /// `data:` URL of the provider logo
    pub logo: Option<String>,
    /// `data:` URL of the creator's stamp
    pub stamp: Option<String>,
}

pub fn setup_template_env() -> Result<minijinja::Environment<'static>, minijinja::Error> {
    let mut env = minijinja::Environment::new();
    env.add_template(TEMPLATE_NAME, include_str!("../templates/invoice.html"))?;
    Ok(env)
}

/// Render the invoice HTML. The QR SVG is inlined without escaping.
pub fn render_template(
    env: &minijinja::Environment<'static>,
    invoice: &Invoice,
    lang: Lang,
    attachments: Attachments,
) -> Result<String, minijinja::Error> {
    let template = env.get_template(TEMPLATE_NAME)?;
    let labels = lang.labels();
    let rows: Vec<ItemRow> = invoice.items().iter().map(ItemRow::from).collect();
    let pages: Vec<_> = rows.chunks(ITEMS_PER_PAGE).collect();
    let tax_breakdown: Vec<TaxRow> = invoice.tax_breakdown().iter().map(TaxRow::from).collect();
    let bank = invoice.provider().bank().map(|bank| {
        context! {
            bank_name => bank.bank_name(),
            account_number => bank.account_number(),
            iban => bank.iban(),
            swift => bank.swift(),
        }
    });
    template.render(context! {
        lang => lang.code(),
        labels => labels,
        title => invoice.title().unwrap_or(labels.invoice),
        invoice => invoice,
        bank => bank,
        pages => pages,
        tax_breakdown => tax_breakdown,
        price => round_amount(&invoice.price()).to_string(),
        price_tax => round_amount(&invoice.price_tax()).to_string(),
        qr_svg => attachments.qr_svg.map(Value::from_safe_string),
        logo => attachments.logo,
        stamp => attachments.stamp,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::invoice::{Creator, InvoiceBuilder, ItemBuilder, PartyBuilder, ProviderBuilder};

    fn make_invoice(use_tax: bool) -> Invoice {
        InvoiceBuilder::default()
            .client(PartyBuilder::default().summary("Client & Co").build().unwrap())
            .provider(
                ProviderBuilder::default()
                    .party(
                        PartyBuilder::default()
                            .summary("Test Company Ltd.")
                            .ir("12345678")
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .creator(Creator::new("Test Accountant"))
            .number("2026001")
            .use_tax(use_tax)
            .note("Thank you!")
            .add_item(
                ItemBuilder::default()
                    .count(2)
                    .price(BigDecimal::from_str("100.50").unwrap())
                    .description("Test Product 1")
                    .unit("pcs")
                    .tax(21)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn renders_parties_items_and_totals() {
        let env = setup_template_env().unwrap();
        let html =
            render_template(&env, &make_invoice(true), Lang::En, Attachments::default())
                .unwrap();
        assert!(html.contains("Invoice 2026001"));
        assert!(html.contains("Test Company Ltd."));
        assert!(html.contains("Client &amp; Co"));
        assert!(html.contains("Reg. No.: 12345678"));
        assert!(html.contains("Test Product 1"));
        assert!(html.contains("201.00 Kč"));
        assert!(html.contains("243.21 Kč"));
        assert!(html.contains("VAT recapitulation"));
        assert!(html.contains("Thank you!"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn plain_numbers_drop_trailing_zeros() {
        assert_eq!(plain(&BigDecimal::from(10)), "10");
        assert_eq!(plain(&BigDecimal::from_str("21.00").unwrap()), "21");
        assert_eq!(plain(&BigDecimal::from_str("1.50").unwrap()), "1.5");
    }

    #[test]
    fn tax_columns_hidden_without_use_tax() {
        let env = setup_template_env().unwrap();
        let html =
            render_template(&env, &make_invoice(false), Lang::Sk, Attachments::default())
                .unwrap();
        assert!(html.contains("Faktúra 2026001"));
        assert!(!html.contains("Rekapitulácia DPH"));
        assert!(!html.contains("243.21"));
    }

    #[test]
    fn qr_svg_is_not_escaped() {
        let env = setup_template_env().unwrap();
        let attachments = Attachments {
            qr_svg: Some(String::from("<svg id=\"qr\"></svg>")),
            ..Default::default()
        };
        let html = render_template(&env, &make_invoice(false), Lang::Cs, attachments).unwrap();
        assert!(html.contains("<svg id=\"qr\"></svg>"));
        assert!(html.contains("QR platba"));
    }
}
