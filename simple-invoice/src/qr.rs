//! QR payment codes in the Short Payment Descriptor format (SPAYD 1.0) read by Czech and Slovak
//! banking apps.

use qrcode::{QrCode, render::svg};

use crate::invoice::{Invoice, round_amount};

const MAX_MESSAGE_LEN: usize = 60;

/// Map the invoice currency label to an ISO 4217 code.
///
/// Three letter labels are taken as codes already. Anything unrecognised is assumed to be crowns.
pub fn currency_code(currency: &str) -> String {
    match currency.trim() {
        "Kč" | "Kc" | "kč" => String::from("CZK"),
        "€" => String::from("EUR"),
        "$" => String::from("USD"),
        c if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) => c.to_ascii_uppercase(),
        _ => String::from("CZK"),
    }
}

// `*` separates fields and may not appear inside values.
fn clean(value: &str) -> String {
    value.replace('*', "").trim().to_string()
}

/// Build the SPAYD payload for the invoice's tax-inclusive total.
///
/// # Returns
/// - `None` if the provider has no IBAN, since the format cannot address domestic accounts
///
/// # Example
/// ```rust
/// use simple_invoice::{
///     BankAccountBuilder, Creator, InvoiceBuilder, ItemBuilder, PartyBuilder, ProviderBuilder,
///     qr::payment_payload,
/// };
///
/// let inv = InvoiceBuilder::default()
///     .client(PartyBuilder::default().summary("Client").build().unwrap())
///     .provider(
///         ProviderBuilder::default()
///             .party(PartyBuilder::default().summary("Provider").build().unwrap())
///             .bank(
///                 BankAccountBuilder::default()
///                     .bank_name("Bank")
///                     .bank_account("1234567890")
///                     .iban("CZ65 0800 0000 1920 0014 5399")
///                     .build().unwrap())
///             .build().unwrap())
///     .creator(Creator::new("Creator"))
///     .variable_symbol("2026001")
///     .add_item(ItemBuilder::default().count(1).price(100).description("x").build().unwrap())
///     .build().unwrap();
/// assert_eq!(
///     payment_payload(&inv).unwrap(),
///     "SPD*1.0*ACC:CZ6508000000192000145399*AM:100.00*CC:CZK*X-VS:2026001"
/// );
/// ```
pub fn payment_payload(invoice: &Invoice) -> Option<String> {
    let bank = invoice.provider().bank()?;
    let iban: String = bank.iban()?.chars().filter(|c| !c.is_whitespace()).collect();
    if iban.is_empty() {
        return None;
    }

    let mut account = iban.to_ascii_uppercase();
    if let Some(swift) = bank.swift().map(clean).filter(|s| !s.is_empty()) {
        account = format!("{account}+{swift}");
    }

    let mut fields = vec![
        String::from("SPD"),
        String::from("1.0"),
        format!("ACC:{account}"),
        format!("AM:{}", round_amount(&invoice.price_tax())),
        format!("CC:{}", currency_code(invoice.currency())),
    ];
    if let Some(due) = invoice.payback() {
        fields.push(format!("DT:{}", due.format("%Y%m%d")));
    }
    if let Some(vs) = invoice.variable_symbol().map(clean).filter(|s| !s.is_empty()) {
        fields.push(format!("X-VS:{vs}"));
    }
    if let Some(ss) = invoice.specific_symbol().map(clean).filter(|s| !s.is_empty()) {
        fields.push(format!("X-SS:{ss}"));
    }
    let message = [invoice.title(), invoice.number()]
        .into_iter()
        .flatten()
        .map(clean)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !message.is_empty() {
        let message: String = message.chars().take(MAX_MESSAGE_LEN).collect();
        fields.push(format!("MSG:{message}"));
    }
    Some(fields.join("*"))
}

/// Render a payload as an SVG QR code suitable for inlining into HTML.
pub fn qr_svg(payload: &str) -> Result<String, crate::Error> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(160, 160)
        .quiet_zone(true)
        .build())
}
