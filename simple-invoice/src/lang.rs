//! Language selection for rendered invoices.
//!
//! The language is picked from the `INVOICE_LANG` environment variable unless the caller passes
//! one explicitly. Only the labels printed by the invoice template are translated.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;

/// Environment variable holding the language code
pub const LANG_ENV: &str = "INVOICE_LANG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    En,
    #[default]
    Cs,
    Sk,
}

impl Lang {
    /// Read the language from `INVOICE_LANG`, falling back to Czech when it is unset or unknown.
    pub fn from_env() -> Self {
        match std::env::var(LANG_ENV) {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}, falling back to {}", Lang::default());
                Lang::default()
            }),
            Err(_) => Lang::default(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Cs => "cs",
            Lang::Sk => "sk",
        }
    }

    pub fn labels(&self) -> &'static Labels {
        match self {
            Lang::En => &EN,
            Lang::Cs => &CS,
            Lang::Sk => &SK,
        }
    }
}

impl Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    /// Accepts a bare code (`sk`) or a locale (`sk_SK.UTF-8`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .split(['_', '-', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match code.as_str() {
            "en" => Ok(Lang::En),
            "cs" | "cz" => Ok(Lang::Cs),
            "sk" => Ok(Lang::Sk),
            _ => Err(format!("unsupported invoice language '{s}'")),
        }
    }
}

/// Every string the invoice template prints outside of invoice data
#[derive(Debug, Serialize)]
pub struct Labels {
    pub invoice: &'static str,
    pub number: &'static str,
    pub provider: &'static str,
    pub client: &'static str,
    pub creator: &'static str,
    pub date: &'static str,
    pub payback: &'static str,
    pub taxable_date: &'static str,
    pub variable_symbol: &'static str,
    pub specific_symbol: &'static str,
    pub paytype: &'static str,
    pub bank: &'static str,
    pub account: &'static str,
    pub iban: &'static str,
    pub swift: &'static str,
    pub vat_id: &'static str,
    pub ir: &'static str,
    pub tax_id: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub description: &'static str,
    pub count: &'static str,
    pub unit_price: &'static str,
    pub tax_rate: &'static str,
    pub total: &'static str,
    pub total_tax: &'static str,
    pub tax_base: &'static str,
    pub tax: &'static str,
    pub tax_recap: &'static str,
    pub total_to_pay: &'static str,
    pub note: &'static str,
    pub qr_payment: &'static str,
}

static EN: Labels = Labels {
    invoice: "Invoice",
    number: "Number",
    provider: "Provider",
    client: "Client",
    creator: "Issued by",
    date: "Date of issue",
    payback: "Due date",
    taxable_date: "Taxable supply date",
    variable_symbol: "Variable symbol",
    specific_symbol: "Specific symbol",
    paytype: "Payment method",
    bank: "Bank",
    account: "Account number",
    iban: "IBAN",
    swift: "SWIFT",
    vat_id: "VAT ID",
    ir: "Reg. No.",
    tax_id: "Tax ID",
    phone: "Phone",
    email: "Email",
    description: "Description",
    count: "Qty",
    unit_price: "Unit price",
    tax_rate: "VAT %",
    total: "Total",
    total_tax: "Total incl. VAT",
    tax_base: "Tax base",
    tax: "VAT",
    tax_recap: "VAT recapitulation",
    total_to_pay: "Total to pay",
    note: "Note",
    qr_payment: "QR payment",
};

static CS: Labels = Labels {
    invoice: "Faktura",
    number: "Číslo",
    provider: "Dodavatel",
    client: "Odběratel",
    creator: "Vystavil",
    date: "Datum vystavení",
    payback: "Datum splatnosti",
    taxable_date: "Datum zdanitelného plnění",
    variable_symbol: "Variabilní symbol",
    specific_symbol: "Specifický symbol",
    paytype: "Způsob platby",
    bank: "Banka",
    account: "Číslo účtu",
    iban: "IBAN",
    swift: "SWIFT",
    vat_id: "DIČ",
    ir: "IČ",
    tax_id: "DIČ",
    phone: "Telefon",
    email: "E-mail",
    description: "Popis",
    count: "Množství",
    unit_price: "Cena za jednotku",
    tax_rate: "DPH %",
    total: "Celkem",
    total_tax: "Celkem s DPH",
    tax_base: "Základ daně",
    tax: "DPH",
    tax_recap: "Rekapitulace DPH",
    total_to_pay: "Celkem k úhradě",
    note: "Poznámka",
    qr_payment: "QR platba",
};

static SK: Labels = Labels {
    invoice: "Faktúra",
    number: "Číslo",
    provider: "Dodávateľ",
    client: "Odberateľ",
    creator: "Vystavil",
    date: "Dátum vystavenia",
    payback: "Dátum splatnosti",
    taxable_date: "Dátum dodania",
    variable_symbol: "Variabilný symbol",
    specific_symbol: "Špecifický symbol",
    paytype: "Spôsob úhrady",
    bank: "Banka",
    account: "Číslo účtu",
    iban: "IBAN",
    swift: "SWIFT",
    vat_id: "IČ DPH",
    ir: "IČO",
    tax_id: "DIČ",
    phone: "Telefón",
    email: "E-mail",
    description: "Popis",
    count: "Množstvo",
    unit_price: "Jednotková cena",
    tax_rate: "DPH %",
    total: "Spolu",
    total_tax: "Spolu s DPH",
    tax_base: "Základ dane",
    tax: "DPH",
    tax_recap: "Rekapitulácia DPH",
    total_to_pay: "Celkom na úhradu",
    note: "Poznámka",
    qr_payment: "QR platba",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_locales() {
        assert_eq!("sk".parse::<Lang>().unwrap(), Lang::Sk);
        assert_eq!("SK".parse::<Lang>().unwrap(), Lang::Sk);
        assert_eq!("sk_SK.UTF-8".parse::<Lang>().unwrap(), Lang::Sk);
        assert_eq!("cs_CZ.UTF-8".parse::<Lang>().unwrap(), Lang::Cs);
        assert_eq!("en".parse::<Lang>().unwrap(), Lang::En);
        assert!("de".parse::<Lang>().is_err());
        assert!("".parse::<Lang>().is_err());
    }

    #[test]
    fn labels_follow_language() {
        assert_eq!(Lang::Sk.labels().invoice, "Faktúra");
        assert_eq!(Lang::Cs.labels().provider, "Dodavatel");
        assert_eq!(Lang::En.labels().payback, "Due date");
        assert_eq!(Lang::default(), Lang::Cs);
    }
}
