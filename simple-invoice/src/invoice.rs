//! Invoice domain types and serialization helpers.
//!
//! This module defines the parties taking part in an invoice (the issuing [`Provider`], the
//! receiving client [`Party`] and the [`Creator`] who signed the document), the billable
//! [`Item`]s and the [`Invoice`] aggregate tying them together. Decimal values are (de)serialized
//! as strings so no precision is lost in JSON. Totals are never stored: they are recomputed from
//! the item list on every read.

use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{Local, NaiveDate};
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn serialize_bigdecimal<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn deserialize_bigdecimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BigDecimal::from_str(&s).map_err(serde::de::Error::custom)
}

fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_currency() -> String {
    String::from("Kč")
}

fn default_currency_locale() -> String {
    String::from("cs_CZ.UTF-8")
}

/// Round a monetary amount to two decimal places, half away from zero.
pub fn round_amount(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// A postal address
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Address {
    address: String,
    #[builder(default)]
    #[serde(default)]
    address_line2: Option<String>,
    city: String,
    zip_code: String,
    #[builder(default)]
    #[serde(default)]
    country: Option<String>,
}

impl Address {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_line2(&self) -> Option<&str> {
        self.address_line2.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

/// A company or person on either side of the invoice.
///
/// Used as is for the client and embedded in [`Provider`] for the issuer. Identifiers are stored
/// exactly as given; nothing checks their format.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Party {
    /// Display name, e.g. `"My Company Ltd."`
    summary: String,
    #[builder(default)]
    #[serde(default)]
    address: Option<Address>,
    #[builder(default)]
    #[serde(default)]
    phone: Option<String>,
    #[builder(default)]
    #[serde(default)]
    email: Option<String>,
    /// VAT identifier (DIČ / IČ DPH)
    #[builder(default)]
    #[serde(default)]
    vat_id: Option<String>,
    /// Business registration identifier (IČ / IČO)
    #[builder(default)]
    #[serde(default)]
    ir: Option<String>,
    /// Tax identifier (DIČ)
    #[builder(default)]
    #[serde(default)]
    tax_id: Option<String>,
}

impl Party {
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn vat_id(&self) -> Option<&str> {
        self.vat_id.as_deref()
    }

    pub fn ir(&self) -> Option<&str> {
        self.ir.as_deref()
    }

    pub fn tax_id(&self) -> Option<&str> {
        self.tax_id.as_deref()
    }
}

/// Bank connection printed on the invoice and used for the QR payment code
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct BankAccount {
    bank_name: String,
    bank_account: String,
    #[builder(default)]
    #[serde(default)]
    bank_code: Option<String>,
    #[builder(default)]
    #[serde(default)]
    iban: Option<String>,
    #[builder(default)]
    #[serde(default)]
    swift: Option<String>,
}

impl BankAccount {
    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn bank_account(&self) -> &str {
        &self.bank_account
    }

    pub fn bank_code(&self) -> Option<&str> {
        self.bank_code.as_deref()
    }

    pub fn iban(&self) -> Option<&str> {
        self.iban.as_deref()
    }

    pub fn swift(&self) -> Option<&str> {
        self.swift.as_deref()
    }

    /// The domestic account number, `account/code` when a bank code is known.
    ///
    /// # Example
    /// ```rust
    /// use simple_invoice::BankAccountBuilder;
    ///
    /// let bank = BankAccountBuilder::default()
    ///     .bank_name("Test Bank")
    ///     .bank_account("1234567890")
    ///     .bank_code("0100")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(bank.account_number(), "1234567890/0100");
    /// ```
    pub fn account_number(&self) -> String {
        match &self.bank_code {
            Some(code) => format!("{}/{}", self.bank_account, code),
            None => self.bank_account.clone(),
        }
    }
}

/// The party issuing the invoice
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Provider {
    #[serde(flatten)]
    party: Party,
    #[builder(default)]
    #[serde(default)]
    bank: Option<BankAccount>,
    #[builder(default)]
    #[serde(default)]
    logo: Option<PathBuf>,
}

impl Provider {
    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn bank(&self) -> Option<&BankAccount> {
        self.bank.as_ref()
    }

    pub fn logo(&self) -> Option<&PathBuf> {
        self.logo.as_ref()
    }
}

/// The natural person who issued the invoice
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Creator {
    name: String,
    #[builder(default)]
    #[serde(default)]
    stamp: Option<PathBuf>,
}

impl Creator {
    /// Shorthand for a creator without a stamp image.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stamp: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stamp(&self) -> Option<&PathBuf> {
        self.stamp.as_ref()
    }
}

/// A single billable line: `count` units of `unit` at `price` each, taxed at `tax` percent.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Item {
    #[serde(
        serialize_with = "serialize_bigdecimal",
        deserialize_with = "deserialize_bigdecimal"
    )]
    count: BigDecimal,
    #[serde(
        serialize_with = "serialize_bigdecimal",
        deserialize_with = "deserialize_bigdecimal"
    )]
    price: BigDecimal,
    description: String,
    #[builder(default)]
    #[serde(default)]
    unit: String,
    /// Tax rate in percent, zero for exempt items
    #[builder(default = BigDecimal::from(0))]
    #[serde(
        default = "zero",
        serialize_with = "serialize_bigdecimal",
        deserialize_with = "deserialize_bigdecimal"
    )]
    tax: BigDecimal,
}

impl Item {
    /// Shorthand for building an item with every field given.
    pub fn new(
        count: impl Into<BigDecimal>,
        price: impl Into<BigDecimal>,
        description: impl Into<String>,
        unit: impl Into<String>,
        tax: impl Into<BigDecimal>,
    ) -> Self {
        Self {
            count: count.into(),
            price: price.into(),
            description: description.into(),
            unit: unit.into(),
            tax: tax.into(),
        }
    }

    pub fn count(&self) -> &BigDecimal {
        &self.count
    }

    /// Return the unit price for this item.
    pub fn price(&self) -> &BigDecimal {
        &self.price
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Return the tax rate in percent.
    pub fn tax(&self) -> &BigDecimal {
        &self.tax
    }

    /// Untaxed subtotal, `count * price`
    pub fn total(&self) -> BigDecimal {
        &self.count * &self.price
    }

    /// Tax owed on this item, `total * tax / 100`
    pub fn tax_amount(&self) -> BigDecimal {
        self.total() * &self.tax / BigDecimal::from(100)
    }

    /// Subtotal including tax, `total * (1 + tax / 100)`
    ///
    /// # Example
    /// ```rust
    /// use std::str::FromStr;
    ///
    /// use bigdecimal::BigDecimal;
    /// use simple_invoice::ItemBuilder;
    ///
    /// let item = ItemBuilder::default()
    ///     .count(2)
    ///     .price(BigDecimal::from_str("100.50").unwrap())
    ///     .description("Test Product 1")
    ///     .unit("pcs")
    ///     .tax(21)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(item.total_tax(), BigDecimal::from_str("243.21").unwrap());
    /// ```
    pub fn total_tax(&self) -> BigDecimal {
        self.total() + self.tax_amount()
    }
}

/// Sums of all items sharing one tax rate
#[derive(Debug, Clone, PartialEq)]
pub struct TaxBreakdown {
    pub rate: BigDecimal,
    pub total: BigDecimal,
    pub tax: BigDecimal,
    pub total_tax: BigDecimal,
}

/// Invoice top level model
///
/// Header fields are stored exactly as given. Only `client`, `provider` and `creator` are
/// required; the issue date defaults to today and the currency to Czech crowns.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned")]
pub struct Invoice {
    client: Party,
    provider: Provider,
    creator: Creator,
    #[builder(default = Vec::new())]
    #[serde(default)]
    items: Vec<Item>,
    #[builder(default)]
    #[serde(default)]
    title: Option<String>,
    #[builder(default)]
    #[serde(default)]
    number: Option<String>,
    #[builder(default)]
    #[serde(default)]
    variable_symbol: Option<String>,
    #[builder(default)]
    #[serde(default)]
    specific_symbol: Option<String>,
    #[builder(default = today())]
    #[serde(default = "today")]
    date: NaiveDate,
    /// Due date
    #[builder(default)]
    #[serde(default)]
    payback: Option<NaiveDate>,
    /// Date of taxable supply
    #[builder(default)]
    #[serde(default)]
    taxable_date: Option<NaiveDate>,
    #[builder(default = default_currency())]
    #[serde(default = "default_currency")]
    currency: String,
    #[builder(default = default_currency_locale())]
    #[serde(default = "default_currency_locale")]
    currency_locale: String,
    #[builder(default)]
    #[serde(default)]
    use_tax: bool,
    #[builder(default)]
    #[serde(default)]
    note: Option<String>,
    /// Payment method label, e.g. "Bank transfer"
    #[builder(default)]
    #[serde(default)]
    paytype: Option<String>,
}

impl Invoice {
    /// Create an invoice with no items and default header fields.
    pub fn new(client: Party, provider: Provider, creator: Creator) -> Self {
        Self {
            client,
            provider,
            creator,
            items: Vec::new(),
            title: None,
            number: None,
            variable_symbol: None,
            specific_symbol: None,
            date: today(),
            payback: None,
            taxable_date: None,
            currency: default_currency(),
            currency_locale: default_currency_locale(),
            use_tax: false,
            note: None,
            paytype: None,
        }
    }

    /// Append an [`Item`]. Totals read afterwards include it.
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Return the invoice's items in the order they were added.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Compute the untaxed invoice total as `sum(items.total)`.
    ///
    /// # Example
    /// ```rust
    /// use std::str::FromStr;
    ///
    /// use bigdecimal::BigDecimal;
    /// use simple_invoice::{Creator, InvoiceBuilder, ItemBuilder, PartyBuilder, ProviderBuilder};
    ///
    /// let inv = InvoiceBuilder::default()
    ///     .client(PartyBuilder::default().summary("Client Company").build().unwrap())
    ///     .provider(
    ///         ProviderBuilder::default()
    ///             .party(PartyBuilder::default().summary("Test Company Ltd.").build().unwrap())
    ///             .build().unwrap())
    ///     .creator(Creator::new("Test Accountant"))
    ///     .add_item(
    ///         ItemBuilder::default()
    ///             .count(2)
    ///             .price(BigDecimal::from_str("1500.00").unwrap())
    ///             .description("Web Development Services")
    ///             .build().unwrap()
    ///     )
    ///     .build().unwrap();
    /// assert_eq!(inv.price(), BigDecimal::from(3000));
    /// ```
    pub fn price(&self) -> BigDecimal {
        self.items.iter().map(Item::total).sum()
    }

    /// Compute the tax-inclusive total as `sum(items.total_tax)`.
    ///
    /// Equal to [`Invoice::price`] when the invoice does not use tax.
    pub fn price_tax(&self) -> BigDecimal {
        if self.use_tax {
            self.items.iter().map(Item::total_tax).sum()
        } else {
            self.price()
        }
    }

    /// Group items by tax rate, ascending. Rates that compare equal (`21` and `21.00`) share a
    /// group.
    pub fn tax_breakdown(&self) -> Vec<TaxBreakdown> {
        let mut groups: BTreeMap<BigDecimal, (BigDecimal, BigDecimal)> = BTreeMap::new();
        for item in &self.items {
            let (total, tax) = groups
                .entry(item.tax.clone())
                .or_insert_with(|| (zero(), zero()));
            *total += item.total();
            *tax += item.tax_amount();
        }
        groups
            .into_iter()
            .map(|(rate, (total, tax))| TaxBreakdown {
                total_tax: &total + &tax,
                rate,
                total,
                tax,
            })
            .collect()
    }

    pub fn client(&self) -> &Party {
        &self.client
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn creator(&self) -> &Creator {
        &self.creator
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn variable_symbol(&self) -> Option<&str> {
        self.variable_symbol.as_deref()
    }

    pub fn specific_symbol(&self) -> Option<&str> {
        self.specific_symbol.as_deref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn payback(&self) -> Option<NaiveDate> {
        self.payback
    }

    pub fn taxable_date(&self) -> Option<NaiveDate> {
        self.taxable_date
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn currency_locale(&self) -> &str {
        &self.currency_locale
    }

    pub fn use_tax(&self) -> bool {
        self.use_tax
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn paytype(&self) -> Option<&str> {
        self.paytype.as_deref()
    }
}

impl InvoiceBuilder {
    /// Add an [`Item`] to the builder's internal list.
    ///
    /// # Arguments
    /// * `item` - The [`Item`] to append.
    ///
    /// # Returns
    /// The updated [`InvoiceBuilder`].
    pub fn add_item(self, item: Item) -> Self {
        match self.items {
            Some(mut l) => {
                l.push(item);
                Self {
                    items: Some(l),
                    ..self
                }
            }
            None => Self {
                items: Some(vec![item]),
                ..self
            },
        }
    }
}
