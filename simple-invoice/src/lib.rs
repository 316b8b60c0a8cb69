//! Utilities for building invoices and rendering them as PDFs
//!
//! This crate models Central European style invoices (provider, client, creator, items with tax
//! rates, variable and specific payment symbols) and renders them to PDF using a connection to
//! headless chrome(ium). Labels are printed in English, Czech or Slovak, chosen through the
//! `INVOICE_LANG` environment variable. Optionally a QR payment code is embedded.
//!
//! # Example
//!
//! ```rust,no_run
//! use bigdecimal::BigDecimal;
//! use simple_invoice::{Creator, Invoice, ItemBuilder, PartyBuilder, ProviderBuilder, SimpleInvoice};
//!
//! # async fn run() -> Result<(), simple_invoice::Error> {
//! let provider = ProviderBuilder::default()
//!     .party(PartyBuilder::default().summary("My Company Ltd.").build().unwrap())
//!     .build().unwrap();
//! let client = PartyBuilder::default().summary("Client Company s.r.o.").build().unwrap();
//! let mut invoice = Invoice::new(client, provider, Creator::new("John Accountant"));
//! invoice.add_item(
//!     ItemBuilder::default()
//!         .count(2)
//!         .price(BigDecimal::from(1500))
//!         .description("Web Development Services")
//!         .unit("hours")
//!         .build().unwrap(),
//! );
//! assert_eq!(invoice.price(), BigDecimal::from(3000));
//! SimpleInvoice::new(invoice).save("invoice.pdf", false).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod invoice;
pub mod lang;
pub mod pdf;
pub mod qr;
pub mod template_env;

pub use error::Error;
pub use invoice::{
    Address, AddressBuilder, AddressBuilderError, BankAccount, BankAccountBuilder,
    BankAccountBuilderError, Creator, CreatorBuilder, CreatorBuilderError, Invoice,
    InvoiceBuilder, InvoiceBuilderError, Item, ItemBuilder, ItemBuilderError, Party, PartyBuilder,
    PartyBuilderError, Provider, ProviderBuilder, ProviderBuilderError, TaxBreakdown,
};
pub use lang::Lang;
pub use pdf::{SimpleInvoice, generate_pdf, start_chromedriver};
