//! # Receipt Command
//!
//! `RegisterCheck` prints a receipt and, when fiscal, registers it with the
//! tax authority. The body is an ordered list of [`CheckLine`]s followed by
//! the payment totals.
//!
//! ## Check Lines
//!
//! Each line is exactly one of:
//!
//! | Variant | Wire key | Prints |
//! |---------|----------|--------|
//! | [`CheckLine::PrintText`] | `PrintText` | free text |
//! | [`CheckLine::Register`] | `Register` | a sold item (fiscal line) |
//! | [`CheckLine::BarCode`] | `BarCode` | a barcode |
//! | [`CheckLine::PrintImage`] | `PrintImage` | a base64 image |
//!
//! Lines keep the order they were added in; that is the printed order.
//!
//! ## Example
//!
//! ```
//! use kkmserver_client::client::ConnectionDefaults;
//! use kkmserver_client::command::{CommandFactory, ItemLine};
//!
//! let defaults = ConnectionDefaults::default();
//! let check = CommandFactory::new(&defaults)
//!     .register_check()
//!     .cashier("Ivanova A.")
//!     .text("Thank you!")
//!     .item(ItemLine::new("Milk 1L", 2.0, 89.9).tax(10))
//!     .barcode("EAN13", "4601234567890")
//!     .cash(179.8)
//!     .build()?;
//!
//! assert_eq!(check.name(), "RegisterCheck");
//! # Ok::<(), kkmserver_client::KkmError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::factory::CommandBuilder;
use super::{BaseCommand, Command};

/// Format version of the receipt body.
pub const DEFAULT_FFD_VERSION: &str = "1.0";

/// Receipt type code for a sale.
pub const CHECK_TYPE_SALE: u8 = 0;

// ============================================================================
// LINES
// ============================================================================

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckLine {
    PrintText(TextLine),
    Register(ItemLine),
    BarCode(BarcodeLine),
    PrintImage(ImageLine),
}

/// Non-fiscal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Font", default, skip_serializing_if = "Option::is_none")]
    pub font: Option<u8>,
    #[serde(rename = "Intensity", default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
            intensity: None,
        }
    }

    pub fn font(mut self, font: u8) -> Self {
        self.font = Some(font);
        self
    }

    pub fn intensity(mut self, intensity: u8) -> Self {
        self.intensity = Some(intensity);
        self
    }
}

/// Alcohol tracking sub-record of an item line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Egais {
    #[serde(rename = "Barcode")]
    pub barcode: String,
    #[serde(rename = "Ean", default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(rename = "Volume", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// A sold item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLine {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// VAT rate code (e.g. -1 = no VAT, 0, 10, 20).
    #[serde(rename = "Tax", default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<i32>,
    #[serde(rename = "Department", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<u32>,
    #[serde(rename = "EAN13", default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(rename = "EGAIS", default, skip_serializing_if = "Option::is_none")]
    pub egais: Option<Egais>,
}

impl ItemLine {
    /// Item with `amount` computed as `quantity * price`, rounded to kopecks.
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            amount: (quantity * price * 100.0).round() / 100.0,
            tax: None,
            department: None,
            barcode: None,
            egais: None,
        }
    }

    /// Override the line total (discounts).
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn tax(mut self, tax: i32) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn department(mut self, department: u32) -> Self {
        self.department = Some(department);
        self
    }

    pub fn barcode(mut self, ean13: impl Into<String>) -> Self {
        self.barcode = Some(ean13.into());
        self
    }

    pub fn egais(mut self, egais: Egais) -> Self {
        self.egais = Some(egais);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeLine {
    /// Symbology: "EAN13", "CODE39", "CODE128", "QR", "PDF417".
    #[serde(rename = "BarcodeType")]
    pub symbology: String,
    #[serde(rename = "Barcode")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLine {
    /// Base64 encoded image.
    #[serde(rename = "Image")]
    pub image: String,
}

// ============================================================================
// PROPERTIES
// ============================================================================

/// Property identified by its fiscal tag number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckProp {
    #[serde(rename = "Print")]
    pub print: bool,
    #[serde(rename = "PrintInHeader")]
    pub print_in_header: bool,
    #[serde(rename = "Teg")]
    pub tag: u32,
    #[serde(rename = "Prop")]
    pub value: serde_json::Value,
}

/// Free-form property identified by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalProp {
    #[serde(rename = "Print")]
    pub print: bool,
    #[serde(rename = "PrintInHeader")]
    pub print_in_header: bool,
    #[serde(rename = "NameProp")]
    pub name: String,
    #[serde(rename = "Prop")]
    pub value: serde_json::Value,
}

// ============================================================================
// COMMAND
// ============================================================================

/// Receipt registration command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckCommand {
    #[serde(flatten)]
    pub base: BaseCommand,
    #[serde(rename = "VerFFD")]
    pub ffd_version: String,
    #[serde(rename = "IsFiscalCheck")]
    pub fiscal: bool,
    /// 0 sale, 1 sale return, 2 sale correction, 10 purchase, ...
    #[serde(rename = "TypeCheck")]
    pub check_type: u8,
    /// Cancel a receipt left open on the device before starting this one.
    #[serde(rename = "CancelOpenedCheck")]
    pub cancel_opened_check: bool,
    #[serde(rename = "NotPrint")]
    pub not_print: bool,
    #[serde(rename = "NumberCopies")]
    pub copies: u8,
    #[serde(rename = "CashierName")]
    pub cashier_name: String,
    /// Buyer phone or e-mail for the electronic receipt.
    #[serde(rename = "ClientAddress", default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(rename = "TaxVariant", default, skip_serializing_if = "Option::is_none")]
    pub tax_variant: Option<String>,
    #[serde(rename = "KPP", default, skip_serializing_if = "Option::is_none")]
    pub kpp: Option<String>,
    #[serde(rename = "ClientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "CheckProps", default)]
    pub props: Vec<CheckProp>,
    #[serde(rename = "AdditionalProps", default)]
    pub additional_props: Vec<AdditionalProp>,
    #[serde(rename = "CheckStrings", default)]
    pub lines: Vec<CheckLine>,
    #[serde(rename = "Cash")]
    pub cash: f64,
    #[serde(rename = "CashLessType1")]
    pub cashless_1: f64,
    #[serde(rename = "CashLessType2")]
    pub cashless_2: f64,
    #[serde(rename = "CashLessType3")]
    pub cashless_3: f64,
}

impl CheckCommand {
    /// Append a line after the receipt has been built.
    pub fn push_line(&mut self, line: CheckLine) -> &mut Self {
        self.lines.push(line);
        self
    }

    /// Sum of all payment totals.
    pub fn total_paid(&self) -> f64 {
        self.cash + self.cashless_1 + self.cashless_2 + self.cashless_3
    }

    /// Sum of the item line totals.
    pub fn total_items(&self) -> f64 {
        self.lines
            .iter()
            .filter_map(|line| match line {
                CheckLine::Register(item) => Some(item.amount),
                _ => None,
            })
            .sum()
    }
}

/// Fluent builder for [`CheckCommand`].
#[derive(Debug, Clone)]
pub struct CheckBuilder<'a> {
    head: CommandBuilder<'a>,
    ffd_version: String,
    fiscal: bool,
    check_type: u8,
    cancel_opened_check: bool,
    not_print: bool,
    copies: u8,
    client_address: Option<String>,
    tax_variant: Option<String>,
    kpp: Option<String>,
    client_id: Option<String>,
    props: Vec<CheckProp>,
    additional_props: Vec<AdditionalProp>,
    lines: Vec<CheckLine>,
    cash: f64,
    cashless: [f64; 3],
}

impl<'a> CheckBuilder<'a> {
    pub(crate) fn new(head: CommandBuilder<'a>) -> Self {
        Self {
            head,
            ffd_version: DEFAULT_FFD_VERSION.to_string(),
            fiscal: true,
            check_type: CHECK_TYPE_SALE,
            cancel_opened_check: true,
            not_print: false,
            copies: 0,
            client_address: None,
            tax_variant: None,
            kpp: None,
            client_id: None,
            props: Vec::new(),
            additional_props: Vec::new(),
            lines: Vec::new(),
            cash: 0.0,
            cashless: [0.0; 3],
        }
    }

    pub fn device(mut self, device: u8) -> Self {
        self.head = self.head.device(device);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.head = self.head.correlation_id(id);
        self
    }

    pub fn timeout_secs(mut self, secs: u32) -> Self {
        self.head = self.head.timeout_secs(secs);
        self
    }

    pub fn cashier(mut self, name: impl Into<String>) -> Self {
        self.head = self.head.cashier(name);
        self
    }

    pub fn tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.head = self.head.tax_id(tax_id);
        self
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.head = self.head.serial(serial);
        self
    }

    pub fn sub_license_key(mut self, key: impl Into<String>) -> Self {
        self.head = self.head.sub_license_key(key);
        self
    }

    pub fn ffd_version(mut self, version: impl Into<String>) -> Self {
        self.ffd_version = version.into();
        self
    }

    /// `false` prints a plain slip that is not registered.
    pub fn fiscal(mut self, fiscal: bool) -> Self {
        self.fiscal = fiscal;
        self
    }

    pub fn check_type(mut self, check_type: u8) -> Self {
        self.check_type = check_type;
        self
    }

    pub fn cancel_opened_check(mut self, cancel: bool) -> Self {
        self.cancel_opened_check = cancel;
        self
    }

    pub fn not_print(mut self, not_print: bool) -> Self {
        self.not_print = not_print;
        self
    }

    pub fn copies(mut self, copies: u8) -> Self {
        self.copies = copies;
        self
    }

    pub fn client_address(mut self, address: impl Into<String>) -> Self {
        self.client_address = Some(address.into());
        self
    }

    pub fn tax_variant(mut self, variant: impl Into<String>) -> Self {
        self.tax_variant = Some(variant.into());
        self
    }

    pub fn kpp(mut self, kpp: impl Into<String>) -> Self {
        self.kpp = Some(kpp.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn prop(mut self, prop: CheckProp) -> Self {
        self.props.push(prop);
        self
    }

    pub fn additional_prop(mut self, prop: AdditionalProp) -> Self {
        self.additional_props.push(prop);
        self
    }

    /// Append any line.
    pub fn line(mut self, line: CheckLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.line(CheckLine::PrintText(TextLine::new(text)))
    }

    pub fn text_line(self, line: TextLine) -> Self {
        self.line(CheckLine::PrintText(line))
    }

    pub fn item(self, item: ItemLine) -> Self {
        self.line(CheckLine::Register(item))
    }

    pub fn barcode(self, symbology: impl Into<String>, value: impl Into<String>) -> Self {
        self.line(CheckLine::BarCode(BarcodeLine {
            symbology: symbology.into(),
            value: value.into(),
        }))
    }

    pub fn image(self, base64: impl Into<String>) -> Self {
        self.line(CheckLine::PrintImage(ImageLine {
            image: base64.into(),
        }))
    }

    pub fn cash(mut self, amount: f64) -> Self {
        self.cash = amount;
        self
    }

    /// Total for non-cash payment type 1..=3. Other slots are ignored.
    pub fn cashless(mut self, slot: usize, amount: f64) -> Self {
        if let Some(total) = slot.checked_sub(1).and_then(|i| self.cashless.get_mut(i)) {
            *total = amount;
        }
        self
    }

    pub fn build(self) -> Result<Command> {
        let base = self.head.build_base()?;
        let cashier_name = self.head.resolve_cashier();
        let [cashless_1, cashless_2, cashless_3] = self.cashless;
        Ok(Command::Check(Box::new(CheckCommand {
            base,
            ffd_version: self.ffd_version,
            fiscal: self.fiscal,
            check_type: self.check_type,
            cancel_opened_check: self.cancel_opened_check,
            not_print: self.not_print,
            copies: self.copies,
            cashier_name,
            client_address: self.client_address,
            tax_variant: self.tax_variant,
            kpp: self.kpp,
            client_id: self.client_id,
            props: self.props,
            additional_props: self.additional_props,
            lines: self.lines,
            cash: self.cash,
            cashless_1,
            cashless_2,
            cashless_3,
        })))
    }
}
