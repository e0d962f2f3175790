//! # Gateway Commands
//!
//! Typed request payloads for the KkmServer `Execute` endpoint.
//!
//! ## Shape
//!
//! Every command shares a [`BaseCommand`] (operation name, device number,
//! correlation id, timeout, licensing and register filters). Variants embed
//! it and add their own fields:
//!
//! | Variant | Adds | Operations |
//! |---------|------|------------|
//! | [`Command::Simple`] | nothing | `GetDataKKT`, `GetRezult`, `OfdReport`, `OpenCashDrawer`, `XReport` |
//! | [`Command::WithCashier`] | `CashierName` | `OpenShift`, `ZReport` |
//! | [`Command::WithAmount`] | `Amount`, `CashierName` | `DepositingCash`, `PaymentCash` |
//! | [`Command::List`] | device filters | `List` |
//! | [`Command::Check`] | receipt body | `RegisterCheck` |
//!
//! Any other operation name can be sent as a [`Command::Simple`].
//!
//! ## Wire Names
//!
//! Field names on the wire are the gateway's (`NumDevice`, `IdCommand`,
//! `CheckStrings`, ...). Unset optional fields are left out of the JSON
//! entirely, never sent as `null`.
//!
//! ## Example
//!
//! ```
//! use kkmserver_client::client::ConnectionDefaults;
//! use kkmserver_client::command::CommandFactory;
//!
//! let defaults = ConnectionDefaults::default().with_cashier_name("Ivanova A.");
//! let factory = CommandFactory::new(&defaults);
//!
//! let open = factory.open_shift().device(2).build()?;
//! assert_eq!(open.name(), "OpenShift");
//! assert_eq!(open.device_number(), 2);
//! # Ok::<(), kkmserver_client::KkmError>(())
//! ```

mod check;
mod factory;
mod id;
mod list;

pub use check::{
    AdditionalProp, BarcodeLine, CheckBuilder, CheckCommand, CheckLine, CheckProp, Egais,
    ImageLine, ItemLine, TextLine,
};
pub use factory::{CommandBuilder, CommandFactory, ListBuilder};
pub use id::{IdStrategy, MAX_CORRELATION_ID_LEN, is_grouped_hex, new_correlation_id};
pub use list::{ListCommand, ListFilter};

pub(crate) use id::validate_correlation_id;

use serde::{Deserialize, Serialize};

/// Operation names understood by the gateway.
pub mod names {
    pub const DEPOSITING_CASH: &str = "DepositingCash";
    pub const PAYMENT_CASH: &str = "PaymentCash";
    pub const GET_DATA_KKT: &str = "GetDataKKT";
    pub const GET_RESULT: &str = "GetRezult";
    pub const LIST: &str = "List";
    pub const OFD_REPORT: &str = "OfdReport";
    pub const OPEN_CASH_DRAWER: &str = "OpenCashDrawer";
    pub const OPEN_SHIFT: &str = "OpenShift";
    pub const X_REPORT: &str = "XReport";
    pub const Z_REPORT: &str = "ZReport";
    pub const REGISTER_CHECK: &str = "RegisterCheck";

    /// Every operation name in the built-in vocabulary.
    pub const ALL: &[&str] = &[
        DEPOSITING_CASH,
        PAYMENT_CASH,
        GET_DATA_KKT,
        GET_RESULT,
        LIST,
        OFD_REPORT,
        OPEN_CASH_DRAWER,
        OPEN_SHIFT,
        X_REPORT,
        Z_REPORT,
        REGISTER_CHECK,
    ];
}

/// Highest device number the gateway addresses.
pub const MAX_DEVICE_NUMBER: u8 = 9;

/// Default value for the `Timeout` field, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// Fields common to every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseCommand {
    /// Operation name.
    #[serde(rename = "Command")]
    pub command: String,
    /// Device number, 0 = first free device.
    #[serde(rename = "NumDevice")]
    pub device_number: u8,
    /// Correlation id used to poll for the result.
    #[serde(rename = "IdCommand")]
    pub correlation_id: String,
    /// Seconds the gateway waits for the device.
    #[serde(rename = "Timeout")]
    pub timeout_secs: u32,
    #[serde(
        rename = "KeySubLicensing",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_license_key: Option<String>,
    /// Tax id (INN) of the register; the gateway refuses a mismatching device.
    #[serde(rename = "InnKkm", default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Serial number of the register, used as a filter.
    #[serde(rename = "KktNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

/// A command that records which cashier performed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashierCommand {
    #[serde(flatten)]
    pub base: BaseCommand,
    #[serde(rename = "CashierName")]
    pub cashier_name: String,
}

/// A cash movement: deposit into or withdrawal from the drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountCommand {
    #[serde(flatten)]
    pub base: BaseCommand,
    #[serde(rename = "CashierName")]
    pub cashier_name: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
}

/// A fully built command, ready for the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Command {
    Simple(BaseCommand),
    WithCashier(CashierCommand),
    WithAmount(AmountCommand),
    List(ListCommand),
    Check(Box<CheckCommand>),
}

impl Command {
    /// The embedded common fields.
    pub fn base(&self) -> &BaseCommand {
        match self {
            Command::Simple(base) => base,
            Command::WithCashier(c) => &c.base,
            Command::WithAmount(c) => &c.base,
            Command::List(c) => &c.base,
            Command::Check(c) => &c.base,
        }
    }

    /// Mutable access to the common fields.
    pub fn base_mut(&mut self) -> &mut BaseCommand {
        match self {
            Command::Simple(base) => base,
            Command::WithCashier(c) => &mut c.base,
            Command::WithAmount(c) => &mut c.base,
            Command::List(c) => &mut c.base,
            Command::Check(c) => &mut c.base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().command
    }

    pub fn correlation_id(&self) -> &str {
        &self.base().correlation_id
    }

    pub fn device_number(&self) -> u8 {
        self.base().device_number
    }

    /// Cashier recorded on the command, if this variant carries one.
    pub fn cashier_name(&self) -> Option<&str> {
        match self {
            Command::WithCashier(c) => Some(&c.cashier_name),
            Command::WithAmount(c) => Some(&c.cashier_name),
            Command::Check(c) => Some(&c.cashier_name),
            Command::Simple(_) | Command::List(_) => None,
        }
    }

    /// Serialize to a JSON value with every `null` removed.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        crate::transport::prune_nulls(&mut value);
        Ok(value)
    }
}

/// What the executor remembers about the command it sent last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCommand {
    pub command: String,
    pub correlation_id: String,
    pub device_number: u8,
}

impl From<&Command> for IssuedCommand {
    fn from(command: &Command) -> Self {
        let base = command.base();
        Self {
            command: base.command.clone(),
            correlation_id: base.correlation_id.clone(),
            device_number: base.device_number,
        }
    }
}

impl From<BaseCommand> for Command {
    fn from(base: BaseCommand) -> Self {
        Command::Simple(base)
    }
}

impl From<CashierCommand> for Command {
    fn from(command: CashierCommand) -> Self {
        Command::WithCashier(command)
    }
}

impl From<AmountCommand> for Command {
    fn from(command: AmountCommand) -> Self {
        Command::WithAmount(command)
    }
}

impl From<ListCommand> for Command {
    fn from(command: ListCommand) -> Self {
        Command::List(command)
    }
}

impl From<CheckCommand> for Command {
    fn from(command: CheckCommand) -> Self {
        Command::Check(Box::new(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base(name: &str) -> BaseCommand {
        BaseCommand {
            command: name.to_string(),
            device_number: 0,
            correlation_id: "id-1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            sub_license_key: None,
            tax_id: None,
            serial: None,
        }
    }

    #[test]
    fn test_simple_wire_shape() {
        let command = Command::from(base(names::X_REPORT));
        assert_eq!(
            command.to_json().unwrap(),
            json!({
                "Command": "XReport",
                "NumDevice": 0,
                "IdCommand": "id-1",
                "Timeout": 60
            })
        );
    }

    #[test]
    fn test_optional_base_fields_serialized_when_set() {
        let mut b = base(names::GET_DATA_KKT);
        b.tax_id = Some("7701234567".to_string());
        b.serial = Some("0000000001".to_string());
        b.sub_license_key = Some("key".to_string());
        let value = Command::from(b).to_json().unwrap();
        assert_eq!(value["InnKkm"], "7701234567");
        assert_eq!(value["KktNumber"], "0000000001");
        assert_eq!(value["KeySubLicensing"], "key");
    }

    #[test]
    fn test_amount_command_keeps_zero() {
        let command = Command::from(AmountCommand {
            base: base(names::PAYMENT_CASH),
            cashier_name: String::new(),
            amount: 0.0,
        });
        let value = command.to_json().unwrap();
        assert_eq!(value["Amount"], json!(0.0));
        assert_eq!(value["CashierName"], "");
        assert_eq!(command.cashier_name(), Some(""));
    }

    #[test]
    fn test_cashier_command_round_trip() {
        let command = CashierCommand {
            base: base(names::OPEN_SHIFT),
            cashier_name: "Petrov".to_string(),
        };
        let text = serde_json::to_string(&command).unwrap();
        let parsed: CashierCommand = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_accessors() {
        let mut command = Command::from(base("FutureOperation"));
        assert_eq!(command.name(), "FutureOperation");
        assert_eq!(command.correlation_id(), "id-1");
        assert_eq!(command.cashier_name(), None);
        command.base_mut().device_number = 4;
        assert_eq!(command.device_number(), 4);
    }
}
