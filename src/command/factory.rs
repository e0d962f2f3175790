//! # Command Factory
//!
//! Fluent builders for every gateway operation. Builders collect explicit
//! arguments as `Option`s and resolve the rest against
//! [`ConnectionDefaults`] when [`build`](CommandBuilder::build) is called, so
//! a device number of 0, an amount of 0.00 or an empty cashier name given by
//! the caller is kept as given.

use crate::client::ConnectionDefaults;
use crate::error::{KkmError, Result};

use super::check::CheckBuilder;
use super::list::{ListCommand, ListFilter};
use super::{
    AmountCommand, BaseCommand, CashierCommand, Command, IssuedCommand, MAX_DEVICE_NUMBER, names,
    validate_correlation_id,
};

/// Produces command builders bound to a set of defaults.
///
/// The factory holds no state of its own. `last` is the most recently
/// executed command, consulted only by [`get_result`](Self::get_result).
#[derive(Debug, Clone)]
pub struct CommandFactory<'a> {
    defaults: &'a ConnectionDefaults,
    last: Option<IssuedCommand>,
}

impl<'a> CommandFactory<'a> {
    pub fn new(defaults: &'a ConnectionDefaults) -> Self {
        Self {
            defaults,
            last: None,
        }
    }

    /// Attach the most recently executed command for result lookups.
    pub fn with_last_command(mut self, last: Option<IssuedCommand>) -> Self {
        self.last = last;
        self
    }

    /// Any operation, including names this crate does not know about.
    pub fn command(&self, name: impl Into<String>) -> CommandBuilder<'a> {
        CommandBuilder::new(self.defaults, name.into(), Shape::Simple)
    }

    /// Put cash into the drawer.
    pub fn depositing_cash(&self, amount: f64) -> CommandBuilder<'a> {
        CommandBuilder::new(self.defaults, names::DEPOSITING_CASH.into(), Shape::Amount(amount))
    }

    /// Take cash out of the drawer.
    pub fn payment_cash(&self, amount: f64) -> CommandBuilder<'a> {
        CommandBuilder::new(self.defaults, names::PAYMENT_CASH.into(), Shape::Amount(amount))
    }

    /// Register state and fiscal memory information.
    pub fn get_data_kkt(&self) -> CommandBuilder<'a> {
        self.command(names::GET_DATA_KKT)
    }

    /// Poll for the result of an earlier command.
    ///
    /// Without an explicit [`correlation_id`](CommandBuilder::correlation_id)
    /// the id of the last executed command is used, and without an explicit
    /// [`device`](CommandBuilder::device) its device number.
    pub fn get_result(&self) -> CommandBuilder<'a> {
        let mut builder =
            CommandBuilder::new(self.defaults, names::GET_RESULT.into(), Shape::GetResult);
        builder.last = self.last.clone();
        builder
    }

    /// Registers attached to the gateway.
    pub fn list(&self) -> ListBuilder<'a> {
        ListBuilder {
            head: self.command(names::LIST),
            filter: ListFilter::default(),
        }
    }

    /// Print the state of the exchange with the fiscal data operator.
    pub fn ofd_report(&self) -> CommandBuilder<'a> {
        self.command(names::OFD_REPORT)
    }

    pub fn open_cash_drawer(&self) -> CommandBuilder<'a> {
        self.command(names::OPEN_CASH_DRAWER)
    }

    pub fn open_shift(&self) -> CommandBuilder<'a> {
        CommandBuilder::new(self.defaults, names::OPEN_SHIFT.into(), Shape::Cashier)
    }

    /// Interim report, shift stays open.
    pub fn x_report(&self) -> CommandBuilder<'a> {
        self.command(names::X_REPORT)
    }

    /// Close the shift.
    pub fn z_report(&self) -> CommandBuilder<'a> {
        CommandBuilder::new(self.defaults, names::Z_REPORT.into(), Shape::Cashier)
    }

    /// Start a receipt. Lines and payments are added on the builder.
    pub fn register_check(&self) -> CheckBuilder<'a> {
        CheckBuilder::new(CommandBuilder::new(
            self.defaults,
            names::REGISTER_CHECK.into(),
            Shape::Cashier,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Simple,
    Cashier,
    Amount(f64),
    GetResult,
}

/// Builder for the simple, cashier and amount command variants.
#[derive(Debug, Clone)]
pub struct CommandBuilder<'a> {
    defaults: &'a ConnectionDefaults,
    last: Option<IssuedCommand>,
    name: String,
    shape: Shape,
    device: Option<u8>,
    correlation_id: Option<String>,
    timeout_secs: Option<u32>,
    cashier: Option<String>,
    tax_id: Option<String>,
    serial: Option<String>,
    sub_license_key: Option<String>,
}

impl<'a> CommandBuilder<'a> {
    fn new(defaults: &'a ConnectionDefaults, name: String, shape: Shape) -> Self {
        Self {
            defaults,
            last: None,
            name,
            shape,
            device: None,
            correlation_id: None,
            timeout_secs: None,
            cashier: None,
            tax_id: None,
            serial: None,
            sub_license_key: None,
        }
    }

    /// Target device, 0 lets the gateway pick the first free one.
    pub fn device(mut self, device: u8) -> Self {
        self.device = Some(device);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Cashier name; ignored by variants that carry none.
    pub fn cashier(mut self, name: impl Into<String>) -> Self {
        self.cashier = Some(name.into());
        self
    }

    pub fn tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn sub_license_key(mut self, key: impl Into<String>) -> Self {
        self.sub_license_key = Some(key.into());
        self
    }

    /// Resolve against the defaults and produce the command.
    pub fn build(self) -> Result<Command> {
        let base = self.build_base()?;
        let command = match self.shape {
            Shape::Simple | Shape::GetResult => Command::Simple(base),
            Shape::Cashier => Command::WithCashier(CashierCommand {
                base,
                cashier_name: self.resolve_cashier(),
            }),
            Shape::Amount(amount) => Command::WithAmount(AmountCommand {
                base,
                cashier_name: self.resolve_cashier(),
                amount,
            }),
        };
        Ok(command)
    }

    pub(crate) fn resolve_cashier(&self) -> String {
        self.cashier
            .clone()
            .unwrap_or_else(|| self.defaults.cashier_name.clone())
    }

    pub(crate) fn build_base(&self) -> Result<BaseCommand> {
        if self.name.is_empty() {
            return Err(KkmError::InvalidCommandShape(
                "operation name is empty".to_string(),
            ));
        }

        let (correlation_id, device_number) = if self.shape == Shape::GetResult {
            self.resolve_result_target()?
        } else {
            let id = match &self.correlation_id {
                Some(id) => id.clone(),
                None => self.defaults.id_strategy.generate(),
            };
            (id, self.device.unwrap_or(self.defaults.device_number))
        };

        if device_number > MAX_DEVICE_NUMBER {
            return Err(KkmError::DeviceNumberOutOfRange(device_number));
        }
        validate_correlation_id(&correlation_id)?;

        Ok(BaseCommand {
            command: self.name.clone(),
            device_number,
            correlation_id,
            timeout_secs: self.timeout_secs.unwrap_or(self.defaults.timeout_secs),
            sub_license_key: self
                .sub_license_key
                .clone()
                .or_else(|| self.defaults.sub_license_key.clone()),
            tax_id: self.tax_id.clone().or_else(|| self.defaults.tax_id.clone()),
            serial: self.serial.clone().or_else(|| self.defaults.serial.clone()),
        })
    }

    fn resolve_result_target(&self) -> Result<(String, u8)> {
        let id = match (&self.correlation_id, &self.last) {
            (Some(id), _) => id.clone(),
            (None, Some(last)) => last.correlation_id.clone(),
            (None, None) => return Err(KkmError::NoPriorCommand),
        };
        let device = match (self.device, &self.last) {
            (Some(device), _) => device,
            (None, Some(last)) => last.device_number,
            (None, None) => self.defaults.device_number,
        };
        Ok((id, device))
    }
}

/// Builder for the `List` query.
#[derive(Debug, Clone)]
pub struct ListBuilder<'a> {
    head: CommandBuilder<'a>,
    filter: ListFilter,
}

impl<'a> ListBuilder<'a> {
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

    pub fn sub_license_key(mut self, key: impl Into<String>) -> Self {
        self.head = self.head.sub_license_key(key);
        self
    }

    /// Only registers with this tax id.
    pub fn tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.filter.tax_id = tax_id.into();
        self
    }

    pub fn active_only(mut self, value: bool) -> Self {
        self.filter.active_only = Some(value);
        self
    }

    pub fn powered_on_only(mut self, value: bool) -> Self {
        self.filter.powered_on_only = Some(value);
        self
    }

    pub fn ofd_error_only(mut self, value: bool) -> Self {
        self.filter.ofd_error_only = Some(value);
        self
    }

    pub fn unsynced_before(mut self, when: chrono::NaiveDateTime) -> Self {
        self.filter.unsynced_before = when;
        self
    }

    pub fn fiscal_memory_expires_before(mut self, when: chrono::NaiveDateTime) -> Self {
        self.filter.fiscal_memory_expires_before = when;
        self
    }

    pub fn fiscal_memory_full(mut self, value: bool) -> Self {
        self.filter.fiscal_memory_full = Some(value);
        self
    }

    pub fn is_fiscal(mut self, value: bool) -> Self {
        self.filter.is_fiscal = Some(value);
        self
    }

    /// Replace the whole filter.
    pub fn filter(mut self, filter: ListFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn build(self) -> Result<Command> {
        let mut base = self.head.build_base()?;
        // The tax id travels in the filter for this query.
        base.tax_id = None;
        Ok(Command::List(ListCommand {
            base,
            filter: self.filter,
        }))
    }
}
