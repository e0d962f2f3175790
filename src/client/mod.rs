//! # Gateway Client
//!
//! Sends commands to one gateway and routes the outcome to a handler.
//!
//! ## Flow
//!
//! ```text
//! Command ──► validate ──► JSON (no nulls) ──► POST /Execute/sync
//!                                                  │
//!                       ┌──────────────────────────┴──────────────┐
//!                  2xx + JSON body                        anything else
//!                       │                                         │
//!                       │                          failure handler builds
//!                       │                          "Request failed: ..." reply
//!                       └──────────────► success handler ◄────────┘
//! ```
//!
//! Local mistakes (no operation name, device out of range, over-long id)
//! are returned as [`KkmError`] before anything is sent. Everything after
//! that, including network failures, ends up as a [`Response`].
//!
//! ## Example
//!
//! ```no_run
//! use kkmserver_client::client::{Client, ClientConfig, SuccessHandler};
//!
//! # async fn example() -> Result<(), kkmserver_client::KkmError> {
//! let mut client = Client::new(
//!     ClientConfig::new("http://localhost:5893/").with_credentials("User", "30x"),
//! )?;
//! client.set_cashier_name("Ivanova A.").set_device_number(1);
//!
//! let open = client.commands().open_shift().build()?;
//! let response = client.send(&open).await?;
//! println!("{}", response.status_line());
//!
//! // Fire and forget, result goes to the callback.
//! let report = client.commands().x_report().build()?;
//! let print_status: SuccessHandler = std::sync::Arc::new(|r: kkmserver_client::Response| {
//!     println!("{:?}", r.status);
//! });
//! client.execute_with(report, Some(print_status), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! `execute` spawns one tokio task per command and returns at once. Replies
//! may complete in any order; callers that need ordering await
//! [`Client::send`] instead. Clones of a client share the transport and the
//! last-command record.

mod config;
pub mod handler;

pub use self::config::{
    ClientConfig, ConnectionDefaults, Credentials, DEFAULT_BASE_URL, ENV_PREFIX, EXECUTE_PATH,
};
pub use handler::{FailureHandler, SuccessHandler};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::command::{
    Command, CommandFactory, IssuedCommand, MAX_DEVICE_NUMBER, validate_correlation_id,
};
use crate::error::{KkmError, Result};
use crate::response::Response;
use crate::transport::{HttpTransport, Request, Transport, TransportFailure, prune_nulls};

/// Client for one gateway.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    last: Arc<Mutex<Option<IssuedCommand>>>,
    on_success: SuccessHandler,
    on_failure: FailureHandler,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("last", &self.last_command())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.execute_url()?;
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    /// Client over any transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            last: Arc::new(Mutex::new(None)),
            on_success: handler::default_success_handler(),
            on_failure: handler::default_failure_handler(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn set_credentials(
        &mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> &mut Self {
        self.config.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn clear_credentials(&mut self) -> &mut Self {
        self.config.credentials = None;
        self
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.set_request_timeout(timeout);
        self
    }

    pub fn set_device_number(&mut self, device: u8) -> &mut Self {
        self.config.defaults.device_number = device;
        self
    }

    pub fn set_cashier_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.defaults.cashier_name = name.into();
        self
    }

    pub fn set_tax_id(&mut self, tax_id: impl Into<String>) -> &mut Self {
        self.config.defaults.tax_id = Some(tax_id.into());
        self
    }

    pub fn set_serial(&mut self, serial: impl Into<String>) -> &mut Self {
        self.config.defaults.serial = Some(serial.into());
        self
    }

    pub fn set_sub_license_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.config.defaults.sub_license_key = Some(key.into());
        self
    }

    /// Replace the handler that receives every response.
    pub fn on_success<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Response) + Send + Sync + 'static,
    {
        self.on_success = Arc::new(handler);
        self
    }

    /// Replace the handler that builds responses for failed requests.
    pub fn on_failure<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&TransportFailure, &IssuedCommand) -> Response + Send + Sync + 'static,
    {
        self.on_failure = Arc::new(handler);
        self
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Builders resolved against this client's defaults.
    pub fn commands(&self) -> CommandFactory<'_> {
        CommandFactory::new(&self.config.defaults).with_last_command(self.last_command())
    }

    /// `GetRezult` for the most recently executed command.
    pub fn get_result(&self) -> Result<Command> {
        self.commands().get_result().build()
    }

    /// The command most recently handed to the transport.
    pub fn last_command(&self) -> Option<IssuedCommand> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remember(&self, issued: IssuedCommand) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(issued);
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Send in the background; the response goes to the client's handlers.
    pub fn execute(&self, command: Command) -> Result<Command> {
        self.execute_with(command, None, None)
    }

    /// Send in the background with per-call handlers.
    ///
    /// Returns the command as soon as the request is scheduled. Must be
    /// called from within a tokio runtime.
    pub fn execute_with(
        &self,
        command: Command,
        on_success: Option<SuccessHandler>,
        on_failure: Option<FailureHandler>,
    ) -> Result<Command> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| KkmError::NoRuntime)?;
        let (request, issued) = self.prepare(&command)?;
        self.remember(issued.clone());
        let dispatch = self.dispatch(on_success, on_failure);
        runtime.spawn(dispatch.run(request, issued));
        Ok(command)
    }

    /// Send and wait for the response.
    ///
    /// The response is returned rather than passed to the success handler;
    /// transport failures still go through the failure handler.
    pub async fn send(&self, command: &Command) -> Result<Response> {
        let (request, issued) = self.prepare(command)?;
        self.remember(issued.clone());
        let dispatch = self.dispatch(None, None);
        Ok(dispatch.exchange(request, &issued).await)
    }

    /// Send a hand-built JSON command in the background.
    ///
    /// The object must carry a non-empty string `Command` field. `null`
    /// members are removed before sending.
    pub fn execute_json(
        &self,
        mut command: Value,
        on_success: Option<SuccessHandler>,
        on_failure: Option<FailureHandler>,
    ) -> Result<Value> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| KkmError::NoRuntime)?;
        let issued = issued_from_json(&command)?;
        prune_nulls(&mut command);
        let request = self.request(command.clone())?;
        self.remember(issued.clone());
        let dispatch = self.dispatch(on_success, on_failure);
        runtime.spawn(dispatch.run(request, issued));
        Ok(command)
    }

    fn prepare(&self, command: &Command) -> Result<(Request, IssuedCommand)> {
        let base = command.base();
        if base.command.is_empty() {
            return Err(KkmError::InvalidCommandShape(
                "missing `Command` field".to_string(),
            ));
        }
        if base.device_number > MAX_DEVICE_NUMBER {
            return Err(KkmError::DeviceNumberOutOfRange(base.device_number));
        }
        validate_correlation_id(&base.correlation_id)?;

        let request = self.request(command.to_json()?)?;
        Ok((request, IssuedCommand::from(command)))
    }

    fn request(&self, body: Value) -> Result<Request> {
        Ok(Request {
            url: self.config.execute_url()?,
            body,
            authorization: self
                .config
                .credentials
                .as_ref()
                .map(Credentials::header_value),
            timeout: self.config.request_timeout(),
        })
    }

    fn dispatch(
        &self,
        on_success: Option<SuccessHandler>,
        on_failure: Option<FailureHandler>,
    ) -> Dispatch {
        Dispatch {
            transport: self.transport.clone(),
            on_success: on_success.unwrap_or_else(|| self.on_success.clone()),
            on_failure: on_failure.unwrap_or_else(|| self.on_failure.clone()),
        }
    }
}

/// Pull the bookkeeping fields out of a raw JSON command.
fn issued_from_json(command: &Value) -> Result<IssuedCommand> {
    let Some(object) = command.as_object() else {
        return Err(KkmError::InvalidCommandShape(
            "command must be a JSON object".to_string(),
        ));
    };
    let name = match object.get("Command").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(KkmError::InvalidCommandShape(
                "missing `Command` field".to_string(),
            ));
        }
    };
    let correlation_id = object
        .get("IdCommand")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    validate_correlation_id(&correlation_id)?;
    let device_number = match object.get("NumDevice") {
        None | Some(Value::Null) => 0,
        Some(value) => match value.as_u64() {
            Some(n) if n <= u64::from(MAX_DEVICE_NUMBER) => n as u8,
            Some(n) => return Err(KkmError::DeviceNumberOutOfRange(n.min(255) as u8)),
            None => {
                return Err(KkmError::InvalidCommandShape(format!(
                    "`NumDevice` must be an integer 0-{}, got {}",
                    MAX_DEVICE_NUMBER, value
                )));
            }
        },
    };
    Ok(IssuedCommand {
        command: name,
        correlation_id,
        device_number,
    })
}

/// One request in flight, with the handlers that will see its outcome.
struct Dispatch {
    transport: Arc<dyn Transport>,
    on_success: SuccessHandler,
    on_failure: FailureHandler,
}

impl Dispatch {
    async fn exchange(&self, request: Request, issued: &IssuedCommand) -> Response {
        debug!(
            command = %issued.command,
            correlation_id = %issued.correlation_id,
            device = issued.device_number,
            url = %request.url,
            "sending command"
        );
        let outcome = match self.transport.post(request).await {
            Ok(body) => Response::from_body(&body)
                .map_err(|e| TransportFailure::InvalidBody(e.to_string())),
            Err(failure) => Err(failure),
        };
        match outcome {
            Ok(response) => response,
            Err(failure) => {
                warn!(
                    command = %issued.command,
                    correlation_id = %issued.correlation_id,
                    "request failed: {}",
                    failure
                );
                (self.on_failure)(&failure, issued)
            }
        }
    }

    async fn run(self, request: Request, issued: IssuedCommand) {
        let response = self.exchange(request, &issued).await;
        (self.on_success)(response);
    }
}
