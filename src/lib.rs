//! # KkmServer Client
//!
//! Client library for KkmServer, an HTTP gateway in front of Russian fiscal
//! cash registers. Commands are built from a small set of typed builders,
//! serialized to the gateway's JSON format and POSTed to
//! `{base_url}/Execute/sync`. Every command yields exactly one [`Response`]:
//! either the gateway's reply or a synthetic `"Request failed: ..."` error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kkmserver_client::{Client, ClientConfig, command::ItemLine};
//!
//! # async fn example() -> Result<(), kkmserver_client::KkmError> {
//! let mut client = Client::new(ClientConfig::new("http://localhost:5893/"))?;
//! client
//!     .set_credentials("User", "30x")
//!     .set_cashier_name("Petrova M.")
//!     .set_device_number(1);
//!
//! let check = client
//!     .commands()
//!     .register_check()
//!     .text("Thank you!")
//!     .item(ItemLine::new("Coffee", 2.0, 150.0))
//!     .cash(300.0)
//!     .build()?;
//!
//! let response = client.send(&check).await?;
//! println!("{}", response.status_line());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`command`] | Command types, builders, correlation ids |
//! | [`client`] | Configuration, execution, result handlers |
//! | [`transport`] | HTTP and mock backends |
//! | [`response`] | Gateway reply model |
//! | [`error`] | Error types |

pub mod client;
pub mod command;
pub mod error;
pub mod response;
pub mod transport;

pub use client::{Client, ClientConfig};
pub use command::Command;
pub use error::KkmError;
pub use response::{Response, Status};
