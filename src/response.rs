//! # Gateway Responses
//!
//! The reply to every command, whether it succeeded, failed on the device,
//! or never reached the gateway at all. Transport failures are folded into
//! the same type (see [`Response::request_failed`]) so callers handle one
//! result shape.
//!
//! ## Status Codes
//!
//! | Code | Variant | Meaning |
//! |------|---------|---------|
//! | 0 | [`Status::Ok`] | completed |
//! | 1 | [`Status::Running`] | still executing, poll with `GetRezult` |
//! | 2 | [`Status::Error`] | failed, see `Error` |
//! | 3 | [`Status::DeviceNotFound`] | no such device |
//! | 4 | [`Status::NotRun`] | accepted but not started |
//!
//! A non-empty `Error` string always wins over the transmitted code, see
//! [`Response::effective_status`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Prefix of the `Error` text for requests that got no usable reply.
pub const REQUEST_FAILED_PREFIX: &str = "Request failed: ";

/// Execution status reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Status {
    Ok,
    Running,
    Error,
    DeviceNotFound,
    NotRun,
}

impl Status {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::Running),
            2 => Some(Status::Error),
            3 => Some(Status::DeviceNotFound),
            4 => Some(Status::NotRun),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, String> {
        Status::from_code(code).ok_or_else(|| format!("unknown status code {}", code))
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => 0,
            Status::Running => 1,
            Status::Error => 2,
            Status::DeviceNotFound => 3,
            Status::NotRun => 4,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "Ok",
            Status::Running => "Running",
            Status::Error => "Error",
            Status::DeviceNotFound => "DeviceNotFound",
            Status::NotRun => "NotRun",
        };
        f.write_str(name)
    }
}

/// Coarse grouping used by the default response handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCategory {
    Error,
    Ok,
    Other,
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Register details returned by `GetDataKKT`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "NameOrganization", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "InnOrganization", default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(rename = "KktNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(rename = "FnNumber", default, skip_serializing_if = "Option::is_none")]
    pub fiscal_memory_number: Option<String>,
    #[serde(rename = "RegNumber", default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(rename = "AddressSettle", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "TaxVariant", default, skip_serializing_if = "Option::is_none")]
    pub tax_variant: Option<String>,
    /// 1 closed, 2 open, 3 open for more than 24 hours.
    #[serde(rename = "SessionState", default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<u8>,
    #[serde(rename = "FN_IsFiscal", default, skip_serializing_if = "Option::is_none")]
    pub is_fiscal: Option<bool>,
    #[serde(rename = "FN_MemOverflowl", default, skip_serializing_if = "Option::is_none")]
    pub fiscal_memory_full: Option<bool>,
    #[serde(rename = "FN_DateEnd", default, skip_serializing_if = "Option::is_none")]
    pub fiscal_memory_expires: Option<String>,
    #[serde(rename = "OFD_NumErrorDoc", default, skip_serializing_if = "Option::is_none")]
    pub unsynced_documents: Option<u32>,
    #[serde(rename = "OFD_DateErrorDoc", default, skip_serializing_if = "Option::is_none")]
    pub oldest_unsynced: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One register from a `List` reply.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceEntry {
    #[serde(rename = "NumDevice", default)]
    pub device_number: u8,
    #[serde(rename = "IdDevice", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(rename = "NameDevice", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "TypeDevice", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(rename = "OnOff", default, skip_serializing_if = "Option::is_none")]
    pub powered_on: Option<bool>,
    #[serde(rename = "Active", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "KktNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(rename = "INN", default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(rename = "NameOrganization", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "FN_IsFiscal", default, skip_serializing_if = "Option::is_none")]
    pub is_fiscal: Option<bool>,
    #[serde(rename = "FN_DateEnd", default, skip_serializing_if = "Option::is_none")]
    pub fiscal_memory_expires: Option<String>,
    #[serde(rename = "PaperOver", default, skip_serializing_if = "Option::is_none")]
    pub paper_out: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply to a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Status")]
    pub status: Status,
    /// Empty on success.
    #[serde(rename = "Error", default, deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(rename = "Command", default, deserialize_with = "null_as_default")]
    pub command: String,
    #[serde(rename = "IdCommand", default, deserialize_with = "null_as_default")]
    pub correlation_id: String,
    /// Receipt verification URL.
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "QRCode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(rename = "CheckNumber", default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<u64>,
    #[serde(rename = "SessionNumber", default, skip_serializing_if = "Option::is_none")]
    pub session_number: Option<u64>,
    /// Characters per printed line.
    #[serde(rename = "LineLength", default, skip_serializing_if = "Option::is_none")]
    pub line_length: Option<u32>,
    #[serde(rename = "Info", default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DeviceInfo>,
    #[serde(rename = "ListUnit", default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DeviceEntry>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    /// Synthetic reply for a request that produced no usable answer.
    pub fn request_failed(
        command: impl Into<String>,
        correlation_id: impl Into<String>,
        status_text: impl fmt::Display,
    ) -> Self {
        Self {
            status: Status::Error,
            error: format!("{}{}", REQUEST_FAILED_PREFIX, status_text),
            command: command.into(),
            correlation_id: correlation_id.into(),
            url: None,
            qr_code: None,
            check_number: None,
            session_number: None,
            line_length: None,
            info: None,
            devices: None,
            extra: Map::new(),
        }
    }

    /// Parse a reply body. Some gateways send the JSON object wrapped in a
    /// JSON string; that string is parsed once more.
    pub fn from_body(body: &[u8]) -> serde_json::Result<Self> {
        match serde_json::from_slice::<Value>(body)? {
            Value::String(inner) => serde_json::from_str(&inner),
            value => serde_json::from_value(value),
        }
    }

    /// `Error` when the error text is set, the transmitted status otherwise.
    pub fn effective_status(&self) -> Status {
        if self.error.is_empty() {
            self.status
        } else {
            Status::Error
        }
    }

    pub fn is_ok(&self) -> bool {
        self.effective_status() == Status::Ok
    }

    pub fn category(&self) -> ResponseCategory {
        match self.effective_status() {
            Status::Error => ResponseCategory::Error,
            Status::Ok => ResponseCategory::Ok,
            _ => ResponseCategory::Other,
        }
    }

    /// One human-readable line describing the outcome.
    pub fn status_line(&self) -> String {
        match self.category() {
            ResponseCategory::Error => format!(
                "{} [{}] failed: {}",
                self.command, self.correlation_id, self.error
            ),
            ResponseCategory::Ok => {
                format!("{} [{}] completed", self.command, self.correlation_id)
            }
            ResponseCategory::Other => format!(
                "{} [{}] status: {}",
                self.command, self.correlation_id, self.status
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_ok() {
        let body = br#"{"Status":0,"Error":"","Command":"OpenShift","IdCommand":"X","SessionNumber":12}"#;
        let response = Response::from_body(body).unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.command, "OpenShift");
        assert_eq!(response.correlation_id, "X");
        assert_eq!(response.session_number, Some(12));
        assert!(response.is_ok());
    }

    #[test]
    fn test_parse_stringified_body() {
        let inner = r#"{"Status":1,"Error":"","Command":"RegisterCheck","IdCommand":"Y"}"#;
        let body = serde_json::to_vec(&Value::String(inner.to_string())).unwrap();
        let response = Response::from_body(&body).unwrap();
        assert_eq!(response.status, Status::Running);
        assert_eq!(response.category(), ResponseCategory::Other);
    }

    #[test]
    fn test_error_text_overrides_status() {
        let body = br#"{"Status":0,"Error":"Paper out","Command":"XReport","IdCommand":"Z"}"#;
        let response = Response::from_body(body).unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.effective_status(), Status::Error);
        assert_eq!(response.category(), ResponseCategory::Error);
        assert_eq!(response.status_line(), "XReport [Z] failed: Paper out");
    }

    #[test]
    fn test_null_strings_become_empty() {
        let body = br#"{"Status":0,"Error":null,"Command":"List","IdCommand":null}"#;
        let response = Response::from_body(body).unwrap();
        assert_eq!(response.error, "");
        assert_eq!(response.correlation_id, "");
        assert!(response.is_ok());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let body = br#"{"Status":9,"Error":""}"#;
        assert!(Response::from_body(body).is_err());
    }

    #[test]
    fn test_status_codes_on_wire() {
        for (code, status) in [
            (0, Status::Ok),
            (1, Status::Running),
            (2, Status::Error),
            (3, Status::DeviceNotFound),
            (4, Status::NotRun),
        ] {
            assert_eq!(serde_json::to_value(status).unwrap(), json!(code));
            assert_eq!(Status::from_code(code), Some(status));
        }
    }

    #[test]
    fn test_device_list_and_extra_fields() {
        let body = json!({
            "Status": 0,
            "Error": "",
            "Command": "List",
            "IdCommand": "L",
            "ListUnit": [
                {"NumDevice": 1, "OnOff": true, "Active": true, "INN": "7701234567", "IP": "10.0.0.9"},
                {"NumDevice": 2, "OnOff": false, "Active": true}
            ],
            "Rezult": {"Custom": 1}
        });
        let response = Response::from_body(body.to_string().as_bytes()).unwrap();
        let devices = response.devices.as_ref().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].tax_id.as_deref(), Some("7701234567"));
        assert_eq!(devices[0].extra["IP"], "10.0.0.9");
        assert_eq!(devices[1].powered_on, Some(false));
        assert_eq!(response.extra["Rezult"], json!({"Custom": 1}));
    }

    #[test]
    fn test_device_info_block() {
        let body = json!({
            "Status": 0,
            "Error": "",
            "Command": "GetDataKKT",
            "IdCommand": "I",
            "Info": {"KktNumber": "0001", "SessionState": 2, "FN_IsFiscal": true}
        });
        let response = Response::from_body(body.to_string().as_bytes()).unwrap();
        let info = response.info.unwrap();
        assert_eq!(info.serial.as_deref(), Some("0001"));
        assert_eq!(info.session_state, Some(2));
        assert_eq!(info.is_fiscal, Some(true));
    }

    #[test]
    fn test_request_failed() {
        let response = Response::request_failed("ZReport", "abc", "timeout");
        assert_eq!(response.status, Status::Error);
        assert_eq!(response.error, "Request failed: timeout");
        assert_eq!(response.command, "ZReport");
        assert_eq!(response.correlation_id, "abc");
        assert_eq!(response.category(), ResponseCategory::Error);
    }

    #[test]
    fn test_status_lines() {
        let mut response = Response::request_failed("OpenShift", "1", "x");
        response.error.clear();
        response.status = Status::Ok;
        assert_eq!(response.status_line(), "OpenShift [1] completed");
        response.status = Status::NotRun;
        assert_eq!(response.status_line(), "OpenShift [1] status: NotRun");
    }

    #[test]
    fn test_missing_status_rejected() {
        let body = br#"{"Error":"","Command":"XReport","IdCommand":"m"}"#;
        assert!(Response::from_body(body).is_err());
    }
}
