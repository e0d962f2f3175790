//! `List` command: enumerate registers attached to the gateway.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::BaseCommand;

/// Date far enough ahead that every device passes the threshold filters.
fn far_future() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2100, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Filters applied by the gateway to the device list.
///
/// Boolean filters left as `None` match every device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Only devices registered to this tax id. Empty matches all.
    #[serde(rename = "InnKkm", default)]
    pub tax_id: String,
    #[serde(rename = "Active", default, skip_serializing_if = "Option::is_none")]
    pub active_only: Option<bool>,
    #[serde(rename = "OnOff", default, skip_serializing_if = "Option::is_none")]
    pub powered_on_only: Option<bool>,
    #[serde(rename = "OFD_Error", default, skip_serializing_if = "Option::is_none")]
    pub ofd_error_only: Option<bool>,
    /// Devices whose oldest document not sent to the OFD predates this.
    #[serde(rename = "OFD_DateErrorDoc")]
    pub unsynced_before: NaiveDateTime,
    /// Devices whose fiscal memory expires before this.
    #[serde(rename = "FN_DateEnd")]
    pub fiscal_memory_expires_before: NaiveDateTime,
    #[serde(
        rename = "FN_MemOverflowl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fiscal_memory_full: Option<bool>,
    #[serde(rename = "FN_IsFiscal", default, skip_serializing_if = "Option::is_none")]
    pub is_fiscal: Option<bool>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            tax_id: String::new(),
            active_only: None,
            powered_on_only: None,
            ofd_error_only: None,
            unsynced_before: far_future(),
            fiscal_memory_expires_before: far_future(),
            fiscal_memory_full: None,
            is_fiscal: None,
        }
    }
}

/// Device list query.
///
/// `InnKkm` belongs to the filter here; `base.tax_id` stays unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListCommand {
    #[serde(flatten)]
    pub base: BaseCommand,
    #[serde(flatten)]
    pub filter: ListFilter,
}

impl<'de> Deserialize<'de> for ListCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let filter = ListFilter::deserialize(Value::Object(fields.clone()))
            .map_err(D::Error::custom)?;
        let mut base =
            BaseCommand::deserialize(Value::Object(fields)).map_err(D::Error::custom)?;
        base.tax_id = None;
        Ok(Self { base, filter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_wire() {
        let value = serde_json::to_value(ListFilter::default()).unwrap();
        assert_eq!(value["InnKkm"], "");
        assert_eq!(value["OFD_DateErrorDoc"], "2100-01-01T00:00:00");
        assert_eq!(value["FN_DateEnd"], "2100-01-01T00:00:00");
        assert!(value.get("Active").is_none());
        assert!(value.get("FN_IsFiscal").is_none());
    }

    #[test]
    fn test_false_filter_is_sent() {
        let filter = ListFilter {
            active_only: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(filter).unwrap();
        assert_eq!(value["Active"], false);
    }

    #[test]
    fn test_tax_id_parses_into_filter() {
        let command = ListCommand {
            base: BaseCommand {
                command: "List".to_string(),
                device_number: 0,
                correlation_id: "l-1".to_string(),
                timeout_secs: 60,
                sub_license_key: None,
                tax_id: None,
                serial: Some("0000000042".to_string()),
            },
            filter: ListFilter {
                tax_id: "7701234567".to_string(),
                is_fiscal: Some(true),
                ..Default::default()
            },
        };
        let text = serde_json::to_string(&command).unwrap();
        let parsed: ListCommand = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.filter.tax_id, "7701234567");
        assert_eq!(parsed.base.tax_id, None);
        assert_eq!(parsed, command);
    }
}
