//! Source configuration
//!
//! `SourceConfig` is the user-facing configuration as it appears in a YAML or
//! JSON file. It is validated once at startup into a `ValidatedConfig` whose
//! dates, region and merchant type are already parsed, so nothing downstream
//! ever sees a malformed value.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Date format used for configuration, request parameters and cursors
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default number of already-synced days the summary stream re-reads
pub const DEFAULT_LOOKBACK_WINDOW_DAYS: u32 = 3;

// ============================================================================
// Region
// ============================================================================

/// Supported settlement regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "AU")]
    Au,
}

impl Country {
    /// All supported regions
    pub const ALL: [Country; 3] = [Country::Us, Country::Ca, Country::Au];

    /// Two-letter region code
    pub fn code(self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Ca => "CA",
            Country::Au => "AU",
        }
    }

    /// API base URL for the region
    pub fn base_url(self) -> &'static str {
        match self {
            Country::Us => "https://api.affirm.com/api/v1",
            Country::Ca => "https://api.affirm.ca/api/v1",
            Country::Au => "https://au.affirm.com/api/v1",
        }
    }
}

impl FromStr for Country {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "US" => Ok(Country::Us),
            "CA" => Ok(Country::Ca),
            "AU" => Ok(Country::Au),
            other => Err(Error::UnsupportedCountry {
                code: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Merchant Type
// ============================================================================

/// Merchant channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MerchantType {
    ECommerce,
    InStore,
}

impl MerchantType {
    /// Wire name of the merchant type
    pub fn as_str(self) -> &'static str {
        match self {
            MerchantType::ECommerce => "e-commerce",
            MerchantType::InStore => "in-store",
        }
    }
}

impl FromStr for MerchantType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "e-commerce" => Ok(MerchantType::ECommerce),
            "in-store" => Ok(MerchantType::InStore),
            other => Err(Error::InvalidConfigValue {
                field: "merchant_type".to_string(),
                message: format!("'{other}' is not one of: e-commerce, in-store"),
            }),
        }
    }
}

// ============================================================================
// Raw Config
// ============================================================================

/// Configuration as provided by the user
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API user (public key)
    pub user: String,

    /// API password (private key)
    pub password: String,

    /// First day to replicate, `YYYY-MM-DD`
    pub start_date: String,

    /// Last day to replicate, `YYYY-MM-DD`; empty or absent means today
    #[serde(default)]
    pub end_date: Option<String>,

    /// Region code (`US`, `CA`, `AU`)
    pub affirm_country: String,

    /// `e-commerce` or `in-store`
    pub merchant_type: String,

    /// Merchant identifier sent with every request
    #[serde(deserialize_with = "text_or_number")]
    pub merchant_id: String,

    /// Page size sent as `limit`
    #[serde(default, deserialize_with = "optional_count")]
    pub api_page_limit: Option<u32>,

    /// Days re-read by the summary stream on every resumed run
    #[serde(
        default = "default_lookback_window_days",
        deserialize_with = "lookback_days"
    )]
    pub lookback_window_days: u32,
}

fn default_lookback_window_days() -> u32 {
    DEFAULT_LOOKBACK_WINDOW_DAYS
}

// Values substituted from `${...}` tokens always arrive as strings, so
// numeric fields also accept their decimal text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Scalar::deserialize(d).map(Scalar::into_text)
}

/// A non-negative integer or its text; null and blank mean unset
fn optional_count<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<u32>, D::Error> {
    let Some(raw) = Option::<Scalar>::deserialize(d)? else {
        return Ok(None);
    };
    let text = raw.into_text();
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| {
        D::Error::custom(format!("expected a non-negative integer, got \"{text}\""))
    })
}

fn lookback_days<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    Ok(optional_count(d)?.unwrap_or(DEFAULT_LOOKBACK_WINDOW_DAYS))
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("affirm_country", &self.affirm_country)
            .field("merchant_type", &self.merchant_type)
            .field("merchant_id", &self.merchant_id)
            .field("api_page_limit", &self.api_page_limit)
            .field("lookback_window_days", &self.lookback_window_days)
            .finish()
    }
}

impl SourceConfig {
    /// Build from an already-resolved YAML document
    pub fn from_yaml_value(value: serde_yaml::Value) -> Result<Self> {
        serde_yaml::from_value(value)
            .map_err(|e| Error::config(format!("Invalid source configuration: {e}")))
    }

    /// Build from a JSON value
    pub fn from_json_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid source configuration: {e}")))
    }

    /// Validate and convert into typed settings
    pub fn validate(&self) -> Result<ValidatedConfig> {
        if self.user.trim().is_empty() {
            return Err(Error::missing_field("user"));
        }
        if self.password.is_empty() {
            return Err(Error::missing_field("password"));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(Error::missing_field("merchant_id"));
        }

        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = self
            .end_date
            .clone()
            .none_if_empty()
            .map(|s| parse_date("end_date", &s))
            .transpose()?;

        if let Some(0) = self.api_page_limit {
            return Err(Error::InvalidConfigValue {
                field: "api_page_limit".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(ValidatedConfig {
            auth: AuthConfig::Basic {
                username: self.user.clone(),
                password: self.password.clone(),
            },
            start_date,
            end_date,
            country: self.affirm_country.parse()?,
            merchant_type: self.merchant_type.parse()?,
            merchant_id: self.merchant_id.clone(),
            page_limit: self.api_page_limit,
            lookback_window_days: self.lookback_window_days,
        })
    }

    /// JSON Schema describing this configuration
    pub fn json_schema() -> Value {
        let countries: Vec<&str> = Country::ALL.iter().map(|c| c.code()).collect();
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "Affirm Settlement Reports Spec",
            "type": "object",
            "required": [
                "user",
                "password",
                "start_date",
                "affirm_country",
                "merchant_type",
                "merchant_id"
            ],
            "additionalProperties": true,
            "properties": {
                "user": {
                    "type": "string",
                    "title": "User",
                    "description": "Public API key"
                },
                "password": {
                    "type": "string",
                    "title": "Password",
                    "description": "Private API key",
                    "airbyte_secret": true
                },
                "start_date": {
                    "type": "string",
                    "title": "Start Date",
                    "description": "date in the format 2015-01-01. Any data before this date will not be replicated.",
                    "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$",
                    "examples": ["2015-01-01"]
                },
                "end_date": {
                    "type": "string",
                    "title": "End Date",
                    "description": "date in the format 2015-01-01. Any data after this date will not be replicated.",
                    "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$|^$",
                    "examples": ["2015-01-01"]
                },
                "affirm_country": {
                    "type": "string",
                    "title": "Country",
                    "description": "Select country of settlement reports.",
                    "enum": countries
                },
                "merchant_type": {
                    "type": "string",
                    "title": "Merchant Type",
                    "description": "Select e-commerce or in-store",
                    "enum": [MerchantType::ECommerce.as_str(), MerchantType::InStore.as_str()]
                },
                "merchant_id": {
                    "type": "string",
                    "title": "Merchant ID"
                },
                "api_page_limit": {
                    "type": "integer",
                    "title": "API Page Limit",
                    "description": "Number of records requested per page",
                    "minimum": 1
                },
                "lookback_window_days": {
                    "type": "integer",
                    "title": "Lookback Window in Days",
                    "description": "When set, the connector will always re-export data from the past N days",
                    "default": DEFAULT_LOOKBACK_WINDOW_DAYS,
                    "minimum": 0
                }
            }
        })
    }
}

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let well_formed = value.len() == 10
        && value
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(Error::invalid_date(field, value));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::invalid_date(field, value))
}

// ============================================================================
// Validated Config
// ============================================================================

/// Configuration after validation
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Basic auth credentials
    pub auth: AuthConfig,
    /// First day to replicate
    pub start_date: NaiveDate,
    /// Last day to replicate, if bounded
    pub end_date: Option<NaiveDate>,
    /// Settlement region
    pub country: Country,
    /// Merchant channel
    pub merchant_type: MerchantType,
    /// Merchant identifier
    pub merchant_id: String,
    /// Page size
    pub page_limit: Option<u32>,
    /// Lookback window for the summary stream
    pub lookback_window_days: u32,
}

impl ValidatedConfig {
    /// Base URL for the configured region
    pub fn base_url(&self) -> &'static str {
        self.country.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample() -> SourceConfig {
        SourceConfig::from_json_value(json!({
            "user": "pub_key",
            "password": "priv_key",
            "start_date": "2024-01-01",
            "affirm_country": "US",
            "merchant_type": "e-commerce",
            "merchant_id": "M-1",
            "api_page_limit": 50
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_defaults() {
        let config = sample().validate().unwrap();
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(config.end_date.is_none());
        assert_eq!(config.country, Country::Us);
        assert_eq!(config.merchant_type, MerchantType::ECommerce);
        assert_eq!(config.page_limit, Some(50));
        assert_eq!(config.lookback_window_days, DEFAULT_LOOKBACK_WINDOW_DAYS);
        assert_eq!(config.base_url(), "https://api.affirm.com/api/v1");
    }

    #[test]
    fn test_empty_end_date_is_unbounded() {
        let mut raw = sample();
        raw.end_date = Some(String::new());
        assert!(raw.validate().unwrap().end_date.is_none());

        raw.end_date = Some("2024-02-01".to_string());
        assert_eq!(
            raw.validate().unwrap().end_date,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test_case("2024-13-01" ; "month out of range")]
    #[test_case("2024-02-30" ; "day out of range")]
    #[test_case("2024-1-01" ; "unpadded month")]
    #[test_case("01/02/2024" ; "wrong separators")]
    #[test_case("" ; "empty")]
    fn test_malformed_start_date_is_fatal(value: &str) {
        let mut raw = sample();
        raw.start_date = value.to_string();
        let err = raw.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref field, .. } if field == "start_date"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_malformed_end_date_is_fatal() {
        let mut raw = sample();
        raw.end_date = Some("tomorrow".to_string());
        assert!(matches!(
            raw.validate().unwrap_err(),
            Error::InvalidDate { ref field, .. } if field == "end_date"
        ));
    }

    #[test_case("US", "https://api.affirm.com/api/v1")]
    #[test_case("CA", "https://api.affirm.ca/api/v1")]
    #[test_case("AU", "https://au.affirm.com/api/v1")]
    fn test_region_base_urls(code: &str, url: &str) {
        let country: Country = code.parse().unwrap();
        assert_eq!(country.base_url(), url);
        assert_eq!(country.to_string(), code);
    }

    #[test]
    fn test_unsupported_country() {
        let mut raw = sample();
        raw.affirm_country = "FR".to_string();
        assert!(matches!(
            raw.validate().unwrap_err(),
            Error::UnsupportedCountry { ref code } if code == "FR"
        ));
    }

    #[test]
    fn test_invalid_merchant_type() {
        let mut raw = sample();
        raw.merchant_type = "wholesale".to_string();
        assert!(raw.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let mut raw = sample();
        raw.api_page_limit = Some(0);
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_missing_field_from_yaml() {
        let value: serde_yaml::Value = serde_yaml::from_str("user: u\npassword: p\n").unwrap();
        let err = SourceConfig::from_yaml_value(value).unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_numeric_fields_accept_text() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            r"
user: u
password: p
start_date: '2024-01-01'
affirm_country: US
merchant_type: in-store
merchant_id: 12345
api_page_limit: '50'
lookback_window_days: ' 7 '
",
        )
        .unwrap();
        let config = SourceConfig::from_yaml_value(value).unwrap();
        assert_eq!(config.merchant_id, "12345");
        assert_eq!(config.api_page_limit, Some(50));
        assert_eq!(config.lookback_window_days, 7);
    }

    #[test]
    fn test_blank_numeric_text_means_unset() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["api_page_limit"] = json!("");
        value["lookback_window_days"] = json!("");
        let config = SourceConfig::from_json_value(value).unwrap();
        assert_eq!(config.api_page_limit, None);
        assert_eq!(config.lookback_window_days, DEFAULT_LOOKBACK_WINDOW_DAYS);
    }

    #[test_case(json!("fifty") ; "word")]
    #[test_case(json!("-3") ; "negative text")]
    #[test_case(json!(-3) ; "negative number")]
    #[test_case(json!("5000000000") ; "out of range")]
    fn test_bad_page_limit_is_config_error(limit: Value) {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["api_page_limit"] = limit;
        let err = SourceConfig::from_json_value(value).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("non-negative integer"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("priv_key"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_json_schema_lists_regions() {
        let schema = SourceConfig::json_schema();
        assert_eq!(
            schema["properties"]["affirm_country"]["enum"],
            json!(["US", "CA", "AU"])
        );
        assert_eq!(schema["properties"]["lookback_window_days"]["default"], 3);
    }
}
