use chrono::{Local, TimeZone, Utc};
use derive_more::Display;
use ethers::{
    types::{Address, U256},
    utils::{format_ether, parse_units, ConversionError, ParseUnits},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ledger::TransferEntry;

/// Same shape as `Date.prototype.toLocaleString()` in en-US
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Transfer form as typed by the user. Nothing here is validated until submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    pub address_to: String,
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum FormField {
    #[display(fmt = "addressTo")]
    AddressTo,
    #[display(fmt = "amount")]
    Amount,
    #[display(fmt = "keyword")]
    Keyword,
    #[display(fmt = "message")]
    Message,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown form field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "addressTo" => Ok(FormField::AddressTo),
            "amount" => Ok(FormField::Amount),
            "keyword" => Ok(FormField::Keyword),
            "message" => Ok(FormField::Message),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl FormInput {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::AddressTo => &mut self.address_to,
            FormField::Amount => &mut self.amount,
            FormField::Keyword => &mut self.keyword,
            FormField::Message => &mut self.message,
        };
        *slot = value.into();
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::AddressTo => &self.address_to,
            FormField::Amount => &self.amount,
            FormField::Keyword => &self.keyword,
            FormField::Message => &self.message,
        }
    }
}

/// One recorded transfer, as shown to the user
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub address_to: Address,
    pub address_from: Address,
    pub timestamp: String,
    pub message: String,
    pub keyword: String,
    pub amount: f64,
}

impl From<TransferEntry> for TransactionRecord {
    fn from(entry: TransferEntry) -> Self {
        Self {
            address_to: entry.receiver,
            address_from: entry.sender,
            timestamp: format_timestamp(entry.timestamp),
            message: entry.message,
            keyword: entry.keyword,
            amount: from_base_units(entry.amount),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount `{0}` is negative")]
    Negative(String),

    #[error(transparent)]
    Parse(#[from] ConversionError),
}

/// Parses a decimal ether amount into wei
pub fn to_base_units(amount: &str) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    match parse_units(trimmed, "ether")? {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => Err(AmountError::Negative(trimmed.to_string())),
    }
}

/// Wei to ether, lossy above f64 precision
pub fn from_base_units(amount: U256) -> f64 {
    format_ether(amount).parse().unwrap_or_default()
}

/// Renders on-chain seconds in local time. Out of range values render empty.
pub fn format_timestamp(seconds: U256) -> String {
    if seconds > U256::from(u64::MAX) {
        return String::new();
    }
    let millis = i64::try_from(seconds.as_u64()).ok().and_then(|s| s.checked_mul(1000));
    match millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        Some(time) => time.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: U256) -> TransferEntry {
        TransferEntry {
            sender: Address::repeat_byte(0x0a),
            receiver: Address::repeat_byte(0x0b),
            amount,
            message: "hi".to_string(),
            timestamp: U256::from(1_700_000_000u64),
            keyword: "k".to_string(),
        }
    }

    #[test]
    fn one_ether_entry_maps_to_record() {
        let record = TransactionRecord::from(entry(U256::exp10(18)));

        assert_eq!(record.address_from, Address::repeat_byte(0x0a));
        assert_eq!(record.address_to, Address::repeat_byte(0x0b));
        assert_eq!(record.amount, 1.0);
        assert_eq!(record.message, "hi");
        assert_eq!(record.keyword, "k");

        let expected = Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .unwrap()
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(record.timestamp, expected);
        assert!(record.timestamp.contains("2023"));
    }

    #[test]
    fn base_units_round_trip_within_tolerance() {
        for amount in ["0.0001", "0.5", "1", "2.75", "1234.000000001"] {
            let wei = to_base_units(amount).unwrap();
            let back = from_base_units(wei);
            let original: f64 = amount.parse().unwrap();
            assert!((back - original).abs() <= original * f64::EPSILON * 4.0, "{amount}");
        }
    }

    #[test]
    fn amount_parsing_keeps_eighteen_decimals() {
        assert_eq!(to_base_units(" 0.000000000000000001 ").unwrap(), U256::one());
        assert_eq!(to_base_units("1.5").unwrap(), U256::from(15u64) * U256::exp10(17));
    }

    #[test]
    fn malformed_amount_is_rejected() {
        assert!(matches!(to_base_units(""), Err(AmountError::Empty)));
        assert!(matches!(to_base_units("   "), Err(AmountError::Empty)));
        assert!(matches!(to_base_units("abc"), Err(AmountError::Parse(_))));
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(matches!(to_base_units("-1"), Err(AmountError::Negative(_))));
        assert!(matches!(to_base_units(" -0.5 "), Err(AmountError::Negative(a)) if a == "-0.5"));
    }

    #[test]
    fn timestamp_beyond_u64_renders_empty() {
        let wrapped = U256::from(u64::MAX) + U256::from(1_700_000_001u64);
        assert_eq!(format_timestamp(wrapped), "");
        assert_eq!(format_timestamp(U256::MAX), "");
        assert!(!format_timestamp(U256::from(1_700_000_000u64)).is_empty());
    }

    #[test]
    fn form_fields_parse_from_ui_names() {
        for field in [FormField::AddressTo, FormField::Amount, FormField::Keyword, FormField::Message]
        {
            assert_eq!(field.to_string().parse::<FormField>().unwrap(), field);
        }
        assert!("recipient".parse::<FormField>().is_err());
    }

    #[test]
    fn setting_a_field_leaves_the_others() {
        let mut form = FormInput { amount: "0.1".to_string(), ..Default::default() };
        form.set(FormField::Message, "thanks");

        assert_eq!(form.get(FormField::Message), "thanks");
        assert_eq!(form.get(FormField::Amount), "0.1");
        assert_eq!(form.get(FormField::AddressTo), "");
    }

    #[test]
    fn form_serializes_with_ui_names() {
        let form = FormInput { address_to: "0xB".to_string(), ..Default::default() };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["addressTo"], "0xB");
    }
}
