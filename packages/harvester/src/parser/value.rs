//! Registry value cells.

use crate::catalog::coap_code;
use crate::types::RegistryValue;

/// Parse an integer cell: decimal or `0x` hex.
fn parse_integer(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}

/// Parse a `class.detail` code into its integer value.
fn parse_dotted(text: &str) -> Option<u64> {
    let (class, detail) = text.trim().split_once('.')?;
    let class: u64 = class.parse().ok()?;
    let detail: u64 = detail.parse().ok()?;
    if class > 7 || detail > 31 {
        return None;
    }
    Some(coap_code(class, detail))
}

fn parse_with(text: &str, single: fn(&str) -> Option<u64>) -> Option<RegistryValue> {
    let text = text.trim();
    if let Some(v) = single(text) {
        return Some(RegistryValue::Single(v));
    }
    let (start, end) = text.split_once('-')?;
    let (start, end) = (single(start)?, single(end)?);
    (start <= end).then_some(RegistryValue::Range(start, end))
}

/// Parse a value cell: `37`, `0x25` or a range such as `24-32767`.
///
/// # Examples
/// ```
/// use iana_harvester::parser::parse_value;
/// use iana_harvester::types::RegistryValue;
///
/// assert_eq!(parse_value("37"), Some(RegistryValue::Single(37)));
/// assert_eq!(parse_value("0x25"), Some(RegistryValue::Single(37)));
/// assert_eq!(parse_value("24-32767"), Some(RegistryValue::Range(24, 32767)));
/// assert_eq!(parse_value("TBD"), None);
/// ```
#[must_use]
pub fn parse_value(text: &str) -> Option<RegistryValue> {
    parse_with(text, parse_integer)
}

/// Parse a CoAP code cell: `2.05` or a range such as `0.08-0.31`.
#[must_use]
pub fn parse_code(text: &str) -> Option<RegistryValue> {
    parse_with(text, parse_dotted)
}

/// Name token for a CoAP code value, `2.05` -> `2_05`.
#[must_use]
pub fn code_token(value: u64) -> String {
    format!("{}_{:02}", (value >> 5) & 0x07, value & 0x1F)
}

/// Published form of a CoAP code value, `69` -> `2.05`.
#[must_use]
pub fn code_label(value: u64) -> String {
    format!("{}.{:02}", (value >> 5) & 0x07, value & 0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(" 1 "), Some(RegistryValue::Single(1)));
        assert_eq!(
            parse_value("18446744073709551615"),
            Some(RegistryValue::Single(u64::MAX))
        );
        assert_eq!(parse_value("65000-65535"), Some(RegistryValue::Range(65000, 65535)));
        assert_eq!(parse_value("10-5"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("2.05"), None);
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("0.01"), Some(RegistryValue::Single(1)));
        assert_eq!(parse_code("2.05"), Some(RegistryValue::Single(69)));
        assert_eq!(parse_code("7.01"), Some(RegistryValue::Single(225)));
        assert_eq!(parse_code("0.08-0.31"), Some(RegistryValue::Range(8, 31)));
        assert_eq!(parse_code("8.01"), None);
        assert_eq!(parse_code("2.32"), None);
        assert_eq!(parse_code("205"), None);
    }

    #[test]
    fn test_code_token_and_label() {
        assert_eq!(code_token(69), "2_05");
        assert_eq!(code_label(132), "4.04");
        assert_eq!(code_label(0), "0.00");
    }
}
