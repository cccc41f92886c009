//! Parser for inbound `Key: Value` birthday messages.

use std::collections::HashMap;

/// Parse a raw message body into a key/value map.
///
/// Each line is split on its first colon; both sides are trimmed and the key
/// is lowercased. Lines with no colon, or where either side trims to empty,
/// are dropped silently. A later duplicate key overwrites an earlier one.
///
/// No required-key validation happens here; an incomplete (or empty) map is a
/// valid result.
pub fn parse_fields(raw: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        fields.insert(key.to_lowercase(), value.to_string());
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_well_formed_lines() {
        let fields = parse_fields("Name: Ada\nPhone: 08012345678\nBirthday: 05-03");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("name").map(String::as_str), Some("Ada"));
        assert_eq!(fields.get("phone").map(String::as_str), Some("08012345678"));
        assert_eq!(fields.get("birthday").map(String::as_str), Some("05-03"));
    }

    #[test]
    fn test_keys_lowercased_values_trimmed() {
        let fields = parse_fields("NAME :   Ada Lovelace  ");
        assert_eq!(
            fields.get("name").map(String::as_str),
            Some("Ada Lovelace")
        );
    }

    #[test]
    fn test_splits_on_first_colon_only() {
        let fields = parse_fields("note: call at 10:30");
        assert_eq!(fields.get("note").map(String::as_str), Some("call at 10:30"));
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let fields = parse_fields("just some text\n: no key\nname:\n   \nphone: 080");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("phone").map(String::as_str), Some("080"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let fields = parse_fields("name: Ada\nName: Grace");
        assert_eq!(fields.get("name").map(String::as_str), Some("Grace"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_fields("").is_empty());
    }
}
