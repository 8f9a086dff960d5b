// Small request-field helpers shared by handlers

/// Trim a field, rejecting empty results when the field is required
pub fn trim_and_validate_field(value: &str, required: bool) -> Result<String, ()> {
    let trimmed = value.trim();
    if required && trimmed.is_empty() {
        return Err(());
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field, mapping empty strings to None
pub fn trim_optional_field(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_validate_field() {
        assert_eq!(trim_and_validate_field("  alice  ", true), Ok("alice".to_string()));
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false), Ok(String::new()));
    }

    #[test]
    fn test_trim_optional_field() {
        assert_eq!(
            trim_optional_field(Some(&" a@x.io ".to_string())),
            Some("a@x.io".to_string())
        );
        assert_eq!(trim_optional_field(Some(&"   ".to_string())), None);
        assert_eq!(trim_optional_field(None), None);
    }
}
