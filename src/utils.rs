use std::str::FromStr;

/// Parse a comma-separated query/path parameter into typed values.
/// Returns the raw strings that failed to parse so callers can echo them
/// back verbatim in a validation error.
pub fn parse_value_list<T: FromStr>(raw: &str) -> Result<Vec<T>, Vec<String>> {
    let mut values = Vec::new();
    let mut invalid = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<T>() {
            Ok(value) => values.push(value),
            Err(_) => invalid.push(part.to_string()),
        }
    }
    if invalid.is_empty() {
        Ok(values)
    } else {
        Err(invalid)
    }
}
