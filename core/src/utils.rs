//! Utility functions and types.

/// Redact a sensitive string for debug output.
///
/// Values shorter than 12 characters are hidden entirely; longer values
/// keep the first and last three characters so different secrets can
/// still be told apart without leaking anything useful.
pub fn redact(value: &str) -> String {
    let length = value.len();
    if length == 0 {
        "EMPTY".to_string()
    } else if length < 12 {
        "***".to_string()
    } else {
        format!("{}***{}", &value[..3], &value[length - 3..])
    }
}
