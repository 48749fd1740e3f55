/// Resolve environment variables in a string.
/// Supports ${VAR_NAME} syntax; unset variables resolve to an empty string.
pub fn resolve_env(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;

    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
        from = start + value.len();
    }

    result
}
