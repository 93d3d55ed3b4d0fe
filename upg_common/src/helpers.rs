/// Returns `None` for missing or whitespace-only values, and the trimmed value otherwise.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
