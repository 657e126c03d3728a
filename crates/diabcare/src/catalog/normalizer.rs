/// Canonical form used when comparing category names.
pub(crate) fn normalize_category(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}
