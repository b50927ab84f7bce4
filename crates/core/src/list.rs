/// Splits a comma-separated parameter into trimmed, non-empty, deduplicated
/// items while keeping the first occurrence order.
#[must_use]
pub fn split_comma_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_owned());
        }
    }

    items
}
