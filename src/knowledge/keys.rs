/// Normalize text into a synonym index key.
///
/// Lower-cases, drops apostrophes and periods ("st. john's" → "st johns"),
/// turns every other non-alphanumeric char into a space, and collapses runs of
/// whitespace. Both the index and incoming tokens go through this.
pub fn normalize_key(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            spaced.extend(ch.to_lowercase());
        } else if matches!(ch, '\'' | '\u{2019}' | '.') {
            continue;
        } else {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
