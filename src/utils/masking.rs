//! Partial disclosure of contact data for the identity challenge.

/// `maria.silva@email.com` -> `m*********@email.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            let first = chars.next().map(String::from).unwrap_or_default();
            let hidden = "*".repeat(chars.count().max(1));
            format!("{}{}@{}", first, hidden, domain)
        }
        None => "*".repeat(email.chars().count().max(1)),
    }
}

/// Keeps only the last two digits; punctuation is preserved so the shape of
/// the number stays recognizable.
pub fn mask_phone(phone: &str) -> String {
    let total_digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let keep_from = total_digits.saturating_sub(2);
    let mut seen = 0;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen > keep_from {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}
