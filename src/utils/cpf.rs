//! CPF (Cadastro de Pessoas Físicas) handling: the Brazilian national tax id.
//!
//! A CPF has eleven digits; the last two are mod-11 check digits computed over
//! the preceding nine and ten digits. Input is accepted with or without the
//! usual `000.000.000-00` punctuation and is stored as bare digits.

/// Strips everything but ASCII digits.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Returns the normalized CPF when `raw` carries a checksum-valid value.
pub fn parse(raw: &str) -> Option<String> {
    let digits = normalize(raw);
    if is_valid_digits(&digits) {
        Some(digits)
    } else {
        None
    }
}

pub fn is_valid(raw: &str) -> bool {
    parse(raw).is_some()
}

fn is_valid_digits(digits: &str) -> bool {
    if digits.len() != 11 {
        return false;
    }
    let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    // Repeated sequences pass the arithmetic but are never issued.
    if values.iter().all(|d| *d == values[0]) {
        return false;
    }
    check_digit(&values[..9]) == values[9] && check_digit(&values[..10]) == values[10]
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}
