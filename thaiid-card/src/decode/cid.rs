//! Citizen ID check digit and formatting

/// Number of digits in a citizen ID
pub const CID_LEN: usize = 13;

fn digits(cid: &str) -> Option<Vec<u32>> {
    if cid.len() != CID_LEN {
        return None;
    }
    cid.chars().map(|c| c.to_digit(10)).collect()
}

/// Check digit for the first twelve digits
///
/// Weighted sum with weights 13 down to 2, then `(11 - sum mod 11) mod 10`.
pub fn check_digit(first_twelve: &[u32]) -> u32 {
    let sum: u32 = first_twelve
        .iter()
        .take(CID_LEN - 1)
        .enumerate()
        .map(|(i, d)| d * (CID_LEN - i) as u32)
        .sum();
    (11 - sum % 11) % 10
}

/// True when `cid` is 13 digits with a matching check digit
pub fn validate_cid(cid: &str) -> bool {
    match digits(cid) {
        Some(d) => check_digit(&d[..CID_LEN - 1]) == d[CID_LEN - 1],
        None => false,
    }
}

/// Group a citizen ID as `1-4-5-2-1`; anything else is returned unchanged
pub fn format_cid(cid: &str) -> String {
    if digits(cid).is_none() {
        return cid.to_string();
    }
    format!(
        "{}-{}-{}-{}-{}",
        &cid[0..1],
        &cid[1..5],
        &cid[5..10],
        &cid[10..12],
        &cid[12..13]
    )
}
