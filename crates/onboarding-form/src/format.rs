//! As-you-type formatters for IBAN and phone inputs.

use crate::checksum::normalize;

/// Uppercases, strips whitespace and regroups in blocks of four.
pub fn format_iban(raw: &str) -> String {
    let compact = normalize(raw);
    let chars: Vec<char> = compact.chars().collect();
    chars
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a Spanish number to `+34 XXX XXX XXX`. Input without digits
/// yields an empty string.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let national = if let Some(rest) = digits.strip_prefix("0034") {
        rest
    } else if digits.len() > 9
        && let Some(rest) = digits.strip_prefix("34")
    {
        rest
    } else {
        digits.as_str()
    };
    if national.is_empty() {
        return String::new();
    }
    let groups: Vec<&str> = national
        .as_bytes()
        .chunks(3)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    format!("+34 {}", groups.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iban_is_grouped_by_four() {
        assert_eq!(
            format_iban("es9121000418450200051332"),
            "ES91 2100 0418 4502 0005 1332"
        );
        assert_eq!(format_iban(""), "");
    }

    #[test]
    fn phone_prefix_variants_normalize_alike() {
        for raw in ["612345678", "+34 612 345 678", "0034612345678", "34-612-345-678"] {
            assert_eq!(format_phone(raw), "+34 612 345 678", "input {raw}");
        }
        assert_eq!(format_phone("abc"), "");
    }
}
