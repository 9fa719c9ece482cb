//! Check-character validators for Spanish identifiers and IBANs.
//!
//! All functions expect normalized input; use [`normalize`] (uppercase,
//! whitespace removed) before calling them on raw user text.

use once_cell::sync::Lazy;
use regex::Regex;

const CONTROL_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";
const CIF_ORGANIZATION_TYPES: &str = "ABCDEFGHJNPQRSUVW";
const CIF_CONTROL_LETTERS: &[u8; 10] = b"JABCDEFGHI";

static NIF_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8}[A-Z]$").expect("nif regex"));
static NIE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[XYZ][0-9]{7}[A-Z]$").expect("nie regex"));
static CIF_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{7}[A-Z0-9]$").expect("cif regex"));
static IBAN_ES_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ES[0-9]{22}$").expect("iban regex"));

/// Uppercases and strips all whitespace.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Control letter for a DNI/NIF number.
pub fn nif_control_letter(number: u32) -> char {
    char::from(CONTROL_LETTERS[(number % 23) as usize])
}

pub fn is_valid_nif(nif: &str) -> bool {
    if !NIF_SHAPE.is_match(nif) {
        return false;
    }
    let (digits, letter) = nif.split_at(8);
    check_control_letter(digits, letter)
}

/// NIE: leading X/Y/Z maps to 0/1/2, then the NIF rule applies.
pub fn is_valid_nie(nie: &str) -> bool {
    if !NIE_SHAPE.is_match(nie) {
        return false;
    }
    let prefix = match nie.as_bytes()[0] {
        b'X' => '0',
        b'Y' => '1',
        b'Z' => '2',
        _ => return false,
    };
    let mut digits = String::with_capacity(8);
    digits.push(prefix);
    digits.push_str(&nie[1..8]);
    check_control_letter(&digits, &nie[8..])
}

pub fn is_valid_cif(cif: &str) -> bool {
    if !CIF_SHAPE.is_match(cif) {
        return false;
    }
    let bytes = cif.as_bytes();
    if !CIF_ORGANIZATION_TYPES.contains(char::from(bytes[0])) {
        return false;
    }

    let sum: u32 = bytes[1..8]
        .iter()
        .enumerate()
        .map(|(idx, byte)| {
            let digit = u32::from(byte - b'0');
            if idx % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    let control = ((10 - sum % 10) % 10) as usize;
    let last = bytes[8];
    last == b'0' + control as u8 || last == CIF_CONTROL_LETTERS[control]
}

/// Accepts any of NIF, NIE or CIF. NIE is tried before CIF since the CIF
/// shape also matches X/Y/Z-prefixed values.
pub fn is_valid_national_id(value: &str) -> bool {
    let value = normalize(value);
    if NIF_SHAPE.is_match(&value) {
        is_valid_nif(&value)
    } else if NIE_SHAPE.is_match(&value) {
        is_valid_nie(&value)
    } else if CIF_SHAPE.is_match(&value) {
        is_valid_cif(&value)
    } else {
        false
    }
}

/// Spanish IBAN with ISO 13616 mod-97 check.
pub fn is_valid_iban(value: &str) -> bool {
    let iban = normalize(value);
    if !IBAN_ES_SHAPE.is_match(&iban) {
        return false;
    }
    let (head, tail) = iban.split_at(4);
    let mut numeric = String::with_capacity(iban.len() * 2);
    for ch in tail.chars().chain(head.chars()) {
        if ch.is_ascii_uppercase() {
            numeric.push_str(&(u32::from(ch) - 55).to_string());
        } else {
            numeric.push(ch);
        }
    }
    mod97(&numeric) == Some(1)
}

/// Streaming remainder of a decimal string by 97. `None` on non-digits.
pub fn mod97(numeric: &str) -> Option<u32> {
    numeric.chars().try_fold(0u32, |remainder, ch| {
        ch.to_digit(10).map(|digit| (remainder * 10 + digit) % 97)
    })
}

fn check_control_letter(digits: &str, letter: &str) -> bool {
    match digits.parse::<u32>() {
        Ok(number) => letter.chars().next() == Some(nif_control_letter(number)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nif_control_letter_uses_mod_23_table() {
        assert_eq!(12345678 % 23, 14);
        assert_eq!(nif_control_letter(12345678), 'Z');
        assert!(is_valid_nif("12345678Z"));
        assert!(!is_valid_nif("12345678A"));
        assert!(!is_valid_nif("1234567Z"));
    }

    #[test]
    fn nie_maps_prefix_letter() {
        assert!(is_valid_nie("X1234567L"));
        assert!(is_valid_nie("Y0000000Z"));
        assert!(!is_valid_nie("X1234567A"));
    }

    #[test]
    fn cif_accepts_digit_or_letter_control() {
        assert!(is_valid_cif("A58818501"));
        assert!(is_valid_cif("Q2826000H"));
        assert!(!is_valid_cif("A58818502"));
        assert!(!is_valid_cif("I58818501"));
    }

    #[test]
    fn national_id_normalizes_before_dispatch() {
        assert!(is_valid_national_id(" 12345678z "));
        assert!(is_valid_national_id("x 1234567 l"));
        assert!(is_valid_national_id("a58818501"));
        assert!(!is_valid_national_id("not-an-id"));
    }

    #[test]
    fn mod97_rejects_non_digits() {
        assert_eq!(mod97("97"), Some(0));
        assert_eq!(mod97("98"), Some(1));
        assert_eq!(mod97("9a"), None);
    }

    #[test]
    fn iban_reference_value_is_valid() {
        assert!(is_valid_iban("ES9121000418450200051332"));
        assert!(is_valid_iban("es91 2100 0418 4502 0005 1332"));
        assert!(!is_valid_iban("DE89370400440532013000"));
    }
}
