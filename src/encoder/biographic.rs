//! Type-2 biographic field normalisation (spec §3, §4.2), re-architected
//! from `original_source/.../eft_generator.py::format_name`/`get_initials`
//! and the inline validation in `generate_eft`.

/// Formats a raw `"Surname, First[, Middle...]"` string to the canonical
/// `"Surname, First Middle"` shape, enforcing the 30-character eForms limit
/// by first reducing a spelled-out middle name to its initial, then
/// truncating outright if it's still too long.
pub fn format_name(raw: &str) -> String {
    let parts: Vec<&str> = raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    if parts.len() == 1 {
        return truncate_chars(parts[0], 30);
    }

    let surname = parts[0];
    let first = parts[1];
    let middle = if parts.len() > 2 {
        parts[2..].join(" ")
    } else {
        "NMN".to_string()
    };

    let full_name = format!("{surname}, {first} {middle}");
    if full_name.chars().count() <= 30 {
        return full_name;
    }

    if middle != "NMN" && !middle.is_empty() {
        if let Some(middle_initial) = middle.chars().next() {
            let short_name = format!("{surname}, {first} {middle_initial}");
            if short_name.chars().count() <= 30 {
                return short_name;
            }
        }
    }

    truncate_chars(&full_name, 30)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Derives TCN initials from a name already in `format_name`'s canonical
/// shape. Surname initial + first-name initial, plus a middle initial
/// unless the middle name is the `"NMN"` placeholder. Falls back to
/// `"XXX"` if the name has no comma or yields no alphanumeric initials.
pub fn get_initials(formatted_name: &str) -> String {
    let Some((surname_part, given_part)) = formatted_name.split_once(',') else {
        return "XXX".to_string();
    };
    let surname = surname_part.trim();
    let given: Vec<&str> = given_part.trim().split_whitespace().collect();

    let mut initials = String::new();
    if let Some(c) = surname.chars().next() {
        initials.push(c);
    }
    if let Some(first) = given.first() {
        if let Some(c) = first.chars().next() {
            initials.push(c);
        }
        if given.len() > 1 && given[1] != "NMN" {
            if let Some(c) = given[1].chars().next() {
                initials.push(c);
            }
        }
    }

    let initials: String = initials.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_uppercase();
    if initials.is_empty() {
        return "XXX".to_string();
    }
    initials.chars().take(5).collect()
}

/// Strips dashes from a raw DOB; the result must already be `YYYYMMDD` or
/// empty (no further validation is attempted here).
pub fn normalize_dob(raw: &str) -> String {
    raw.chars().filter(|&c| c != '-').collect()
}

/// Keeps only digits; returns `""` unless exactly 9 remain, or when
/// `bypass_ssn` is asserted (in which case the field is always empty).
pub fn normalize_ssn(raw: &str, bypass_ssn: bool) -> String {
    if bypass_ssn {
        return String::new();
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 9 {
        digits
    } else {
        String::new()
    }
}

/// Height must parse as an integer in `[400, 711]` (feet-inches encoded,
/// e.g. `507` = 5'07"); anything else normalises to `"000"`.
pub fn normalize_height(raw: &str) -> String {
    match raw.trim().parse::<i32>() {
        Ok(value) if (400..=711).contains(&value) => value.to_string(),
        _ => "000".to_string(),
    }
}

/// Weight must parse as an integer in `[0, 499]` pounds; anything else
/// normalises to `"000"`.
pub fn normalize_weight(raw: &str) -> String {
    match raw.trim().parse::<i32>() {
        Ok(value) if (0..=499).contains(&value) => value.to_string(),
        _ => "000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part_name_is_truncated_to_30() {
        assert_eq!(format_name("Doe"), "Doe");
        let long = "A".repeat(40);
        assert_eq!(format_name(&long).chars().count(), 30);
    }

    #[test]
    fn two_part_name_gets_nmn_middle() {
        assert_eq!(format_name("Doe, Jane"), "Doe, Jane NMN");
    }

    #[test]
    fn long_middle_name_reduces_to_initial() {
        let formatted = format_name("Smith, John, Alexander Bartholomew");
        assert_eq!(formatted, "Smith, John A");
    }

    #[test]
    fn still_too_long_after_initial_is_truncated() {
        let formatted = format_name("Worthington-Smythe-Fairweather, Bartholomew, Zebedee");
        assert_eq!(formatted.chars().count(), 30);
    }

    #[test]
    fn get_initials_uses_surname_first_middle() {
        assert_eq!(get_initials("Doe, Jane Marie"), "DJM");
        assert_eq!(get_initials("Doe, Jane NMN"), "DJ");
    }

    #[test]
    fn get_initials_falls_back_to_xxx() {
        assert_eq!(get_initials("no comma here"), "XXX");
        assert_eq!(get_initials(""), "XXX");
    }

    #[test]
    fn dob_strips_dashes() {
        assert_eq!(normalize_dob("1990-01-01"), "19900101");
    }

    #[test]
    fn ssn_requires_exactly_nine_digits() {
        assert_eq!(normalize_ssn("123-45-6789", false), "123456789");
        assert_eq!(normalize_ssn("12345", false), "");
        assert_eq!(normalize_ssn("123456789", true), "");
    }

    #[test]
    fn height_out_of_range_falls_back() {
        assert_eq!(normalize_height("507"), "507");
        assert_eq!(normalize_height("399"), "000");
        assert_eq!(normalize_height("712"), "000");
        assert_eq!(normalize_height("not a number"), "000");
    }

    #[test]
    fn weight_out_of_range_falls_back() {
        assert_eq!(normalize_weight("180"), "180");
        assert_eq!(normalize_weight("500"), "000");
        assert_eq!(normalize_weight("-5"), "000");
    }
}
