//! Day-key normalization for document and bank dates

use chrono::NaiveDate;

/// Day key (`YYYY-MM-DD`) for a document: the document date, falling back to
/// its creation timestamp, sliced to ten characters.
pub fn day_key_from_doc_date(date: Option<&str>, fallback_iso: &str) -> String {
    let raw = date.filter(|d| !d.is_empty()).unwrap_or(fallback_iso);
    raw.chars().take(10).collect()
}

/// Normalize a raw bank-statement date to a `YYYY-MM-DD` day key.
///
/// ISO-prefixed strings are sliced to ten characters; `D/M/Y` and `D-M-Y`
/// styles are zero-padded with two-digit years expanded as `20yy`; anything
/// else goes through a small set of fallback formats. Returns `None` when the
/// string cannot be resolved.
pub fn day_key_from_bank_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if is_iso_prefixed(s) {
        return Some(s.chars().take(10).collect());
    }

    if let Some(key) = day_month_year_key(s) {
        return Some(key);
    }

    parse_fallback(s).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Signed day difference `a - b` between two day keys; `None` when either key
/// is missing or does not parse as a real calendar date.
pub fn day_diff(a: Option<&str>, b: Option<&str>) -> Option<i64> {
    let da = NaiveDate::parse_from_str(a?, "%Y-%m-%d").ok()?;
    let db = NaiveDate::parse_from_str(b?, "%Y-%m-%d").ok()?;
    Some((da - db).num_days())
}

fn is_iso_prefixed(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

/// Match a leading `D/M/Y` or `D-M-Y` pattern and rebuild it as a day key.
fn day_month_year_key(s: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    let mut current = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if (c == '/' || c == '-') && !current.is_empty() && parts.len() < 2 {
            parts.push(std::mem::take(&mut current));
        } else {
            break;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.len() != 3 {
        return None;
    }

    let (dd, mm, yy) = (&parts[0], &parts[1], &parts[2]);
    if dd.len() > 2 || mm.len() > 2 || !(yy.len() == 2 || yy.len() == 4) {
        return None;
    }
    let year = if yy.len() == 2 {
        format!("20{yy}")
    } else {
        yy.clone()
    };
    Some(format!("{year}-{mm:0>2}-{dd:0>2}"))
}

/// Generic fallback parse for the formats banks commonly emit outside the
/// ISO and `D/M/Y` families.
fn parse_fallback(s: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%Y/%m/%d"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_prefix_is_sliced() {
        assert_eq!(
            day_key_from_bank_date("2024-03-01T10:00:00Z").as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            day_key_from_bank_date("2024-03-01").as_deref(),
            Some("2024-03-01")
        );
    }

    #[test]
    fn day_month_year_is_padded() {
        assert_eq!(
            day_key_from_bank_date("3/4/2024").as_deref(),
            Some("2024-04-03")
        );
        assert_eq!(
            day_key_from_bank_date("03-04-24").as_deref(),
            Some("2024-04-03")
        );
    }

    #[test]
    fn fallback_formats_parse() {
        assert_eq!(
            day_key_from_bank_date("1 Mar 2024").as_deref(),
            Some("2024-03-01")
        );
    }

    #[test]
    fn unresolvable_dates_are_none() {
        assert_eq!(day_key_from_bank_date(""), None);
        assert_eq!(day_key_from_bank_date("yesterday"), None);
    }

    #[test]
    fn doc_day_key_falls_back_to_created_at() {
        assert_eq!(
            day_key_from_doc_date(None, "2024-05-05T09:00:00Z"),
            "2024-05-05"
        );
        assert_eq!(
            day_key_from_doc_date(Some("2024-05-01"), "2024-05-05T09:00:00Z"),
            "2024-05-01"
        );
    }

    #[test]
    fn day_diff_is_signed() {
        assert_eq!(day_diff(Some("2024-03-05"), Some("2024-03-01")), Some(4));
        assert_eq!(day_diff(Some("2024-03-01"), Some("2024-03-05")), Some(-4));
        assert_eq!(day_diff(Some("2024-02-31"), Some("2024-03-01")), None);
        assert_eq!(day_diff(None, Some("2024-03-01")), None);
    }
}
