//! Streaming tokenizer for delimited statement text

/// Pick the field delimiter by counting candidates on the header line only.
///
/// Tab wins any tie as long as it appears at all; a semicolon beats the
/// default comma only when it is strictly more frequent.
pub fn detect_delimiter(text: &str) -> char {
    let header = text.lines().next().unwrap_or("");
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    let tabs = header.matches('\t').count();

    let delimiter = if tabs > 0 && tabs >= commas && tabs >= semicolons {
        '\t'
    } else if semicolons > commas {
        ';'
    } else {
        ','
    };
    tracing::debug!(commas, semicolons, tabs, %delimiter, "delimiter elected");
    delimiter
}

/// Split delimited text into rows of fields.
///
/// Quoted fields may contain the delimiter and newlines; a doubled `"` inside
/// quotes is an escaped quote. `\r` is ignored, `\n` terminates a row, and a
/// pending field or row is still emitted at end of input without a trailing
/// terminator.
pub fn tokenize(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_beats_single_semicolon() {
        assert_eq!(detect_delimiter("a,b,c,d;x\n1,2,3,4"), ',');
    }

    #[test]
    fn tab_wins_with_no_commas() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn tab_wins_a_tie() {
        assert_eq!(detect_delimiter("a\tb,c\td,\n"), '\t');
    }

    #[test]
    fn semicolon_needs_strict_majority() {
        assert_eq!(detect_delimiter("a;b,c\n"), ',');
        assert_eq!(detect_delimiter("a;b;c,\n"), ';');
    }

    #[test]
    fn quoted_fields_and_escaped_quotes() {
        let rows = tokenize("\"a,b\",\"say \"\"hi\"\"\"\nplain,2", ',');
        assert_eq!(
            rows,
            vec![
                vec!["a,b".to_string(), "say \"hi\"".to_string()],
                vec!["plain".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let rows = tokenize("a,b\r\nc,d\r\n", ',');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn final_row_without_newline_is_emitted() {
        let rows = tokenize("a,b\nc,d", ',');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn quoted_newline_stays_in_field() {
        let rows = tokenize("\"line1\nline2\",x", ',');
        assert_eq!(rows, vec![vec!["line1\nline2".to_string(), "x".to_string()]]);
    }
}
