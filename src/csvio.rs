//! Minimal quote-aware CSV encode/decode for the flat bookkeeping files.
//! Matches the dialect the historical files were written in: comma-separated,
//! fields quoted when they contain a comma, quote, or line break, embedded
//! quotes doubled, CRLF record terminator.

/// Encodes one record, including the trailing CRLF.
pub fn encode_row(fields: &[&str]) -> String {
    let mut out = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        if needs_quoting(field) {
            out.push('"');
            for ch in field.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
    out
}

fn needs_quoting(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Decodes a whole file into records. Accepts both LF and CRLF terminators;
/// quoted fields may span lines. Trailing empty records are dropped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                push_record(&mut records, &mut record);
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, &mut record);
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, &mut record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>) {
    let taken = std::mem::take(record);
    // A bare newline parses as one empty field; skip those records.
    if taken.len() == 1 && taken[0].is_empty() {
        return;
    }
    records.push(taken);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_round_trip() {
        let row = encode_row(&["2025-01-01", "믿음", "히브리서 11:1"]);
        assert_eq!(row, "2025-01-01,믿음,히브리서 11:1\r\n");
        let parsed = parse(&row);
        assert_eq!(parsed, vec![vec!["2025-01-01", "믿음", "히브리서 11:1"]]);
    }

    #[test]
    fn quoted_fields_round_trip() {
        let guide = "1단계: \"so loved\" 강조,\n2단계: \"the world\" 축소";
        let row = encode_row(&["a", guide, "b"]);
        let parsed = parse(&row);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0][1], guide);
    }

    #[test]
    fn accepts_lf_terminated_input() {
        let parsed = parse("h1,h2\nv1,v2\nv3,v4\n");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2], vec!["v3", "v4"]);
    }

    #[test]
    fn empty_trailing_lines_are_skipped() {
        let parsed = parse("a,b\r\n\r\n");
        assert_eq!(parsed.len(), 1);
    }
}
