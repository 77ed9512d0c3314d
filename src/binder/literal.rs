/// SQL literal rendering for bound parameters
///
/// Text is single-quoted with embedded quotes doubled and nothing else
/// escaped. Blobs become `x'..'` with lowercase hex.

use crate::types::Param;

pub fn format_literal(value: &Param) -> String {
    match value {
        Param::Null => "NULL".to_string(),
        Param::Boolean(true) => "true".to_string(),
        Param::Boolean(false) => "false".to_string(),
        Param::Integer(i) => i.to_string(),
        Param::Real(r) => format_real(*r),
        Param::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Param::Blob(b) => format!("x'{}'", hex::encode(b)),
    }
}

fn format_real(r: f64) -> String {
    if r.is_nan() {
        // sqlite stores NaN as NULL anyway
        "NULL".to_string()
    } else if r == f64::INFINITY {
        "9e999".to_string()
    } else if r == f64::NEG_INFINITY {
        "-9e999".to_string()
    } else {
        r.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scalars() {
        assert_eq!(format_literal(&Param::Null), "NULL");
        assert_eq!(format_literal(&Param::Boolean(true)), "true");
        assert_eq!(format_literal(&Param::Boolean(false)), "false");
        assert_eq!(format_literal(&Param::Integer(-42)), "-42");
        assert_eq!(format_literal(&Param::Real(1.25)), "1.25");
        assert_eq!(format_literal(&Param::Real(0.1)), "0.1");
    }

    #[test]
    fn test_non_finite_reals() {
        assert_eq!(format_literal(&Param::Real(f64::NAN)), "NULL");
        assert_eq!(format_literal(&Param::Real(f64::INFINITY)), "9e999");
        assert_eq!(format_literal(&Param::Real(f64::NEG_INFINITY)), "-9e999");
    }

    #[test]
    fn test_text_quotes_are_doubled() {
        assert_eq!(format_literal(&Param::Text("it's".into())), "'it''s'");
        assert_eq!(format_literal(&Param::Text("''".into())), "''''''");
        assert_eq!(format_literal(&Param::Text("a\\nb".into())), "'a\\nb'");
    }

    #[test]
    fn test_blob() {
        assert_eq!(format_literal(&Param::Blob(vec![1, 2, 3])), "x'010203'");
        assert_eq!(format_literal(&Param::Blob(vec![0xAB, 0xff])), "x'abff'");
        assert_eq!(format_literal(&Param::Blob(Vec::new())), "x''");
    }

    proptest! {
        #[test]
        fn prop_text_round_trips_through_quote_doubling(s in ".*") {
            let literal = format_literal(&Param::Text(s.clone()));
            prop_assert!(literal.starts_with('\'') && literal.ends_with('\''));
            let inner = &literal[1..literal.len() - 1];
            prop_assert_eq!(inner.replace("''", "'"), s);
        }

        #[test]
        fn prop_blob_is_lowercase_hex(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let literal = format_literal(&Param::Blob(bytes.clone()));
            prop_assert_eq!(literal.len(), 3 + bytes.len() * 2);
            prop_assert!(literal[2..literal.len() - 1]
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }

        #[test]
        fn prop_reals_parse_back(r in proptest::num::f64::NORMAL) {
            let literal = format_literal(&Param::Real(r));
            prop_assert_eq!(literal.parse::<f64>().unwrap(), r);
        }
    }
}
