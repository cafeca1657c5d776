use crate::CoreError;

/// Floating point type used throughout the workspace
pub type Real = f64;

/// Parse a time-directory name (`0`, `100`, `0.005`, `1e-3`) into its value.
pub fn parse_time_label(label: &str) -> Result<Real, CoreError> {
    match label.trim().parse::<Real>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CoreError::InvalidTimeLabel {
            label: label.to_string(),
        }),
    }
}

/// Euclidean norm of a vector-valued sample.
pub fn magnitude(components: &[Real]) -> Real {
    components.iter().map(|c| c * c).sum::<Real>().sqrt()
}

/// Label that always carries a decimal point (`3.0`, `2.5`).
///
/// Used for wind speeds in archive keys and run identifiers.
pub fn decimal_label(v: Real) -> String {
    format!("{v:?}")
}

/// Shortest label for a value (`0`, `90`, `22.5`).
///
/// Used for wind directions in archive keys and run identifiers.
pub fn compact_label(v: Real) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_labels_parse_numerically() {
        assert_eq!(parse_time_label("0").unwrap(), 0.0);
        assert_eq!(parse_time_label("0.005").unwrap(), 0.005);
        assert_eq!(parse_time_label("1e-3").unwrap(), 0.001);
        assert!(parse_time_label("constant").is_err());
        assert!(parse_time_label("processor0").is_err());
        assert!(parse_time_label("nan").is_err());
    }

    #[test]
    fn labels_match_archive_convention() {
        assert_eq!(decimal_label(3.0), "3.0");
        assert_eq!(decimal_label(2.5), "2.5");
        assert_eq!(compact_label(0.0), "0");
        assert_eq!(compact_label(90.0), "90");
        assert_eq!(compact_label(22.5), "22.5");
    }

    #[test]
    fn magnitude_of_vector() {
        assert!((magnitude(&[3.0, 4.0, 0.0]) - 5.0).abs() < 1e-12);
        assert_eq!(magnitude(&[]), 0.0);
    }

    proptest::proptest! {
        #[test]
        fn time_label_round_trips(v in -1.0e6f64..1.0e6) {
            proptest::prop_assert_eq!(parse_time_label(&compact_label(v)).unwrap(), v);
        }
    }
}
