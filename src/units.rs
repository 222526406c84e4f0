const UNITS: [(&str, u64); 6] = [
    ("EB", 1_000_000_000_000_000_000),
    ("PB", 1_000_000_000_000_000),
    ("TB", 1_000_000_000_000),
    ("GB", 1_000_000_000),
    ("MB", 1_000_000),
    ("KB", 1_000),
];

/// Human readable size in decimal units, one decimal place.
pub fn format_size(bytes: u64) -> String {
    for (suffix, base) in UNITS {
        if bytes >= base {
            return format!("{:.1} {}", bytes as f64 / base as f64, suffix);
        }
    }
    format!("{:.1} B", bytes as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.0 B")]
    #[case(999, "999.0 B")]
    #[case(1_000, "1.0 KB")]
    #[case(1_500, "1.5 KB")]
    #[case(2_340_000, "2.3 MB")]
    #[case(7_000_000_000, "7.0 GB")]
    #[case(u64::MAX, "18.4 EB")]
    fn test_format_size(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_size(bytes), expected);
    }
}
