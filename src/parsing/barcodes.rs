use tracing::warn;

/// Parse barcode CSV text with columns: name, sequence
///
/// Blank lines and lines starting with `#` are ignored, as is an optional header
/// row (`name,sequence`). Lines that do not have exactly two non-empty fields are
/// skipped with a warning.
pub fn parse_barcodes_text(text: &str) -> Vec<(String, String)> {
    let mut barcodes = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        if first_data_line {
            first_data_line = false;
            if is_header(&fields) {
                continue;
            }
        }

        // Line numbers in warnings are 1-based for user friendliness
        let line_num = i + 1;

        match fields.as_slice() {
            [name, sequence] if !name.is_empty() && !sequence.is_empty() => {
                barcodes.push(((*name).to_string(), (*sequence).to_string()));
            }
            _ => warn!("Skipping barcode line {line_num}: expected 'name,sequence', found '{line}'"),
        }
    }

    barcodes
}

fn is_header(fields: &[&str]) -> bool {
    match fields {
        [name, sequence] => {
            matches!(name.to_lowercase().as_str(), "name" | "barcode" | "id")
                && matches!(sequence.to_lowercase().as_str(), "sequence" | "seq" | "barcode")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_barcodes_text() {
        let csv = "bc1,ACGT\nbc2,TGCA\n";
        let barcodes = parse_barcodes_text(csv);
        assert_eq!(
            barcodes,
            vec![
                ("bc1".to_string(), "ACGT".to_string()),
                ("bc2".to_string(), "TGCA".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_blank_lines_and_header() {
        let csv = r"# barcodes for run 7

name,sequence
bc1, ACGT
# trailing comment
";
        let barcodes = parse_barcodes_text(csv);
        assert_eq!(barcodes, vec![("bc1".to_string(), "ACGT".to_string())]);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let csv = "bc1,ACGT\nbc2\nbc3,AC,GT\n,TTTT\nbc4,\nbc5,GGGG\n";
        let names: Vec<String> = parse_barcodes_text(csv).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["bc1", "bc5"]);
    }

    #[test]
    fn test_header_only_detected_on_first_line() {
        let csv = "bc1,ACGT\nname,sequence\n";
        assert_eq!(parse_barcodes_text(csv).len(), 2);
    }
}
