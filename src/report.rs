//! Census report rendering

use crate::census::Census;
use anyhow::{Context, Result};
use std::io::Write;

/// Write the per-region table and the sorted totals to `out`
pub fn write_report<W: Write>(census: &Census, out: &mut W) -> Result<()> {
    let per_region = serde_json::to_string_pretty(census.per_region())
        .context("Failed to serialize per-region counts")?;

    writeln!(out, "Resources by region")?;
    writeln!(out, "{}", per_region)?;
    writeln!(out)?;
    writeln!(out, "Resource totals across all regions")?;
    for (label, count) in census.totals() {
        writeln!(out, "{} : {}", label, count)?;
    }
    writeln!(out)?;
    writeln!(out, "Total resources: {}", census.grand_total())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(census: &Census) -> String {
        let mut buf = Vec::new();
        write_report(census, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_layout() {
        let mut census = Census::new();
        census.record_region("us-east-1", "instances", 2);
        census.record_total("Volumes", 1);
        census.record_total("Instances", 2);

        let text = render(&census);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Resources by region");
        assert!(text.contains("\"us-east-1\": {"));
        assert!(text.contains("\"instances\": 2"));

        let totals_at = lines
            .iter()
            .position(|l| *l == "Resource totals across all regions")
            .unwrap();
        assert_eq!(lines[totals_at + 1], "Instances : 2");
        assert_eq!(lines[totals_at + 2], "Volumes : 1");
        assert_eq!(lines.last(), Some(&"Total resources: 3"));
    }

    #[test]
    fn test_empty_report() {
        let text = render(&Census::new());
        assert!(text.contains("{}"));
        assert!(text.ends_with("Total resources: 0\n"));
    }
}
