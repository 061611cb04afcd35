use anyhow::{ensure, Context, Result};

/// Parses a comma-separated list of sizes and inclusive ranges, e.g.
/// `"5-10,20-30"` or `"1,2,100"`, into a sorted, deduplicated list.
pub fn extract_range(range: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for part in range.split(',') {
        let limits: Vec<&str> = part.split('-').collect();
        ensure!(
            !limits.is_empty() && limits.len() <= 2,
            "malformed range component {:?}",
            part
        );
        let lower: usize = limits[0]
            .trim()
            .parse()
            .with_context(|| format!("malformed range component {:?}", part))?;
        if limits.len() == 1 {
            indices.push(lower);
        } else {
            let upper: usize = limits[1]
                .trim()
                .parse()
                .with_context(|| format!("malformed range component {:?}", part))?;
            ensure!(lower <= upper, "descending range {:?}", part);
            indices.extend(lower..=upper);
        }
    }
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}
