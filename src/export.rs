use std::path::Path;

use anyhow::{Context, Result};

use crate::types::PostRecord;

/// Column order of the exported CSV
const HEADER: [&str; 6] = ["author", "content", "reactions", "comments", "hashtags", "url"];

/// Write the scraped records to a CSV file, UTF-8, one row per post.
///
/// Comments are joined with `"; "`, hashtags with a space. Callers skip the
/// write entirely when no records were extracted.
pub fn write_csv(path: &Path, records: &[PostRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .context(format!("Failed to create {}", path.display()))?;

    writer.write_record(HEADER)?;
    for record in records {
        let comments = record.comments.join("; ");
        let hashtags = record.hashtags.join(" ");
        writer.write_record([
            record.author.as_str(),
            record.content.as_str(),
            record.reactions.as_str(),
            comments.as_str(),
            hashtags.as_str(),
            record.url.as_str(),
        ])?;
    }
    writer.flush().context("Failed to flush CSV output")?;

    Ok(())
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
