// Unit tests for CSV export

use pretty_assertions::assert_eq;

use super::*;
use crate::types::PostRecord;

fn sample_record() -> PostRecord {
    PostRecord {
        author: "Cxyz123".to_string(),
        content: "caption, with a comma #tag".to_string(),
        reactions: "1,234".to_string(),
        comments: vec!["first comment".to_string(), "second".to_string()],
        hashtags: vec!["#tag".to_string(), "#tag".to_string()],
        url: "https://www.instagram.com/p/Cxyz123/".to_string(),
    }
}

#[test]
fn test_write_csv_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    write_csv(&path, &[sample_record(), sample_record()]).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["author", "content", "reactions", "comments", "hashtags", "url"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Cxyz123");
    // Comma-bearing content survives the round trip
    assert_eq!(&rows[0][1], "caption, with a comma #tag");
    assert_eq!(&rows[0][3], "first comment; second");
    assert_eq!(&rows[0][4], "#tag #tag");
}

#[test]
fn test_write_csv_empty_records_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    // The caller skips the write for zero records; the writer itself still
    // produces a well-formed header-only file if asked.
    write_csv(&path, &[]).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), 0);
}
