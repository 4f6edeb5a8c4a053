//! Reading and writing the delimited block log.
//!
//! Each record is written as
//!
//! ```text
//! ===YK_START===
//! id: <value>
//! name: <value>
//! unit: <value>
//! message: <value>
//! recordedAt: <value>
//! ===YK_END===
//! ```
//!
//! and appended to the log, so the oldest record comes first. Older
//! logs may also contain one JSON record per line between blocks. The
//! JSON array file is the canonical format; this module only exists to
//! import and export logs.

use std::collections::{HashMap, HashSet};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::BackendError;
use crate::record::FeedbackRecord;
use crate::store::Store;

pub const START_MARKER: &str = "===YK_START===";
pub const END_MARKER: &str = "===YK_END===";

/// The result of parsing a log.
#[derive(Debug, Default)]
pub struct Parsed {
    /// The records found, newest first.
    pub records: Vec<FeedbackRecord>,

    /// How many blocks or lines couldn't be turned into records.
    pub skipped: usize,
}

/// Parses a whole log, skipping anything that isn't a complete record.
pub fn parse(text: &str) -> Parsed {
    let mut parsed = Parsed::default();
    let mut rest = text;

    loop {
        match rest.find(START_MARKER) {
            Some(start) => {
                parse_legacy_lines(&rest[..start], &mut parsed);

                let body = &rest[start + START_MARKER.len()..];

                // a block is cut short by the next start marker if its
                // end marker is missing
                let end = body.find(END_MARKER);
                let next_start = body.find(START_MARKER);

                match (end, next_start) {
                    (Some(end), Some(next)) if next < end => {
                        parsed.skipped += 1;
                        rest = &body[next..];
                    }
                    (Some(end), _) => {
                        match parse_block(&body[..end]) {
                            Some(record) => parsed.records.push(record),
                            None => parsed.skipped += 1,
                        }
                        rest = &body[end + END_MARKER.len()..];
                    }
                    (None, Some(next)) => {
                        parsed.skipped += 1;
                        rest = &body[next..];
                    }
                    (None, None) => {
                        parsed.skipped += 1;
                        rest = "";
                    }
                }
            }
            None => {
                parse_legacy_lines(rest, &mut parsed);
                break;
            }
        }
    }

    parsed.records.reverse();
    parsed
}

/// Renders a record as one block, including the trailing newline.
/// The creation instant, when known, gets its own `createdAt` line.
pub fn encode(record: &FeedbackRecord) -> String {
    let created_at = record
        .created_at()
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .map(|instant| format!("createdAt: {}\n", instant))
        .unwrap_or_default();

    format!(
        "{}\nid: {}\nname: {}\nunit: {}\nmessage: {}\n{}recordedAt: {}\n{}\n",
        START_MARKER,
        single_line(record.id()),
        single_line(record.name()),
        single_line(record.unit()),
        single_line(record.message()),
        created_at,
        single_line(record.recorded_at()),
        END_MARKER,
    )
}

/// Renders records given newest first as a log, oldest first.
pub fn encode_all<'a>(records: impl DoubleEndedIterator<Item = &'a FeedbackRecord>) -> String {
    records.rev().map(encode).collect()
}

/// Appends parsed records (newest first) to `store` in log order,
/// skipping IDs it already holds. Returns how many were added.
pub async fn import(store: &dyn Store, records: Vec<FeedbackRecord>) -> Result<usize, BackendError> {
    let mut known = store
        .list()
        .await?
        .into_iter()
        .map(|record| record.id().to_owned())
        .collect::<HashSet<_>>();

    let mut imported = 0;

    for record in records.into_iter().rev() {
        if known.insert(record.id().to_owned()) {
            store.append(record).await?;
            imported += 1;
        }
    }

    Ok(imported)
}

fn parse_block(body: &str) -> Option<FeedbackRecord> {
    let fields = body.lines().filter_map(split_field).collect::<HashMap<_, _>>();

    let required = |key: &str| {
        fields
            .get(key)
            .map(|value| value.to_string())
            .filter(|value| !value.is_empty())
    };

    let recorded_at = fields.get("recordedAt").map(|v| v.to_string()).unwrap_or_default();

    // older logs put the instant itself in recordedAt
    let created_at = fields
        .get("createdAt")
        .and_then(|v| OffsetDateTime::parse(v, &Rfc3339).ok())
        .or_else(|| OffsetDateTime::parse(&recorded_at, &Rfc3339).ok());

    Some(FeedbackRecord::from_parts(
        required("id")?,
        required("name")?,
        required("unit")?,
        required("message")?,
        created_at,
        recorded_at,
    ))
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = line[..colon].trim();

    if key.is_empty() {
        return None;
    }

    Some((key, line[colon + 1..].trim()))
}

fn parse_legacy_lines(text: &str, parsed: &mut Parsed) {
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<FeedbackRecord>(line) {
            Ok(record) => parsed.records.push(record),
            Err(_) => parsed.skipped += 1,
        }
    }
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;
    use crate::record::FeedbackSubmission;

    const LOG: &str = "===YK_START===
id: lq1a2b3c4d5e
name: Nguyen Van A
unit: Doan Truong
message: Rat mong duoc ho tro them ve co so vat chat.
recordedAt: 2024-03-05T01:02:03Z
===YK_END===
{\"id\":\"legacy1\",\"name\":\"Tran Thi B\",\"unit\":\"Khoa Toan\",\"message\":\"Ban to chuc rat chu dao\",\"recordedAt\":\"6/3/2024 09:00\"}
this line is garbage
===YK_START===
id: lq9z8y7x6w5v
name: Le Van C
unit: Phong Dao tao
message: Thoi gian: can keo dai them.
recordedAt: 07/03/2024 10:15
===YK_END===
";

    #[test]
    fn blocks_and_legacy_lines_are_read_newest_first() {
        let parsed = parse(LOG);

        let ids = parsed.records.iter().map(|r| r.id()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["lq9z8y7x6w5v", "legacy1", "lq1a2b3c4d5e"]);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn values_may_contain_colons() {
        let parsed = parse(LOG);

        assert_eq!(parsed.records[0].message(), "Thoi gian: can keo dai them.");
    }

    #[test]
    fn instants_are_recovered_when_possible() {
        let parsed = parse(LOG);

        assert_eq!(parsed.records[2].created_at(), Some(datetime!(2024-03-05 01:02:03 UTC)));
        assert_eq!(parsed.records[0].created_at(), None);
        assert_eq!(parsed.records[0].recorded_at(), "07/03/2024 10:15");
    }

    #[test]
    fn incomplete_blocks_are_skipped() {
        let log = "===YK_START===
id: missing-message
name: Nguyen Van A
unit: Doan Truong
===YK_END===
===YK_START===
id: unterminated
name: Tran Thi B
===YK_START===
id: ok
name: Le Van C
unit: Khoa Ly
message: Noi dung day du
recordedAt: x
===YK_END===
===YK_START===
id: truncated at end of file
";

        let parsed = parse(log);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id(), "ok");
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn empty_log_has_no_records() {
        let parsed = parse("");

        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn encoded_logs_parse_back() {
        let make = |name: &str, at| {
            let valid = FeedbackSubmission::new(name, "Doan Truong", "Mot y kien dong gop.")
                .validate()
                .expect("validate submission");
            FeedbackRecord::create(valid, at, offset!(+7))
        };

        let newest_first = vec![
            make("Second person", datetime!(2024-03-06 00:00 UTC)),
            make("First person", datetime!(2024-03-05 00:00 UTC)),
        ];

        let log = encode_all(newest_first.iter());
        assert!(log.starts_with(START_MARKER));
        assert!(log.find("First person") < log.find("Second person"));

        let parsed = parse(&log);
        assert_eq!(parsed.skipped, 0);

        let names = parsed.records.iter().map(|r| r.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Second person", "First person"]);
        assert_eq!(parsed.records, newest_first);
        assert_eq!(parsed.records[1].recorded_at(), "05/03/2024 07:00");
    }

    #[test]
    fn display_times_survive_export_and_import() {
        let record = FeedbackRecord::from_parts(
            "lq1a2b3c4d5e".to_owned(),
            "Nguyen Van A".to_owned(),
            "Doan Truong".to_owned(),
            "Rat mong duoc ho tro them ve co so vat chat.".to_owned(),
            Some(datetime!(2024-03-05 01:02:03 UTC)),
            "05/03/2024 08:02".to_owned(),
        );

        let log = encode(&record);
        assert!(log.contains("createdAt: 2024-03-05T01:02:03Z\n"));
        assert!(log.contains("recordedAt: 05/03/2024 08:02\n"));

        let parsed = parse(&log);
        assert_eq!(parsed.records, vec![record]);
    }

    #[tokio::test]
    async fn importing_skips_known_ids_and_keeps_order() {
        use std::sync::Arc;

        use crate::store::{JsonFileStore, Store};

        let dir = tempfile::tempdir().expect("create temporary directory");
        let store = JsonFileStore::open(Arc::new(log::discard_logger()), dir.path().join("feedbacks.json"))
            .await
            .expect("open store");

        let current = FeedbackRecord::from_parts(
            "current".to_owned(),
            "Current person".to_owned(),
            "Doan Truong".to_owned(),
            "Mot y kien moi nhat.".to_owned(),
            Some(datetime!(2026-10-17 00:00 UTC)),
            "17/10/2026 07:00".to_owned(),
        );
        store.append(current).await.expect("append");

        let parsed = parse(LOG);
        assert_eq!(import(&store, parsed.records.clone()).await.expect("import"), 3);
        assert_eq!(import(&store, parsed.records).await.expect("import again"), 0);

        let ids = store
            .list()
            .await
            .expect("list")
            .iter()
            .map(|r| r.id().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["current", "lq1a2b3c4d5e", "lq9z8y7x6w5v", "legacy1"]);
    }
}
