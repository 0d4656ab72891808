//! Loads the offline matcher's CSV output into the match store.
//!
//! Expected header: `user_id,job_id,rank,match_percent,match_reason`. Only the first two
//! columns are required to be non-empty.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{JobId, MatchEntry, MatchList, UserId};
use super::store::{MatchRepository, StoreError};

#[derive(Debug)]
pub enum MatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    Store(StoreError),
}

impl std::fmt::Display for MatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchImportError::Io(err) => write!(f, "failed to read match export: {}", err),
            MatchImportError::Csv(err) => write!(f, "invalid match CSV data: {}", err),
            MatchImportError::InvalidRow { line, reason } => {
                write!(f, "match export line {}: {}", line, reason)
            }
            MatchImportError::Store(err) => write!(f, "could not store imported matches: {}", err),
        }
    }
}

impl std::error::Error for MatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatchImportError::Io(err) => Some(err),
            MatchImportError::Csv(err) => Some(err),
            MatchImportError::InvalidRow { .. } => None,
            MatchImportError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for MatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for MatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for MatchImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    user_id: String,
    job_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rank: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    match_percent: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    match_reason: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}

pub struct MatchImporter;

impl MatchImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<MatchList>, MatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, imported_at)
    }

    /// Parses rows and groups them per user, keeping row order within each user.
    pub fn from_reader<R: Read>(
        reader: R,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<MatchList>, MatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut grouped: BTreeMap<UserId, Vec<MatchEntry>> = BTreeMap::new();

        for (index, row) in csv_reader.deserialize::<MatchRow>().enumerate() {
            let row = row?;
            let line = index as u64 + 2;
            let (user_id, entry) = parse_row(row, line)?;
            grouped.entry(user_id).or_default().push(entry);
        }

        Ok(grouped
            .into_iter()
            .map(|(user_id, entries)| MatchList {
                user_id,
                entries,
                updated_at: imported_at,
            })
            .collect())
    }

    /// Replaces each user's stored match list. Returns the number of users updated.
    pub fn store_all<M: MatchRepository>(
        repository: &M,
        lists: Vec<MatchList>,
    ) -> Result<usize, MatchImportError> {
        let count = lists.len();
        for list in lists {
            repository.replace_match_list(list)?;
        }
        Ok(count)
    }
}

fn parse_row(row: MatchRow, line: u64) -> Result<(UserId, MatchEntry), MatchImportError> {
    let invalid = |reason: String| MatchImportError::InvalidRow { line, reason };

    if row.user_id.is_empty() || row.job_id.is_empty() {
        return Err(invalid("user_id and job_id are required".to_string()));
    }

    let rank = row
        .rank
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| invalid(format!("rank '{raw}' is not a whole number")))
        })
        .transpose()?;

    let match_percent = row
        .match_percent
        .map(|raw| match raw.parse::<f32>() {
            Ok(value) if (0.0..=100.0).contains(&value) => Ok(value.round() as u8),
            _ => Err(invalid(format!("match_percent '{raw}' is outside 0-100"))),
        })
        .transpose()?;

    Ok((
        UserId::new(row.user_id),
        MatchEntry {
            job_id: JobId::new(row.job_id),
            match_percent,
            rank,
            reason: row.match_reason,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::memory::MemoryStore;
    use std::io::Cursor;

    const EXPORT: &str = "user_id,job_id,rank,match_percent,match_reason\n\
usr-1,job-9,2,71.6,Strong SQL overlap\n\
usr-2,job-3,,40,\n\
usr-1,job-4,1,88,Rust and Kafka\n";

    #[test]
    fn groups_rows_per_user_in_row_order() {
        let lists =
            MatchImporter::from_reader(Cursor::new(EXPORT), Utc::now()).expect("parses export");

        assert_eq!(lists.len(), 2);
        let first = &lists[0];
        assert_eq!(first.user_id, UserId::new("usr-1"));
        let jobs: Vec<&str> = first.entries.iter().map(|e| e.job_id.as_str()).collect();
        assert_eq!(jobs, vec!["job-9", "job-4"]);
        assert_eq!(first.entries[0].match_percent, Some(72));
        assert_eq!(first.entries[0].rank, Some(2));

        let second = &lists[1];
        assert_eq!(second.entries[0].rank, None);
        assert_eq!(second.entries[0].reason, None);
    }

    #[test]
    fn rejects_out_of_range_percentages_with_line_number() {
        let export = "user_id,job_id,rank,match_percent,match_reason\nusr-1,job-1,1,140,\n";
        match MatchImporter::from_reader(Cursor::new(export), Utc::now()) {
            Err(MatchImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("140"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn store_all_replaces_existing_lists() {
        let store = MemoryStore::new();
        let lists =
            MatchImporter::from_reader(Cursor::new(EXPORT), Utc::now()).expect("parses export");
        assert_eq!(MatchImporter::store_all(&store, lists).expect("stores"), 2);

        let replacement = "user_id,job_id,rank,match_percent,match_reason\nusr-1,job-7,1,50,\n";
        let lists = MatchImporter::from_reader(Cursor::new(replacement), Utc::now())
            .expect("parses replacement");
        MatchImporter::store_all(&store, lists).expect("stores");

        let stored = store
            .match_list(&UserId::new("usr-1"))
            .expect("query")
            .expect("present");
        assert_eq!(stored.entries.len(), 1);
        assert_eq!(stored.entries[0].job_id, JobId::new("job-7"));
    }
}
