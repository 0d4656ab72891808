//! Skill-overlap scoring and query-time ordering of offline match results.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use super::domain::{Certification, ExperienceEntry, Job, MatchEntry};

/// Percentage of `required` skills present in `candidate`, compared case-insensitively.
///
/// Returns 0 when either side is empty. Duplicate required skills count once per
/// occurrence, and the result is rounded half-up to the nearest integer.
pub fn score<R, C>(required: &[R], candidate: &[C]) -> u8
where
    R: AsRef<str>,
    C: AsRef<str>,
{
    if required.is_empty() || candidate.is_empty() {
        return 0;
    }

    let matched = matched_skills(required, candidate).len();
    let total = required.len();
    let rounded = (matched * 200 + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// The required skills the candidate declares, in the job's order.
pub fn matched_skills<R, C>(required: &[R], candidate: &[C]) -> Vec<String>
where
    R: AsRef<str>,
    C: AsRef<str>,
{
    let declared: HashSet<String> = candidate
        .iter()
        .map(|skill| skill.as_ref().to_lowercase())
        .collect();

    required
        .iter()
        .map(|skill| skill.as_ref())
        .filter(|skill| declared.contains(&skill.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Orders offline match entries: ranked entries first by ascending rank, then unranked
/// entries by descending match percentage. Ties keep their stored order.
pub fn rank_entries(mut entries: Vec<MatchEntry>) -> Vec<MatchEntry> {
    entries.sort_by(|left, right| match (left.rank, right.rank) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => right.match_percent.cmp(&left.match_percent),
    });
    entries
}

/// A job recommended to a candidate by the offline matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedJob {
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
}

/// Candidate data shown to employers with identifying fields withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlindApplicant {
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub certifications: Vec<Certification>,
    pub match_score: u8,
}
