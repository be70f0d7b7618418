use crate::dto::submission_dto::{KeyValuePair, NormalizedSubmission, ParsedSubmission};
use crate::models::submission::Submission;
use serde_json::Value as JsonValue;

const MISSING: &str = "-";

/// Fields each derived view adds on top of the raw row.
const NORMALIZED_KEYS: [&str; 6] = [
    "refleksi_1",
    "refleksi_2",
    "refleksi_3",
    "refleksi_4",
    "target_upgrade",
    "skor_formatted",
];
const PARSED_KEYS: [&str; 2] = ["jawaban_refleksi_parsed", "jawaban_kuis_parsed"];

/// How a multi-valued `target_upgrade` is joined for its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// HTML table on the dashboard.
    Display,
    /// Spreadsheet cell.
    Export,
}

impl JoinPolicy {
    pub fn separator(self) -> &'static str {
        match self {
            JoinPolicy::Display => "<br>",
            JoinPolicy::Export => ", ",
        }
    }
}

pub struct NormalizeService;

impl NormalizeService {
    pub fn normalize(submission: &Submission, policy: JoinPolicy) -> NormalizedSubmission {
        let (reflections, target_upgrade) = match submission.reflection_answers() {
            Some(answers) => {
                let texts = answers.answers().map(|a| a.unwrap_or(MISSING).to_string());
                let target = answers
                    .target_upgrade
                    .as_ref()
                    .map(|t| t.join(policy.separator()))
                    .unwrap_or_else(|| MISSING.to_string());
                (texts, target)
            }
            None => (
                std::array::from_fn(|_| MISSING.to_string()),
                MISSING.to_string(),
            ),
        };

        let [refleksi_1, refleksi_2, refleksi_3, refleksi_4] = reflections;

        NormalizedSubmission {
            submission: without_keys(submission, &NORMALIZED_KEYS),
            refleksi_1,
            refleksi_2,
            refleksi_3,
            refleksi_4,
            target_upgrade,
            skor_formatted: Self::format_score(submission),
        }
    }

    pub fn normalize_all(submissions: &[Submission], policy: JoinPolicy) -> Vec<NormalizedSubmission> {
        submissions
            .iter()
            .map(|s| Self::normalize(s, policy))
            .collect()
    }

    /// `"{skor}: {q1} {q2} {q3} {q4} {q5}"`, or `"{skor}: -"` without quiz answers.
    pub fn format_score(submission: &Submission) -> String {
        let skor = submission.skor.unwrap_or(0);
        match submission.quiz_answers() {
            Some(quiz) => {
                let answers: Vec<&str> = quiz
                    .in_order()
                    .iter()
                    .map(|a| a.unwrap_or(MISSING))
                    .collect();
                format!("{}: {}", skor, answers.join(" "))
            }
            None => format!("{}: {}", skor, MISSING),
        }
    }

    /// Entries of a stored JSON column: object members in stored order, array
    /// items keyed by index, the characters of a plain string. Strings holding
    /// encoded JSON are decoded first. Absent and falsy values have no entries.
    pub fn key_value_pairs(value: Option<&JsonValue>) -> Vec<KeyValuePair> {
        let pair = |key: String, value: JsonValue| KeyValuePair { key, value };
        match value {
            Some(JsonValue::Object(map)) => map
                .iter()
                .map(|(key, value)| pair(key.clone(), value.clone()))
                .collect(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, value)| pair(i.to_string(), value.clone()))
                .collect(),
            Some(JsonValue::String(text)) => match serde_json::from_str::<JsonValue>(text) {
                Ok(decoded @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
                    Self::key_value_pairs(Some(&decoded))
                }
                _ => text
                    .chars()
                    .enumerate()
                    .map(|(i, c)| pair(i.to_string(), JsonValue::String(c.to_string())))
                    .collect(),
            },
            _ => Vec::new(),
        }
    }

    pub fn parse_submission(submission: Submission) -> ParsedSubmission {
        let jawaban_refleksi_parsed = Self::key_value_pairs(submission.column("jawaban_refleksi"));
        let jawaban_kuis_parsed = Self::key_value_pairs(submission.column("jawaban_kuis"));
        ParsedSubmission {
            submission: without_keys(&submission, &PARSED_KEYS),
            jawaban_refleksi_parsed,
            jawaban_kuis_parsed,
        }
    }
}

/// Copy of the row whose stored columns cannot collide with derived fields.
fn without_keys(submission: &Submission, keys: &[&str]) -> Submission {
    let mut copy = submission.clone();
    for key in keys {
        copy.remove_column(key);
    }
    copy
}
