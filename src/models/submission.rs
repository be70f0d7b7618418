use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Store-assigned identifier. Tables created through the dashboard use
/// `int8`, imported ones sometimes use `uuid`/`text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionId::Number(n) => write!(f, "{}", n),
            SubmissionId::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the submissions table. The typed columns are lenient reads of
/// the stored row, which is kept untouched and is what serializes back out.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "JsonMap")]
pub struct Submission {
    pub id: SubmissionId,
    pub nama: Option<String>,
    pub kelas: Option<String>,
    pub skor: Option<i64>,
    pub jawaban_kuis: Option<JsonMap>,
    pub jawaban_refleksi: Option<JsonMap>,
    pub created_at: Option<DateTime<Utc>>,
    row: JsonMap,
}

#[derive(Deserialize)]
struct Columns {
    id: SubmissionId,
    #[serde(default, deserialize_with = "deserialize_text_flexible")]
    nama: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text_flexible")]
    kelas: Option<String>,
    #[serde(default, deserialize_with = "deserialize_score_flexible")]
    skor: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_json_object")]
    jawaban_kuis: Option<JsonMap>,
    #[serde(default, deserialize_with = "deserialize_json_object")]
    jawaban_refleksi: Option<JsonMap>,
    #[serde(default, deserialize_with = "deserialize_timestamp_flexible")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<JsonMap> for Submission {
    type Error = serde_json::Error;

    fn try_from(row: JsonMap) -> std::result::Result<Self, Self::Error> {
        let columns: Columns = serde_json::from_value(JsonValue::Object(row.clone()))?;
        Ok(Self {
            id: columns.id,
            nama: columns.nama,
            kelas: columns.kelas,
            skor: columns.skor,
            jawaban_kuis: columns.jawaban_kuis,
            jawaban_refleksi: columns.jawaban_refleksi,
            created_at: columns.created_at,
            row,
        })
    }
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.row.serialize(serializer)
    }
}

impl Submission {
    /// The row exactly as the store returned it.
    pub fn row(&self) -> &JsonMap {
        &self.row
    }

    /// Stored value of a column, `None` when the row has no such column.
    pub fn column(&self, name: &str) -> Option<&JsonValue> {
        self.row.get(name)
    }

    /// Drops a column from the stored row. Typed columns are left as read.
    pub fn remove_column(&mut self, name: &str) -> Option<JsonValue> {
        self.row.shift_remove(name)
    }

    pub fn quiz_answers(&self) -> Option<QuizAnswers> {
        self.jawaban_kuis.as_ref().map(QuizAnswers::from_map)
    }

    pub fn reflection_answers(&self) -> Option<ReflectionAnswers> {
        self.jawaban_refleksi.as_ref().map(ReflectionAnswers::from_map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAnswers {
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
    pub q4: Option<String>,
    pub q5: Option<String>,
}

impl QuizAnswers {
    pub fn from_map(map: &JsonMap) -> Self {
        let get = |key: &str| map.get(key).and_then(answer_text);
        Self {
            q1: get("q1"),
            q2: get("q2"),
            q3: get("q3"),
            q4: get("q4"),
            q5: get("q5"),
        }
    }

    pub fn in_order(&self) -> [Option<&str>; 5] {
        [
            self.q1.as_deref(),
            self.q2.as_deref(),
            self.q3.as_deref(),
            self.q4.as_deref(),
            self.q5.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionEntry {
    pub jawaban: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUpgrade {
    Many(Vec<String>),
    One(String),
}

impl TargetUpgrade {
    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Array(items) => Some(TargetUpgrade::Many(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::Null => String::new(),
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            other => answer_text(other).map(TargetUpgrade::One),
        }
    }

    pub fn join(&self, separator: &str) -> String {
        match self {
            TargetUpgrade::Many(items) => items.join(separator),
            TargetUpgrade::One(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionAnswers {
    pub refleksi_1: Option<ReflectionEntry>,
    pub refleksi_2: Option<ReflectionEntry>,
    pub refleksi_3: Option<ReflectionEntry>,
    pub refleksi_4: Option<ReflectionEntry>,
    pub target_upgrade: Option<TargetUpgrade>,
}

impl ReflectionAnswers {
    pub fn from_map(map: &JsonMap) -> Self {
        let entry = |key: &str| {
            map.get(key)
                .and_then(JsonValue::as_object)
                .map(|obj| ReflectionEntry {
                    jawaban: obj.get("jawaban").and_then(answer_text),
                })
        };
        Self {
            refleksi_1: entry("refleksi_1"),
            refleksi_2: entry("refleksi_2"),
            refleksi_3: entry("refleksi_3"),
            refleksi_4: entry("refleksi_4"),
            target_upgrade: map.get("target_upgrade").and_then(TargetUpgrade::from_json),
        }
    }

    /// Answers of `refleksi_1..=4` in key order.
    pub fn answers(&self) -> [Option<&str>; 4] {
        fn text(entry: &Option<ReflectionEntry>) -> Option<&str> {
            entry.as_ref().and_then(|e| e.jawaban.as_deref())
        }
        [
            text(&self.refleksi_1),
            text(&self.refleksi_2),
            text(&self.refleksi_3),
            text(&self.refleksi_4),
        ]
    }
}

/// Text of an answer leaf. Empty strings, `false`, `0` and null count as no
/// answer; containers are not answers.
fn answer_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Bool(true) => Some("true".to_string()),
        JsonValue::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_text_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn deserialize_score_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

/// Accepts a JSON object, or a string holding one (rows written by older
/// form versions stored the answers as text).
fn deserialize_json_object<'de, D>(deserializer: D) -> std::result::Result<Option<JsonMap>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Object(map) => Some(map),
        JsonValue::String(s) => match serde_json::from_str::<JsonValue>(&s) {
            Ok(JsonValue::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    })
}

fn deserialize_timestamp_flexible<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => s,
        _ => return Ok(None),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    // `timestamp without time zone` columns come back without an offset.
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}
