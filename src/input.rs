//! Boundary between loosely-typed API payloads and the engine's validated
//! record types.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::models::{ScoreRecord, YearMetrics};

/// Largest count an `f64` payload value still represents exactly (2^53).
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// API payloads sometimes carry numbers as strings ("87.5").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, expecting = "a number or a numeric string")]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn to_f64(&self, field: &str) -> Result<f64, AnalyticsError> {
        let value = match self {
            LooseNumber::Number(value) => *value,
            LooseNumber::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                AnalyticsError::InvalidInput(format!("{field} '{text}' is not a number"))
            })?,
        };

        if !value.is_finite() {
            return Err(AnalyticsError::InvalidInput(format!("{field} is not finite")));
        }
        Ok(value)
    }
}

/// Ids arrive as either integers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, expecting = "an id as a string or an integer")]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl LooseId {
    fn into_text(self, field: &str) -> Result<String, AnalyticsError> {
        match self {
            LooseId::Number(id) => Ok(id.to_string()),
            LooseId::Text(id) => required_text(Some(id), field),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScoreRecord {
    #[serde(alias = "student_id")]
    pub student_id: Option<LooseId>,
    #[serde(alias = "student_name")]
    pub student_name: Option<String>,
    #[serde(alias = "class_id")]
    pub class_id: Option<LooseId>,
    #[serde(alias = "exam_type")]
    pub exam_type: Option<String>,
    pub percentage: Option<LooseNumber>,
}

impl TryFrom<RawScoreRecord> for ScoreRecord {
    type Error = AnalyticsError;

    fn try_from(raw: RawScoreRecord) -> Result<Self, Self::Error> {
        let student_id = match raw.student_id {
            Some(id) => id.into_text("studentId")?,
            None => return Err(AnalyticsError::InvalidInput("studentId is missing".to_string())),
        };
        let student_name = required_text(raw.student_name, "studentName")?;
        let exam_type = required_text(raw.exam_type, "examType")?;
        let percentage = raw
            .percentage
            .ok_or_else(|| missing("percentage", &student_id))?
            .to_f64("percentage")?;

        if !(0.0..=100.0).contains(&percentage) {
            return Err(AnalyticsError::InvalidInput(format!(
                "percentage {percentage} for student {student_id} is outside [0, 100]"
            )));
        }

        let class_id = match raw.class_id {
            Some(id) => id.into_text("classId").ok(),
            None => None,
        };

        Ok(ScoreRecord {
            student_id,
            student_name,
            class_id,
            exam_type,
            percentage,
        })
    }
}

/// CSV cells are read as text so ids such as "007" keep their leading zeros.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvScoreRow {
    #[serde(alias = "student_id")]
    student_id: Option<String>,
    #[serde(alias = "student_name")]
    student_name: Option<String>,
    #[serde(alias = "class_id")]
    class_id: Option<String>,
    #[serde(alias = "exam_type")]
    exam_type: Option<String>,
    percentage: Option<String>,
}

impl From<CsvScoreRow> for RawScoreRecord {
    fn from(row: CsvScoreRow) -> Self {
        RawScoreRecord {
            student_id: row.student_id.map(LooseId::Text),
            student_name: row.student_name,
            class_id: row.class_id.map(LooseId::Text),
            exam_type: row.exam_type,
            percentage: row.percentage.map(LooseNumber::Text),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawYearMetrics {
    pub year_id: Option<LooseId>,
    pub year_label: Option<String>,
    pub total_students: Option<LooseNumber>,
    pub total_classes: Option<LooseNumber>,
    pub total_exams: Option<LooseNumber>,
    pub total_subjects: Option<LooseNumber>,
    pub total_teachers: Option<LooseNumber>,
    pub average_attendance: Option<LooseNumber>,
}

impl TryFrom<RawYearMetrics> for YearMetrics {
    type Error = AnalyticsError;

    fn try_from(raw: RawYearMetrics) -> Result<Self, Self::Error> {
        let year_id = match raw.year_id {
            Some(id) => id.into_text("yearId")?,
            None => return Err(AnalyticsError::InvalidInput("yearId is missing".to_string())),
        };
        let year_label = required_text(raw.year_label, "yearLabel")?;

        let average_attendance = raw
            .average_attendance
            .map(|value| value.to_f64("averageAttendance"))
            .transpose()?;
        if let Some(attendance) = average_attendance {
            if !(0.0..=100.0).contains(&attendance) {
                return Err(AnalyticsError::InvalidInput(format!(
                    "averageAttendance {attendance} for year {year_id} is outside [0, 100]"
                )));
            }
        }

        Ok(YearMetrics {
            total_students: count(raw.total_students, "totalStudents", &year_id)?,
            total_classes: count(raw.total_classes, "totalClasses", &year_id)?,
            total_exams: count(raw.total_exams, "totalExams", &year_id)?,
            total_subjects: count(raw.total_subjects, "totalSubjects", &year_id)?,
            total_teachers: count(raw.total_teachers, "totalTeachers", &year_id)?,
            average_attendance,
            year_id,
            year_label,
        })
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AnalyticsError> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(AnalyticsError::InvalidInput(format!("{field} is missing"))),
    }
}

fn missing(field: &str, owner: &str) -> AnalyticsError {
    AnalyticsError::InvalidInput(format!("{field} is missing for {owner}"))
}

fn count(value: Option<LooseNumber>, field: &str, year_id: &str) -> Result<Option<u64>, AnalyticsError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let number = value.to_f64(field)?;
    if number < 0.0 || number.fract() != 0.0 {
        return Err(AnalyticsError::InvalidInput(format!(
            "{field} {number} for year {year_id} is not a non-negative whole number"
        )));
    }
    if number > MAX_EXACT_COUNT {
        return Err(AnalyticsError::InvalidInput(format!(
            "{field} {number} for year {year_id} is too large"
        )));
    }
    Ok(Some(number as u64))
}

/// Validates a batch, reporting the position of the first bad entry.
pub fn validate_records(raw: Vec<RawScoreRecord>) -> Result<Vec<ScoreRecord>, AnalyticsError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| {
            ScoreRecord::try_from(record).map_err(|err| {
                warn!(index, error = %err, "invalid score record");
                at_index(err, index)
            })
        })
        .collect()
}

pub fn validate_years(raw: Vec<RawYearMetrics>) -> Result<Vec<YearMetrics>, AnalyticsError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, year)| {
            YearMetrics::try_from(year).map_err(|err| {
                warn!(index, error = %err, "invalid year metrics");
                at_index(err, index)
            })
        })
        .collect()
}

fn at_index(err: AnalyticsError, index: usize) -> AnalyticsError {
    match err {
        AnalyticsError::InvalidInput(message) => {
            AnalyticsError::InvalidInput(format!("entry {index}: {message}"))
        }
        other => other,
    }
}

/// Accepts a bare array or an object wrapping the array under `key`.
fn payload_entries(text: &str, key: &str) -> anyhow::Result<Vec<Value>> {
    let document: Value = serde_json::from_str(text).context("payload is not valid JSON")?;
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove(key) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(AnalyticsError::InvalidInput(format!(
                    "expected a JSON array or {{ \"{key}\": [...] }}"
                ))
                .into())
            }
        },
        _ => {
            return Err(AnalyticsError::InvalidInput(format!(
                "expected a JSON array or {{ \"{key}\": [...] }}"
            ))
            .into())
        }
    };
    Ok(entries)
}

fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>) -> Result<Vec<T>, AnalyticsError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|err| {
                warn!(index, error = %err, "malformed payload entry");
                AnalyticsError::InvalidInput(format!("entry {index}: malformed entry ({err})"))
            })
        })
        .collect()
}

pub fn parse_records_json(text: &str) -> anyhow::Result<Vec<ScoreRecord>> {
    let raw: Vec<RawScoreRecord> = decode_entries(payload_entries(text, "records")?)?;
    Ok(validate_records(raw)?)
}

pub fn parse_years_json(text: &str) -> anyhow::Result<Vec<YearMetrics>> {
    let raw: Vec<RawYearMetrics> = decode_entries(payload_entries(text, "years")?)?;
    Ok(validate_years(raw)?)
}

/// Reads score records from a `.json` or `.csv` file.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<ScoreRecord>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut raw = Vec::new();
        for (index, row) in reader.deserialize::<CsvScoreRow>().enumerate() {
            let row = row.map_err(|err| {
                AnalyticsError::InvalidInput(format!("entry {index}: malformed row ({err})"))
            })?;
            raw.push(RawScoreRecord::from(row));
        }
        validate_records(raw)?
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_records_json(&text)?
    };

    debug!(path = %path.display(), records = records.len(), "loaded score records");
    Ok(records)
}

pub fn load_years(path: &Path) -> anyhow::Result<Vec<YearMetrics>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let years = parse_years_json(&text)?;
    debug!(path = %path.display(), years = years.len(), "loaded year metrics");
    Ok(years)
}
