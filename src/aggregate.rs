use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::grade;
use crate::models::{ClassAnalyticsSnapshot, GradeDistribution, ScoreRecord, Statistics};
use crate::ranking::{self, StudentAverage};

struct StudentTotals<'a> {
    student_name: &'a str,
    sum: f64,
    records: usize,
    exams: HashSet<&'a str>,
}

/// Builds a class snapshot from score records, restricted to one exam type
/// when `exam_type` is given.
///
/// Statistics are taken over every matching record. The grade distribution
/// and rankings are per student, using each student's mean across their
/// matching records, so the distribution always sums to `total_students`.
pub fn aggregate(
    records: &[ScoreRecord],
    exam_type: Option<&str>,
) -> Result<ClassAnalyticsSnapshot, AnalyticsError> {
    let filtered: Vec<&ScoreRecord> = records
        .iter()
        .filter(|record| exam_type.map_or(true, |wanted| record.exam_type == wanted))
        .collect();

    debug!(
        records = records.len(),
        matched = filtered.len(),
        exam_type = exam_type.unwrap_or("all"),
        "aggregating class snapshot"
    );

    if filtered.is_empty() {
        return Err(AnalyticsError::EmptyInput(match exam_type {
            Some(wanted) => format!("no records for exam type {wanted}"),
            None => "no records supplied".to_string(),
        }));
    }

    let mut percentages = Vec::with_capacity(filtered.len());
    let mut exam_types: HashSet<&str> = HashSet::new();
    let mut students: HashMap<&str, StudentTotals> = HashMap::new();

    for record in filtered {
        if let Err(err) = grade::classify(record.percentage) {
            warn!(student_id = %record.student_id, exam_type = %record.exam_type, "rejecting record");
            return Err(err);
        }

        percentages.push(record.percentage);
        exam_types.insert(record.exam_type.as_str());

        let entry = students
            .entry(record.student_id.as_str())
            .or_insert_with(|| StudentTotals {
                student_name: record.student_name.as_str(),
                sum: 0.0,
                records: 0,
                exams: HashSet::new(),
            });
        entry.sum += record.percentage;
        entry.records += 1;
        entry.exams.insert(record.exam_type.as_str());
    }

    let averages: Vec<StudentAverage> = students
        .into_iter()
        .map(|(student_id, totals)| StudentAverage {
            student_id: student_id.to_string(),
            student_name: totals.student_name.to_string(),
            percentage: totals.sum / totals.records as f64,
            exams_attempted: totals.exams.len(),
        })
        .collect();

    let student_rankings = ranking::rank(averages, exam_types.len())?;

    let mut grade_distribution = GradeDistribution::new();
    for ranking in &student_rankings {
        *grade_distribution.entry(ranking.grade).or_insert(0) += 1;
    }

    Ok(ClassAnalyticsSnapshot {
        total_students: student_rankings.len(),
        statistics: Statistics::from_values(&percentages),
        grade_distribution,
        student_rankings,
    })
}

/// Restricts records to one class before aggregating. Records without a
/// class id never match.
pub fn aggregate_class(
    records: &[ScoreRecord],
    class_id: &str,
    exam_type: Option<&str>,
) -> Result<ClassAnalyticsSnapshot, AnalyticsError> {
    let class_records: Vec<ScoreRecord> = records
        .iter()
        .filter(|record| record.class_id.as_deref() == Some(class_id))
        .cloned()
        .collect();

    if class_records.is_empty() {
        return Err(AnalyticsError::EmptyInput(format!(
            "no records for class {class_id}"
        )));
    }

    aggregate(&class_records, exam_type)
}

/// Distinct exam types in first-seen order.
pub fn exam_types(records: &[ScoreRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.exam_type.as_str()))
        .map(|record| record.exam_type.clone())
        .collect()
}
