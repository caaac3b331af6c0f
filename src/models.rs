use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grade::Grade;

/// One student's score on one exam. Validated at the input boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub student_id: String,
    pub student_name: String,
    pub class_id: Option<String>,
    pub exam_type: String,
    pub percentage: f64,
}

/// Count of students per grade. Grades with no students are omitted.
pub type GradeDistribution = BTreeMap<Grade, usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRanking {
    pub student_id: String,
    pub student_name: String,
    pub percentage: f64,
    pub grade: Grade,
    pub rank: usize,
    pub exams_attempted: usize,
    pub total_exams: usize,
}

/// Summary statistics over a set of percentages. `None` means there was no
/// data, which is distinct from a score of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub average: Option<f64>,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
}

impl Statistics {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sum: f64 = values.iter().sum();
        let highest = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = values.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            average: Some(sum / values.len() as f64),
            highest: Some(highest),
            lowest: Some(lowest),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAnalyticsSnapshot {
    pub total_students: usize,
    pub statistics: Statistics,
    pub grade_distribution: GradeDistribution,
    pub student_rankings: Vec<StudentRanking>,
}

impl ClassAnalyticsSnapshot {
    /// Placeholder shown when a filter matches no records.
    pub fn empty() -> Self {
        Self {
            total_students: 0,
            statistics: Statistics::default(),
            grade_distribution: GradeDistribution::new(),
            student_rankings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_students == 0
    }
}

/// Aggregate totals for one academic year. Missing metrics stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearMetrics {
    pub year_id: String,
    pub year_label: String,
    pub total_students: Option<u64>,
    pub total_classes: Option<u64>,
    pub total_exams: Option<u64>,
    pub total_subjects: Option<u64>,
    pub total_teachers: Option<u64>,
    pub average_attendance: Option<f64>,
}

/// Metrics tracked across academic years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    TotalStudents,
    TotalClasses,
    TotalExams,
    TotalSubjects,
    TotalTeachers,
    AverageAttendance,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::TotalStudents,
        Metric::TotalClasses,
        Metric::TotalExams,
        Metric::TotalSubjects,
        Metric::TotalTeachers,
        Metric::AverageAttendance,
    ];

    pub fn value(self, year: &YearMetrics) -> Option<f64> {
        match self {
            Metric::TotalStudents => year.total_students.map(|v| v as f64),
            Metric::TotalClasses => year.total_classes.map(|v| v as f64),
            Metric::TotalExams => year.total_exams.map(|v| v as f64),
            Metric::TotalSubjects => year.total_subjects.map(|v| v as f64),
            Metric::TotalTeachers => year.total_teachers.map(|v| v as f64),
            Metric::AverageAttendance => year.average_attendance,
        }
    }

    /// Key used for this metric in `ComparisonResult::trends`.
    pub fn trend_key(self) -> &'static str {
        match self {
            Metric::TotalStudents => "studentsChange",
            Metric::TotalClasses => "classesChange",
            Metric::TotalExams => "examsChange",
            Metric::TotalSubjects => "subjectsChange",
            Metric::TotalTeachers => "teachersChange",
            Metric::AverageAttendance => "attendanceChange",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalStudents => "Students",
            Metric::TotalClasses => "Classes",
            Metric::TotalExams => "Exams",
            Metric::TotalSubjects => "Subjects",
            Metric::TotalTeachers => "Teachers",
            Metric::AverageAttendance => "Attendance %",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub years: Vec<YearMetrics>,
    /// Latest minus previous selected year; `None` renders as "N/A".
    pub trends: BTreeMap<String, Option<f64>>,
    /// Only metrics with a strict, non-zero maximum have an entry.
    pub per_metric_max_year_id: BTreeMap<Metric, String>,
}

impl ComparisonResult {
    pub fn trend(&self, metric: Metric) -> Option<f64> {
        self.trends.get(metric.trend_key()).copied().flatten()
    }

    pub fn max_year(&self, metric: Metric) -> Option<&str> {
        self.per_metric_max_year_id.get(&metric).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_of_empty_slice_are_none() {
        let stats = Statistics::from_values(&[]);
        assert_eq!(stats.average, None);
        assert_eq!(stats.highest, None);
        assert_eq!(stats.lowest, None);
    }

    #[test]
    fn statistics_cover_mean_and_extremes() {
        let stats = Statistics::from_values(&[90.0, 90.0, 75.0]);
        assert!((stats.average.unwrap() - 85.0).abs() < 1e-9);
        assert_eq!(stats.highest, Some(90.0));
        assert_eq!(stats.lowest, Some(75.0));
    }

    #[test]
    fn empty_snapshot_serializes_nulls() {
        let json = serde_json::to_value(ClassAnalyticsSnapshot::empty()).unwrap();
        assert_eq!(json["totalStudents"], 0);
        assert!(json["statistics"]["average"].is_null());
        assert_eq!(json["gradeDistribution"], serde_json::json!({}));
    }

    #[test]
    fn metric_keys_match_payload_names() {
        assert_eq!(
            serde_json::to_string(&Metric::AverageAttendance).unwrap(),
            "\"averageAttendance\""
        );
        assert_eq!(Metric::TotalStudents.trend_key(), "studentsChange");
    }
}
