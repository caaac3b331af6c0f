use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::grade::Grade;
use crate::models::{ClassAnalyticsSnapshot, ComparisonResult, Metric};

/// Neutral series palette. Renderers are free to re-theme by series index.
const PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2b", "#59a14f", "#e15759", "#76b7b2", "#edc948",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Trend,
    Distribution,
    Ranking,
    Growth,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Trend => "trend",
            ChartKind::Distribution => "distribution",
            ChartKind::Ranking => "ranking",
            ChartKind::Growth => "growth",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "trend" => Ok(ChartKind::Trend),
            "distribution" => Ok(ChartKind::Distribution),
            "ranking" => Ok(ChartKind::Ranking),
            "growth" => Ok(ChartKind::Growth),
            other => Err(format!(
                "unknown chart kind '{other}' (expected trend, distribution, ranking or growth)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ChartSource<'a> {
    Snapshot(&'a ClassAnalyticsSnapshot),
    Comparison(&'a ComparisonResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// `None` marks a gap the renderer should not plot.
    pub values: Vec<Option<f64>>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSeries {
    /// The no-data sentinel.
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.series.is_empty()
    }
}

/// Reshapes already-computed analytics into labels and series, in display
/// order. Kinds that do not apply to the source, or sources without the
/// relevant data, give [`ChartSeries::empty`].
pub fn to_series(source: ChartSource<'_>, kind: ChartKind) -> ChartSeries {
    match (source, kind) {
        (ChartSource::Snapshot(snapshot), ChartKind::Distribution) => distribution(snapshot),
        (ChartSource::Snapshot(snapshot), ChartKind::Ranking) => ranking(snapshot),
        (ChartSource::Comparison(result), ChartKind::Trend) => trend(result),
        (ChartSource::Comparison(result), ChartKind::Growth) => growth(result),
        _ => ChartSeries::empty(),
    }
}

fn distribution(snapshot: &ClassAnalyticsSnapshot) -> ChartSeries {
    let present: Vec<(Grade, usize)> = Grade::ALL
        .iter()
        .filter_map(|grade| {
            snapshot
                .grade_distribution
                .get(grade)
                .map(|count| (*grade, *count))
        })
        .collect();

    if present.is_empty() {
        return ChartSeries::empty();
    }

    ChartSeries {
        labels: present.iter().map(|(grade, _)| grade.label().to_string()).collect(),
        series: vec![Series {
            name: "Students".to_string(),
            values: present.iter().map(|(_, count)| Some(*count as f64)).collect(),
            color: PALETTE[0].to_string(),
        }],
    }
}

fn ranking(snapshot: &ClassAnalyticsSnapshot) -> ChartSeries {
    if snapshot.student_rankings.is_empty() {
        return ChartSeries::empty();
    }

    ChartSeries {
        labels: snapshot
            .student_rankings
            .iter()
            .map(|r| r.student_name.clone())
            .collect(),
        series: vec![Series {
            name: "Percentage".to_string(),
            values: snapshot
                .student_rankings
                .iter()
                .map(|r| Some(r.percentage))
                .collect(),
            color: PALETTE[1].to_string(),
        }],
    }
}

fn trend(result: &ComparisonResult) -> ChartSeries {
    if result.years.is_empty() {
        return ChartSeries::empty();
    }

    let series: Vec<Series> = Metric::ALL
        .iter()
        .map(|metric| {
            let values: Vec<Option<f64>> =
                result.years.iter().map(|year| metric.value(year)).collect();
            (metric, values)
        })
        .filter(|(_, values)| values.iter().any(Option::is_some))
        .enumerate()
        .map(|(index, (metric, values))| Series {
            name: metric.label().to_string(),
            values,
            color: PALETTE[index % PALETTE.len()].to_string(),
        })
        .collect();

    if series.is_empty() {
        return ChartSeries::empty();
    }

    ChartSeries {
        labels: result.years.iter().map(|y| y.year_label.clone()).collect(),
        series,
    }
}

fn growth(result: &ComparisonResult) -> ChartSeries {
    let changes: Vec<(Metric, f64)> = Metric::ALL
        .iter()
        .filter_map(|metric| result.trend(*metric).map(|delta| (*metric, delta)))
        .collect();

    if changes.is_empty() {
        return ChartSeries::empty();
    }

    ChartSeries {
        labels: changes
            .iter()
            .map(|(metric, _)| metric.label().to_string())
            .collect(),
        series: vec![Series {
            name: "Change".to_string(),
            values: changes.iter().map(|(_, delta)| Some(*delta)).collect(),
            color: PALETTE[2].to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::compare::compare;
    use crate::models::{ScoreRecord, YearMetrics};

    fn snapshot() -> ClassAnalyticsSnapshot {
        let records: Vec<ScoreRecord> = [("S1", 95.0), ("S2", 42.0), ("S3", 95.0)]
            .iter()
            .map(|(id, percentage)| ScoreRecord {
                student_id: id.to_string(),
                student_name: format!("Student {id}"),
                class_id: None,
                exam_type: "SA1".to_string(),
                percentage: *percentage,
            })
            .collect();
        aggregate(&records, None).unwrap()
    }

    fn year(id: &str, label: &str, students: u64, attendance: Option<f64>) -> YearMetrics {
        YearMetrics {
            year_id: id.to_string(),
            year_label: label.to_string(),
            total_students: Some(students),
            total_classes: None,
            total_exams: None,
            total_subjects: None,
            total_teachers: None,
            average_attendance: attendance,
        }
    }

    #[test]
    fn distribution_follows_grade_order() {
        let chart = to_series(ChartSource::Snapshot(&snapshot()), ChartKind::Distribution);
        assert_eq!(chart.labels, vec!["A+".to_string(), "D".to_string()]);
        assert_eq!(chart.series[0].values, vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn ranking_follows_rank_order() {
        let chart = to_series(ChartSource::Snapshot(&snapshot()), ChartKind::Ranking);
        assert_eq!(chart.labels[0], "Student S1");
        assert_eq!(chart.labels[2], "Student S2");
        assert_eq!(chart.series[0].values[2], Some(42.0));
    }

    #[test]
    fn trend_has_one_series_per_reported_metric() {
        let result = compare(&[
            year("Y1", "2023-24", 100, Some(91.0)),
            year("Y2", "2024-25", 120, None),
        ])
        .unwrap();

        let chart = to_series(ChartSource::Comparison(&result), ChartKind::Trend);
        assert_eq!(chart.labels, vec!["2023-24".to_string(), "2024-25".to_string()]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "Students");
        assert_eq!(chart.series[1].values, vec![Some(91.0), None]);
    }

    #[test]
    fn growth_skips_unavailable_trends() {
        let result = compare(&[
            year("Y1", "2023-24", 100, Some(91.0)),
            year("Y2", "2024-25", 120, None),
        ])
        .unwrap();

        let chart = to_series(ChartSource::Comparison(&result), ChartKind::Growth);
        assert_eq!(chart.labels, vec!["Students".to_string()]);
        assert_eq!(chart.series[0].values, vec![Some(20.0)]);
    }

    #[test]
    fn missing_data_degrades_to_empty_sentinel() {
        let empty = ClassAnalyticsSnapshot::empty();
        let chart = to_series(ChartSource::Snapshot(&empty), ChartKind::Distribution);
        assert_eq!(chart, ChartSeries::empty());
        assert!(chart.is_empty());

        let mismatched = to_series(ChartSource::Snapshot(&snapshot()), ChartKind::Growth);
        assert!(mismatched.is_empty());
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("Trend".parse::<ChartKind>(), Ok(ChartKind::Trend));
        assert!("pie".parse::<ChartKind>().is_err());
    }
}
