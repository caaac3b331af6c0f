use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::models::{ComparisonResult, Metric, YearMetrics};

pub const MIN_SELECTED_YEARS: usize = 2;
pub const MAX_SELECTED_YEARS: usize = 5;

/// Compares 2 to 5 academic years in the order the caller selected them.
///
/// Trends are the last selected year minus the second-to-last, per metric,
/// and are `None` when either side is missing. A year is flagged as the
/// maximum for a metric only when its value is non-zero and strictly greater
/// than every other selected year's value; ties flag nobody.
pub fn compare(selected: &[YearMetrics]) -> Result<ComparisonResult, AnalyticsError> {
    validate_selection(selected)?;

    debug!(
        years = selected.len(),
        latest = %selected[selected.len() - 1].year_id,
        "comparing academic years"
    );

    let latest = &selected[selected.len() - 1];
    let previous = &selected[selected.len() - 2];

    let trends: BTreeMap<String, Option<f64>> = Metric::ALL
        .iter()
        .map(|metric| {
            let delta = match (metric.value(latest), metric.value(previous)) {
                (Some(current), Some(before)) => Some(current - before),
                _ => None,
            };
            (metric.trend_key().to_string(), delta)
        })
        .collect();

    let per_metric_max_year_id: BTreeMap<Metric, String> = Metric::ALL
        .iter()
        .filter_map(|metric| strict_max(selected, *metric).map(|year_id| (*metric, year_id)))
        .collect();

    Ok(ComparisonResult {
        years: selected.to_vec(),
        trends,
        per_metric_max_year_id,
    })
}

fn validate_selection(selected: &[YearMetrics]) -> Result<(), AnalyticsError> {
    if !(MIN_SELECTED_YEARS..=MAX_SELECTED_YEARS).contains(&selected.len()) {
        warn!(years = selected.len(), "year selection out of bounds");
        return Err(AnalyticsError::InvalidSelection(format!(
            "select between {MIN_SELECTED_YEARS} and {MAX_SELECTED_YEARS} years, got {}",
            selected.len()
        )));
    }

    let mut seen = HashSet::new();
    for year in selected {
        if !seen.insert(year.year_id.as_str()) {
            warn!(year_id = %year.year_id, "duplicate year in selection");
            return Err(AnalyticsError::InvalidSelection(format!(
                "year {} selected more than once",
                year.year_id
            )));
        }
    }

    Ok(())
}

fn strict_max(selected: &[YearMetrics], metric: Metric) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    let mut tied = false;

    for year in selected {
        let Some(value) = metric.value(year) else {
            continue;
        };
        if value <= 0.0 || !value.is_finite() {
            continue;
        }

        match best {
            Some((_, current)) if value < current => {}
            Some((_, current)) if value == current => tied = true,
            _ => {
                best = Some((year.year_id.as_str(), value));
                tied = false;
            }
        }
    }

    match best {
        Some((year_id, _)) if !tied => Some(year_id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(id: &str, students: u64, attendance: f64) -> YearMetrics {
        YearMetrics {
            year_id: id.to_string(),
            year_label: format!("{id} label"),
            total_students: Some(students),
            total_classes: Some(10),
            total_exams: Some(6),
            total_subjects: None,
            total_teachers: Some(0),
            average_attendance: Some(attendance),
        }
    }

    #[test]
    fn two_year_scenario() {
        let result = compare(&[year("Y1", 100, 92.0), year("Y2", 120, 95.5)]).unwrap();

        assert_eq!(result.trend(Metric::TotalStudents), Some(20.0));
        assert!((result.trend(Metric::AverageAttendance).unwrap() - 3.5).abs() < 1e-9);
        assert_eq!(result.trends.get("studentsChange"), Some(&Some(20.0)));
        assert_eq!(result.max_year(Metric::TotalStudents), Some("Y2"));
        assert_eq!(result.max_year(Metric::AverageAttendance), Some("Y2"));
    }

    #[test]
    fn rejects_selection_outside_two_to_five() {
        assert!(matches!(
            compare(&[year("Y1", 100, 90.0)]),
            Err(AnalyticsError::InvalidSelection(_))
        ));

        let six: Vec<YearMetrics> = (1..=6).map(|i| year(&format!("Y{i}"), 100, 90.0)).collect();
        assert!(matches!(compare(&six), Err(AnalyticsError::InvalidSelection(_))));
        assert!(compare(&six[..5]).is_ok());
        assert!(matches!(compare(&[]), Err(AnalyticsError::InvalidSelection(_))));
    }

    #[test]
    fn rejects_duplicate_years() {
        assert!(matches!(
            compare(&[year("Y1", 100, 90.0), year("Y1", 110, 91.0)]),
            Err(AnalyticsError::InvalidSelection(_))
        ));
    }

    #[test]
    fn preserves_selection_order_and_uses_last_two() {
        let selected = vec![
            year("Y3", 150, 90.0),
            year("Y1", 100, 80.0),
            year("Y2", 130, 85.0),
        ];
        let result = compare(&selected).unwrap();

        let ids: Vec<&str> = result.years.iter().map(|y| y.year_id.as_str()).collect();
        assert_eq!(ids, vec!["Y3", "Y1", "Y2"]);
        assert_eq!(result.trend(Metric::TotalStudents), Some(30.0));
        assert_eq!(result.max_year(Metric::TotalStudents), Some("Y3"));
    }

    #[test]
    fn missing_operand_yields_no_trend() {
        let mut latest = year("Y2", 120, 95.0);
        latest.average_attendance = None;
        let result = compare(&[year("Y1", 100, 92.0), latest]).unwrap();

        assert_eq!(result.trends.get("attendanceChange"), Some(&None));
        assert_eq!(result.trend(Metric::TotalSubjects), None);
        assert_eq!(result.trend(Metric::TotalStudents), Some(20.0));
    }

    #[test]
    fn ties_and_zero_values_are_not_flagged() {
        let result = compare(&[year("Y1", 100, 92.0), year("Y2", 120, 95.5)]).unwrap();

        // both years report 10 classes and 0 teachers
        assert_eq!(result.max_year(Metric::TotalClasses), None);
        assert_eq!(result.max_year(Metric::TotalTeachers), None);
        assert_eq!(result.max_year(Metric::TotalSubjects), None);
    }

    #[test]
    fn tie_below_a_strict_max_still_flags_the_max() {
        let result = compare(&[
            year("Y1", 100, 90.0),
            year("Y2", 100, 90.0),
            year("Y3", 140, 90.0),
        ])
        .unwrap();

        assert_eq!(result.max_year(Metric::TotalStudents), Some("Y3"));
        assert_eq!(result.max_year(Metric::AverageAttendance), None);
    }

    #[test]
    fn trends_equal_last_minus_second_to_last_for_every_metric() {
        let selected = vec![
            year("Y1", 80, 70.0),
            year("Y2", 95, 88.5),
            year("Y3", 90, 91.0),
            year("Y4", 110, 86.25),
        ];
        let result = compare(&selected).unwrap();

        for metric in Metric::ALL {
            let expected = match (metric.value(&selected[3]), metric.value(&selected[2])) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            };
            assert_eq!(result.trend(metric), expected, "{metric:?}");
        }
    }
}
