use std::fmt::Write;

use chrono::NaiveDate;

use crate::grade::Grade;
use crate::models::{ClassAnalyticsSnapshot, ComparisonResult, Metric};
use crate::ranking;

/// One decimal place, or "N/A" when there is no value.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}"),
        None => "N/A".to_string(),
    }
}

/// Signed delta, e.g. "+20.0" or "-3.5"; "N/A" when unavailable.
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(value) if value > 0.0 => format!("+{value:.1}"),
        Some(value) => format!("{value:.1}"),
        None => "N/A".to_string(),
    }
}

pub fn snapshot_report(
    class_label: Option<&str>,
    exam_type: Option<&str>,
    generated_on: NaiveDate,
    snapshot: &ClassAnalyticsSnapshot,
    limit: usize,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Class Performance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        class_label.unwrap_or("all classes"),
        exam_type.unwrap_or("all exams"),
        generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if snapshot.is_empty() {
        let _ = writeln!(output, "No results recorded for this selection.");
        return output;
    }

    let stats = &snapshot.statistics;
    let _ = writeln!(output, "- Students: {}", snapshot.total_students);
    let _ = writeln!(output, "- Average: {}%", format_value(stats.average));
    let _ = writeln!(output, "- Highest: {}%", format_value(stats.highest));
    let _ = writeln!(output, "- Lowest: {}%", format_value(stats.lowest));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");
    for grade in Grade::ALL {
        if let Some(count) = snapshot.grade_distribution.get(&grade) {
            let _ = writeln!(output, "- {}: {} students", grade, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Students");
    for student in ranking::top(&snapshot.student_rankings, limit) {
        let _ = writeln!(
            output,
            "{}. {} ({}) {:.1}% grade {} across {}/{} exams",
            student.rank,
            student.student_name,
            student.student_id,
            student.percentage,
            student.grade,
            student.exams_attempted,
            student.total_exams
        );
    }

    output
}

pub fn comparison_report(generated_on: NaiveDate, result: &ComparisonResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Year Comparison");
    let labels: Vec<&str> = result.years.iter().map(|y| y.year_label.as_str()).collect();
    let _ = writeln!(output, "Comparing {} on {}", labels.join(", "), generated_on);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Metrics");
    for metric in Metric::ALL {
        let cells: Vec<String> = result
            .years
            .iter()
            .map(|year| {
                let value = metric_cell(metric, metric.value(year));
                if result.max_year(metric) == Some(year.year_id.as_str()) {
                    format!("{value} (highest)")
                } else {
                    value
                }
            })
            .collect();
        let _ = writeln!(output, "- {}: {}", metric.label(), cells.join(" | "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Change");
    for metric in Metric::ALL {
        let _ = writeln!(
            output,
            "- {}: {}",
            metric.label(),
            format_change(result.trend(metric))
        );
    }

    output
}

fn metric_cell(metric: Metric, value: Option<f64>) -> String {
    match (metric, value) {
        (Metric::AverageAttendance, value) => format_value(value),
        (_, Some(value)) => format!("{value:.0}"),
        (_, None) => "N/A".to_string(),
    }
}
