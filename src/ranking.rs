use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::AnalyticsError;
use crate::grade;
use crate::models::StudentRanking;

/// A student's mean percentage across the exams they attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAverage {
    pub student_id: String,
    pub student_name: String,
    pub percentage: f64,
    pub exams_attempted: usize,
}

/// Orders students by percentage descending, breaking ties by student id
/// ascending, and assigns sequential ranks 1..=N. Students with equal scores
/// get different ranks; see [`rank_competition`] for shared ranks.
///
/// Each student id may appear once; duplicates are `InvalidInput`. The full
/// ranking is always returned. Use [`top`] to truncate.
pub fn rank(
    averages: Vec<StudentAverage>,
    total_exams: usize,
) -> Result<Vec<StudentRanking>, AnalyticsError> {
    let sorted = sort_averages(averages)?;

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, average)| to_ranking(average, index + 1, total_exams))
        .collect()
}

/// Competition ranking ("1, 1, 3"): equal percentages share a rank and the
/// next distinct percentage skips the shared positions. Ordering is the same
/// as [`rank`].
pub fn rank_competition(
    averages: Vec<StudentAverage>,
    total_exams: usize,
) -> Result<Vec<StudentRanking>, AnalyticsError> {
    let sorted = sort_averages(averages)?;
    let mut rankings = Vec::with_capacity(sorted.len());
    let mut previous: Option<(f64, usize)> = None;

    for (index, average) in sorted.into_iter().enumerate() {
        let position = index + 1;
        let rank = match previous {
            Some((score, shared)) if score == average.percentage => shared,
            _ => position,
        };
        previous = Some((average.percentage, rank));
        rankings.push(to_ranking(average, rank, total_exams)?);
    }

    Ok(rankings)
}

/// Caller-side truncation of a complete ranking.
pub fn top(rankings: &[StudentRanking], limit: usize) -> &[StudentRanking] {
    &rankings[..limit.min(rankings.len())]
}

fn sort_averages(mut averages: Vec<StudentAverage>) -> Result<Vec<StudentAverage>, AnalyticsError> {
    if let Some(bad) = averages.iter().find(|a| !a.percentage.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "student {} has a non-numeric average",
            bad.student_id
        )));
    }

    {
        let mut seen = HashSet::new();
        if let Some(duplicate) = averages.iter().find(|a| !seen.insert(a.student_id.as_str())) {
            return Err(AnalyticsError::InvalidInput(format!(
                "student {} appears more than once",
                duplicate.student_id
            )));
        }
    }

    averages.sort_by(compare_averages);
    Ok(averages)
}

fn compare_averages(a: &StudentAverage, b: &StudentAverage) -> Ordering {
    b.percentage
        .total_cmp(&a.percentage)
        .then_with(|| a.student_id.cmp(&b.student_id))
}

fn to_ranking(
    average: StudentAverage,
    rank: usize,
    total_exams: usize,
) -> Result<StudentRanking, AnalyticsError> {
    let grade = grade::classify(average.percentage)?;
    Ok(StudentRanking {
        student_id: average.student_id,
        student_name: average.student_name,
        percentage: average.percentage,
        grade,
        rank,
        exams_attempted: average.exams_attempted,
        total_exams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::Grade;

    fn average(id: &str, percentage: f64) -> StudentAverage {
        StudentAverage {
            student_id: id.to_string(),
            student_name: format!("Student {id}"),
            percentage,
            exams_attempted: 1,
        }
    }

    #[test]
    fn ties_break_by_student_id() {
        let rankings = rank(
            vec![average("S3", 75.0), average("S2", 90.0), average("S1", 90.0)],
            1,
        )
        .unwrap();

        let order: Vec<(&str, usize)> = rankings
            .iter()
            .map(|r| (r.student_id.as_str(), r.rank))
            .collect();
        assert_eq!(order, vec![("S1", 1), ("S2", 2), ("S3", 3)]);
        assert_eq!(rankings[0].grade, Grade::APlus);
        assert_eq!(rankings[2].grade, Grade::BPlus);
    }

    #[test]
    fn ranks_are_dense_and_scores_non_increasing() {
        let input: Vec<StudentAverage> = (0..20)
            .map(|i| average(&format!("S{:02}", i), ((i * 37) % 101) as f64))
            .collect();
        let rankings = rank(input, 4).unwrap();

        for (index, ranking) in rankings.iter().enumerate() {
            assert_eq!(ranking.rank, index + 1);
            assert_eq!(ranking.total_exams, 4);
        }
        for pair in rankings.windows(2) {
            assert!(pair[0].percentage >= pair[1].percentage);
            if pair[0].percentage == pair[1].percentage {
                assert!(pair[0].student_id < pair[1].student_id);
            }
        }
    }

    #[test]
    fn competition_ranking_shares_ranks() {
        let rankings = rank_competition(
            vec![average("S1", 90.0), average("S2", 90.0), average("S3", 75.0)],
            1,
        )
        .unwrap();

        let ranks: Vec<usize> = rankings.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
    }

    #[test]
    fn top_slices_without_overflow() {
        let rankings = rank(vec![average("S1", 50.0), average("S2", 60.0)], 1).unwrap();
        assert_eq!(top(&rankings, 1).len(), 1);
        assert_eq!(top(&rankings, 1)[0].student_id, "S2");
        assert_eq!(top(&rankings, 10).len(), 2);
    }

    #[test]
    fn rejects_nan_average() {
        let result = rank(vec![average("S1", f64::NAN)], 1);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn rejects_duplicate_student_ids() {
        let result = rank(vec![average("S1", 70.0), average("S1", 80.0)], 1);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));

        let result = rank_competition(vec![average("S2", 70.0), average("S2", 70.0)], 1);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        assert!(rank(Vec::new(), 0).unwrap().is_empty());
    }
}
