//! Score and leaderboard computation for the kid dashboard.
//!
//! Everything here is a pure function over records fetched by the caller:
//! the persistent store and the clock are injected, never reached for
//! globally, so the whole module is testable with fixture data. Each call
//! recomputes from scratch; nothing is cached across invocations.

use db::models::{comic, kid, submission};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    /// The querying kid is absent from the fetched kid set.
    #[error("Kid not found in records")]
    KidNotFound,
    /// A submission references a comic that no longer exists. Referential
    /// integrity should make this impossible; surfaced rather than skipped.
    #[error("Submission {0} references a missing comic")]
    MissingComic(i64),
}

/// A kid together with their submissions (each paired with its comic) and
/// the total score derived from them.
#[derive(Debug, Clone)]
pub struct ScoredKid {
    pub kid: kid::Model,
    pub submissions: Vec<(submission::Model, comic::Model)>,
    pub score: i64,
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Points one submission contributes to its kid's score.
///
/// Awarded marks (0 until graded) plus the comic's bonus when the comic has
/// a deadline and the submission was created on or before it.
pub fn submission_score(sub: &submission::Model, comic: &comic::Model) -> i64 {
    let marks = i64::from(sub.marks.unwrap_or(0));
    let bonus = match comic.submission_deadline {
        Some(deadline) if sub.created_at <= deadline => i64::from(comic.bonus),
        _ => 0,
    };
    marks + bonus
}

/// Scores every kid and sorts them into leaderboard order.
///
/// Descending by score; equal scores order by ascending kid id so the
/// result is deterministic regardless of input iteration order.
pub fn compute_leaderboard(
    kids: Vec<kid::Model>,
    mut submissions_by_kid: HashMap<i64, Vec<(submission::Model, comic::Model)>>,
) -> Vec<ScoredKid> {
    let mut scored: Vec<ScoredKid> = kids
        .into_iter()
        .map(|k| {
            let submissions = submissions_by_kid.remove(&k.id).unwrap_or_default();
            let score = submissions
                .iter()
                .map(|(s, c)| submission_score(s, c))
                .sum();
            ScoredKid {
                kid: k,
                submissions,
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.kid.id.cmp(&b.kid.id)));
    scored
}

/// 1-based position of a kid on the leaderboard.
pub fn rank_of(leaderboard: &[ScoredKid], kid_id: i64) -> Result<usize, StatsError> {
    leaderboard
        .iter()
        .position(|s| s.kid.id == kid_id)
        .map(|i| i + 1)
        .ok_or(StatsError::KidNotFound)
}

/// Sum of `total_marks` over all comics: the global denominator.
pub fn grand_total_marks(comics: &[comic::Model]) -> i64 {
    comics.iter().map(|c| i64::from(c.total_marks)).sum()
}

/// A kid's score as a percentage of the grand total, or 0 when no marks
/// are achievable at all.
pub fn overall_percentage(score: i64, grand_total: i64) -> f64 {
    if grand_total <= 0 {
        return 0.0;
    }
    round2(score as f64 * 100.0 / grand_total as f64)
}

/// Per-submission progress: marks over the comic's total, with a fallback
/// denominator of 100 when the comic has no total set.
pub fn progress_percentage(marks: i32, total_marks: i32) -> f64 {
    let denominator = if total_marks > 0 { total_marks } else { 100 };
    round2(f64::from(marks) * 100.0 / f64::from(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use db::models::submission::SubmissionStatus;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn make_kid(id: i64, name: &str) -> kid::Model {
        kid::Model {
            id,
            name: name.to_string(),
            email: None,
            parent_phone: None,
            password_hash: None,
            avatar: None,
            gender: None,
            father_name: None,
            mother_name: None,
            date_of_birth: None,
            is_verified: false,
            verification_code: None,
            verification_code_expires: None,
            last_login: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn make_comic(id: i64, total_marks: i32, bonus: i32, deadline: Option<&str>) -> comic::Model {
        comic::Model {
            id,
            title: format!("Comic {id}"),
            subtitle: "sub".into(),
            description: "desc".into(),
            image: "".into(),
            category: None,
            submission_deadline: deadline.map(ts),
            bonus,
            total_marks,
            max_uploads: 1,
            document: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn make_submission(
        id: i64,
        kid_id: i64,
        comic_id: i64,
        marks: Option<i32>,
        created_at: &str,
    ) -> submission::Model {
        submission::Model {
            id,
            kid_id,
            comic_id,
            description: None,
            comments: None,
            files: "[]".into(),
            marks,
            status: if marks.is_some() {
                SubmissionStatus::Graded
            } else {
                SubmissionStatus::Pending
            },
            submission_date: ts(created_at),
            created_at: ts(created_at),
            updated_at: ts(created_at),
        }
    }

    #[test]
    fn bonus_awarded_before_deadline() {
        // Comic A: totalMarks=100, bonus=20, deadline 2024-01-31.
        // Kid X submits on 2024-01-15 and is graded 80 -> score 100.
        let comic = make_comic(1, 100, 20, Some("2024-01-31T23:59:59Z"));
        let sub = make_submission(1, 1, 1, Some(80), "2024-01-15T12:00:00Z");
        assert_eq!(submission_score(&sub, &comic), 100);
        assert_eq!(overall_percentage(100, grand_total_marks(&[comic])), 100.00);
    }

    #[test]
    fn no_bonus_after_deadline() {
        let comic = make_comic(1, 100, 20, Some("2024-01-31T23:59:59Z"));
        let sub = make_submission(1, 2, 1, Some(80), "2024-02-01T00:00:01Z");
        assert_eq!(submission_score(&sub, &comic), 80);
    }

    #[test]
    fn ungraded_submission_counts_as_zero_marks() {
        let comic = make_comic(1, 100, 0, None);
        let sub = make_submission(1, 1, 1, None, "2024-01-15T12:00:00Z");
        assert_eq!(submission_score(&sub, &comic), 0);
    }

    #[test]
    fn no_deadline_means_no_bonus() {
        let comic = make_comic(1, 100, 20, None);
        let sub = make_submission(1, 1, 1, Some(50), "2024-01-15T12:00:00Z");
        assert_eq!(submission_score(&sub, &comic), 50);
    }

    #[test]
    fn zero_grand_total_reports_zero_percentage() {
        assert_eq!(overall_percentage(42, 0), 0.0);
        assert_eq!(grand_total_marks(&[]), 0);
    }

    #[test]
    fn percentage_bounds_and_rounding() {
        assert_eq!(overall_percentage(1, 3), 33.33);
        assert_eq!(overall_percentage(2, 3), 66.67);
        assert_eq!(overall_percentage(0, 100), 0.0);
        assert_eq!(overall_percentage(100, 100), 100.0);
    }

    #[test]
    fn progress_defaults_denominator_when_total_is_zero() {
        assert_eq!(progress_percentage(50, 0), 50.0);
        assert_eq!(progress_percentage(80, 100), 80.0);
        assert_eq!(progress_percentage(1, 3), 33.33);
    }

    #[test]
    fn leaderboard_sorts_descending_with_id_tiebreak() {
        let comic = make_comic(1, 100, 0, None);
        let kids = vec![make_kid(3, "c"), make_kid(1, "a"), make_kid(2, "b")];
        let mut by_kid = HashMap::new();
        by_kid.insert(
            1,
            vec![(
                make_submission(1, 1, 1, Some(50), "2024-01-10T00:00:00Z"),
                comic.clone(),
            )],
        );
        by_kid.insert(
            2,
            vec![(
                make_submission(2, 2, 1, Some(50), "2024-01-11T00:00:00Z"),
                comic.clone(),
            )],
        );
        by_kid.insert(
            3,
            vec![(
                make_submission(3, 3, 1, Some(90), "2024-01-12T00:00:00Z"),
                comic.clone(),
            )],
        );

        let board = compute_leaderboard(kids, by_kid);
        let order: Vec<i64> = board.iter().map(|s| s.kid.id).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(rank_of(&board, 3).unwrap(), 1);
        assert_eq!(rank_of(&board, 1).unwrap(), 2);
        assert_eq!(rank_of(&board, 2).unwrap(), 3);
    }

    #[test]
    fn leaderboard_is_order_independent() {
        let comic = make_comic(1, 100, 0, None);
        let build = |kids: Vec<kid::Model>| {
            let mut by_kid = HashMap::new();
            by_kid.insert(
                1,
                vec![(
                    make_submission(1, 1, 1, Some(70), "2024-01-10T00:00:00Z"),
                    comic.clone(),
                )],
            );
            by_kid.insert(
                2,
                vec![(
                    make_submission(2, 2, 1, Some(70), "2024-01-11T00:00:00Z"),
                    comic.clone(),
                )],
            );
            compute_leaderboard(kids, by_kid)
                .iter()
                .map(|s| (s.kid.id, s.score))
                .collect::<Vec<_>>()
        };

        let forward = build(vec![make_kid(1, "a"), make_kid(2, "b")]);
        let reverse = build(vec![make_kid(2, "b"), make_kid(1, "a")]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn kid_with_no_submissions_scores_zero() {
        let kids = vec![make_kid(1, "a"), make_kid(2, "b")];
        let mut by_kid = HashMap::new();
        by_kid.insert(
            2,
            vec![(
                make_submission(1, 2, 1, Some(10), "2024-01-10T00:00:00Z"),
                make_comic(1, 100, 0, None),
            )],
        );

        let board = compute_leaderboard(kids, by_kid);
        assert_eq!(board[1].kid.id, 1);
        assert_eq!(board[1].score, 0);
        assert!(board[1].submissions.is_empty());
        assert_eq!(rank_of(&board, 1).unwrap(), 2);
    }

    #[test]
    fn rank_of_unknown_kid_is_not_found() {
        let board = compute_leaderboard(vec![make_kid(1, "a")], HashMap::new());
        assert_eq!(rank_of(&board, 99), Err(StatsError::KidNotFound));
    }
}
