//! Active-user bucket computation for the admin dashboard chart.
//!
//! The caller fetches every kid's `(created_at, last_login)` pair once and
//! hands the slice here together with "now"; each function walks the slice
//! per bucket. Monthly buckets use UTC boundaries, weekly and daily buckets
//! use the supplied timezone. All comparisons happen in naive local time of
//! the bucket's zone, which keeps the bounds total-ordered across DST
//! transitions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

/// The activity inputs of one kid.
#[derive(Debug, Clone, Copy)]
pub struct KidActivity {
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// One chart bucket. `total` counts kids that existed by the bucket's end,
/// `active` those who logged in during it, `offline` the remainder.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityBucket {
    pub label: String,
    pub total: u64,
    pub active: u64,
    pub offline: u64,
}

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.unwrap().pred_opt().unwrap().day()
}

fn count_bucket(
    kids: &[(NaiveDateTime, Option<NaiveDateTime>)],
    label: &str,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> ActivityBucket {
    let mut total = 0u64;
    let mut active = 0u64;
    for (created, last_login) in kids {
        let existed = match end {
            Some(end) => *created < end,
            None => true,
        };
        if existed {
            total += 1;
        }
        if let Some(ll) = last_login {
            let in_window = *ll >= start && end.map(|end| *ll < end).unwrap_or(true);
            if in_window {
                active += 1;
            }
        }
    }
    ActivityBucket {
        label: label.to_string(),
        total,
        active,
        offline: total.saturating_sub(active),
    }
}

fn zero_bucket(label: &str) -> ActivityBucket {
    ActivityBucket {
        label: label.to_string(),
        total: 0,
        active: 0,
        offline: 0,
    }
}

/// Twelve buckets, January through December of the current year, UTC.
///
/// Months after the current one report zeros. The current month counts
/// logins from its start with no upper bound, so a login recorded between
/// fetching and bucketing still lands in it.
pub fn monthly_activity(kids: &[KidActivity], now: DateTime<Utc>) -> Vec<ActivityBucket> {
    let naive: Vec<_> = kids
        .iter()
        .map(|k| (k.created_at.naive_utc(), k.last_login.map(|l| l.naive_utc())))
        .collect();
    let year = now.year();
    let current_month = now.month();

    (1..=12u32)
        .map(|month| {
            let label = MONTH_LABELS[(month - 1) as usize];
            if month > current_month {
                return zero_bucket(label);
            }
            let start = midnight(NaiveDate::from_ymd_opt(year, month, 1).unwrap());
            let end = if month == current_month {
                None
            } else {
                Some(midnight(
                    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap()
                        + Duration::days(1),
                ))
            };
            count_bucket(&naive, label, start, end)
        })
        .collect()
}

fn to_local_pairs<Tz: TimeZone>(
    kids: &[KidActivity],
    tz: &Tz,
) -> Vec<(NaiveDateTime, Option<NaiveDateTime>)> {
    kids.iter()
        .map(|k| {
            (
                k.created_at.with_timezone(tz).naive_local(),
                k.last_login.map(|l| l.with_timezone(tz).naive_local()),
            )
        })
        .collect()
}

/// Four buckets covering the current month in the caller's timezone.
///
/// Weeks 1 to 3 span seven days each; week 4 runs to the last calendar day.
/// Every bucket is bounded above. Weeks that have not started yet report
/// zeros.
pub fn weekly_activity<Tz: TimeZone>(kids: &[KidActivity], now: &DateTime<Tz>) -> Vec<ActivityBucket> {
    let naive = to_local_pairs(kids, &now.timezone());
    let now_local = now.naive_local();
    let year = now_local.year();
    let month = now_local.month();
    let last_day = days_in_month(year, month);

    (0..4u32)
        .map(|week| {
            let label = format!("Week {}", week + 1);
            let first = week * 7 + 1;
            if first > last_day {
                return zero_bucket(&label);
            }
            let start = midnight(NaiveDate::from_ymd_opt(year, month, first).unwrap());
            if start > now_local {
                return zero_bucket(&label);
            }
            let end_day = if week == 3 { last_day } else { (first + 6).min(last_day) };
            let end = midnight(NaiveDate::from_ymd_opt(year, month, end_day).unwrap())
                + Duration::days(1);
            count_bucket(&naive, &label, start, Some(end))
        })
        .collect()
}

/// Seven buckets, the six days before today plus today, in the caller's
/// timezone, labeled by weekday.
pub fn daily_activity<Tz: TimeZone>(kids: &[KidActivity], now: &DateTime<Tz>) -> Vec<ActivityBucket> {
    let naive = to_local_pairs(kids, &now.timezone());
    let today = now.naive_local().date();

    (0..7i64)
        .map(|offset| {
            let date = today - Duration::days(6 - offset);
            let label = date.weekday().to_string();
            let start = midnight(date);
            count_bucket(&naive, &label, start, Some(start + Duration::days(1)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn kid(created: &str, last_login: Option<&str>) -> KidActivity {
        KidActivity {
            created_at: ts(created),
            last_login: last_login.map(ts),
        }
    }

    // 2024-06-15 12:00 UTC is a Saturday.
    fn june_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn monthly_future_months_are_zero() {
        let kids = vec![kid("2024-01-10T00:00:00Z", Some("2024-03-05T00:00:00Z"))];
        let buckets = monthly_activity(&kids, june_now());
        assert_eq!(buckets.len(), 12);
        for b in &buckets[6..] {
            assert_eq!((b.total, b.active, b.offline), (0, 0, 0));
        }
        assert_eq!(buckets[11].label, "Dec");
    }

    #[test]
    fn monthly_counts_creation_and_logins() {
        let kids = vec![
            kid("2024-01-10T00:00:00Z", Some("2024-03-05T00:00:00Z")),
            kid("2024-02-20T00:00:00Z", Some("2024-06-14T08:00:00Z")),
            kid("2024-04-01T00:00:00Z", None),
        ];
        let buckets = monthly_activity(&kids, june_now());

        // January: only the first kid exists, no logins yet.
        assert_eq!(buckets[0], ActivityBucket {
            label: "Jan".into(),
            total: 1,
            active: 0,
            offline: 1,
        });
        // March: two kids exist, one logged in.
        assert_eq!((buckets[2].total, buckets[2].active), (2, 1));
        // June (current month): all three exist, one logged in this month.
        assert_eq!((buckets[5].total, buckets[5].active), (3, 1));
    }

    #[test]
    fn monthly_current_month_has_open_upper_bound() {
        // last_login a few hours past "now" still lands in the June bucket.
        let kids = vec![kid("2024-01-01T00:00:00Z", Some("2024-06-15T20:00:00Z"))];
        let buckets = monthly_activity(&kids, june_now());
        assert_eq!(buckets[5].active, 1);
    }

    #[test]
    fn bucket_invariant_holds_everywhere() {
        let kids = vec![
            kid("2024-01-10T00:00:00Z", Some("2024-06-01T00:00:00Z")),
            kid("2024-05-20T00:00:00Z", None),
            kid("2024-06-10T00:00:00Z", Some("2024-06-10T01:00:00Z")),
        ];
        let now = june_now();
        for b in monthly_activity(&kids, now)
            .into_iter()
            .chain(weekly_activity(&kids, &now))
            .chain(daily_activity(&kids, &now))
        {
            assert_eq!(b.total, b.active + b.offline, "bucket {}", b.label);
            assert!(b.offline <= b.total);
        }
    }

    #[test]
    fn weekly_week_four_extends_to_month_end() {
        // Now late June so all four weeks have started.
        let now = Utc.with_ymd_and_hms(2024, 6, 29, 12, 0, 0).unwrap();
        let kids = vec![
            kid("2024-01-01T00:00:00Z", Some("2024-06-22T00:00:00Z")),
            kid("2024-01-01T00:00:00Z", Some("2024-06-30T10:00:00Z")),
        ];
        let buckets = weekly_activity(&kids, &now);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[3].label, "Week 4");
        // Both logins fall in days 22..=30.
        assert_eq!(buckets[3].active, 2);
    }

    #[test]
    fn weekly_future_weeks_are_zero() {
        // Now on the 5th: only week 1 has started.
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();
        let kids = vec![kid("2024-01-01T00:00:00Z", Some("2024-06-03T00:00:00Z"))];
        let buckets = weekly_activity(&kids, &now);
        assert_eq!(buckets[0].active, 1);
        for b in &buckets[1..] {
            assert_eq!((b.total, b.active, b.offline), (0, 0, 0));
        }
    }

    #[test]
    fn daily_covers_last_seven_days_with_weekday_labels() {
        let now = june_now(); // Saturday
        let kids = vec![
            kid("2024-01-01T00:00:00Z", Some("2024-06-15T08:00:00Z")),
            kid("2024-01-01T00:00:00Z", Some("2024-06-09T08:00:00Z")),
            kid("2024-01-01T00:00:00Z", Some("2024-06-01T08:00:00Z")),
        ];
        let buckets = daily_activity(&kids, &now);
        assert_eq!(buckets.len(), 7);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
        // June 9 was the Sunday six days back, June 15 is today.
        assert_eq!(buckets[0].active, 1);
        assert_eq!(buckets[6].active, 1);
        // The June 1 login is outside the window.
        assert_eq!(buckets.iter().map(|b| b.active).sum::<u64>(), 2);
    }

    #[test]
    fn empty_input_yields_zeroed_buckets() {
        let now = june_now();
        for b in monthly_activity(&[], now) {
            assert_eq!((b.total, b.active, b.offline), (0, 0, 0));
        }
        assert_eq!(daily_activity(&[], &now).len(), 7);
    }
}
