//! Recency grouping of chat sessions for the history sidebar.

use super::model::ChatSession;
use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Utc};

/// Sessions partitioned by how recently they were created.
///
/// Each bucket preserves the relative order of the input. Sessions older
/// than the week boundary appear in none of them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecencyGroups<'a> {
    pub today: Vec<&'a ChatSession>,
    pub yesterday: Vec<&'a ChatSession>,
    pub this_week: Vec<&'a ChatSession>,
}

impl RecencyGroups<'_> {
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.yesterday.is_empty() && self.this_week.is_empty()
    }

    pub fn len(&self) -> usize {
        self.today.len() + self.yesterday.len() + self.this_week.len()
    }
}

/// Day boundaries, expressed as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundaries {
    today: DateTime<Utc>,
    yesterday: DateTime<Utc>,
    week: DateTime<Utc>,
}

impl Boundaries {
    fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let today = start_of_day(now);
        Self {
            today,
            yesterday: today - Duration::days(1),
            week: today - Duration::days(7),
        }
    }
}

/// Midnight of `now`'s calendar day in `now`'s own time zone.
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // midnight skipped by a DST jump
        None => Utc.from_utc_datetime(&(midnight - now.offset().fix())),
    }
}

/// Partitions `sessions` into today / yesterday / this-week buckets.
///
/// - today: `created_at >= start of today`
/// - yesterday: `start of yesterday <= created_at < start of today`
/// - this week: `start of today - 7 days <= created_at < start of yesterday`
///
/// Calendar days are computed in the time zone of `now`.
pub fn group_by_recency<'a, Tz: TimeZone>(
    sessions: &'a [ChatSession],
    now: &DateTime<Tz>,
) -> RecencyGroups<'a> {
    let bounds = Boundaries::at(now);
    let mut groups = RecencyGroups::default();

    for session in sessions {
        let at = session.created_at;
        if at >= bounds.today {
            groups.today.push(session);
        } else if at >= bounds.yesterday {
            groups.yesterday.push(session);
        } else if at >= bounds.week {
            groups.this_week.push(session);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn session_at(created_at: DateTime<Utc>, title: &str) -> ChatSession {
        let mut session = ChatSession::new(created_at);
        session.title = title.to_string();
        session
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_buckets_preserve_input_order() {
        let now = utc(2024, 5, 10, 15, 0);
        let sessions = vec![
            session_at(utc(2024, 5, 10, 14, 0), "t1"),
            session_at(utc(2024, 5, 9, 20, 0), "y1"),
            session_at(utc(2024, 5, 10, 9, 0), "t2"),
            session_at(utc(2024, 5, 5, 8, 0), "w1"),
            session_at(utc(2024, 5, 9, 1, 0), "y2"),
            session_at(utc(2024, 5, 4, 8, 0), "w2"),
        ];

        let groups = group_by_recency(&sessions, &now);
        let titles = |v: &Vec<&ChatSession>| v.iter().map(|s| s.title.clone()).collect::<Vec<_>>();

        assert_eq!(titles(&groups.today), vec!["t1", "t2"]);
        assert_eq!(titles(&groups.yesterday), vec!["y1", "y2"]);
        assert_eq!(titles(&groups.this_week), vec!["w1", "w2"]);
        assert_eq!(groups.len(), 6);
    }

    #[test]
    fn test_start_of_today_is_today() {
        let now = utc(2024, 5, 10, 15, 0);
        let sessions = vec![
            session_at(utc(2024, 5, 10, 0, 0), "midnight"),
            session_at(utc(2024, 5, 9, 23, 59), "just before"),
        ];

        let groups = group_by_recency(&sessions, &now);
        assert_eq!(groups.today.len(), 1);
        assert_eq!(groups.today[0].title, "midnight");
        assert_eq!(groups.yesterday[0].title, "just before");
    }

    #[test]
    fn test_older_than_a_week_is_dropped() {
        let now = utc(2024, 5, 10, 15, 0);
        let sessions = vec![
            session_at(utc(2024, 5, 3, 0, 0), "boundary"),
            session_at(utc(2024, 5, 2, 23, 59), "too old"),
        ];

        let groups = group_by_recency(&sessions, &now);
        assert_eq!(groups.this_week.len(), 1);
        assert_eq!(groups.this_week[0].title, "boundary");
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_days_follow_the_time_zone_of_now() {
        // 2024-05-10 01:00 in Bogotá (UTC-5) is 06:00 UTC
        let bogota = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = bogota.with_ymd_and_hms(2024, 5, 10, 1, 0, 0).unwrap();

        // 04:00 UTC is 23:00 of the previous local day
        let sessions = vec![
            session_at(utc(2024, 5, 10, 4, 0), "late yesterday"),
            session_at(utc(2024, 5, 10, 5, 30), "early today"),
        ];

        let groups = group_by_recency(&sessions, &now);
        assert_eq!(groups.today[0].title, "early today");
        assert_eq!(groups.yesterday[0].title, "late yesterday");
    }

    #[test]
    fn test_empty_input() {
        let groups = group_by_recency(&[], &Utc::now());
        assert!(groups.is_empty());
    }
}
