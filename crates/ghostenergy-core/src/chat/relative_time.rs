//! Human-friendly ages for the chat history list.

use chrono::{DateTime, TimeZone, Utc};

/// Formats how long ago `at` happened, relative to `now`.
///
/// Times of day and dates are rendered in the time zone of `now`.
pub fn format_relative_time<Tz>(at: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let elapsed = now.clone().with_timezone(&Utc) - *at;
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    let local = at.with_timezone(&now.timezone());

    if hours < 1 {
        "Hace unos minutos".to_string()
    } else if hours < 24 {
        let plural = if hours > 1 { "s" } else { "" };
        format!("Hace {hours} hora{plural}")
    } else if days == 1 {
        format!("Ayer {}", local.format("%H:%M"))
    } else if days < 7 {
        format!("{days} días atrás")
    } else {
        local.format("%-d/%-m/%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_minutes_ago() {
        assert_eq!(format_relative_time(&utc(10, 14, 30), &utc(10, 15, 0)), "Hace unos minutos");
    }

    #[test]
    fn test_hours_ago() {
        assert_eq!(format_relative_time(&utc(10, 13, 0), &utc(10, 15, 0)), "Hace 2 horas");
        assert_eq!(format_relative_time(&utc(10, 14, 0), &utc(10, 15, 0)), "Hace 1 hora");
    }

    #[test]
    fn test_yesterday_shows_time_of_day() {
        assert_eq!(format_relative_time(&utc(9, 8, 5), &utc(10, 15, 0)), "Ayer 08:05");
    }

    #[test]
    fn test_days_ago() {
        assert_eq!(format_relative_time(&utc(6, 15, 0), &utc(10, 15, 0)), "4 días atrás");
    }

    #[test]
    fn test_older_shows_date() {
        assert_eq!(format_relative_time(&utc(1, 15, 0), &utc(10, 15, 0)), "1/5/2024");
    }
}
