use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Hours of the day offered as meeting slots.
pub const SLOT_HOURS: [u32; 4] = [9, 11, 14, 16];
pub const DEFAULT_SUGGESTIONS: usize = 5;
const MAX_LOOKAHEAD_DAYS: i64 = 14;

/// Slots on the business days after `now`, earliest first.
pub fn suggest_meeting_times(now: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    let mut slots = Vec::with_capacity(count);

    for offset in 1..=MAX_LOOKAHEAD_DAYS {
        if slots.len() >= count {
            break;
        }
        let date = now.date() + Duration::days(offset);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        for hour in SLOT_HOURS {
            if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                slots.push(date.and_time(time));
            }
        }
    }

    slots.truncate(count);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_starts_next_business_day() {
        // Monday afternoon
        let slots = suggest_meeting_times(at(2024, 5, 6, 15), 5);
        assert_eq!(
            slots,
            vec![
                at(2024, 5, 7, 9),
                at(2024, 5, 7, 11),
                at(2024, 5, 7, 14),
                at(2024, 5, 7, 16),
                at(2024, 5, 8, 9),
            ]
        );
    }

    #[test]
    fn test_skips_weekend() {
        // Friday
        let slots = suggest_meeting_times(at(2024, 5, 10, 8), 5);
        assert_eq!(slots[0], at(2024, 5, 13, 9));
        assert!(slots
            .iter()
            .all(|s| !matches!(s.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_count_is_respected() {
        assert!(suggest_meeting_times(at(2024, 5, 6, 9), 0).is_empty());
        assert_eq!(suggest_meeting_times(at(2024, 5, 6, 9), 12).len(), 12);
    }
}
