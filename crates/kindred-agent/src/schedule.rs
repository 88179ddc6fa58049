// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persona's weekly schedule.
//!
//! Supplies the `{current_activity}` slot of the character card so the
//! companion's small talk stays consistent across a day. Hour bands are
//! half-open (`start <= hour < end`) in local time.

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};

/// One activity band: start hour (inclusive), end hour (exclusive), text.
type Band = (u32, u32, &'static str);

const WEEKDAY_BANDS: &[Band] = &[
    (6, 8, "just up, stretching and making the first coffee of the day"),
    (8, 9, "out on a morning walk along the river, headphones in"),
    (9, 13, "deep in studio work, sketching and answering client notes"),
    (13, 14, "grabbing lunch at the corner cafe, people-watching"),
    (14, 18, "back in the studio, heads-down on the big commission"),
    (18, 20, "cooking dinner with music on, phone within reach"),
    (20, 23, "curled up with a book or a series, half-watching"),
];

const SATURDAY_BANDS: &[Band] = &[
    (7, 9, "slow morning, pancakes and too much coffee"),
    (9, 12, "at the weekend market hunting for vegetables and vinyl"),
    (12, 15, "meeting friends for a long lunch that keeps extending"),
    (15, 19, "wandering the city with a camera, no particular plan"),
    (19, 23, "out for dinner, maybe a small gig afterwards"),
];

const SUNDAY_BANDS: &[Band] = &[
    (7, 10, "sleeping in, then reading in bed"),
    (10, 13, "tidying the flat and watering the plants"),
    (13, 16, "long call with family, then a lazy walk"),
    (16, 20, "meal-prepping for the week, podcast on"),
    (20, 23, "winding down early, planning the week ahead"),
];

const NIGHT_ACTIVITY: &str = "asleep -- replies will be slow until morning";

/// Returns the persona's current activity for the given local time.
pub fn current_activity(now: DateTime<Local>) -> &'static str {
    let bands = match now.weekday() {
        Weekday::Sat => SATURDAY_BANDS,
        Weekday::Sun => SUNDAY_BANDS,
        _ => WEEKDAY_BANDS,
    };

    let hour = now.hour();
    bands
        .iter()
        .find(|(start, end, _)| hour >= *start && hour < *end)
        .map(|(_, _, text)| *text)
        .unwrap_or(NIGHT_ACTIVITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn weekday_morning_hits_studio_band() {
        // 2026-08-05 is a Wednesday.
        let activity = current_activity(local(2026, 8, 5, 10));
        assert!(activity.contains("studio"));
    }

    #[test]
    fn saturday_uses_weekend_schedule() {
        // 2026-08-08 is a Saturday.
        let activity = current_activity(local(2026, 8, 8, 10));
        assert!(activity.contains("market"));
    }

    #[test]
    fn sunday_uses_sunday_schedule() {
        // 2026-08-09 is a Sunday.
        let activity = current_activity(local(2026, 8, 9, 11));
        assert!(activity.contains("plants"));
    }

    #[test]
    fn small_hours_fall_back_to_sleeping() {
        let activity = current_activity(local(2026, 8, 5, 3));
        assert!(activity.contains("asleep"));
    }

    #[test]
    fn every_hour_yields_some_activity() {
        for hour in 0..24 {
            let activity = current_activity(local(2026, 8, 5, hour));
            assert!(!activity.is_empty());
        }
    }
}
