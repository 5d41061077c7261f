// Deadline evaluation over loosely-formatted sheet text.
//
// Deadline cells are written by hand and often carry several timezone
// mentions on one line ("23:00 по ACT / 21:00 по МСК 01.02.2026"). Parsing
// extracts the first `DD.MM.YYYY` date and the first `HH:MM` time labeled
// with the configured timezone; when no time carries the label, a lone
// unlabeled time is accepted, anything more ambiguous parses to None and the
// caller skips deadline-dependent behavior for that entry.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineClass {
    Past,
    DueSoon,
    Future,
}

/// Parse deadline text into an absolute instant in the configured timezone.
/// Pure; soft-fails to None on anything it cannot pin down.
pub fn parse(text: &str, tz: FixedOffset, tz_label: &str) -> Option<DateTime<FixedOffset>> {
    let chars: Vec<char> = text.chars().collect();
    let date = find_date(&chars)?;
    let time = find_labeled_time(&chars, tz_label)?;
    tz.from_local_datetime(&date.and_time(time)).single()
}

/// Classify an instant against `now`. DueSoon is the half-open interval
/// `[now, now + window)`; identical inputs always classify identically.
pub fn classify(
    instant: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
    window: Duration,
) -> DeadlineClass {
    if instant < now {
        DeadlineClass::Past
    } else if instant - now < window {
        DeadlineClass::DueSoon
    } else {
        DeadlineClass::Future
    }
}

/// First valid `DD.MM.YYYY` in the text.
fn find_date(chars: &[char]) -> Option<NaiveDate> {
    for start in 0..chars.len() {
        if !digit_boundary(chars, start, 10) {
            continue;
        }
        let w = &chars[start..start + 10];
        if !(w[2] == '.' && w[5] == '.') {
            continue;
        }
        if ![0, 1, 3, 4, 6, 7, 8, 9].iter().all(|&i| w[i].is_ascii_digit()) {
            continue;
        }

        let day = two_digits(w[0], w[1]);
        let month = two_digits(w[3], w[4]);
        let year = (0..4).fold(0i32, |acc, i| acc * 10 + w[6 + i] as i32 - '0' as i32);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    None
}

/// First `HH:MM` carrying the timezone label, or a lone unlabeled time.
fn find_labeled_time(chars: &[char], tz_label: &str) -> Option<NaiveTime> {
    let mut times: Vec<(usize, NaiveTime)> = Vec::new();
    for start in 0..chars.len() {
        if !digit_boundary(chars, start, 5) {
            continue;
        }
        let w = &chars[start..start + 5];
        if !(w[2] == ':' && w[0].is_ascii_digit() && w[1].is_ascii_digit()
            && w[3].is_ascii_digit() && w[4].is_ascii_digit())
        {
            continue;
        }
        if let Some(time) = NaiveTime::from_hms_opt(two_digits(w[0], w[1]), two_digits(w[3], w[4]), 0)
        {
            times.push((start, time));
        }
    }

    let label = tz_label.to_lowercase();
    for (i, &(start, time)) in times.iter().enumerate() {
        // The label window runs from the end of this time up to the next
        // one; overlapping matches like "21:00:30" can start inside it
        let end = times
            .get(i + 1)
            .map(|&(next, _)| next)
            .unwrap_or(chars.len())
            .max(start + 5);
        let window: String = chars[start + 5..end].iter().collect::<String>().to_lowercase();
        if !label.is_empty() && window.contains(&label) {
            return Some(time);
        }
    }

    // A single time with no label anywhere is unambiguous enough
    if times.len() == 1 {
        return Some(times[0].1);
    }

    None
}

/// True when a window of `len` chars starting at `start` fits and is not
/// embedded in a longer digit run.
fn digit_boundary(chars: &[char], start: usize, len: usize) -> bool {
    if start + len > chars.len() {
        return false;
    }
    if start > 0 && chars[start - 1].is_ascii_digit() {
        return false;
    }
    if start + len < chars.len() && chars[start + len].is_ascii_digit() {
        return false;
    }
    true
}

fn two_digits(a: char, b: char) -> u32 {
    (a as u32 - '0' as u32) * 10 + (b as u32 - '0' as u32)
}
