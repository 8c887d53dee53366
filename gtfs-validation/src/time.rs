//! Time of day handling. Times are seconds since midnight of the service day and may go past
//! 24:00:00 for trips that end after midnight.

fn parse_time_impl(h: &str, m: &str, s: &str) -> Option<u32> {
    if ![h, m, s].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    let seconds: u32 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Parses `H:MM:SS` or `HH:MM:SS` into seconds since midnight
pub fn parse_time(s: &str) -> Result<u32, crate::Error> {
    let len = s.len();

    if !(7..=8).contains(&len)
        || !s.is_ascii()
        || &s[len - 3..len - 2] != ":"
        || &s[len - 6..len - 5] != ":"
    {
        return Err(crate::Error::InvalidTime(s.to_owned()));
    }
    let sec = &s[len - 2..];
    let min = &s[len - 5..len - 3];
    let hour = &s[..len - 6];
    parse_time_impl(hour, min, sec).ok_or_else(|| crate::Error::InvalidTime(s.to_owned()))
}

/// Formats seconds since midnight as `HH:MM:SS`
pub fn format_time(time: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time / 3600,
        time % 3600 / 60,
        time % 60
    )
}

/// Half-open periods `[s1, e1)` and `[s2, e2)` share at least one instant
pub fn are_periods_overlapping(s1: u32, e1: u32, s2: u32, e2: u32) -> bool {
    s1 < e2 && s2 < e1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(3600 + 60 + 1, parse_time("01:01:01").unwrap());
        assert_eq!(8 * 3600 + 30 * 60, parse_time("8:30:00").unwrap());
        assert_eq!(25 * 3600 + 59 * 60 + 59, parse_time("25:59:59").unwrap());
        assert_eq!(0, parse_time("00:00:00").unwrap());
    }

    #[test]
    fn parse_invalid_times() {
        for t in [
            "", "12:00", "12:60:00", "12:00:60", "1200:00", "ab:cd:ef", "12-00-00", "+1:00:00",
            "123:00:00", "é:00:00",
        ] {
            assert!(parse_time(t).is_err(), "{} should be invalid", t);
        }
    }

    #[test]
    fn format() {
        assert_eq!("08:05:09", format_time(8 * 3600 + 5 * 60 + 9));
        assert_eq!("26:00:00", format_time(26 * 3600));
    }

    #[test]
    fn overlaps() {
        let h = |h: u32, m: u32| h * 3600 + m * 60;
        assert!(are_periods_overlapping(h(12, 0), h(18, 0), h(15, 44), h(21, 43)));
        assert!(are_periods_overlapping(h(15, 44), h(21, 43), h(12, 0), h(18, 0)));
        // touching periods do not overlap
        assert!(!are_periods_overlapping(h(12, 0), h(18, 0), h(18, 0), h(20, 0)));
        assert!(!are_periods_overlapping(h(6, 0), h(7, 0), h(12, 0), h(18, 0)));
    }
}
