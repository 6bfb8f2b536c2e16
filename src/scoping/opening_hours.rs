//! Recurring time windows (`applyDuring`).
//!
//! Windows use the subset of the OSM opening-hours syntax that appears in
//! Overture data:
//!
//! ```text
//! 24/7
//! Mo-Fr 07:00-09:00,16:00-18:30; Sa 10:00-14:00
//! Fr-Mo 22:00-06:00          (wrapping day range, span past midnight)
//! Mo-Su 08:00-20:00; Su off  (later rule replaces earlier for Sunday)
//! 07:00-19:00                (no day selector: every day)
//! Sa,Su                      (no spans: whole day)
//! ```
//!
//! Spans are half-open: `07:00-09:00` contains 08:59 but not 09:00. A span
//! whose end is before its start continues past midnight into the next day;
//! that spill-over belongs to the day the span was declared on.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

pub const MINUTES_PER_DAY: u16 = 24 * 60;
pub const MINUTES_PER_WEEK: usize = 7 * MINUTES_PER_DAY as usize;

bitflags::bitflags! {
    /// Days selected by a window rule, Monday first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DaySet: u8 {
        const MO = 1 << 0;
        const TU = 1 << 1;
        const WE = 1 << 2;
        const TH = 1 << 3;
        const FR = 1 << 4;
        const SA = 1 << 5;
        const SU = 1 << 6;
    }
}

impl DaySet {
    fn day(index: u8) -> DaySet {
        DaySet::from_bits_truncate(1 << (index % 7))
    }

    fn has(self, index: u8) -> bool {
        self.contains(DaySet::day(index))
    }
}

/// A parsed `applyDuring` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalWindow {
    rules: Vec<WindowRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WindowRule {
    days: DaySet,
    spans: Vec<Span>,
    off: bool,
}

/// Minutes since midnight; `end` may be 1440 (`24:00`) or less than `start`
/// for a span that spills into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u16,
    end: u16,
}

impl Span {
    fn spills(self) -> bool {
        self.end < self.start
    }

    fn contains_same_day(self, minute: u16) -> bool {
        if self.spills() { minute >= self.start } else { minute >= self.start && minute < self.end }
    }

    fn contains_spill(self, minute: u16) -> bool {
        self.spills() && minute < self.end
    }
}

impl WindowRule {
    fn open_on_day(&self, minute: u16) -> bool {
        self.spans.is_empty() || self.spans.iter().any(|span| span.contains_same_day(minute))
    }

    fn spills_into(&self, minute: u16) -> bool {
        self.spans.iter().any(|span| span.contains_spill(minute))
    }
}

impl TemporalWindow {
    /// Parse an opening-hours string. The error is a human-readable reason.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("expression is empty".to_string());
        }

        if trimmed == "24/7" {
            let rule = WindowRule { days: DaySet::all(), spans: Vec::new(), off: false };
            return Ok(TemporalWindow { rules: vec![rule] });
        }

        let mut rules = Vec::new();
        for part in trimmed.split(';') {
            let part = part.trim();
            if part.is_empty() {
                return Err("empty rule between ';' separators".to_string());
            }
            rules.push(parse_rule(part)?);
        }

        Ok(TemporalWindow { rules })
    }

    /// True when `at` falls inside the window.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.weekday().num_days_from_monday() as u8;
        let minute = (at.hour() * 60 + at.minute()) as u16;
        self.contains_minute(day, minute)
    }

    /// `day` is 0 for Monday; `minute` counts from midnight.
    ///
    /// The last rule selecting `day` decides its own hours; the last rule
    /// selecting the day before decides what spills over midnight.
    pub fn contains_minute(&self, day: u8, minute: u16) -> bool {
        let yesterday = (day + 6) % 7;
        let mut same_day = false;
        let mut spill = false;

        for rule in &self.rules {
            if rule.days.has(day) {
                same_day = !rule.off && rule.open_on_day(minute);
            }
            if rule.days.has(yesterday) {
                spill = !rule.off && rule.spills_into(minute);
            }
        }

        same_day || spill
    }

    /// Every minute of the week this window is open.
    pub fn week_mask(&self) -> WeekMask {
        let mut mask = WeekMask::empty();
        for day in 0..7u8 {
            for minute in 0..MINUTES_PER_DAY {
                if self.contains_minute(day, minute) {
                    mask.set(day as usize * MINUTES_PER_DAY as usize + minute as usize);
                }
            }
        }
        mask
    }
}

fn parse_rule(part: &str) -> Result<WindowRule, String> {
    let (selector, rest) = match part.split_once(char::is_whitespace) {
        Some((head, tail)) if is_day_selector(head) => (Some(head), tail.trim()),
        _ if is_day_selector(part) => (Some(part), ""),
        _ => (None, part),
    };

    let days = match selector {
        Some(selector) => parse_days(selector)?,
        None => DaySet::all(),
    };

    if rest == "off" {
        return Ok(WindowRule { days, spans: Vec::new(), off: true });
    }

    let spans = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|span| parse_span(span.trim())).collect::<Result<Vec<_>, _>>()?
    };

    Ok(WindowRule { days, spans, off: false })
}

fn is_day_selector(token: &str) -> bool {
    regex!(r"^(Mo|Tu|We|Th|Fr|Sa|Su)(-(Mo|Tu|We|Th|Fr|Sa|Su))?(,(Mo|Tu|We|Th|Fr|Sa|Su)(-(Mo|Tu|We|Th|Fr|Sa|Su))?)*$")
        .is_match(token)
}

fn weekday_index(name: &str) -> Result<u8, String> {
    let weekday = match name {
        "Mo" => Weekday::Mon,
        "Tu" => Weekday::Tue,
        "We" => Weekday::Wed,
        "Th" => Weekday::Thu,
        "Fr" => Weekday::Fri,
        "Sa" => Weekday::Sat,
        "Su" => Weekday::Sun,
        other => return Err(format!("unknown weekday '{other}'")),
    };
    Ok(weekday.num_days_from_monday() as u8)
}

fn parse_days(selector: &str) -> Result<DaySet, String> {
    let mut days = DaySet::empty();
    for item in selector.split(',') {
        match item.split_once('-') {
            Some((from, to)) => {
                let from = weekday_index(from)?;
                let to = weekday_index(to)?;
                // Ranges may wrap around the end of the week (Fr-Mo).
                let len = (to + 7 - from) % 7;
                for offset in 0..=len {
                    days |= DaySet::day(from + offset);
                }
            }
            None => days |= DaySet::day(weekday_index(item)?),
        }
    }
    Ok(days)
}

fn parse_span(text: &str) -> Result<Span, String> {
    let caps = regex!(r"^(\d{2}):(\d{2})-(\d{2}):(\d{2})$")
        .captures(text)
        .ok_or_else(|| format!("'{text}' is not a HH:MM-HH:MM span"))?;

    let field = |idx: usize| caps.get(idx).map_or(0, |m| m.as_str().parse::<u16>().unwrap_or(u16::MAX));
    let (start_h, start_m, end_h, end_m) = (field(1), field(2), field(3), field(4));

    if start_h > 23 || start_m > 59 {
        return Err(format!("invalid start time in '{text}'"));
    }
    if end_m > 59 || end_h > 24 || (end_h == 24 && end_m != 0) {
        return Err(format!("invalid end time in '{text}'"));
    }

    let start = start_h * 60 + start_m;
    let end = end_h * 60 + end_m;
    if start == end {
        return Err(format!("span '{text}' is empty"));
    }

    Ok(Span { start, end })
}

const WEEK_WORDS: usize = MINUTES_PER_WEEK.div_ceil(64);

/// Bitset over the 10 080 minutes of a week.
#[derive(Clone, PartialEq, Eq)]
pub struct WeekMask([u64; WEEK_WORDS]);

impl std::fmt::Debug for WeekMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeekMask").field("minutes", &self.count()).finish()
    }
}

impl WeekMask {
    pub fn empty() -> Self {
        WeekMask([0; WEEK_WORDS])
    }

    pub fn full() -> Self {
        let mut mask = WeekMask([u64::MAX; WEEK_WORDS]);
        let tail = MINUTES_PER_WEEK % 64;
        if tail != 0 {
            mask.0[WEEK_WORDS - 1] = (1u64 << tail) - 1;
        }
        mask
    }

    fn set(&mut self, minute: usize) {
        self.0[minute / 64] |= 1 << (minute % 64);
    }

    pub fn union(&mut self, other: &WeekMask) {
        for (word, bits) in self.0.iter_mut().zip(other.0.iter()) {
            *word |= bits;
        }
    }

    pub fn intersects(&self, other: &WeekMask) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }

    pub fn count(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_full(&self) -> bool {
        self.count() == MINUTES_PER_WEEK
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-01-01 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn always_open() {
        let window = TemporalWindow::parse("24/7").unwrap();
        assert!(window.contains(at(1, 0, 0)));
        assert!(window.contains(at(7, 23, 59)));
        assert!(window.week_mask().is_full());
    }

    #[test]
    fn weekday_range_with_two_spans() {
        let window = TemporalWindow::parse("Mo-Fr 07:00-09:00,16:00-18:30").unwrap();
        assert!(window.contains(at(1, 7, 0)));
        assert!(window.contains(at(5, 8, 59)));
        assert!(!window.contains(at(5, 9, 0)));
        assert!(window.contains(at(3, 18, 29)));
        assert!(!window.contains(at(6, 8, 0)));
    }

    #[test]
    fn span_spills_past_midnight_into_next_day() {
        let window = TemporalWindow::parse("Fr 22:00-02:00").unwrap();
        assert!(window.contains(at(5, 23, 0)));
        assert!(window.contains(at(6, 1, 30)));
        assert!(!window.contains(at(6, 2, 0)));
        assert!(!window.contains(at(5, 1, 30)));
    }

    #[test]
    fn later_rule_for_next_day_keeps_spill() {
        let window = TemporalWindow::parse("Sa 22:00-02:00; Su 10:00-12:00").unwrap();
        assert!(window.contains(at(7, 1, 0)));
        assert!(!window.contains(at(7, 3, 0)));
        assert!(window.contains(at(7, 11, 0)));

        let window = TemporalWindow::parse("Sa 22:00-02:00; Su off").unwrap();
        assert!(window.contains(at(7, 1, 0)));
        assert!(!window.contains(at(7, 11, 0)));

        let window = TemporalWindow::parse("Sa 22:00-02:00; Sa 10:00-12:00").unwrap();
        assert!(!window.contains(at(7, 1, 0)));
    }

    #[test]
    fn wrapping_day_range() {
        let window = TemporalWindow::parse("Sa-Mo").unwrap();
        assert!(window.contains(at(6, 12, 0)));
        assert!(window.contains(at(7, 12, 0)));
        assert!(window.contains(at(1, 12, 0)));
        assert!(!window.contains(at(2, 12, 0)));
    }

    #[test]
    fn later_rule_overrides_earlier_for_same_day() {
        let window = TemporalWindow::parse("Mo-Su 08:00-20:00; Su off").unwrap();
        assert!(window.contains(at(6, 10, 0)));
        assert!(!window.contains(at(7, 10, 0)));

        let window = TemporalWindow::parse("Mo-Fr 08:00-20:00; We 10:00-12:00").unwrap();
        assert!(!window.contains(at(3, 9, 0)));
        assert!(window.contains(at(3, 11, 0)));
    }

    #[test]
    fn spans_without_day_selector_apply_every_day() {
        let window = TemporalWindow::parse("07:00-19:00").unwrap();
        assert!(window.contains(at(7, 7, 0)));
        assert!(!window.contains(at(7, 19, 0)));
        assert_eq!(window.week_mask().count(), 7 * 12 * 60);
    }

    #[test]
    fn end_of_day_is_accepted() {
        let window = TemporalWindow::parse("Mo 12:00-24:00").unwrap();
        assert!(window.contains(at(1, 23, 59)));
        assert!(!window.contains(at(2, 0, 0)));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for input in ["", "Mo-Fr 7:00-9:00", "Xx 08:00-09:00", "Mo 25:00-26:00", "Mo 08:00-08:00", "Mo;;Tu", "Mo 12:00-24:30"] {
            assert!(TemporalWindow::parse(input).is_err(), "expected '{input}' to be rejected");
        }
    }

    #[test]
    fn masks_intersect_only_when_windows_share_a_minute() {
        let morning = TemporalWindow::parse("06:00-12:00").unwrap().week_mask();
        let afternoon = TemporalWindow::parse("12:00-18:00").unwrap().week_mask();
        let noon = TemporalWindow::parse("11:00-13:00").unwrap().week_mask();
        assert!(!morning.intersects(&afternoon));
        assert!(morning.intersects(&noon));

        let mut both = morning.clone();
        both.union(&afternoon);
        assert_eq!(both.count(), 7 * 12 * 60);
        assert!(!both.is_full());
        assert!(WeekMask::empty().is_empty());
    }
}
