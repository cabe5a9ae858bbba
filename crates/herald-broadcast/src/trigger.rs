//! Trigger times — `HH:MM` wall-clock points at which a broadcast fires.
//! Accepts 1- or 2-digit hours and 2-digit minutes ("9:00" and "09:00" both
//! parse); anything else is rejected with the offending token.

use chrono::Timelike;

use herald_core::error::{HeraldError, Result};

/// One scheduled firing point. Matching is on hour+minute only, so a trigger
/// fires once per matching minute on every day the loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerTime {
    pub hour: u8,
    pub minute: u8,
}

impl TriggerTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    /// Parse one `HH:MM` token.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || HeraldError::InvalidTrigger(token.to_string());
        let (h, m) = token.split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }

    /// Does this trigger match the given clock reading (hour+minute only)?
    pub fn matches(&self, now: &impl Timelike) -> bool {
        u32::from(self.hour) == now.hour() && u32::from(self.minute) == now.minute()
    }
}

impl std::fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse a comma-separated batch of `HH:MM` tokens atomically: any malformed
/// token rejects the whole batch. The result is deduplicated and sorted
/// ascending. A blank input is the empty set (disarm).
pub fn parse_batch(spec: &str) -> Result<Vec<TriggerTime>> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut times = spec
        .split(',')
        .map(|token| TriggerTime::parse(token.trim()))
        .collect::<Result<Vec<_>>>()?;
    times.sort();
    times.dedup();
    Ok(times)
}

/// True when any trigger matches the given clock reading. The set is
/// deduplicated, so at most one trigger can match per minute.
pub fn due(triggers: &[TriggerTime], now: &impl Timelike) -> bool {
    triggers.iter().any(|t| t.matches(now))
}

/// Render a trigger set the way operators entered it: "09:00, 14:30".
pub fn format_schedule(triggers: &[TriggerTime]) -> String {
    triggers
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_parse_valid() {
        let t = TriggerTime::parse("09:00").unwrap();
        assert_eq!((t.hour, t.minute), (9, 0));
        let t = TriggerTime::parse("9:05").unwrap();
        assert_eq!((t.hour, t.minute), (9, 5));
        let t = TriggerTime::parse("23:59").unwrap();
        assert_eq!((t.hour, t.minute), (23, 59));
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["24:00", "09:60", "25:61", "09", "09:0", "09:000", "a:00", "09:0b", "", ":30"] {
            assert!(TriggerTime::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_batch_dedupes_and_sorts() {
        let times = parse_batch("14:30,09:00,09:00").unwrap();
        assert_eq!(format_schedule(&times), "09:00, 14:30");
    }

    #[test]
    fn test_batch_rejects_whole_input() {
        let err = parse_batch("09:00,25:61").unwrap_err();
        assert!(err.to_string().contains("25:61"));
    }

    #[test]
    fn test_blank_batch_is_empty_set() {
        assert!(parse_batch("").unwrap().is_empty());
        assert!(parse_batch("  ").unwrap().is_empty());
    }

    #[test]
    fn test_due_matches_hour_and_minute_only() {
        let times = parse_batch("09:00").unwrap();
        let at = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert!(due(&times, &at(9, 0, 0)));
        assert!(due(&times, &at(9, 0, 42)));
        assert!(!due(&times, &at(9, 1, 0)));
        assert!(!due(&times, &at(10, 0, 0)));
        assert!(!due(&[], &at(9, 0, 0)));
    }
}
