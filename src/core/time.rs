use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Deadline for an attempt started at `start` with a limit of `minutes`.
pub(crate) fn deadline_after(start: PrimitiveDateTime, minutes: i32) -> PrimitiveDateTime {
    start + Duration::minutes(i64::from(minutes))
}

/// Whole seconds left until `deadline`, never negative.
pub(crate) fn seconds_until(now: PrimitiveDateTime, deadline: PrimitiveDateTime) -> i64 {
    (deadline - now).whole_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let value = datetime!(2025-01-02 10:20:30);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn deadline_after_adds_minutes() {
        let start = datetime!(2025-01-02 23:30:00);
        assert_eq!(deadline_after(start, 120), datetime!(2025-01-03 01:30:00));
    }

    #[test]
    fn seconds_until_clamps_past_deadlines() {
        let deadline = datetime!(2025-01-02 10:00:00);
        assert_eq!(seconds_until(datetime!(2025-01-02 09:59:00), deadline), 60);
        assert_eq!(seconds_until(datetime!(2025-01-02 10:05:00), deadline), 0);
    }
}
