use chrono::{DateTime, Utc};

/// Test whether two booking intervals conflict.
///
/// Deliberately conservative: touching endpoints count as overlapping, so a
/// booking ending at 12:00 blocks another starting at exactly 12:00. This
/// forbids back-to-back bookings at the exact boundary.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!overlaps(at(10), at(12), at(13), at(15)));
        assert!(!overlaps(at(13), at(15), at(10), at(12)));
    }

    #[test]
    fn contained_interval_overlaps() {
        assert!(overlaps(at(10), at(18), at(12), at(14)));
        assert!(overlaps(at(12), at(14), at(10), at(18)));
    }

    #[test]
    fn partial_overlap() {
        assert!(overlaps(at(10), at(13), at(12), at(15)));
    }

    #[test]
    fn identical_intervals_overlap() {
        assert!(overlaps(at(10), at(12), at(10), at(12)));
    }

    #[test]
    fn touching_boundary_counts_as_overlap() {
        // Existing booking 10:00-12:00, request 12:00-14:00: rejected by policy.
        assert!(overlaps(at(10), at(12), at(12), at(14)));
        assert!(overlaps(at(12), at(14), at(10), at(12)));
    }
}
