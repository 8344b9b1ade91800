use chrono::{DateTime, Utc};

/// Fractional days elapsed from `since` to `until`; never negative.
pub fn days_between(since: DateTime<Utc>, until: DateTime<Utc>) -> f64 {
    let seconds = until.signed_duration_since(since).num_seconds().max(0);
    seconds as f64 / 86_400.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn days_between_is_fractional_and_clamped() {
        let t0 = Utc::now();
        assert_eq!(days_between(t0, t0 + Duration::hours(36)), 1.5);
        assert_eq!(days_between(t0 + Duration::days(1), t0), 0.0);
        assert_eq!(round1(2.349), 2.3);
    }
}
