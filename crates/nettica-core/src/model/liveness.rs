// ── Liveness classification ──
//
// Devices check in periodically and the server records `lastSeen`. The
// console derives a display status from how stale that timestamp is.

use std::time::Duration;

use chrono::{DateTime, Utc};

use nettica_api::models::{Device, Liveness, Vpn};

/// Platforms served by native OS clients. These report in rarely, so a
/// stale `lastSeen` shows as `Native` rather than `Offline`.
pub const NATIVE_PLATFORMS: [&str; 5] = ["Windows", "Native", "iOS", "Android", "MacOS"];

/// Classify a record from its last check-in.
///
/// Returns `None` when the record has never checked in.
pub fn classify(
    last_seen: Option<DateTime<Utc>>,
    platform: Option<&str>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<Liveness> {
    let last_seen = last_seen?;
    let age = (now - last_seen).abs().to_std().unwrap_or(Duration::MAX);

    if age <= window {
        return Some(Liveness::Online);
    }

    if platform.is_some_and(|p| NATIVE_PLATFORMS.contains(&p)) {
        Some(Liveness::Native)
    } else {
        Some(Liveness::Offline)
    }
}

/// Records that carry a check-in timestamp.
pub trait Observed {
    fn last_seen(&self) -> Option<DateTime<Utc>>;

    fn platform(&self) -> Option<&str> {
        None
    }

    fn set_status(&mut self, status: Option<Liveness>);

    /// Recompute the derived status relative to `now`.
    fn observe(&mut self, now: DateTime<Utc>, window: Duration) {
        let status = classify(self.last_seen(), self.platform(), now, window);
        self.set_status(status);
    }
}

impl Observed for Device {
    fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    fn set_status(&mut self, status: Option<Liveness>) {
        self.status = status;
    }
}

impl Observed for Vpn {
    fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    fn set_status(&mut self, status: Option<Liveness>) {
        self.status = status;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    fn ago(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc::now() - TimeDelta::seconds(secs))
    }

    #[test]
    fn never_seen_has_no_status() {
        assert_eq!(classify(None, Some("Linux"), Utc::now(), WINDOW), None);
    }

    #[test]
    fn recent_check_in_is_online() {
        let now = Utc::now();
        let seen = Some(now - TimeDelta::seconds(5));
        assert_eq!(classify(seen, None, now, WINDOW), Some(Liveness::Online));
    }

    #[test]
    fn stale_agent_is_offline() {
        let now = Utc::now();
        let seen = Some(now - TimeDelta::seconds(40));
        assert_eq!(
            classify(seen, Some("Linux"), now, WINDOW),
            Some(Liveness::Offline)
        );
    }

    #[test]
    fn stale_native_client_is_native() {
        let now = Utc::now();
        for platform in NATIVE_PLATFORMS {
            let seen = Some(now - TimeDelta::seconds(40));
            assert_eq!(
                classify(seen, Some(platform), now, WINDOW),
                Some(Liveness::Native),
                "{platform}"
            );
        }
    }

    #[test]
    fn fresh_native_client_is_online() {
        let now = Utc::now();
        let seen = Some(now - TimeDelta::seconds(2));
        assert_eq!(
            classify(seen, Some("iOS"), now, WINDOW),
            Some(Liveness::Online)
        );
    }

    #[test]
    fn future_timestamps_use_absolute_age() {
        let now = Utc::now();
        let skewed = Some(now + TimeDelta::seconds(120));
        assert_eq!(
            classify(skewed, None, now, WINDOW),
            Some(Liveness::Offline)
        );
    }

    #[test]
    fn observe_sets_device_status() {
        let mut device = Device {
            id: "d1".into(),
            platform: Some("iOS".into()),
            last_seen: ago(40),
            ..Device::default()
        };
        device.observe(Utc::now(), WINDOW);
        assert_eq!(device.status, Some(Liveness::Native));
    }
}
