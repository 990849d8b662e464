use {
    serde::Serialize,
    std::sync::atomic::{AtomicU64, Ordering},
};

/// Counters for events that the relay delivers, drops or overwrites.
#[derive(Debug, Default)]
pub struct RelayStats {
    delivered: AtomicU64,
    foreign_user: AtomicU64,
    malformed: AtomicU64,
    overwritten: AtomicU64,
    expired: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub delivered: u64,
    pub foreign_user: u64,
    pub malformed: u64,
    pub overwritten: u64,
    pub expired: u64,
}

impl RelayStats {
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_foreign_user(&self) {
        self.foreign_user.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overwritten(&self) {
        self.overwritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            foreign_user: self.foreign_user.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
