//! Process-wide usage tallies for completed surface selections.

use std::fmt::Write as _;
use std::sync::Mutex;

use serde::Serialize;

use crate::domain::item::{SurfacePreference, Tier};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counters {
    tiers: [u64; 3],
    surfaces: [u64; 3],
    total: u64,
}

/// Shared across conversations; one `record` per completed surface choice.
#[derive(Debug, Default)]
pub struct UsageStats {
    counters: Mutex<Counters>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub label: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub total: u64,
    pub tiers: Vec<TallyEntry>,
    pub surfaces: Vec<TallyEntry>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tier: Tier, surface: SurfacePreference) {
        let mut counters = match self.counters.lock() {
            Ok(counters) => counters,
            Err(poisoned) => poisoned.into_inner(),
        };
        counters.tiers[tier.index()] += 1;
        counters.surfaces[surface.index()] += 1;
        counters.total += 1;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let counters = match self.counters.lock() {
            Ok(counters) => *counters,
            Err(poisoned) => *poisoned.into_inner(),
        };

        UsageSnapshot {
            total: counters.total,
            tiers: Tier::ALL
                .iter()
                .map(|tier| TallyEntry {
                    label: tier.label().to_owned(),
                    count: counters.tiers[tier.index()],
                })
                .collect(),
            surfaces: SurfacePreference::ALL
                .iter()
                .map(|surface| TallyEntry {
                    label: surface.label().to_owned(),
                    count: counters.surfaces[surface.index()],
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u64 {
        self.snapshot().total
    }

    pub fn report(&self) -> String {
        self.snapshot().report()
    }
}

impl UsageSnapshot {
    pub fn percentage(&self, count: u64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        count as f64 / self.total as f64 * 100.0
    }

    pub fn report(&self) -> String {
        if self.total == 0 {
            return "📊 No usage statistics yet.".to_owned();
        }

        let mut message = String::from("📊 Request statistics:\n\nBy level:\n");
        self.write_section(&mut message, &self.tiers);
        message.push_str("\nBy surface:\n");
        self.write_section(&mut message, &self.surfaces);
        message
    }

    fn write_section(&self, message: &mut String, entries: &[TallyEntry]) {
        for entry in entries {
            let _ = writeln!(
                message,
                "- {}: {} ({:.1}%)",
                entry.label,
                entry.count,
                self.percentage(entry.count)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::UsageStats;
    use crate::domain::item::{SurfacePreference, Tier};

    #[test]
    fn empty_stats_render_placeholder() {
        let stats = UsageStats::new();
        assert_eq!(stats.total(), 0);
        assert!(stats.report().contains("No usage statistics yet"));
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let stats = UsageStats::new();
        stats.record(Tier::Novice, SurfacePreference::Indoor);
        stats.record(Tier::Novice, SurfacePreference::Outdoor);
        stats.record(Tier::Professional, SurfacePreference::Indoor);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 3);

        let tier_sum: f64 = snapshot.tiers.iter().map(|entry| snapshot.percentage(entry.count)).sum();
        let surface_sum: f64 =
            snapshot.surfaces.iter().map(|entry| snapshot.percentage(entry.count)).sum();
        assert!((tier_sum - 100.0).abs() < 0.01);
        assert!((surface_sum - 100.0).abs() < 0.01);

        let report = snapshot.report();
        assert!(report.contains("- Novice: 2 (66.7%)"));
        assert!(report.contains("- Intermediate: 0 (0.0%)"));
        assert!(report.contains("- Indoor: 2 (66.7%)"));
        assert!(report.contains("- Universal use: 0 (0.0%)"));
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let stats = Arc::new(UsageStats::new());
        let handles = (0..8)
            .map(|worker| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for round in 0..250 {
                        let tier = Tier::ALL[(worker + round) % 3];
                        let surface = SurfacePreference::ALL[round % 3];
                        stats.record(tier, surface);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().expect("worker thread");
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 2_000);
        assert_eq!(snapshot.tiers.iter().map(|entry| entry.count).sum::<u64>(), 2_000);
        assert_eq!(snapshot.surfaces.iter().map(|entry| entry.count).sum::<u64>(), 2_000);
    }
}
