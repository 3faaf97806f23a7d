//! Curated override application.
//!
//! Overrides may add packages and raise computed versions. They never
//! lower one: a computed version above the override is kept and the
//! override is reported as stale.

use std::fmt;

use inbox_core::{MergeOutcome, PackageTable};
use inbox_registry::OverrideRecord;
use semver::Version;
use tracing::warn;

/// What one override did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideOutcome {
    Inserted,
    /// The computed version was lower and has been replaced.
    Raised { computed: Version },
    /// The computed version is higher; the override was ignored.
    Stale { computed: Version },
    Unchanged,
}

/// Per-record outcomes of an override pass.
#[derive(Debug, Clone, Default)]
pub struct OverrideReport {
    pub outcomes: Vec<(String, Version, OverrideOutcome)>,
}

impl OverrideReport {
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, OverrideOutcome::Inserted))
    }

    pub fn raised(&self) -> usize {
        self.count(|o| matches!(o, OverrideOutcome::Raised { .. }))
    }

    pub fn stale(&self) -> usize {
        self.count(|o| matches!(o, OverrideOutcome::Stale { .. }))
    }

    fn count(&self, pred: impl Fn(&OverrideOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, _, o)| pred(o)).count()
    }

    /// Fold another report into this one.
    pub fn extend(&mut self, other: OverrideReport) {
        self.outcomes.extend(other.outcomes);
    }
}

impl fmt::Display for OverrideReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} overrides: {} inserted, {} raised, {} stale",
            self.outcomes.len(),
            self.inserted(),
            self.raised(),
            self.stale()
        )
    }
}

/// Apply `overrides` to `table` in order.
pub fn apply_overrides(table: &mut PackageTable, overrides: &[OverrideRecord]) -> OverrideReport {
    let mut report = OverrideReport::default();
    for record in overrides {
        let outcome = match table.merge_max(record.id.as_str(), record.version.clone()) {
            MergeOutcome::Inserted => OverrideOutcome::Inserted,
            MergeOutcome::Raised { previous } => {
                warn!(
                    id = %record.id,
                    computed = %previous,
                    override_version = %record.version,
                    "computed version is lower than the override"
                );
                OverrideOutcome::Raised { computed: previous }
            }
            MergeOutcome::Unchanged { existing } if existing > record.version => {
                warn!(
                    id = %record.id,
                    computed = %existing,
                    override_version = %record.version,
                    "computed version is higher than the override, keeping it"
                );
                OverrideOutcome::Stale { computed: existing }
            }
            MergeOutcome::Unchanged { .. } => OverrideOutcome::Unchanged,
        };
        report
            .outcomes
            .push((record.id.clone(), record.version.clone(), outcome));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn record(id: &str, version: &str) -> OverrideRecord {
        OverrideRecord {
            id: id.to_string(),
            version: ver(version),
        }
    }

    #[test]
    fn stale_override_keeps_computed_value() {
        let mut table = PackageTable::from_entries([("PkgA", ver("1.2.0"))]);
        let report = apply_overrides(&mut table, &[record("PkgA", "1.1.0")]);
        assert_eq!(table.get("PkgA"), Some(&ver("1.2.0")));
        assert_eq!(
            report.outcomes[0].2,
            OverrideOutcome::Stale {
                computed: ver("1.2.0")
            }
        );
    }

    #[test]
    fn higher_override_wins() {
        let mut table = PackageTable::from_entries([("PkgA", ver("1.2.0"))]);
        let report = apply_overrides(&mut table, &[record("pkga", "1.3.0")]);
        assert_eq!(table.get("PkgA"), Some(&ver("1.3.0")));
        assert_eq!(report.raised(), 1);
    }

    #[test]
    fn new_and_equal_overrides() {
        let mut table = PackageTable::from_entries([("PkgA", ver("1.2.0"))]);
        let report = apply_overrides(
            &mut table,
            &[record("PkgA", "1.2.0"), record("PkgB", "4.5.0")],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(report.outcomes[0].2, OverrideOutcome::Unchanged);
        assert_eq!(report.inserted(), 1);
        assert_eq!(report.to_string(), "2 overrides: 1 inserted, 0 raised, 0 stale");
    }
}
