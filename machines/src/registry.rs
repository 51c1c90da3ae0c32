//! Fixture registry, grounded on the teacher's `machines::registry`
//! (`MachineEntry` + `inventory::collect!` + sorted `all()` + `find()`),
//! generalized from "named arcade system + its ROM set" to "named test
//! program + its bytecode image".

pub struct FixtureEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> Vec<u8>,
}

inventory::collect!(FixtureEntry);

/// All registered fixtures, sorted by name so iteration order is
/// deterministic across builds.
pub fn all() -> Vec<&'static FixtureEntry> {
    let mut entries: Vec<&'static FixtureEntry> = inventory::iter::<FixtureEntry>().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static FixtureEntry> {
    inventory::iter::<FixtureEntry>().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_fixtures_are_discoverable_by_name() {
        assert!(!all().is_empty());
        let first = all()[0];
        assert!(find(first.name).is_some());
    }

    #[test]
    fn unknown_fixture_name_returns_none() {
        assert!(find("no-such-fixture").is_none());
    }
}
