//! Recipient eligibility — drop excluded recipients, keep transport order.

use std::collections::HashSet;

use herald_core::types::RecipientId;

/// Recipients present in `all` and absent from `excluded`, in the order the
/// transport enumerated them. An empty result is a normal "nothing to do this
/// cycle" outcome, not an error.
pub fn eligible(all: &[RecipientId], excluded: &HashSet<RecipientId>) -> Vec<RecipientId> {
    all.iter()
        .filter(|r| !excluded.contains(*r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<RecipientId> {
        raw.iter().map(|s| RecipientId::from(*s)).collect()
    }

    #[test]
    fn test_preserves_order() {
        let all = ids(&["g3", "g1", "g2"]);
        let excluded = HashSet::from([RecipientId::from("g1")]);
        assert_eq!(eligible(&all, &excluded), ids(&["g3", "g2"]));
    }

    #[test]
    fn test_empty_and_all_excluded() {
        let excluded: HashSet<RecipientId> = ids(&["g1", "g2"]).into_iter().collect();
        assert!(eligible(&[], &excluded).is_empty());
        assert!(eligible(&ids(&["g1", "g2"]), &excluded).is_empty());
    }

    #[test]
    fn test_no_exclusions() {
        let all = ids(&["g1", "g2"]);
        assert_eq!(eligible(&all, &HashSet::new()), all);
    }
}
