//! Allocation and collection types for Orrery.
//!
//! Re-exports the AHash based collections used by every cache and registry in the workspace.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert("sprites/hero", 1u32);
        assert_eq!(map.get("sprites/hero"), Some(&1));
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        assert!(set.insert(0x1000usize));
        assert!(!set.insert(0x1000usize));
    }
}
