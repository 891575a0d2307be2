//! Cache key normalization.
//!
//! Asset names are logical paths such as `sprites\hero.png`. Two names that differ only in
//! separator style (and, on case-insensitive targets, in letter case) refer to the same asset and
//! must share one cache entry.

/// How normalized keys are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyComparison {
    /// Keys that differ only in letter case are the same key.
    ///
    /// Each character is folded on its own with its simple uppercase mapping, so characters
    /// whose uppercase form is several characters (`ß`) are left alone and compatibility
    /// characters such as the Kelvin sign stay distinct from their ASCII look-alikes.
    CaseInsensitive,
    /// Keys must match exactly after separator normalization.
    Exact,
}

impl KeyComparison {
    /// The comparison mode for the current target.
    ///
    /// The web target serves content from a case-sensitive store, so keys compare exactly there.
    /// Every other target compares case-insensitively.
    pub const fn platform_default() -> Self {
        if cfg!(target_arch = "wasm32") {
            KeyComparison::Exact
        } else {
            KeyComparison::CaseInsensitive
        }
    }
}

impl Default for KeyComparison {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// A normalized asset key.
///
/// `name` keeps the caller's spelling with `/` separators and is what reloads pass back to the
/// reader. `lookup` is the form used for equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    name: String,
    lookup: String,
}

impl AssetKey {
    /// Normalize `name` under the given comparison mode.
    pub fn new(name: &str, comparison: KeyComparison) -> Self {
        let name = normalize_separators(name);
        let lookup = match comparison {
            KeyComparison::CaseInsensitive => fold_case(&name),
            KeyComparison::Exact => name.clone(),
        };
        Self { name, lookup }
    }

    /// The slash-normalized, case-preserved asset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The comparison form of the key.
    pub fn lookup(&self) -> &str {
        &self.lookup
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.name, self.lookup)
    }
}

/// Per-character simple uppercase folding.
fn fold_case(name: &str) -> String {
    name.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            if upper.len() == 1 {
                upper.next().unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Replace every backslash with a forward slash.
pub fn normalize_separators(name: &str) -> String {
    name.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_unified() {
        let key = AssetKey::new("sprites\\ui\\button.png", KeyComparison::Exact);
        assert_eq!(key.name(), "sprites/ui/button.png");
        assert_eq!(key.lookup(), "sprites/ui/button.png");
    }

    #[test]
    fn test_case_insensitive_keys_match() {
        let a = AssetKey::new("sprites\\hero.png", KeyComparison::CaseInsensitive);
        let b = AssetKey::new("sprites/HERO.png", KeyComparison::CaseInsensitive);
        assert_eq!(a.lookup(), b.lookup());
        // The caller's spelling survives for reloads.
        assert_eq!(b.name(), "sprites/HERO.png");
    }

    #[test]
    fn test_case_folding_is_per_character() {
        let kelvin = AssetKey::new("\u{212A}.png", KeyComparison::CaseInsensitive);
        let k = AssetKey::new("k.png", KeyComparison::CaseInsensitive);
        assert_ne!(kelvin.lookup(), k.lookup());
        assert_eq!(k.lookup(), AssetKey::new("K.PNG", KeyComparison::CaseInsensitive).lookup());

        let sharp = AssetKey::new("straße", KeyComparison::CaseInsensitive);
        assert_eq!(sharp.lookup(), "STRAßE");
        assert_eq!(
            AssetKey::new("Ünïcode/Ω", KeyComparison::CaseInsensitive).lookup(),
            AssetKey::new("ünÏCODE/ω", KeyComparison::CaseInsensitive).lookup()
        );
    }

    #[test]
    fn test_exact_keys_keep_case() {
        let a = AssetKey::new("sprites/hero.png", KeyComparison::Exact);
        let b = AssetKey::new("sprites/HERO.png", KeyComparison::Exact);
        assert_ne!(a, b);
    }

    #[test]
    fn test_platform_default() {
        #[cfg(not(target_arch = "wasm32"))]
        assert_eq!(KeyComparison::default(), KeyComparison::CaseInsensitive);
        #[cfg(target_arch = "wasm32")]
        assert_eq!(KeyComparison::default(), KeyComparison::Exact);
    }
}
