//! Agent-name matching across source tables.
//!
//! No sheet guarantees a normalized agent-name format: one side may carry a
//! parenthetical qualifier ("Kim(Seoul)") or a shortened form. The linker only
//! ever asks a `NameMatcher`, so the policy can be tightened without touching
//! the linkage control flow.

/// Drop a trailing parenthetical qualifier and surrounding whitespace.
/// "Kim(Seoul)" → "Kim", "Kim （본점）" → "Kim".
pub fn strip_suffix(name: &str) -> &str {
    let cut = name
        .find(|c| c == '(' || c == '（' || c == '[')
        .unwrap_or(name.len());
    name[..cut].trim()
}

pub trait NameMatcher: Send + Sync {
    /// Stable policy name, reported in diagnostics.
    fn name(&self) -> &'static str;

    fn names_match(&self, a: &str, b: &str) -> bool;
}

/// Symmetric substring containment after suffix stripping.
///
/// Known to link "Lee" with "Leeds Mobile"; see DESIGN.md.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

impl NameMatcher for ContainmentMatcher {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        let a = strip_suffix(a);
        let b = strip_suffix(b);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a == b || a.contains(b) || b.contains(a)
    }
}

/// Equality after suffix stripping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl NameMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        let a = strip_suffix(a);
        !a.is_empty() && a == strip_suffix(b)
    }
}
