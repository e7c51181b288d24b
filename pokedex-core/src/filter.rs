//! Pure filtering over a catalog snapshot.
//!
//! All present criteria are ANDed; an absent criterion always matches.
//! Filtering is deterministic, preserves snapshot order among matches, and
//! performs no I/O, so it can be re-derived on every criteria or snapshot
//! change.

use pokeapi::Entity;

/// A conjunction of independent predicates over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring over the entity name or its decimal id.
    pub text: Option<String>,

    /// Exact category-tag membership.
    pub category: Option<String>,

    /// Inclusive id bounds.
    pub id_range: Option<(u32, u32)>,
}

impl FilterCriteria {
    /// The empty criteria set: the identity filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_id_range(mut self, low: u32, high: u32) -> Self {
        self.id_range = Some((low, high));
        self
    }

    /// Whether no predicate is present.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.category.is_none() && self.id_range.is_none()
    }

    /// Whether a single entity satisfies every present predicate.
    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let name_hit = entity.name.to_lowercase().contains(&needle);
            let id_hit = entity.id.to_string().contains(&needle);
            if !name_hit && !id_hit {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !entity.has_category(category) {
                return false;
            }
        }

        if let Some((low, high)) = self.id_range {
            if entity.id < low || entity.id > high {
                return false;
            }
        }

        true
    }
}

/// Derive the filtered view of a snapshot.
///
/// Pure and side-effect free; returns matches in their original relative
/// order. Empty criteria returns the whole snapshot.
pub fn apply<'a>(snapshot: &'a [Entity], criteria: &FilterCriteria) -> Vec<&'a Entity> {
    snapshot.iter().filter(|e| criteria.matches(e)).collect()
}

/// Inclusive id range covered by a catalog generation, as fixed by the
/// upstream numbering (generation I is ids 1..=151, and so on).
pub fn generation_range(generation: u8) -> Option<(u32, u32)> {
    match generation {
        1 => Some((1, 151)),
        2 => Some((152, 251)),
        3 => Some((252, 386)),
        4 => Some((387, 493)),
        5 => Some((494, 649)),
        6 => Some((650, 721)),
        7 => Some((722, 809)),
        8 => Some((810, 905)),
        9 => Some((906, 1010)),
        _ => None,
    }
}
