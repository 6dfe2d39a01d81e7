//! Composable pre-filter predicates.
//!
//! Category-style filtering (facility type, administrative sphere, weekday)
//! is orthogonal to proximity, so it never lives inside the distance
//! engine. These helpers build plain predicates that
//! [`find_nearby_filtered`](super::find_nearby_filtered) applies before any
//! distance is computed.

use perto_datasets::LocatedEntity;

/// A boxed entity predicate, composable with [`any_of`] and [`all_of`].
pub type EntityPredicate = Box<dyn Fn(&LocatedEntity) -> bool + Send + Sync>;

/// Matches entities whose `extra` field `key` is the string `expected`.
#[must_use]
pub fn field_equals(key: &str, expected: &str) -> EntityPredicate {
    let key = key.to_string();
    let expected = expected.to_string();
    Box::new(move |entity| entity.field_str(&key) == Some(expected.as_str()))
}

/// Case-insensitive variant of [`field_equals`] (ASCII only, which covers
/// the category codes in municipal datasets).
#[must_use]
pub fn field_equals_ci(key: &str, expected: &str) -> EntityPredicate {
    let key = key.to_string();
    let expected = expected.to_string();
    Box::new(move |entity| {
        entity
            .field_str(&key)
            .is_some_and(|value| value.eq_ignore_ascii_case(&expected))
    })
}

/// Matches when any inner predicate matches. Empty input matches nothing.
#[must_use]
pub fn any_of(predicates: Vec<EntityPredicate>) -> EntityPredicate {
    Box::new(move |entity| predicates.iter().any(|predicate| predicate(entity)))
}

/// Matches when every inner predicate matches. Empty input matches
/// everything.
#[must_use]
pub fn all_of(predicates: Vec<EntityPredicate>) -> EntityPredicate {
    Box::new(move |entity| predicates.iter().all(|predicate| predicate(entity)))
}
