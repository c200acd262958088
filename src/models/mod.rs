//! Domain models for storymap.
//!
//! # Core Concepts
//!
//! - [`UserStory`]: A single requirement expressed as role/feature/benefit plus
//!   acceptance criteria. Owns its MVP membership through `mvp_id`.
//! - [`Mvp`]: A named release increment. Its member stories are never stored on
//!   the MVP itself; they are derived by filtering stories (see [`MvpWithStories`]).
//! - [`Document`]: The versioned record holding both collections. It is persisted
//!   as a single serialized blob under one storage key.
//! - [`Idea`]: A raw feature idea awaiting triage; promoted into a story.
//! - [`Profile`]: Cosmetic "logged in" marker kept under its own key.

mod document;
mod idea;
mod mvp;
mod profile;
mod story;

pub use document::*;
pub use idea::*;
pub use mvp::*;
pub use profile::*;
pub use story::*;

use chrono::Utc;
use serde::{Deserialize, Deserializer};

/// Generate a timestamp-derived id such as `US-1718031200123-9f3a`.
///
/// The millisecond timestamp keeps ids sortable by creation time; the short
/// random suffix keeps two ids minted in the same millisecond apart.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, millis, &suffix[..4])
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Used with `#[serde(default)]` so that a missing key yields `None`, while
/// `null` yields `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_differ() {
        let a = generate_id("US");
        let b = generate_id("US");
        assert!(a.starts_with("US-"));
        assert_eq!(a.split('-').count(), 3);
        assert_ne!(a, b);
    }
}
