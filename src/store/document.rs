//! Versioned encoding of the [`Document`] record.
//!
//! Version 1 is `{"version":1,"stories":[...],"mvps":[...]}`. Records without
//! a `version` field use the legacy layout in which each MVP also carried a
//! `stories` array of member ids; they are upgraded on read.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::models::{Document, DocumentOrigin, Mvp, UserStory, CURRENT_DOCUMENT_VERSION};

/// Serialize a document at the current version.
pub fn encode(document: &Document) -> Result<String> {
    let mut document = document.clone();
    document.version = CURRENT_DOCUMENT_VERSION;
    Ok(serde_json::to_string(&document)?)
}

/// Parse a stored record, upgrading older layouts.
///
/// Returns [`StoreError::Corrupt`] when the record is not valid JSON or does
/// not have the expected shape, and [`StoreError::UnsupportedVersion`] when it
/// was written by a newer schema.
pub fn decode(key: &str, raw: &str) -> Result<(Document, DocumentOrigin)> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?;
    let Value::Object(fields) = &value else {
        return Err(corrupt("expected a JSON object".to_string()));
    };

    let version = match fields.get("version") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| corrupt(format!("invalid version: {}", v)))?,
    };

    if version > CURRENT_DOCUMENT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            supported: CURRENT_DOCUMENT_VERSION,
        });
    }

    if version == CURRENT_DOCUMENT_VERSION {
        let document: Document =
            serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        return Ok((document, DocumentOrigin::Stored));
    }

    let legacy: LegacyDocument =
        serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
    let document = upgrade_legacy(legacy);
    tracing::info!(
        key,
        from = version,
        stories = document.stories.len(),
        mvps = document.mvps.len(),
        "Upgraded legacy document layout"
    );
    Ok((document, DocumentOrigin::Migrated { from: version }))
}

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    stories: Vec<UserStory>,
    #[serde(default)]
    mvps: Vec<LegacyMvp>,
}

#[derive(Debug, Deserialize)]
struct LegacyMvp {
    #[serde(flatten)]
    mvp: Mvp,
    #[serde(default)]
    stories: Vec<String>,
}

/// Fold the legacy MVP member arrays into `UserStory::mvp_id`.
///
/// A story that already names an MVP keeps it. An unassigned story adopts the
/// first MVP (in collection order) that claims it. Claims on unknown story ids
/// are discarded.
fn upgrade_legacy(legacy: LegacyDocument) -> Document {
    let mut stories = legacy.stories;
    let mut mvps = Vec::with_capacity(legacy.mvps.len());

    for LegacyMvp { mvp, stories: claims } in legacy.mvps {
        for claim in claims {
            match stories.iter_mut().find(|s| s.id == claim) {
                Some(story) if story.mvp_id.is_none() => {
                    story.mvp_id = Some(mvp.id.clone());
                }
                Some(story) => {
                    if story.mvp_id.as_deref() != Some(mvp.id.as_str()) {
                        tracing::warn!(
                            story = %story.id,
                            claimed_by = %mvp.id,
                            assigned_to = ?story.mvp_id,
                            "Conflicting legacy MVP claim ignored"
                        );
                    }
                }
                None => {
                    tracing::warn!(story = %claim, mvp = %mvp.id, "Legacy MVP claims unknown story");
                }
            }
        }
        mvps.push(mvp);
    }

    Document {
        version: CURRENT_DOCUMENT_VERSION,
        stories,
        mvps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn encode_then_decode_is_stored() {
        let now = Utc::now();
        let mut story = UserStory::new("US-1", "Login", now);
        story.tags = vec!["auth".to_string(), "auth".to_string()];
        let document = Document {
            version: CURRENT_DOCUMENT_VERSION,
            stories: vec![story],
            mvps: vec![Mvp::new("M1", "Auth", now)],
        };

        let raw = encode(&document).unwrap();
        let (decoded, origin) = decode("k", &raw).unwrap();
        assert_eq!(decoded, document);
        assert_eq!(origin, DocumentOrigin::Stored);
    }

    #[test]
    fn rejects_unparseable_input_as_corrupt() {
        let err = decode("k", "{not json").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "k"));

        let err = decode("k", "[1, 2, 3]").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let err = decode("k", r#"{"version":1,"stories":"nope"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let err = decode("k", r#"{"version":"one"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn rejects_newer_versions() {
        let err = decode("k", r#"{"version":7,"stories":[],"mvps":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion {
                found: 7,
                supported: 1
            }
        ));
    }

    #[test]
    fn upgrades_legacy_member_arrays() {
        let raw = r#"{
            "stories": [
                {"id": "US-001", "title": "Registration", "mvpId": null},
                {"id": "US-002", "title": "Login", "mvpId": "mvp-2"},
                {"id": "US-003", "title": "Reset", "mvpId": null}
            ],
            "mvps": [
                {"id": "mvp-1", "name": "Auth", "status": "ready-for-sprint",
                 "stories": ["US-001", "US-002", "US-404"]},
                {"id": "mvp-2", "name": "Catalog", "stories": ["US-001"]}
            ]
        }"#;

        let (document, origin) = decode("k", raw).unwrap();
        assert_eq!(origin, DocumentOrigin::Migrated { from: 0 });
        assert_eq!(document.version, CURRENT_DOCUMENT_VERSION);

        let assignments: Vec<_> = document
            .stories
            .iter()
            .map(|s| (s.id.as_str(), s.mvp_id.as_deref()))
            .collect();
        assert_eq!(
            assignments,
            vec![
                ("US-001", Some("mvp-1")),
                ("US-002", Some("mvp-2")),
                ("US-003", None),
            ]
        );
        assert_eq!(document.mvps.len(), 2);
        assert_eq!(document.mvps[0].name, "Auth");
    }

    #[test]
    fn legacy_record_with_missing_collections_is_empty() {
        let (document, origin) = decode("k", "{}").unwrap();
        assert!(document.is_empty());
        assert_eq!(origin, DocumentOrigin::Migrated { from: 0 });
    }
}
