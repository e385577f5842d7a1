//! The generic entity contract shared by every persisted kind.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

/// Category of a persisted entity, used as the cache partition key and the
/// store partition column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(&'static str);

impl Kind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A persisted domain object addressed by a store-assigned identifier.
///
/// The identifier is `None` until the first insert; the store assigns one and
/// it stays stable for the life of the entity. Implementations serialize the
/// whole value as the stored payload.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: Kind;

    fn id(&self) -> Option<Uuid>;

    fn set_id(&mut self, id: Uuid);
}

/// Detached snapshot of a stored entity: the form trafficked between the
/// store adapter and the caches.
///
/// The record id is authoritative; [`RawEntity::decode`] always overwrites
/// whatever id the payload carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub id: Uuid,
    pub data: Value,
}

impl RawEntity {
    pub fn new(id: Uuid, data: Value) -> Self {
        Self { id, data }
    }

    pub fn decode<E: Entity>(&self) -> Result<E, serde_json::Error> {
        let mut entity: E = serde_json::from_value(self.data.clone())?;
        entity.set_id(self.id);
        Ok(entity)
    }

    pub fn encode<E: Entity>(entity: &E) -> Result<Value, serde_json::Error> {
        serde_json::to_value(entity)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(default)]
        id: Option<Uuid>,
        body: String,
    }

    impl Entity for Note {
        const KIND: Kind = Kind::new("note");

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn set_id(&mut self, id: Uuid) {
            self.id = Some(id);
        }
    }

    #[test]
    fn decode_overrides_payload_id() {
        let stale = Uuid::new_v4();
        let assigned = Uuid::new_v4();
        let raw = RawEntity::new(
            assigned,
            serde_json::json!({ "id": stale, "body": "hello" }),
        );

        let note: Note = raw.decode().expect("decodable payload");
        assert_eq!(note.id, Some(assigned));
        assert_eq!(note.body, "hello");
    }

    #[test]
    fn decode_accepts_payload_without_id() {
        let assigned = Uuid::new_v4();
        let raw = RawEntity::new(assigned, serde_json::json!({ "body": "hi" }));

        let note: Note = raw.decode().expect("decodable payload");
        assert_eq!(note.id, Some(assigned));
    }

    #[test]
    fn kind_display_matches_name() {
        assert_eq!(Note::KIND.to_string(), "note");
        assert_eq!(Note::KIND.as_str(), "note");
    }
}
