use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix Wikidata puts in front of every entity URI it returns.
pub const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

const PREFIXED_FORM: &str = "wd:";

/// Opaque handle of a knowledge-base entity (`Q` followed by digits).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SPARQL prefixed name, e.g. `wd:Q142`.
    pub fn prefixed(&self) -> String {
        format!("{PREFIXED_FORM}{}", self.0)
    }

    /// Accepts a bare id, a `wd:` prefixed name or a full entity URI.
    pub fn parse(raw: &str) -> Result<Self, EntityIdError> {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix(ENTITY_URI_PREFIX)
            .or_else(|| trimmed.strip_prefix(PREFIXED_FORM))
            .unwrap_or(trimmed);

        let mut chars = bare.chars();
        let valid = matches!(chars.next(), Some('Q'))
            && bare.len() > 1
            && chars.all(|c| c.is_ascii_digit());
        if !valid {
            return Err(EntityIdError(raw.to_string()));
        }
        Ok(Self(bare.to_string()))
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a knowledge-base entity id: {0:?}")]
pub struct EntityIdError(pub String);

/// A country as reported to the player. The name is only looked up once the
/// game is decided; during play countries are handled by id alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: EntityId,
    pub name: String,
}

impl Country {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.id.as_str() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}
