//! The knowledge-base seam.
//!
//! Everything the game knows about countries comes through [`KnowledgeBase`].
//! Two implementations ship with the crate:
//!
//! | Type              | Backing store                                   |
//! |-------------------|-------------------------------------------------|
//! | [`WikidataClient`] | remote SPARQL endpoint (blocking HTTP)          |
//! | [`Atlas`]          | in-memory fixture, optionally loaded from YAML  |

mod atlas;
pub mod sparql;
mod wikidata;

pub use atlas::{Atlas, AtlasCountry, AtlasError, AtlasWaterBody};
pub use sparql::BaseSet;
pub use wikidata::{DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, WikidataClient, WikidataOptions};

use crate::model::country::{Country, EntityId};
use crate::model::filter::Filter;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

/// A water body together with the number of current candidates next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaterBodyCount {
    pub water_body: EntityId,
    pub countries: usize,
}

/// Structured access to the country knowledge base.
///
/// Every query is restricted to the implementation's base set of countries
/// and then to `filter`.
pub trait KnowledgeBase {
    /// Distinct ids of every country satisfying `filter`.
    fn candidates(&self, filter: &Filter) -> Result<Vec<EntityId>, KnowledgeError>;

    /// Average population over the countries satisfying `filter`, or `None`
    /// when none of them has a population figure.
    fn average_population(&self, filter: &Filter) -> Result<Option<f64>, KnowledgeError>;

    /// The water body, outside `exclude`, that the largest number of
    /// countries satisfying `filter` are located in or next to.
    fn top_water_body(
        &self,
        filter: &Filter,
        exclude: &[EntityId],
    ) -> Result<Option<WaterBodyCount>, KnowledgeError>;

    /// English display name of an entity.
    fn label(&self, id: &EntityId) -> Result<String, KnowledgeError>;

    /// Every country of the base set with its display name, ordered by name.
    fn countries(&self) -> Result<Vec<Country>, KnowledgeError>;
}

impl<K: KnowledgeBase + ?Sized> KnowledgeBase for Box<K> {
    fn candidates(&self, filter: &Filter) -> Result<Vec<EntityId>, KnowledgeError> {
        (**self).candidates(filter)
    }

    fn average_population(&self, filter: &Filter) -> Result<Option<f64>, KnowledgeError> {
        (**self).average_population(filter)
    }

    fn top_water_body(
        &self,
        filter: &Filter,
        exclude: &[EntityId],
    ) -> Result<Option<WaterBodyCount>, KnowledgeError> {
        (**self).top_water_body(filter, exclude)
    }

    fn label(&self, id: &EntityId) -> Result<String, KnowledgeError> {
        (**self).label(id)
    }

    fn countries(&self) -> Result<Vec<Country>, KnowledgeError> {
        (**self).countries()
    }
}

/// Look up a display name, falling back to the raw id. Never fails.
pub fn resolve_label(kb: &dyn KnowledgeBase, id: &EntityId) -> String {
    match kb.label(id) {
        Ok(label) => label,
        Err(err) => {
            event!(
                target: "geoquiz_core::label",
                Level::WARN,
                entity = %id,
                error = %err,
                "could not resolve label; using the raw id"
            );
            id.to_string()
        }
    }
}

/// Failure of a knowledge-base operation. The remote cause (transport,
/// rejected query or unexpected payload) is kept but callers treat every
/// variant the same way.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("network error during {operation}: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },
    #[error("knowledge base rejected {operation} (status {status}): {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("malformed {operation} response: {message}")]
    Parse {
        operation: &'static str,
        message: String,
    },
}

impl KnowledgeError {
    pub fn operation(&self) -> &'static str {
        match self {
            KnowledgeError::Network { operation, .. }
            | KnowledgeError::Api { operation, .. }
            | KnowledgeError::Parse { operation, .. } => operation,
        }
    }
}
