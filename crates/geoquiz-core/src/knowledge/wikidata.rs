use super::sparql::{self, BaseSet};
use super::{KnowledgeBase, KnowledgeError, WaterBodyCount};
use crate::model::country::{Country, EntityId};
use crate::model::filter::Filter;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{Level, event};

pub const DEFAULT_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_USER_AGENT: &str =
    concat!("geoquiz/", env!("CARGO_PKG_VERSION"), " (country guessing game)");

const RESULTS_MEDIA_TYPE: &str = "application/sparql-results+json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikidataOptions {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub base_set: BaseSet,
}

impl Default for WikidataOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            base_set: BaseSet::default(),
        }
    }
}

/// Blocking SPARQL client for a Wikidata-compatible endpoint.
pub struct WikidataClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    user_agent: String,
    base_set: BaseSet,
}

impl WikidataClient {
    pub fn new(options: WikidataOptions) -> Result<Self, KnowledgeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| KnowledgeError::Network {
                operation: "connect",
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: options.endpoint.trim_end_matches('/').to_string(),
            user_agent: options.user_agent,
            base_set: options.base_set,
        })
    }

    pub fn base_set(&self) -> BaseSet {
        self.base_set
    }

    fn run(&self, operation: &'static str, query: &str) -> Result<Vec<Row>, KnowledgeError> {
        let start = Instant::now();
        event!(
            target: "geoquiz_core::wikidata",
            Level::DEBUG,
            operation,
            query,
            "running query"
        );

        let result = self.fetch(operation, query);
        match &result {
            Ok(rows) => event!(
                target: "geoquiz_core::wikidata",
                Level::DEBUG,
                operation,
                rows = rows.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "query finished"
            ),
            Err(err) => event!(
                target: "geoquiz_core::wikidata",
                Level::ERROR,
                operation,
                query,
                error = %err,
                "query failed"
            ),
        }
        result
    }

    fn fetch(&self, operation: &'static str, query: &str) -> Result<Vec<Row>, KnowledgeError> {
        let network = |err: reqwest::Error| KnowledgeError::Network {
            operation,
            message: err.to_string(),
        };

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query)])
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, RESULTS_MEDIA_TYPE)
            .send()
            .map_err(network)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(KnowledgeError::Api {
                operation,
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().map_err(network)?;
        parse_rows(operation, &body)
    }
}

impl KnowledgeBase for WikidataClient {
    fn candidates(&self, filter: &Filter) -> Result<Vec<EntityId>, KnowledgeError> {
        const OP: &str = "candidates";
        let rows = self.run(OP, &sparql::candidates_query(self.base_set, filter))?;
        rows.iter()
            .map(|row| row.entity(OP, sparql::COUNTRY_VAR))
            .collect()
    }

    fn average_population(&self, filter: &Filter) -> Result<Option<f64>, KnowledgeError> {
        const OP: &str = "average_population";
        let rows = self.run(OP, &sparql::average_population_query(self.base_set, filter))?;
        match rows.first() {
            Some(row) if row.has(sparql::RESULT_VAR) => {
                row.number(OP, sparql::RESULT_VAR).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn top_water_body(
        &self,
        filter: &Filter,
        exclude: &[EntityId],
    ) -> Result<Option<WaterBodyCount>, KnowledgeError> {
        const OP: &str = "top_water_body";
        let query = sparql::top_water_body_query(self.base_set, filter, exclude);
        let rows = self.run(OP, &query)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        if !row.has(sparql::WATER_VAR) {
            return Ok(None);
        }

        let water_body = row.entity(OP, sparql::WATER_VAR)?;
        let countries = row.number(OP, sparql::COUNT_VAR)? as usize;
        Ok(Some(WaterBodyCount {
            water_body,
            countries,
        }))
    }

    fn label(&self, id: &EntityId) -> Result<String, KnowledgeError> {
        const OP: &str = "label";
        let rows = self.run(OP, &sparql::label_query(id))?;
        rows.first()
            .and_then(|row| row.text(sparql::LABEL_VAR))
            .map(str::to_string)
            .ok_or_else(|| KnowledgeError::Parse {
                operation: OP,
                message: format!("no English label for {id}"),
            })
    }

    fn countries(&self) -> Result<Vec<Country>, KnowledgeError> {
        const OP: &str = "countries";
        let rows = self.run(OP, &sparql::countries_query(self.base_set))?;
        rows.iter()
            .map(|row| {
                let id = row.entity(OP, sparql::COUNTRY_VAR)?;
                let name = row
                    .text(sparql::COUNTRY_LABEL_VAR)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.to_string());
                Ok(Country::new(id, name))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, Binding>>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    value: String,
}

/// One solution of a SELECT query.
#[derive(Debug)]
pub(crate) struct Row(HashMap<String, Binding>);

impl Row {
    fn has(&self, var: &str) -> bool {
        self.0.contains_key(var)
    }

    fn text(&self, var: &str) -> Option<&str> {
        self.0.get(var).map(|binding| binding.value.as_str())
    }

    fn required(&self, operation: &'static str, var: &str) -> Result<&str, KnowledgeError> {
        self.text(var).ok_or_else(|| KnowledgeError::Parse {
            operation,
            message: format!("row is missing ?{var}"),
        })
    }

    fn entity(&self, operation: &'static str, var: &str) -> Result<EntityId, KnowledgeError> {
        let raw = self.required(operation, var)?;
        EntityId::parse(raw).map_err(|err| KnowledgeError::Parse {
            operation,
            message: err.to_string(),
        })
    }

    fn number(&self, operation: &'static str, var: &str) -> Result<f64, KnowledgeError> {
        let raw = self.required(operation, var)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| KnowledgeError::Parse {
                operation,
                message: format!("?{var} is not a number: {raw:?}"),
            })
    }
}

pub(crate) fn parse_rows(operation: &'static str, body: &str) -> Result<Vec<Row>, KnowledgeError> {
    let response: SparqlResponse =
        serde_json::from_str(body).map_err(|err| KnowledgeError::Parse {
            operation,
            message: err.to_string(),
        })?;
    Ok(response.results.bindings.into_iter().map(Row).collect())
}
