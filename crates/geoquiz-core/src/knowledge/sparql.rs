//! SPARQL rendering for every query the game issues.
//!
//! All functions are pure; [`super::WikidataClient`] only adds transport.

use crate::model::country::{ENTITY_URI_PREFIX, EntityId};
use crate::model::filter::{Constraint, Filter};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const COUNTRY_VAR: &str = "country";
pub const POPULATION_VAR: &str = "pop";
pub const WATER_VAR: &str = "water";
pub const COUNT_VAR: &str = "number";
pub const RESULT_VAR: &str = "result";
pub const LABEL_VAR: &str = "label";
pub const COUNTRY_LABEL_VAR: &str = "countryLabel";

const INSTANCE_OF: &str = "wdt:P31";
const COUNTRY_CLASS: &str = "wd:Q6256";
const POPULATION: &str = "wdt:P1082";
const NEAR_WATER: &str = "wdt:P206";
const DISSOLVED: &str = "wdt:P576";
const HISTORICAL_COUNTRY: &str = "wd:Q3024240";
const ANCIENT_CIVILIZATION: &str = "wd:Q28171280";

/// Which entities count as countries at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSet {
    /// Every instance of "country".
    Countries,
    /// Countries with an English Wikipedia article that are neither
    /// historical, ancient nor dissolved.
    #[default]
    CurrentCountries,
}

impl BaseSet {
    pub fn pattern(self) -> String {
        let mut out = format!("  ?{COUNTRY_VAR} {INSTANCE_OF} {COUNTRY_CLASS} .\n");
        if self == BaseSet::CurrentCountries {
            out.push_str("  ?article schema:about ?country .\n");
            out.push_str("  ?article schema:isPartOf <https://en.wikipedia.org/> .\n");
            let _ = writeln!(
                out,
                "  FILTER NOT EXISTS {{ ?{COUNTRY_VAR} {INSTANCE_OF} {HISTORICAL_COUNTRY} }}"
            );
            let _ = writeln!(
                out,
                "  FILTER NOT EXISTS {{ ?{COUNTRY_VAR} {INSTANCE_OF} {ANCIENT_CIVILIZATION} }}"
            );
            let _ = writeln!(
                out,
                "  FILTER NOT EXISTS {{ ?{COUNTRY_VAR} {DISSOLVED} ?dissolved }}"
            );
        }
        out
    }
}

fn id_list(ids: &[EntityId], separator: &str) -> String {
    ids.iter()
        .map(EntityId::prefixed)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Graph patterns for a single constraint.
pub fn render_constraint(constraint: &Constraint) -> String {
    match constraint {
        Constraint::NotIn(ids) => {
            format!("  FILTER(?{COUNTRY_VAR} NOT IN ({}))\n", id_list(ids, ", "))
        }
        Constraint::Population { above, at_most } => {
            let mut out = format!("  ?{COUNTRY_VAR} {POPULATION} ?{POPULATION_VAR} .\n");
            match (above, at_most) {
                (None, None) => {}
                (Some(low), None) => {
                    let _ = writeln!(out, "  FILTER(?{POPULATION_VAR} > {low})");
                }
                (None, Some(high)) => {
                    let _ = writeln!(out, "  FILTER(?{POPULATION_VAR} <= {high})");
                }
                (Some(low), Some(high)) => {
                    let _ = writeln!(
                        out,
                        "  FILTER(?{POPULATION_VAR} > {low} && ?{POPULATION_VAR} <= {high})"
                    );
                }
            }
            out
        }
        Constraint::NearWater(id) => {
            format!("  ?{COUNTRY_VAR} {NEAR_WATER} {} .\n", id.prefixed())
        }
        Constraint::NotNearWater(ids) => format!(
            "  FILTER NOT EXISTS {{\n    VALUES ?excludedWater {{ {} }}\n    ?{COUNTRY_VAR} {NEAR_WATER} ?excludedWater .\n  }}\n",
            id_list(ids, " ")
        ),
    }
}

/// Graph patterns for a whole conjunction.
pub fn render_filter(filter: &Filter) -> String {
    filter.iter().map(render_constraint).collect()
}

fn where_clause(base: BaseSet, filter: &Filter, extra: &str) -> String {
    format!(
        "WHERE {{\n{}{}{}}}",
        base.pattern(),
        render_filter(filter),
        extra
    )
}

pub fn candidates_query(base: BaseSet, filter: &Filter) -> String {
    format!(
        "SELECT DISTINCT ?{COUNTRY_VAR}\n{}",
        where_clause(base, filter, "")
    )
}

pub fn average_population_query(base: BaseSet, filter: &Filter) -> String {
    let extra = if filter.constrains_population() {
        String::new()
    } else {
        format!("  ?{COUNTRY_VAR} {POPULATION} ?{POPULATION_VAR} .\n")
    };
    format!(
        "SELECT (AVG(?{POPULATION_VAR}) AS ?{RESULT_VAR})\n{}",
        where_clause(base, filter, &extra)
    )
}

pub fn top_water_body_query(base: BaseSet, filter: &Filter, exclude: &[EntityId]) -> String {
    let mut extra = format!("  ?{COUNTRY_VAR} {NEAR_WATER} ?{WATER_VAR} .\n");
    // Unknown-value statements bind blank-node IRIs, not entities.
    let _ = writeln!(
        extra,
        "  FILTER(STRSTARTS(STR(?{WATER_VAR}), \"{ENTITY_URI_PREFIX}\"))"
    );
    if !exclude.is_empty() {
        let _ = writeln!(
            extra,
            "  FILTER(?{WATER_VAR} NOT IN ({}))",
            id_list(exclude, ", ")
        );
    }
    format!(
        "SELECT ?{WATER_VAR} (COUNT(DISTINCT ?{COUNTRY_VAR}) AS ?{COUNT_VAR})\n{}\nGROUP BY ?{WATER_VAR}\nORDER BY DESC(?{COUNT_VAR})\nLIMIT 1",
        where_clause(base, filter, &extra)
    )
}

pub fn label_query(id: &EntityId) -> String {
    format!(
        "SELECT ?{LABEL_VAR}\nWHERE {{\n  {} rdfs:label ?{LABEL_VAR} .\n  FILTER(langMatches(lang(?{LABEL_VAR}), \"EN\"))\n}}\nLIMIT 1",
        id.prefixed()
    )
}

pub fn countries_query(base: BaseSet) -> String {
    format!(
        "SELECT DISTINCT ?{COUNTRY_VAR} ?{COUNTRY_LABEL_VAR}\nWHERE {{\n{}  SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\" . }}\n}}\nORDER BY ?{COUNTRY_LABEL_VAR}",
        base.pattern()
    )
}
