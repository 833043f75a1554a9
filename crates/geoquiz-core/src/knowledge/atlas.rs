use super::{KnowledgeBase, KnowledgeError, WaterBodyCount};
use crate::model::country::{Country, EntityId};
use crate::model::filter::{Constraint, Filter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// In-memory knowledge base. Its country list is the base set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atlas {
    #[serde(default)]
    countries: Vec<AtlasCountry>,
    #[serde(default)]
    water_bodies: Vec<AtlasWaterBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasCountry {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub waters: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasWaterBody {
    pub id: EntityId,
    pub name: String,
}

impl AtlasCountry {
    fn satisfies(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::NotIn(ids) => !ids.contains(&self.id),
            Constraint::Population { above, at_most } => match self.population {
                None => false,
                Some(pop) => {
                    above.is_none_or(|low| pop > low) && at_most.is_none_or(|high| pop <= high)
                }
            },
            Constraint::NearWater(water) => self.waters.contains(water),
            Constraint::NotNearWater(ids) => !self.waters.iter().any(|w| ids.contains(w)),
        }
    }

    pub fn matches(&self, filter: &Filter) -> bool {
        filter.iter().all(|constraint| self.satisfies(constraint))
    }
}

impl Atlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_water_body(mut self, id: EntityId, name: impl Into<String>) -> Self {
        self.water_bodies.push(AtlasWaterBody {
            id,
            name: name.into(),
        });
        self
    }

    pub fn with_country(
        mut self,
        id: EntityId,
        name: impl Into<String>,
        population: Option<u64>,
        waters: Vec<EntityId>,
    ) -> Self {
        self.countries.push(AtlasCountry {
            id,
            name: name.into(),
            population,
            waters,
        });
        self
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, AtlasError> {
        let atlas: Atlas = serde_yaml::from_str(raw).map_err(|source| AtlasError::Parse {
            source,
            path: None,
        })?;
        atlas.validate()?;
        Ok(atlas)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| AtlasError::Read {
            source,
            path: path.clone(),
        })?;
        let atlas: Atlas =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|source| AtlasError::Parse {
                source,
                path: Some(path),
            })?;
        atlas.validate()?;
        Ok(atlas)
    }

    /// Ids must be unique and every referenced water body must be declared.
    pub fn validate(&self) -> Result<(), AtlasError> {
        let mut seen = HashSet::new();
        for id in self
            .countries
            .iter()
            .map(|c| &c.id)
            .chain(self.water_bodies.iter().map(|w| &w.id))
        {
            if !seen.insert(id) {
                return Err(AtlasError::Invalid(format!("{id} is defined more than once")));
            }
        }

        for country in &self.countries {
            if let Some(water) = country
                .waters
                .iter()
                .find(|w| !self.water_bodies.iter().any(|decl| &decl.id == *w))
            {
                return Err(AtlasError::Invalid(format!(
                    "{} references undeclared water body {water}",
                    country.id
                )));
            }
        }
        Ok(())
    }

    pub fn country(&self, id: &EntityId) -> Option<&AtlasCountry> {
        self.countries.iter().find(|c| &c.id == id)
    }

    pub fn country_list(&self) -> &[AtlasCountry] {
        &self.countries
    }

    pub fn water_bodies(&self) -> &[AtlasWaterBody] {
        &self.water_bodies
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a AtlasCountry> + 'a {
        self.countries.iter().filter(move |c| c.matches(filter))
    }
}

impl KnowledgeBase for Atlas {
    fn candidates(&self, filter: &Filter) -> Result<Vec<EntityId>, KnowledgeError> {
        Ok(self.matching(filter).map(|c| c.id.clone()).collect())
    }

    fn average_population(&self, filter: &Filter) -> Result<Option<f64>, KnowledgeError> {
        let (sum, count) = self
            .matching(filter)
            .filter_map(|c| c.population)
            .fold((0u128, 0u64), |(sum, count), pop| (sum + pop as u128, count + 1));
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(sum as f64 / count as f64))
    }

    fn top_water_body(
        &self,
        filter: &Filter,
        exclude: &[EntityId],
    ) -> Result<Option<WaterBodyCount>, KnowledgeError> {
        let matching: Vec<&AtlasCountry> = self.matching(filter).collect();
        let mut best: Option<WaterBodyCount> = None;
        for water in self.water_bodies.iter().filter(|w| !exclude.contains(&w.id)) {
            let countries = matching
                .iter()
                .filter(|c| c.waters.contains(&water.id))
                .count();
            if countries == 0 {
                continue;
            }
            if best.as_ref().is_none_or(|b| countries > b.countries) {
                best = Some(WaterBodyCount {
                    water_body: water.id.clone(),
                    countries,
                });
            }
        }
        Ok(best)
    }

    fn label(&self, id: &EntityId) -> Result<String, KnowledgeError> {
        self.countries
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone())
            .or_else(|| {
                self.water_bodies
                    .iter()
                    .find(|w| &w.id == id)
                    .map(|w| w.name.clone())
            })
            .ok_or_else(|| KnowledgeError::Parse {
                operation: "label",
                message: format!("{id} is not in the atlas"),
            })
    }

    fn countries(&self) -> Result<Vec<Country>, KnowledgeError> {
        let mut countries: Vec<Country> = self
            .countries
            .iter()
            .map(|c| Country::new(c.id.clone(), c.name.clone()))
            .collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(countries)
    }
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("failed to read atlas {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse atlas {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: Option<PathBuf>,
    },
    #[error("invalid atlas: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    fn sample() -> Atlas {
        Atlas::new()
            .with_water_body(id("Q4918"), "Mediterranean Sea")
            .with_water_body(id("Q97"), "Atlantic Ocean")
            .with_country(id("Q142"), "France", Some(68_000_000), vec![id("Q4918"), id("Q97")])
            .with_country(id("Q38"), "Italy", Some(59_000_000), vec![id("Q4918")])
            .with_country(id("Q39"), "Switzerland", Some(8_800_000), vec![])
            .with_country(id("Q1"), "Nowhere", None, vec![])
    }

    #[test]
    fn population_range_is_open_below_closed_above() {
        let atlas = sample();
        let filter = Filter::single(Constraint::Population {
            above: Some(8_800_000),
            at_most: Some(59_000_000),
        });
        assert_eq!(atlas.candidates(&filter).unwrap(), vec![id("Q38")]);
    }

    #[test]
    fn open_population_constraint_drops_unknown_population() {
        let atlas = sample();
        let filter = Filter::single(Constraint::Population {
            above: None,
            at_most: None,
        });
        assert_eq!(atlas.candidates(&filter).unwrap().len(), 3);
        assert_eq!(atlas.candidates(&Filter::new()).unwrap().len(), 4);
    }

    #[test]
    fn average_ignores_missing_population() {
        let atlas = sample();
        let avg = atlas.average_population(&Filter::new()).unwrap().unwrap();
        let expected = (68_000_000.0 + 59_000_000.0 + 8_800_000.0) / 3.0;
        assert!((avg - expected).abs() < 1e-6);

        let none = Filter::single(Constraint::NotIn(vec![id("Q142"), id("Q38"), id("Q39")]));
        assert_eq!(atlas.average_population(&none).unwrap(), None);
    }

    #[test]
    fn top_water_body_counts_candidates_and_skips_excluded() {
        let atlas = sample();
        let top = atlas.top_water_body(&Filter::new(), &[]).unwrap().unwrap();
        assert_eq!(top.water_body, id("Q4918"));
        assert_eq!(top.countries, 2);

        let next = atlas.top_water_body(&Filter::new(), &[id("Q4918")]).unwrap().unwrap();
        assert_eq!(next.water_body, id("Q97"));
        assert_eq!(next.countries, 1);

        let none = atlas
            .top_water_body(&Filter::new(), &[id("Q4918"), id("Q97")])
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn water_constraints_include_and_exclude() {
        let atlas = sample();
        let near = Filter::single(Constraint::NearWater(id("Q97")));
        assert_eq!(atlas.candidates(&near).unwrap(), vec![id("Q142")]);

        let not_near = Filter::single(Constraint::NotNearWater(vec![id("Q4918")]));
        assert_eq!(atlas.candidates(&not_near).unwrap(), vec![id("Q39"), id("Q1")]);
    }

    #[test]
    fn labels_cover_countries_and_water_bodies() {
        let atlas = sample();
        assert_eq!(atlas.label(&id("Q38")).unwrap(), "Italy");
        assert_eq!(atlas.label(&id("Q97")).unwrap(), "Atlantic Ocean");
        assert!(atlas.label(&id("Q999")).is_err());
    }

    #[test]
    fn countries_are_sorted_by_name() {
        let names: Vec<String> = sample()
            .countries()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["France", "Italy", "Nowhere", "Switzerland"]);
    }

    #[test]
    fn yaml_round_trip_validates_references() {
        let ok = r#"
water_bodies:
  - { id: Q4918, name: "Mediterranean Sea" }
countries:
  - { id: Q38, name: Italy, population: 59000000, waters: [Q4918] }
"#;
        let atlas = Atlas::from_yaml_str(ok).expect("valid atlas");
        assert_eq!(atlas.country_list().len(), 1);

        let dangling = ok.replace("waters: [Q4918]", "waters: [Q97]");
        let err = Atlas::from_yaml_str(&dangling).expect_err("undeclared water body");
        assert!(matches!(err, AtlasError::Invalid(_)));

        let duplicate = format!("{ok}  - {{ id: Q38, name: Again }}\n");
        assert!(matches!(
            Atlas::from_yaml_str(&duplicate),
            Err(AtlasError::Invalid(_))
        ));
    }

    #[test]
    fn from_path_reads_file_and_reports_its_location() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("atlas.yaml");
        std::fs::write(
            &path,
            "countries:\n  - { id: Q36, name: Poland, population: 36700000 }\n",
        )
        .expect("write atlas");

        let atlas = Atlas::from_path(&path).expect("atlas loads");
        assert_eq!(atlas.label(&id("Q36")).unwrap(), "Poland");

        std::fs::write(&path, "countries: [unterminated\n").expect("write atlas");
        match Atlas::from_path(&path) {
            Err(AtlasError::Parse { path: Some(reported), .. }) => assert_eq!(reported, path),
            other => panic!("expected a parse error, got {other:?}"),
        }

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            Atlas::from_path(&missing),
            Err(AtlasError::Read { path: reported, .. }) if reported == missing
        ));
    }
}
