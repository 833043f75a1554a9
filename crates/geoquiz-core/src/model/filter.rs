use crate::model::country::EntityId;
use serde::{Deserialize, Serialize};

/// One piece of the candidate predicate. Every variant only ever removes
/// countries from the base set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// The country is none of the listed entities.
    NotIn(Vec<EntityId>),
    /// The country has a population figure within `(above, at_most]`.
    /// Either end may be open; with both open the country merely needs a
    /// population figure at all.
    Population {
        above: Option<u64>,
        at_most: Option<u64>,
    },
    /// The country is located in or next to the water body.
    NearWater(EntityId),
    /// The country is located in or next to none of the water bodies.
    NotNearWater(Vec<EntityId>),
}

impl Constraint {
    /// True when the constraint cannot exclude anything on its own and can be
    /// left out of a rendered query.
    pub fn is_vacuous(&self) -> bool {
        match self {
            Constraint::NotIn(ids) | Constraint::NotNearWater(ids) => ids.is_empty(),
            Constraint::Population { .. } | Constraint::NearWater(_) => false,
        }
    }
}

/// Conjunction of constraints. Bounds hand out fragments; the orchestrator
/// joins them with [`Filter::and`] into the combined predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    constraints: Vec<Constraint>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(constraint: Constraint) -> Self {
        let mut filter = Self::new();
        filter.push(constraint);
        filter
    }

    pub fn push(&mut self, constraint: Constraint) {
        if !constraint.is_vacuous() {
            self.constraints.push(constraint);
        }
    }

    pub fn and(mut self, other: Filter) -> Self {
        for constraint in other.constraints {
            self.push(constraint);
        }
        self
    }

    pub fn all<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        fragments.into_iter().fold(Filter::new(), Filter::and)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn constrains_population(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::Population { .. }))
    }
}

impl FromIterator<Constraint> for Filter {
    fn from_iter<T: IntoIterator<Item = Constraint>>(iter: T) -> Self {
        let mut filter = Filter::new();
        for constraint in iter {
            filter.push(constraint);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::{Constraint, Filter};
    use crate::model::country::EntityId;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    #[test]
    fn vacuous_constraints_are_dropped() {
        let filter = Filter::single(Constraint::NotIn(Vec::new()))
            .and(Filter::single(Constraint::NotNearWater(Vec::new())));
        assert!(filter.is_empty());
    }

    #[test]
    fn conjunction_keeps_order() {
        let left = Filter::single(Constraint::NotIn(vec![id("Q1")]));
        let right = Filter::single(Constraint::NearWater(id("Q2")));
        let combined = Filter::all([left, Filter::new(), right]);
        assert_eq!(combined.len(), 2);
        assert!(matches!(combined.constraints()[0], Constraint::NotIn(_)));
        assert!(matches!(combined.constraints()[1], Constraint::NearWater(_)));
    }

    #[test]
    fn open_population_range_still_counts() {
        let filter = Filter::single(Constraint::Population {
            above: None,
            at_most: None,
        });
        assert!(!filter.is_empty());
        assert!(filter.constrains_population());
    }
}
