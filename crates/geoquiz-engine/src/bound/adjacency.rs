use super::{Bound, BoundError, InvariantViolation, Pending, Probe, Question, QuestionContext};
use geoquiz_core::knowledge::{KnowledgeError, resolve_label};
use geoquiz_core::model::country::EntityId;
use geoquiz_core::model::filter::{Constraint, Filter};
use rand::RngCore;
use std::collections::BTreeSet;

/// Splits candidates on the water body most of them border.
#[derive(Debug, Default)]
pub struct AdjacencyBound {
    near: BTreeSet<EntityId>,
    not_near: BTreeSet<EntityId>,
    pending: Pending<EntityId>,
}

impl AdjacencyBound {
    pub const NAME: &'static str = "adjacency";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn near(&self) -> &BTreeSet<EntityId> {
        &self.near
    }

    pub fn not_near(&self) -> &BTreeSet<EntityId> {
        &self.not_near
    }

    pub fn pending_water_body(&self) -> Option<&EntityId> {
        self.pending.peek()
    }

    fn asked(&self) -> Vec<EntityId> {
        self.near.iter().chain(&self.not_near).cloned().collect()
    }
}

impl Bound for AdjacencyBound {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get(&self) -> Filter {
        let mut filter: Filter = self
            .near
            .iter()
            .cloned()
            .map(Constraint::NearWater)
            .collect();
        filter.push(Constraint::NotNearWater(
            self.not_near.iter().cloned().collect(),
        ));
        filter
    }

    fn next_question(
        &mut self,
        ctx: &QuestionContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Question, BoundError> {
        self.pending.ensure_idle(Self::NAME)?;

        let exclude = self.asked();
        let Some(top) = ctx.kb.top_water_body(ctx.filter, &exclude)? else {
            return Err(BoundError::exhausted(
                Self::NAME,
                "no unasked water body borders any candidate",
            ));
        };
        if exclude.contains(&top.water_body) {
            return Err(KnowledgeError::Parse {
                operation: "top_water_body",
                message: format!("{} was excluded but returned", top.water_body),
            }
            .into());
        }

        let text = format!(
            "Is your country located in or next to {}?",
            resolve_label(ctx.kb, &top.water_body)
        );
        self.pending.set(Self::NAME, top.water_body.clone())?;
        Ok(Question {
            bound: Self::NAME,
            probe: Probe::NearWater {
                water_body: top.water_body,
            },
            text,
        })
    }

    fn update(&mut self, answer: bool) -> Result<(), InvariantViolation> {
        let water_body = self.pending.take(Self::NAME)?;
        if answer {
            self.near.insert(water_body);
        } else {
            self.not_near.insert(water_body);
        }
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.pending.is_awaiting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::testing::{atlas, id};
    use geoquiz_core::knowledge::{Atlas, KnowledgeBase, WaterBodyCount};
    use geoquiz_core::model::country::Country;
    use rand::rngs::mock::StepRng;

    fn ask(bound: &mut AdjacencyBound, kb: &dyn KnowledgeBase) -> Result<Question, BoundError> {
        let filter = bound.get();
        let candidates = kb.candidates(&filter).unwrap().len();
        let ctx = QuestionContext {
            kb,
            filter: &filter,
            candidates,
        };
        bound.next_question(&ctx, &mut StepRng::new(0, 0))
    }

    #[test]
    fn asks_about_most_shared_water_body() {
        let kb = atlas();
        let mut bound = AdjacencyBound::new();
        let question = ask(&mut bound, &kb).unwrap();
        assert_eq!(
            question.probe,
            Probe::NearWater {
                water_body: id("Q4918")
            }
        );
        assert_eq!(
            question.text,
            "Is your country located in or next to Mediterranean Sea?"
        );
    }

    #[test]
    fn answers_narrow_and_never_repeat() {
        let kb = atlas();
        let mut bound = AdjacencyBound::new();

        ask(&mut bound, &kb).unwrap();
        bound.update(true).unwrap();
        assert_eq!(
            kb.candidates(&bound.get()).unwrap(),
            vec![id("Q142"), id("Q38"), id("Q29")]
        );

        let second = ask(&mut bound, &kb).unwrap();
        assert_eq!(
            second.probe,
            Probe::NearWater {
                water_body: id("Q97")
            }
        );
        bound.update(false).unwrap();
        assert_eq!(kb.candidates(&bound.get()).unwrap(), vec![id("Q38")]);
        assert!(bound.near().is_disjoint(bound.not_near()));

        assert!(matches!(
            ask(&mut bound, &kb),
            Err(BoundError::Exhausted { bound: "adjacency", .. })
        ));
    }

    #[test]
    fn negative_answers_exclude_the_water_body() {
        let kb = atlas();
        let mut bound = AdjacencyBound::new();
        ask(&mut bound, &kb).unwrap();
        bound.update(false).unwrap();
        assert_eq!(
            kb.candidates(&bound.get()).unwrap(),
            vec![id("Q36"), id("Q39")]
        );
        let next = ask(&mut bound, &kb).unwrap();
        assert_eq!(
            next.probe,
            Probe::NearWater {
                water_body: id("Q545")
            }
        );
    }

    #[test]
    fn landlocked_candidates_exhaust_the_bound() {
        let kb = Atlas::new().with_country(id("Q39"), "Switzerland", Some(8_800_000), vec![]);
        let mut bound = AdjacencyBound::new();
        assert!(matches!(
            ask(&mut bound, &kb),
            Err(BoundError::Exhausted { .. })
        ));
        assert!(bound.pending_water_body().is_none());
    }

    /// Ignores the exclusion list.
    struct Stubborn(Atlas);

    impl KnowledgeBase for Stubborn {
        fn candidates(&self, filter: &Filter) -> Result<Vec<EntityId>, KnowledgeError> {
            self.0.candidates(filter)
        }

        fn average_population(&self, filter: &Filter) -> Result<Option<f64>, KnowledgeError> {
            self.0.average_population(filter)
        }

        fn top_water_body(
            &self,
            filter: &Filter,
            _exclude: &[EntityId],
        ) -> Result<Option<WaterBodyCount>, KnowledgeError> {
            self.0.top_water_body(filter, &[])
        }

        fn label(&self, id: &EntityId) -> Result<String, KnowledgeError> {
            self.0.label(id)
        }

        fn countries(&self) -> Result<Vec<Country>, KnowledgeError> {
            self.0.countries()
        }
    }

    #[test]
    fn repeated_water_body_from_knowledge_base_is_an_error() {
        let kb = Stubborn(atlas());
        let mut bound = AdjacencyBound::new();
        ask(&mut bound, &kb).unwrap();
        bound.update(true).unwrap();
        let err = ask(&mut bound, &kb).unwrap_err();
        assert!(matches!(err, BoundError::Knowledge(KnowledgeError::Parse { .. })));
        assert!(!bound.has_pending());
    }

    #[test]
    fn pending_discipline_is_enforced() {
        let kb = atlas();
        let mut bound = AdjacencyBound::new();
        assert_eq!(
            bound.update(false).unwrap_err(),
            InvariantViolation::NothingPending { bound: "adjacency" }
        );
        ask(&mut bound, &kb).unwrap();
        assert!(matches!(
            ask(&mut bound, &kb),
            Err(BoundError::Invariant(InvariantViolation::PendingAlreadySet { .. }))
        ));
    }
}
