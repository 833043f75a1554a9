use super::{Bound, BoundError, InvariantViolation, Pending, Probe, Question, QuestionContext};
use geoquiz_core::knowledge::resolve_label;
use geoquiz_core::model::country::EntityId;
use geoquiz_core::model::filter::{Constraint, Filter};
use rand::RngCore;
use rand::seq::SliceRandom;

/// Guesses a single remaining candidate and remembers every rejected guess.
#[derive(Debug, Default)]
pub struct TrivialBound {
    wrong_guesses: Vec<EntityId>,
    pending: Pending<EntityId>,
}

impl TrivialBound {
    pub const NAME: &'static str = "trivial";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrong_guesses(&self) -> &[EntityId] {
        &self.wrong_guesses
    }

    pub fn pending_guess(&self) -> Option<&EntityId> {
        self.pending.peek()
    }
}

impl Bound for TrivialBound {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get(&self) -> Filter {
        Filter::single(Constraint::NotIn(self.wrong_guesses.clone()))
    }

    fn next_question(
        &mut self,
        ctx: &QuestionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Question, BoundError> {
        self.pending.ensure_idle(Self::NAME)?;

        let candidates = ctx.kb.candidates(ctx.filter)?;
        let Some(guess) = candidates.choose(rng).cloned() else {
            return Err(BoundError::exhausted(Self::NAME, "no candidate left to guess"));
        };

        let text = format!("Is your country {}?", resolve_label(ctx.kb, &guess));
        self.pending.set(Self::NAME, guess.clone())?;
        Ok(Question {
            bound: Self::NAME,
            probe: Probe::IsCountry { country: guess },
            text,
        })
    }

    fn update(&mut self, answer: bool) -> Result<(), InvariantViolation> {
        if answer {
            return Err(match self.pending.peek() {
                Some(guess) => InvariantViolation::UnexpectedAnswer {
                    bound: Self::NAME,
                    pending: guess.to_string(),
                },
                None => InvariantViolation::NothingPending { bound: Self::NAME },
            });
        }
        let guess = self.pending.take(Self::NAME)?;
        self.wrong_guesses.push(guess);
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.pending.is_awaiting()
    }
}
