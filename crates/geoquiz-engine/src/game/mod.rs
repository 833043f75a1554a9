mod player;

pub use player::{Player, Prompt};

use crate::bound::{Bound, BoundError, InvariantViolation, Probe, Question, QuestionContext};
use geoquiz_core::knowledge::{KnowledgeBase, KnowledgeError, resolve_label};
use geoquiz_core::model::country::Country;
use geoquiz_core::model::filter::Filter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::io;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Playing,
    Won,
    Contradiction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GameOutcome {
    /// Exactly one candidate is left, or the player confirmed a direct guess.
    Won { country: Country, turns: u32 },
    /// The answers exclude every country.
    Contradiction { turns: u32 },
}

impl GameOutcome {
    pub fn turns(&self) -> u32 {
        match self {
            GameOutcome::Won { turns, .. } | GameOutcome::Contradiction { turns } => *turns,
        }
    }

    pub fn state(&self) -> GameState {
        match self {
            GameOutcome::Won { .. } => GameState::Won,
            GameOutcome::Contradiction { .. } => GameState::Contradiction,
        }
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub candidates: usize,
    pub bound: &'static str,
    pub question: String,
    pub probe: Probe,
    pub answer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    Continue(TurnRecord),
    Stop(GameOutcome),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("could not read an answer from the player: {0}")]
    Player(#[from] io::Error),
    #[error("no bound can ask anything useful with {candidates} candidates left")]
    Stalled { candidates: usize },
}

/// Drives the turn loop over a fixed collection of bounds.
pub struct Orchestrator<R: RngCore = StdRng> {
    kb: Box<dyn KnowledgeBase>,
    bounds: Vec<Box<dyn Bound>>,
    player: Box<dyn Player>,
    rng: R,
    outcome: Option<GameOutcome>,
    answered: u32,
    last_count: Option<usize>,
    /// A question whose bound is pending but the player never answered.
    unanswered: Option<(usize, Question)>,
}

impl Orchestrator<StdRng> {
    pub fn with_seed(
        kb: Box<dyn KnowledgeBase>,
        bounds: Vec<Box<dyn Bound>>,
        player: Box<dyn Player>,
        seed: u64,
    ) -> Self {
        Self::new(kb, bounds, player, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> Orchestrator<R> {
    pub fn new(
        kb: Box<dyn KnowledgeBase>,
        bounds: Vec<Box<dyn Bound>>,
        player: Box<dyn Player>,
        rng: R,
    ) -> Self {
        Self {
            kb,
            bounds,
            player,
            rng,
            outcome: None,
            answered: 0,
            last_count: None,
            unanswered: None,
        }
    }

    pub fn state(&self) -> GameState {
        self.outcome
            .as_ref()
            .map_or(GameState::Playing, GameOutcome::state)
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Number of questions answered so far.
    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn bounds(&self) -> &[Box<dyn Bound>] {
        &self.bounds
    }

    pub fn knowledge_base(&self) -> &dyn KnowledgeBase {
        self.kb.as_ref()
    }

    /// Conjunction of every bound's current fragment.
    pub fn combined_filter(&self) -> Filter {
        Filter::all(self.bounds.iter().map(|bound| bound.get()))
    }

    /// Play one turn. Once the game has ended every further call returns the
    /// same `Stop` without touching the knowledge base or the player.
    ///
    /// A confirmed direct guess ends the game as well; its turn still comes
    /// back as `Continue` so the answer is reported, and the next call stops.
    ///
    /// If the player fails to answer, the error is returned and the same
    /// question is asked again on the next call.
    pub fn turn(&mut self) -> Result<TurnReport, GameError> {
        if let Some(outcome) = &self.outcome {
            return Ok(TurnReport::Stop(outcome.clone()));
        }

        let filter = self.combined_filter();
        let candidates = self.kb.candidates(&filter)?;
        let count = candidates.len();
        if let Some(previous) = self.last_count {
            if count > previous {
                return Err(InvariantViolation::CandidatesGrew {
                    previous,
                    current: count,
                }
                .into());
            }
        }
        self.last_count = Some(count);

        match candidates.as_slice() {
            [] => {
                return Ok(self.finish(GameOutcome::Contradiction {
                    turns: self.answered,
                }));
            }
            [only] => {
                let name = resolve_label(self.kb.as_ref(), only);
                return Ok(self.finish(GameOutcome::Won {
                    country: Country::new(only.clone(), name),
                    turns: self.answered,
                }));
            }
            _ => {}
        }

        let (index, question) = match self.unanswered.take() {
            Some(unanswered) => unanswered,
            None => self.pick_question(&filter, count)?,
        };
        let turn = self.answered + 1;
        let asked = self.player.ask(&Prompt {
            turn,
            candidates: count,
            question: &question,
        });
        let answer = match asked {
            Ok(answer) => answer,
            Err(err) => {
                self.unanswered = Some((index, question));
                return Err(err.into());
            }
        };
        self.answered = turn;

        event!(
            target: "geoquiz_engine::turn",
            Level::INFO,
            turn,
            candidates = count,
            bound = question.bound,
            question = %question.text,
            answer,
            "question answered"
        );

        let record = TurnRecord {
            turn,
            candidates: count,
            bound: question.bound,
            question: question.text,
            probe: question.probe,
            answer,
        };
        match &record.probe {
            Probe::IsCountry { country } if answer => {
                let name = resolve_label(self.kb.as_ref(), country);
                self.finish(GameOutcome::Won {
                    country: Country::new(country.clone(), name),
                    turns: self.answered,
                });
            }
            _ => self.bounds[index].update(answer)?,
        }
        Ok(TurnReport::Continue(record))
    }

    /// Call [`Orchestrator::turn`] until the game stops.
    pub fn run(&mut self) -> Result<GameOutcome, GameError> {
        loop {
            if let TurnReport::Stop(outcome) = self.turn()? {
                return Ok(outcome);
            }
        }
    }

    /// Ask bounds in a fresh random order until one has a useful question.
    fn pick_question(
        &mut self,
        filter: &Filter,
        count: usize,
    ) -> Result<(usize, Question), GameError> {
        let mut order: Vec<usize> = (0..self.bounds.len()).collect();
        order.shuffle(&mut self.rng);

        let ctx = QuestionContext {
            kb: self.kb.as_ref(),
            filter,
            candidates: count,
        };
        for index in order {
            match self.bounds[index].next_question(&ctx, &mut self.rng) {
                Ok(question) => return Ok((index, question)),
                Err(BoundError::Exhausted { bound, reason }) => {
                    event!(
                        target: "geoquiz_engine::turn",
                        Level::INFO,
                        bound,
                        reason = %reason,
                        candidates = count,
                        "bound exhausted"
                    );
                }
                Err(BoundError::Knowledge(err)) => return Err(err.into()),
                Err(BoundError::Invariant(err)) => return Err(err.into()),
            }
        }
        Err(GameError::Stalled { candidates: count })
    }

    fn finish(&mut self, outcome: GameOutcome) -> TurnReport {
        match &outcome {
            GameOutcome::Won { country, turns } => event!(
                target: "geoquiz_engine::game",
                Level::INFO,
                country = %country,
                turns,
                "game won"
            ),
            GameOutcome::Contradiction { turns } => event!(
                target: "geoquiz_engine::game",
                Level::INFO,
                turns,
                "no country satisfies every answer"
            ),
        }
        self.outcome = Some(outcome.clone());
        TurnReport::Stop(outcome)
    }
}
