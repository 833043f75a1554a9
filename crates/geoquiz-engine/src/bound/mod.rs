mod adjacency;
mod pending;
mod population;
mod trivial;

pub use adjacency::AdjacencyBound;
pub use pending::Pending;
pub use population::{PopulationBound, round_threshold};
pub use trivial::TrivialBound;

use core::fmt;
use core::str::FromStr;
use geoquiz_core::knowledge::{KnowledgeBase, KnowledgeError};
use geoquiz_core::model::country::EntityId;
use geoquiz_core::model::filter::Filter;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a bound needs to compute its next question.
pub struct QuestionContext<'a> {
    pub kb: &'a dyn KnowledgeBase,
    /// Conjunction of every bound's current fragment, this one's included.
    pub filter: &'a Filter,
    /// Size of the candidate set under `filter`.
    pub candidates: usize,
}

/// The fact a question tests, independent of its wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Probe {
    IsCountry { country: EntityId },
    PopulationAbove { threshold: u64 },
    NearWater { water_body: EntityId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub bound: &'static str,
    pub probe: Probe,
    pub text: String,
}

/// One independent dimension of narrowing.
///
/// A bound is a two-state machine: `next_question` moves it from idle to
/// awaiting an answer, `update` commits the answer and moves it back.
pub trait Bound {
    fn name(&self) -> &'static str;

    /// Current constraint of this dimension. Empty when nothing is known yet.
    fn get(&self) -> Filter;

    /// Pick the most useful value to ask about under `ctx.filter`, remember it
    /// as pending and phrase it as a yes/no question.
    fn next_question(
        &mut self,
        ctx: &QuestionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Question, BoundError>;

    /// Fold the player's answer about the pending value into the constraint.
    fn update(&mut self, answer: bool) -> Result<(), InvariantViolation>;

    fn has_pending(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum BoundError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error("{bound} bound has nothing useful left to ask: {reason}")]
    Exhausted { bound: &'static str, reason: String },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl BoundError {
    pub(crate) fn exhausted(bound: &'static str, reason: impl Into<String>) -> Self {
        BoundError::Exhausted {
            bound,
            reason: reason.into(),
        }
    }
}

/// Programming errors. They are reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{bound} bound was asked for a new question while {pending} is still unanswered")]
    PendingAlreadySet { bound: &'static str, pending: String },
    #[error("{bound} bound received an answer but has no pending question")]
    NothingPending { bound: &'static str },
    #[error("{bound} bound only accepts \"no\" for its guess {pending}")]
    UnexpectedAnswer { bound: &'static str, pending: String },
    #[error("candidate set grew from {previous} to {current} countries")]
    CandidatesGrew { previous: usize, current: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundKind {
    Trivial,
    Population,
    Adjacency,
}

impl BoundKind {
    pub const ALL: [BoundKind; 3] = [
        BoundKind::Trivial,
        BoundKind::Population,
        BoundKind::Adjacency,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            BoundKind::Trivial => TrivialBound::NAME,
            BoundKind::Population => PopulationBound::NAME,
            BoundKind::Adjacency => AdjacencyBound::NAME,
        }
    }

    pub fn build(self) -> Box<dyn Bound> {
        match self {
            BoundKind::Trivial => Box::new(TrivialBound::new()),
            BoundKind::Population => Box::new(PopulationBound::new()),
            BoundKind::Adjacency => Box::new(AdjacencyBound::new()),
        }
    }
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundKind {
    type Err = UnknownBound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trivial" | "guess" => Ok(BoundKind::Trivial),
            "population" | "pop" => Ok(BoundKind::Population),
            "adjacency" | "water" => Ok(BoundKind::Adjacency),
            other => Err(UnknownBound(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bound {0:?}; expected one of trivial, population, adjacency")]
pub struct UnknownBound(pub String);

pub fn build_bounds(kinds: &[BoundKind]) -> Vec<Box<dyn Bound>> {
    kinds.iter().map(|kind| kind.build()).collect()
}
