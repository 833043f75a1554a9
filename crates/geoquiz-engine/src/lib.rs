pub mod bound;
pub mod game;

pub use bound::{
    AdjacencyBound, Bound, BoundError, BoundKind, InvariantViolation, Pending, PopulationBound,
    Probe, Question, QuestionContext, TrivialBound, UnknownBound, build_bounds, round_threshold,
};
pub use game::{
    GameError, GameOutcome, GameState, Orchestrator, Player, Prompt, TurnRecord, TurnReport,
};
