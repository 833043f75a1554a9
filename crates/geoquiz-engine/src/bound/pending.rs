use super::InvariantViolation;
use core::fmt;

/// A value proposed by `next_question` and not yet settled by `update`.
///
/// Each bound owns exactly one of these; the transitions are
/// `Idle --set--> Awaiting --take--> Idle` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending<T> {
    Idle,
    Awaiting(T),
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Pending::Idle
    }
}

impl<T: fmt::Display> Pending<T> {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Pending::Awaiting(_))
    }

    pub fn peek(&self) -> Option<&T> {
        match self {
            Pending::Idle => None,
            Pending::Awaiting(value) => Some(value),
        }
    }

    pub fn ensure_idle(&self, bound: &'static str) -> Result<(), InvariantViolation> {
        match self {
            Pending::Idle => Ok(()),
            Pending::Awaiting(value) => Err(InvariantViolation::PendingAlreadySet {
                bound,
                pending: value.to_string(),
            }),
        }
    }

    pub fn set(&mut self, bound: &'static str, value: T) -> Result<(), InvariantViolation> {
        self.ensure_idle(bound)?;
        *self = Pending::Awaiting(value);
        Ok(())
    }

    pub fn take(&mut self, bound: &'static str) -> Result<T, InvariantViolation> {
        match std::mem::take(self) {
            Pending::Awaiting(value) => Ok(value),
            Pending::Idle => Err(InvariantViolation::NothingPending { bound }),
        }
    }
}
