use crate::bound::Question;
use std::io;

/// Everything shown to the player for one question.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    /// 1-based number of the question being asked.
    pub turn: u32,
    pub candidates: usize,
    pub question: &'a Question,
}

impl Prompt<'_> {
    pub fn header(&self) -> String {
        format!(
            "QUESTION {}! {} countries are left.",
            self.turn, self.candidates
        )
    }
}

/// Source of yes/no answers.
///
/// Implementations block until they have a valid answer; malformed input is
/// their own concern and never reaches the orchestrator.
pub trait Player {
    fn ask(&mut self, prompt: &Prompt<'_>) -> io::Result<bool>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn ask(&mut self, prompt: &Prompt<'_>) -> io::Result<bool> {
        (**self).ask(prompt)
    }
}
