use super::{Bound, BoundError, InvariantViolation, Pending, Probe, Question, QuestionContext};
use geoquiz_core::model::filter::{Constraint, Filter};
use geoquiz_core::model::format::group_thousands;
use rand::RngCore;

/// Bisects the population axis around the running average.
#[derive(Debug, Default)]
pub struct PopulationBound {
    above: Option<u64>,
    at_most: Option<u64>,
    pending: Pending<u64>,
}

impl PopulationBound {
    pub const NAME: &'static str = "population";

    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive lower end of the known range.
    pub fn above(&self) -> Option<u64> {
        self.above
    }

    /// Inclusive upper end of the known range.
    pub fn at_most(&self) -> Option<u64> {
        self.at_most
    }

    pub fn pending_threshold(&self) -> Option<u64> {
        self.pending.peek().copied()
    }

    fn already_known(&self, threshold: u64) -> bool {
        self.above.is_some_and(|low| threshold <= low)
            || self.at_most.is_some_and(|high| threshold >= high)
    }
}

/// Round an average down to three significant digits.
///
/// `magnitude = floor(log10(avg)) - 2`; for a positive magnitude the integer
/// part is truncated to a multiple of `10^magnitude`, otherwise it is used as
/// is. Returns `None` when `avg` is not a finite value of at least one.
pub fn round_threshold(avg: f64) -> Option<u64> {
    if !avg.is_finite() || avg < 1.0 {
        return None;
    }
    let whole = avg.floor() as u64;
    let magnitude = whole.ilog10() as i32 - 2;
    if magnitude <= 0 {
        return Some(whole);
    }
    let step = 10u64.pow(magnitude as u32);
    Some(whole / step * step)
}

impl Bound for PopulationBound {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get(&self) -> Filter {
        if self.above.is_none() && self.at_most.is_none() {
            return Filter::new();
        }
        Filter::single(Constraint::Population {
            above: self.above,
            at_most: self.at_most,
        })
    }

    fn next_question(
        &mut self,
        ctx: &QuestionContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Question, BoundError> {
        self.pending.ensure_idle(Self::NAME)?;

        let Some(average) = ctx.kb.average_population(ctx.filter)? else {
            return Err(BoundError::exhausted(
                Self::NAME,
                "no candidate has a population figure",
            ));
        };
        let Some(threshold) = round_threshold(average) else {
            return Err(BoundError::exhausted(
                Self::NAME,
                format!("average population {average} cannot be rounded"),
            ));
        };
        if self.already_known(threshold) {
            return Err(BoundError::exhausted(
                Self::NAME,
                format!("threshold {threshold} would not split the candidates"),
            ));
        }

        self.pending.set(Self::NAME, threshold)?;
        Ok(Question {
            bound: Self::NAME,
            probe: Probe::PopulationAbove { threshold },
            text: format!(
                "Is the population of your country greater than {}?",
                group_thousands(threshold)
            ),
        })
    }

    fn update(&mut self, answer: bool) -> Result<(), InvariantViolation> {
        let threshold = self.pending.take(Self::NAME)?;
        if answer {
            self.above = Some(self.above.map_or(threshold, |low| low.max(threshold)));
        } else {
            self.at_most = Some(self.at_most.map_or(threshold, |high| high.min(threshold)));
        }
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.pending.is_awaiting()
    }
}
