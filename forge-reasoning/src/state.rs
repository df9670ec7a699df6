use crate::config::ReasoningConfig;
use crate::parse::ParsedBatch;
use crate::step::{ReasoningResult, ReasoningStep, StepKind};
use forge_core::ComplexityLevel;

/// Result of folding one batch into the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub step: ReasoningStep,
    /// Set only on the first iteration, when the reply declared a level.
    pub complexity_detected: Option<ComplexityLevel>,
    pub finished: bool,
}

/// Pure reasoning state machine.
///
/// Complexity is read from the first batch only and fixes `max_iterations` for the rest of
/// the run. After each batch the loop continues only if the model asked for a revision, the
/// next iteration is below `max_iterations`, and it is below the revision ceiling.
#[derive(Debug, Clone)]
pub struct ReasoningLoop {
    kind: StepKind,
    iteration: usize,
    complexity: ComplexityLevel,
    max_iterations: usize,
    revision_ceiling: usize,
    steps: Vec<ReasoningStep>,
    finished: bool,
}

impl ReasoningLoop {
    pub fn new(kind: StepKind, revision_ceiling: usize) -> Self {
        let complexity = ComplexityLevel::default();
        Self {
            kind,
            iteration: 0,
            complexity,
            max_iterations: kind.max_iterations(complexity),
            revision_ceiling: revision_ceiling.max(1),
            steps: Vec::new(),
            finished: false,
        }
    }

    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self::new(config.kind, config.revision_ceiling)
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Zero-based index of the next batch.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn complexity(&self) -> ComplexityLevel {
        self.complexity
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fold one parsed reply. Calling this after the loop finished is a no-op returning the
    /// last step.
    pub fn advance(&mut self, batch: ParsedBatch) -> Transition {
        if self.finished {
            if let Some(step) = self.steps.last() {
                return Transition { step: step.clone(), complexity_detected: None, finished: true };
            }
        }

        let mut complexity_detected = None;
        if self.iteration == 0 {
            if let Some(level) = batch.complexity {
                self.complexity = level;
                self.max_iterations = self.kind.max_iterations(level);
                complexity_detected = Some(level);
            }
        }

        let step = ReasoningStep { batch_index: self.iteration, items: batch.items, kind: self.kind };
        self.steps.push(step.clone());
        self.iteration += 1;

        let within_bound = self.iteration < self.max_iterations;
        let within_ceiling = self.iteration < self.revision_ceiling;
        self.finished = !(batch.improve_needed && within_bound && within_ceiling);

        Transition { step, complexity_detected, finished: self.finished }
    }

    pub fn into_result(self) -> ReasoningResult {
        ReasoningResult::new(self.steps, self.complexity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_batch;
    use proptest::prelude::*;

    fn batch(complexity: Option<ComplexityLevel>, improve: bool) -> ParsedBatch {
        ParsedBatch { items: vec!["x".into()], complexity, improve_needed: improve }
    }

    fn run(kind: StepKind, replies: impl IntoIterator<Item = ParsedBatch>) -> ReasoningLoop {
        let mut state = ReasoningLoop::new(kind, 5);
        for reply in replies {
            if state.advance(reply).finished {
                break;
            }
        }
        state
    }

    #[test]
    fn test_stops_when_revision_not_requested() {
        let state = run(StepKind::Draft, [batch(Some(ComplexityLevel::Low), false)]);
        assert!(state.is_finished());
        assert_eq!(state.steps().len(), 1);
        assert_eq!(state.complexity(), ComplexityLevel::Low);
    }

    #[test]
    fn test_low_bound_stops_after_two() {
        let replies = std::iter::repeat_with(|| batch(None, true)).take(10);
        let state = run(StepKind::Thought, replies);
        assert_eq!(state.steps().len(), 2);
    }

    #[test]
    fn test_complexity_is_fixed_after_first_iteration() {
        let replies = vec![
            batch(Some(ComplexityLevel::Low), true),
            batch(Some(ComplexityLevel::High), true),
            batch(Some(ComplexityLevel::VeryHigh), true),
        ];
        let state = run(StepKind::Thought, replies);
        assert_eq!(state.complexity(), ComplexityLevel::Low);
        assert_eq!(state.max_iterations(), 2);
        assert_eq!(state.steps().len(), 2);
    }

    #[test]
    fn test_revision_ceiling_caps_very_high() {
        let mut replies = vec![batch(Some(ComplexityLevel::VeryHigh), true)];
        replies.extend(std::iter::repeat_with(|| batch(None, true)).take(30));
        let state = run(StepKind::Thought, replies);
        assert_eq!(state.max_iterations(), 20);
        assert_eq!(state.steps().len(), 5);
    }

    #[test]
    fn test_sentinel_batch_continues_the_loop() {
        let mut state = ReasoningLoop::new(StepKind::Thought, 5);
        state.advance(batch(Some(ComplexityLevel::Medium), true));
        let transition = state.advance(parse_batch("garbled", 8, 20));
        assert_eq!(transition.step.items, vec![crate::NO_VIABLE_OUTPUT.to_string()]);
        assert!(transition.finished);
        assert_eq!(state.into_result().steps.len(), 2);
    }

    fn level() -> impl Strategy<Value = Option<ComplexityLevel>> {
        prop_oneof![
            Just(None),
            Just(Some(ComplexityLevel::Low)),
            Just(Some(ComplexityLevel::Medium)),
            Just(Some(ComplexityLevel::High)),
            Just(Some(ComplexityLevel::VeryHigh)),
        ]
    }

    proptest! {
        #[test]
        fn prop_iterations_never_exceed_bound_or_ceiling(
            draft in any::<bool>(),
            replies in prop::collection::vec((level(), any::<bool>()), 1..40),
        ) {
            let kind = if draft { StepKind::Draft } else { StepKind::Thought };
            let first_level = replies[0].0.unwrap_or_default();
            let state = run(kind, replies.into_iter().map(|(c, i)| batch(c, i)));

            prop_assert_eq!(state.complexity(), first_level);
            prop_assert!(state.steps().len() <= kind.max_iterations(first_level));
            prop_assert!(state.steps().len() <= 5);
        }
    }
}
