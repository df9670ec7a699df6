use crate::step::{ReasoningStep, StepKind};

/// Build the prompt for `iteration`. Every earlier batch is embedded so the model revises
/// rather than restarts.
pub fn build_prompt(
    kind: StepKind,
    message: &str,
    previous: &[ReasoningStep],
    max_items: usize,
    word_cap: usize,
) -> String {
    let (noun, style) = match kind {
        StepKind::Thought => ("thoughts", "Each thought is one clear sentence"),
        StepKind::Draft => ("drafts", "Each draft is a minimal note"),
    };
    let mut prompt = format!(
        "Reason about the following message before it is answered. Do not answer it yet.\n\n\
         Message:\n{message}\n"
    );

    if previous.is_empty() {
        prompt.push_str(
            "\nOn the first line write `COMPLEXITY: <level>` where <level> is one of \
             low, medium, high or very-high, rating how much reasoning the message needs.\n",
        );
    } else {
        prompt.push_str(&format!("\nYour previous {noun}:\n"));
        for step in previous {
            prompt.push_str(&format!("\nBatch {}:\n{}\n", step.batch_index + 1, step.render()));
        }
        prompt.push_str(&format!(
            "\nImprove on the previous {noun}: correct mistakes and fill gaps instead of \
             repeating them.\n"
        ));
    }

    prompt.push_str(&format!(
        "\nList between 1 and {max_items} numbered {noun} (`1.`, `2.`, ...). {style} of at most \
         {word_cap} words.\n\
         On the last line write `IMPROVE_NEEDED: yes` if another revision would clearly help, \
         otherwise `IMPROVE_NEEDED: no`.\n"
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_prompt_asks_for_complexity() {
        let prompt = build_prompt(StepKind::Draft, "give 3 short greetings", &[], 8, 5);
        assert!(prompt.contains("give 3 short greetings"));
        assert!(prompt.contains("COMPLEXITY: <level>"));
        assert!(prompt.contains("at most 5 words"));
        assert!(prompt.contains("IMPROVE_NEEDED"));
    }

    #[test]
    fn test_later_prompts_embed_every_batch() {
        let previous = vec![
            ReasoningStep { batch_index: 0, items: vec!["alpha".into()], kind: StepKind::Thought },
            ReasoningStep { batch_index: 1, items: vec!["beta".into()], kind: StepKind::Thought },
        ];
        let prompt = build_prompt(StepKind::Thought, "why?", &previous, 8, 20);
        assert!(!prompt.contains("COMPLEXITY: <level>"));
        assert!(prompt.contains("Batch 1:\n1. alpha"));
        assert!(prompt.contains("Batch 2:\n1. beta"));
        assert!(prompt.contains("why?"));
    }
}
