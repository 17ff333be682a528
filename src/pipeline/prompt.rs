//! Prompt assembly for answers and summaries

use crate::generation::CompletionRequest;

/// Instruction placed before the retrieved passages
pub const ANSWER_INSTRUCTION: &str =
    "You are a helpful assistant. Use the following information to answer the question:\n\n";

/// System message for summaries
pub const SUMMARY_INSTRUCTION: &str = "You are a concise summarizer.";

/// System context: the instruction followed by passages in ranked order, separated by a blank line
pub fn answer_system_message<S: AsRef<str>>(passages: &[S]) -> String {
    let joined = passages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}{}", ANSWER_INSTRUCTION, joined)
}

pub fn answer_request<S: AsRef<str>>(
    passages: &[S],
    question: &str,
    max_tokens: u32,
    temperature: f32,
) -> CompletionRequest {
    CompletionRequest {
        system: answer_system_message(passages),
        user: question.to_string(),
        max_tokens,
        temperature,
    }
}

/// Summary request; the token budget is twice the word ceiling to leave room for tokenization
pub fn summary_request(text: &str, max_length: usize, temperature: f32) -> CompletionRequest {
    let max_tokens = u32::try_from(max_length.saturating_mul(2)).unwrap_or(u32::MAX);

    CompletionRequest {
        system: SUMMARY_INSTRUCTION.to_string(),
        user: format!(
            "Summarize this text in {} words or fewer:\n\n{}",
            max_length, text
        ),
        max_tokens,
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_system_message_joins_with_blank_line() {
        let message = answer_system_message(&["first passage", "second passage"]);
        assert_eq!(
            message,
            "You are a helpful assistant. Use the following information to answer the question:\n\n\
             first passage\n\nsecond passage"
        );
    }

    #[test]
    fn test_answer_request() {
        let request = answer_request(&["ctx".to_string()], "Why?", 150, 0.7);
        assert!(request.system.ends_with("ctx"));
        assert_eq!(request.user, "Why?");
        assert_eq!(request.max_tokens, 150);
    }

    #[test]
    fn test_summary_request() {
        let request = summary_request("Some long text.", 50, 0.3);
        assert_eq!(request.system, SUMMARY_INSTRUCTION);
        assert_eq!(
            request.user,
            "Summarize this text in 50 words or fewer:\n\nSome long text."
        );
        assert_eq!(request.max_tokens, 100);
    }

    #[test]
    fn test_summary_budget_saturates() {
        let request = summary_request("x", usize::MAX, 0.3);
        assert_eq!(request.max_tokens, u32::MAX);
    }
}
