//! Quiz generation: a strict block parser for model output and a bounded
//! retry state machine around it.
//!
//! Grammar accepted by [`parse_quizzes`]:
//!
//! ```text
//! response := block ( blank-line+ block )*
//! block    := question-line option-line option-line option-line extra-line*
//! question-line := "Question:" text
//! ```
//!
//! Blocks that do not match are ignored.

use log::{debug, info, warn};
use serde::Serialize;

use crate::generate::ResilientGenerator;

pub const QUESTION_MARKER: &str = "Question:";
pub const QUIZ_UNAVAILABLE: &str = "quiz unavailable";
pub const QUIZ_COUNT: usize = 3;
pub const MAX_QUIZ_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    pub question: String,
    pub options: [String; 3],
}

impl QuizItem {
    pub fn placeholder() -> Self {
        Self {
            question: QUIZ_UNAVAILABLE.to_string(),
            options: ["N/A".to_string(), "N/A".to_string(), "N/A".to_string()],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.question == QUIZ_UNAVAILABLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Requesting,
    Parsing,
    Accepted,
    Retry,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub items: Vec<QuizItem>,
    pub state: QuizState,
    pub attempts: u32,
}

/// Parse every well-formed quiz block in `text`
pub fn parse_quizzes(text: &str) -> Vec<QuizItem> {
    split_blocks(text).iter().filter_map(|block| parse_block(block)).collect()
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(lines: &[&str]) -> Option<QuizItem> {
    if lines.len() < 4 {
        return None;
    }
    let question = lines[0].strip_prefix(QUESTION_MARKER)?.trim();
    Some(QuizItem {
        question: question.to_string(),
        options: [lines[1].to_string(), lines[2].to_string(), lines[3].to_string()],
    })
}

pub fn quiz_prompt(summary: &str, language: &str) -> String {
    format!(
        "Based on the following YouTube video summary, write 3 simple quiz questions viewers can answer. \
Follow this format exactly for each question:\n\n\
{QUESTION_MARKER} (question)\n\
a) correct answer\n\
b) wrong answer 1\n\
c) wrong answer 2\n\n\
You must write exactly 3 quizzes, each with one question and 3 options. Put a blank line between quizzes. \
Keep the \"{QUESTION_MARKER}\" marker as is and write everything else in {language}.\n\n{summary}"
    )
}

/// Ask for quizzes until one response yields exactly 3, or give up with placeholders
pub async fn generate_quizzes(
    generator: &ResilientGenerator,
    summary: &str,
    language: &str,
    max_attempts: u32,
) -> QuizOutcome {
    let max_attempts = max_attempts.max(1);
    let prompt = quiz_prompt(summary, language);
    let mut state = QuizState::Requesting;
    let mut attempt = 0;
    let mut response = None;
    let mut items = Vec::new();

    loop {
        state = match state {
            QuizState::Requesting => {
                attempt += 1;
                debug!("Quiz attempt {attempt}/{max_attempts}");
                response = generator.generate(&prompt).await;
                QuizState::Parsing
            }
            QuizState::Parsing => {
                let parsed = response.take().map(|r| parse_quizzes(&r)).unwrap_or_default();
                if parsed.len() == QUIZ_COUNT {
                    items = parsed;
                    QuizState::Accepted
                } else {
                    warn!(
                        "Quiz attempt {attempt}/{max_attempts}: parsed {} of {QUIZ_COUNT} quizzes",
                        parsed.len()
                    );
                    QuizState::Retry
                }
            }
            QuizState::Retry if attempt < max_attempts => QuizState::Requesting,
            QuizState::Retry => QuizState::Exhausted,
            QuizState::Accepted => {
                info!("Quizzes accepted on attempt {attempt}");
                break;
            }
            QuizState::Exhausted => {
                warn!("Quiz generation exhausted after {attempt} attempts; using placeholders");
                items = vec![QuizItem::placeholder(); QUIZ_COUNT];
                break;
            }
        };
    }

    QuizOutcome {
        items,
        state,
        attempts: attempt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::{ScriptedGenerator, resilient};
    use std::sync::Arc;

    const GOOD: &str = "Question: What is Rust?\na) A language\nb) A fungus only\nc) A color\n\n\
Question: Who maintains it?\na) The community\nb) Nobody\nc) A single person\n\n\
Question: Is it fast?\na) Yes\nb) No\nc) Only on Tuesdays";

    #[test]
    fn test_parse_three_blocks() {
        let quizzes = parse_quizzes(GOOD);
        assert_eq!(quizzes.len(), 3);
        assert_eq!(quizzes[0].question, "What is Rust?");
        assert_eq!(quizzes[0].options, ["a) A language", "b) A fungus only", "c) A color"].map(String::from));
        assert_eq!(quizzes[2].options[2], "c) Only on Tuesdays");
    }

    #[test]
    fn test_parse_tolerates_crlf_and_extra_blank_lines() {
        let text = "\r\n\r\nQuestion: Q1\r\na) x\r\nb) y\r\nc) z\r\n\r\n\r\n\r\nQuestion: Q2\r\na) x\r\nb) y\r\nc) z\r\n";
        assert_eq!(parse_quizzes(text).len(), 2);
    }

    #[test]
    fn test_parse_rejects_short_blocks() {
        let text = "Question: Only two options\na) one\nb) two\n\nQuestion: ok\na) 1\nb) 2\nc) 3";
        let quizzes = parse_quizzes(text);
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].question, "ok");
    }

    #[test]
    fn test_parse_rejects_missing_marker() {
        let text = "Here are your quizzes:\na) 1\nb) 2\nc) 3\n\n1. Question: numbered\na) 1\nb) 2\nc) 3";
        assert!(parse_quizzes(text).is_empty());
    }

    #[test]
    fn test_parse_extra_lines_ignored() {
        let text = "Question: Q\na) 1\nb) 2\nc) 3\nAnswer: a";
        let quizzes = parse_quizzes(text);
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].options[2], "c) 3");
    }

    #[test]
    fn test_parse_garbage() {
        for text in ["", "\n\n\n", "Question:", "Question:\n\n\n\na\nb\nc", "🙂🙂🙂"] {
            assert!(parse_quizzes(text).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn test_prompt_mentions_marker() {
        assert!(quiz_prompt("summary", "Korean").contains("Question: (question)"));
    }

    #[tokio::test]
    async fn test_accepted_on_second_attempt() {
        let generator = Arc::new(ScriptedGenerator::new(
            vec![Some("Question: only one\na) 1\nb) 2\nc) 3"), Some(GOOD)],
            Some("malformed"),
        ));
        let outcome = generate_quizzes(&resilient(&generator), "summary", "Korean", MAX_QUIZ_ATTEMPTS).await;
        assert_eq!(outcome.state, QuizState::Accepted);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.items.len(), 3);
        assert!(!outcome.items[0].is_placeholder());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_too_many_blocks_is_retried() {
        let four = format!("{GOOD}\n\nQuestion: Fourth?\na) 1\nb) 2\nc) 3");
        let generator = Arc::new(ScriptedGenerator::new(vec![Some(four.as_str()), Some(GOOD)], None));
        let outcome = generate_quizzes(&resilient(&generator), "summary", "Korean", MAX_QUIZ_ATTEMPTS).await;
        assert_eq!(outcome.state, QuizState::Accepted);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_exhausted_with_failing_generator() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let outcome = generate_quizzes(&resilient(&generator), "summary", "Korean", MAX_QUIZ_ATTEMPTS).await;
        assert_eq!(outcome.state, QuizState::Exhausted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.items, vec![QuizItem::placeholder(); 3]);
        assert!(outcome.items.iter().all(|q| q.question == "quiz unavailable"));
        // each quiz attempt goes through the client's own 3 tries
        assert_eq!(generator.calls(), 9);
    }

    #[tokio::test]
    async fn test_exhausted_with_malformed_output() {
        let generator = Arc::new(ScriptedGenerator::always("not a quiz"));
        let outcome = generate_quizzes(&resilient(&generator), "summary", "Korean", MAX_QUIZ_ATTEMPTS).await;
        assert_eq!(outcome.state, QuizState::Exhausted);
        assert_eq!(generator.calls(), 3);
        assert!(outcome.items.iter().all(QuizItem::is_placeholder));
    }
}
