//! Question/answer dossier assembly.

use std::collections::HashMap;
use tracing::warn;

use crate::records::{Answer, DossierItem, Question};

/// Number of dossier items kept by default.
pub const DEFAULT_TOP_N: usize = 5;

/// Join questions with their accepted answers.
///
/// Answers are looked up by `question_id`. When two answers share a
/// question id the later one wins and a warning is logged. Questions
/// without an answer are dropped; the order of `questions` is kept.
pub fn assemble(questions: Vec<Question>, answers: Vec<Answer>) -> Vec<DossierItem> {
    let mut by_question: HashMap<i64, Answer> = HashMap::with_capacity(answers.len());
    for answer in answers {
        let question_id = answer.question_id;
        let answer_id = answer.id;
        if let Some(previous) = by_question.insert(question_id, answer) {
            warn!(
                question_id,
                replaced = previous.id,
                kept = answer_id,
                "duplicate answer for question, keeping the last one"
            );
        }
    }

    questions
        .into_iter()
        .filter_map(|question| {
            by_question
                .get(&question.id)
                .cloned()
                .map(|answer| DossierItem::new(question, answer))
        })
        .collect()
}

/// [`assemble`] followed by truncation to the first `top_n` items.
pub fn assemble_top(
    questions: Vec<Question>,
    answers: Vec<Answer>,
    top_n: usize,
) -> Vec<DossierItem> {
    let mut items = assemble(questions, answers);
    items.truncate(top_n);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64) -> Question {
        Question {
            id,
            title: format!("Question {}", id),
            link: format!("https://stackoverflow.com/q/{}", id),
            accepted_answer_id: Some(id * 10),
            ..Default::default()
        }
    }

    fn answer(id: i64, question_id: i64) -> Answer {
        Answer {
            id,
            question_id,
            is_accepted: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_unmatched_questions_are_dropped() {
        let items = assemble(vec![question(1), question(2)], vec![answer(10, 1)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question().id, 1);
        assert_eq!(items[0].answer().id, 10);
    }

    #[test]
    fn test_question_order_is_preserved() {
        let items = assemble(
            vec![question(3), question(1), question(2)],
            vec![answer(10, 1), answer(20, 2), answer(30, 3)],
        );
        let ids: Vec<i64> = items.iter().map(|i| i.question().id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        for item in &items {
            assert_eq!(item.answer().question_id, item.question().id);
        }
    }

    #[test]
    fn test_duplicate_answers_last_write_wins() {
        let items = assemble(vec![question(1)], vec![answer(10, 1), answer(11, 1)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].answer().id, 11);
    }

    #[test]
    fn test_orphan_answers_are_ignored() {
        let items = assemble(vec![question(1)], vec![answer(10, 1), answer(99, 42)]);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_assemble_top_truncates_after_join() {
        let questions: Vec<Question> = (1..=8).map(question).collect();
        // question 2 has no answer, so the top five are 1, 3, 4, 5, 6
        let answers: Vec<Answer> = (1..=8)
            .filter(|id| *id != 2)
            .map(|id| answer(id * 10, id))
            .collect();
        let items = assemble_top(questions, answers, DEFAULT_TOP_N);
        let ids: Vec<i64> = items.iter().map(|i| i.question().id).collect();
        assert_eq!(ids, vec![1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(assemble(vec![], vec![answer(1, 1)]).is_empty());
        assert!(assemble(vec![question(1)], vec![]).is_empty());
    }
}
