//! Multiple-choice quiz items as produced by the model.

use serde::{Deserialize, Serialize};

/// Answer label of a four-option question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

/// The four answer options, keyed `A`..`D` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: QuizOptions,
    pub correct: OptionLabel,
    /// Why the answer is right, quoting or locating the supporting text.
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_model_shape() {
        let item: QuizItem = serde_json::from_value(json!({
            "question": "What colour is the sky?",
            "options": {"A": "Blue", "B": "Green", "C": "Red", "D": "Black"},
            "correct": "A",
            "explanation": "Page 1: \"the sky is blue\""
        }))
        .unwrap();

        assert_eq!(item.correct, OptionLabel::A);
        assert_eq!(item.options.a, "Blue");
    }

    #[test]
    fn rejects_missing_option() {
        let result = serde_json::from_value::<QuizItem>(json!({
            "question": "q",
            "options": {"A": "1", "B": "2", "C": "3"},
            "correct": "A",
            "explanation": "e"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_answer_label() {
        let result = serde_json::from_value::<QuizItem>(json!({
            "question": "q",
            "options": {"A": "1", "B": "2", "C": "3", "D": "4"},
            "correct": "E",
            "explanation": "e"
        }));
        assert!(result.is_err());
    }
}
