//! Machining knowledge quizzes generated by the assistant.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

const MAX_QUESTIONS: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "kolay" => Ok(Difficulty::Easy),
            "medium" | "orta" => Ok(Difficulty::Medium),
            "hard" | "zor" => Ok(Difficulty::Hard),
            _ => Err(CalcError::invalid_input("difficulty", s, "Use easy, medium or hard")),
        }
    }
}

/// Body of the quiz function request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(rename = "questionCount", alias = "count")]
    pub count: u8,
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, count: u8) -> Self {
        QuizRequest {
            topic: topic.into(),
            difficulty,
            count,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.topic.trim().is_empty() {
            return Err(CalcError::missing_field("topic"));
        }
        if self.count == 0 || self.count > MAX_QUESTIONS {
            return Err(CalcError::invalid_input(
                "count",
                self.count.to_string(),
                format!("Ask for 1 to {} questions", MAX_QUESTIONS),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex", alias = "correct_index", alias = "correctAnswer")]
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// Outcome of answering a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
    /// Indices of questions answered wrong or skipped
    pub missed: Vec<usize>,
}

impl Quiz {
    /// Parse and check the quiz function's JSON reply.
    pub fn from_gateway_json(body: &str) -> CalcResult<Self> {
        let quiz: Quiz = serde_json::from_str(body)?;
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.questions.is_empty() {
            return Err(CalcError::calculation_failed("quiz", "gateway returned no questions"));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.options.len() < 2 {
                return Err(CalcError::invalid_input(
                    format!("questions[{}].options", i),
                    q.options.len().to_string(),
                    "A question needs at least two options",
                ));
            }
            if q.correct_index >= q.options.len() {
                return Err(CalcError::invalid_input(
                    format!("questions[{}].correctIndex", i),
                    q.correct_index.to_string(),
                    "Correct answer is not one of the options",
                ));
            }
        }
        Ok(())
    }

    /// Score answers given as option indices; `None` is a skipped question.
    /// Missing trailing answers count as skipped.
    pub fn score(&self, answers: &[Option<usize>]) -> QuizScore {
        let missed: Vec<usize> = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(*i).copied().flatten() != Some(q.correct_index))
            .map(|(i, _)| i)
            .collect();
        let total = self.questions.len();
        let correct = total - missed.len();
        QuizScore {
            correct,
            total,
            percent: if total > 0 { correct as f64 / total as f64 * 100.0 } else { 0.0 },
            missed,
        }
    }
}
