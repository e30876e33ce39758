use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Algorithm,
    #[serde(rename = "System Design")]
    SystemDesign,
    Behavioral,
    Java,
    Spring,
}

/// Question content in one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub category: Category,
}

/// Score on the 0-10 scale with a reviewer note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f32,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDetails {
    pub technical: DimensionScore,
    pub structure: DimensionScore,
    pub clarity: DimensionScore,
    pub depth: DimensionScore,
}

impl EvaluationDetails {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DimensionScore)> {
        [
            ("technical", &self.technical),
            ("structure", &self.structure),
            ("clarity", &self.clarity),
            ("depth", &self.depth),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedPractice {
    pub question_id: String,
    pub reason: String,
}

/// Structured output of the evaluation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub id: String,
    pub session_id: String,
    pub overall_score: f32,
    pub details: EvaluationDetails,
    pub transcript: String,
    pub feedback_summary: String,
    pub suggested_practice: Vec<SuggestedPractice>,
}

impl EvaluationReport {
    pub const MAX_SCORE: f32 = 10.0;

    /// Every score, overall and per dimension, lies within 0..=10
    pub fn scores_in_range(&self) -> bool {
        let in_range = |s: f32| (0.0..=Self::MAX_SCORE).contains(&s);
        in_range(self.overall_score) && self.details.iter().all(|(_, d)| in_range(d.score))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Completed,
    Incomplete,
}

/// Row of the practice history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub question_id: String,
    pub question_title: String,
    pub date: String,
    /// Display duration ("45s"), "-" when never recorded
    pub duration: String,
    pub score: Option<f32>,
    pub status: HistoryStatus,
}

/// Filter for the question bank listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionFilter {
    pub category: Option<Category>,
    /// Case-insensitive match on title or tags
    pub text: Option<String>,
}

pub fn filter_questions(questions: Vec<Question>, filter: &QuestionFilter) -> Vec<Question> {
    let needle = filter
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    questions
        .into_iter()
        .filter(|q| filter.category.map_or(true, |c| q.category == c))
        .filter(|q| match &needle {
            None => true,
            Some(n) => {
                q.title.to_lowercase().contains(n)
                    || q.tags.iter().any(|t| t.to_lowercase().contains(n))
            }
        })
        .collect()
}
