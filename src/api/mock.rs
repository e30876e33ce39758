// In-memory API backing the demo
//
// Serves the bilingual question catalog, a canned evaluation report and a
// fixed practice history. Every call waits for a configurable latency first
// so the UI sees realistic loading states; tests set the latencies to zero.

use std::time::Duration;
use tracing::{debug, info};

use super::models::{
    Category, Difficulty, DimensionScore, EvaluationDetails, EvaluationReport, HistoryEntry,
    HistoryStatus, Question, SuggestedPractice,
};
use super::provider::{
    ApiError, HistoryProvider, QuestionProvider, ReportGenerator, SubmissionService,
};
use crate::language::Language;
use crate::media::Artifact;

/// Artificial delay applied before each call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiLatency {
    pub question_list: Duration,
    pub question_fetch: Duration,
    pub submit: Duration,
    pub evaluate: Duration,
    pub history: Duration,
}

impl ApiLatency {
    pub fn zero() -> Self {
        Self {
            question_list: Duration::ZERO,
            question_fetch: Duration::ZERO,
            submit: Duration::ZERO,
            evaluate: Duration::ZERO,
            history: Duration::ZERO,
        }
    }
}

impl Default for ApiLatency {
    fn default() -> Self {
        Self {
            question_list: Duration::from_millis(600),
            question_fetch: Duration::from_millis(300),
            submit: Duration::from_millis(2000),
            evaluate: Duration::from_millis(3000),
            history: Duration::from_millis(500),
        }
    }
}

/// Text of a catalog entry in both languages
struct Localized {
    en: &'static str,
    zh: &'static str,
}

impl Localized {
    fn get(&self, language: Language) -> String {
        match language {
            Language::En => self.en,
            Language::Zh => self.zh,
        }
        .to_string()
    }
}

struct CatalogEntry {
    id: &'static str,
    difficulty: Difficulty,
    category: Category,
    tags: &'static [&'static str],
    title: Localized,
    description: Localized,
}

impl CatalogEntry {
    fn localize(&self, language: Language) -> Question {
        Question {
            id: self.id.to_string(),
            title: self.title.get(language),
            description: self.description.get(language),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            difficulty: self.difficulty,
            category: self.category,
        }
    }
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "1",
        difficulty: Difficulty::Easy,
        category: Category::Java,
        tags: &["Java", "Collections"],
        title: Localized {
            en: "Explain the difference between HashMap and HashTable",
            zh: "解释 HashMap 和 HashTable 的区别",
        },
        description: Localized {
            en: "Focus on synchronization, null keys/values, and performance implications.",
            zh: "请重点关注线程安全（Synchronization）、Null 值处理以及性能方面的差异。",
        },
    },
    CatalogEntry {
        id: "2",
        difficulty: Difficulty::Hard,
        category: Category::SystemDesign,
        tags: &["System Design", "Scalability"],
        title: Localized {
            en: "Design a URL Shortener service",
            zh: "设计一个短链接生成系统 (URL Shortener)",
        },
        description: Localized {
            en: "Discuss database schema, algorithm for shortening, and handling high concurrency.",
            zh: "请讨论数据库 Schema 设计、短链生成算法以及如何应对高并发场景。",
        },
    },
    CatalogEntry {
        id: "3",
        difficulty: Difficulty::Medium,
        category: Category::Behavioral,
        tags: &["Behavioral", "Soft Skills"],
        title: Localized {
            en: "Tell me about a time you failed",
            zh: "请分享一次你失败的经历",
        },
        description: Localized {
            en: "Use the STAR method to structure your response.",
            zh: "请使用 STAR 法则（情境、任务、行动、结果）来构建你的回答。",
        },
    },
    CatalogEntry {
        id: "4",
        difficulty: Difficulty::Medium,
        category: Category::Spring,
        tags: &["Spring Boot", "Framework"],
        title: Localized {
            en: "How does Spring Boot Auto-configuration work?",
            zh: "Spring Boot 自动配置是如何工作的？",
        },
        description: Localized {
            en: "Explain @EnableAutoConfiguration and conditional annotations.",
            zh: "请解释 @EnableAutoConfiguration 注解以及条件注解（Conditional Annotations）的作用。",
        },
    },
];

/// Simulated backend implementing every collaborator trait
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    latency: ApiLatency,
}

impl MockApi {
    pub fn new(latency: ApiLatency) -> Self {
        Self { latency }
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    fn score(score: f32, en: &str, zh: &str, language: Language) -> DimensionScore {
        DimensionScore {
            score,
            note: match language {
                Language::En => en,
                Language::Zh => zh,
            }
            .to_string(),
        }
    }
}

#[async_trait::async_trait]
impl QuestionProvider for MockApi {
    async fn list_questions(&self, language: Language) -> Result<Vec<Question>, ApiError> {
        self.delay(self.latency.question_list).await;
        Ok(CATALOG.iter().map(|e| e.localize(language)).collect())
    }

    async fn fetch_question(&self, id: &str, language: Language) -> Result<Question, ApiError> {
        self.delay(self.latency.question_fetch).await;
        CATALOG
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.localize(language))
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }
}

#[async_trait::async_trait]
impl SubmissionService for MockApi {
    async fn submit(&self, session_id: &str, artifact: &Artifact) -> Result<(), ApiError> {
        info!(
            "Uploading artifact of {} bytes ({}) for session {}",
            artifact.len(),
            artifact.mime_type,
            session_id
        );
        self.delay(self.latency.submit).await;
        debug!("Upload for session {} accepted", session_id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReportGenerator for MockApi {
    async fn generate(
        &self,
        session_id: &str,
        language: Language,
    ) -> Result<EvaluationReport, ApiError> {
        // Stands in for transcription + LLM scoring
        self.delay(self.latency.evaluate).await;

        let zh = language == Language::Zh;
        let pick = |en: &str, zh_text: &str| if zh { zh_text.to_string() } else { en.to_string() };

        let report = EvaluationReport {
            id: format!("eval-{}", uuid::Uuid::new_v4()),
            session_id: session_id.to_string(),
            overall_score: 7.9,
            transcript: pick(
                "So, the HashMap is not synchronized which means it is not thread-safe, whereas HashTable is synchronized. Also, HashMap allows one null key and multiple null values, but HashTable doesn't allow any nulls. In terms of performance, HashMap is generally faster because it doesn't have the overhead of synchronization.",
                "HashMap 不是同步的，这意味着它不是线程安全的，而 HashTable 是同步的。另外，HashMap 允许一个 Null 键和多个 Null 值，但 HashTable 不允许任何 Null。在性能方面，HashMap 通常更快，因为它没有同步的开销。",
            ),
            feedback_summary: pick(
                "Good grasp of the core differences. You correctly identified synchronization and null handling. However, you could have mentioned ConcurrentHashMap as a modern alternative.",
                "对核心差异理解很好。你正确指出了同步机制和空值处理的区别。但是，在谈到现代并发替代方案时，如果能提及 ConcurrentHashMap 会更完美。",
            ),
            details: EvaluationDetails {
                technical: Self::score(
                    9.0,
                    "Correctly identified key technical differences.",
                    "正确识别了关键的技术差异。",
                    language,
                ),
                structure: Self::score(
                    7.5,
                    "Good direct answer, but could use a concluding summary.",
                    "回答直接，但可以增加一个总结性的结尾。",
                    language,
                ),
                clarity: Self::score(
                    8.5,
                    "Language was clear and concise.",
                    "语言表达清晰简洁。",
                    language,
                ),
                depth: Self::score(
                    6.0,
                    "Could expand on internal implementation (buckets, nodes).",
                    "可以展开讨论内部实现（如 bucket、entry node）。",
                    language,
                ),
            },
            suggested_practice: vec![SuggestedPractice {
                question_id: "4".to_string(),
                reason: pick(
                    "Strengthen knowledge on concurrent collections",
                    "加强对并发集合知识的理解",
                ),
            }],
        };

        if !report.scores_in_range() {
            return Err(ApiError::Evaluation(format!(
                "score outside 0-{} scale",
                EvaluationReport::MAX_SCORE
            )));
        }

        Ok(report)
    }
}

#[async_trait::async_trait]
impl HistoryProvider for MockApi {
    async fn history(&self, language: Language) -> Result<Vec<HistoryEntry>, ApiError> {
        self.delay(self.latency.history).await;

        let zh = language == Language::Zh;
        let title = |en: &str, zh_text: &str| if zh { zh_text.to_string() } else { en.to_string() };

        Ok(vec![
            HistoryEntry {
                id: "sess_1".to_string(),
                question_id: "1".to_string(),
                question_title: title(
                    "Explain difference between HashMap and HashTable",
                    "解释 HashMap 和 HashTable 的区别",
                ),
                date: "2023-10-24 14:30".to_string(),
                duration: "45s".to_string(),
                score: Some(7.9),
                status: HistoryStatus::Completed,
            },
            HistoryEntry {
                id: "sess_2".to_string(),
                question_id: "2".to_string(),
                question_title: title("Design a URL Shortener service", "设计一个短链接生成系统"),
                date: "2023-10-23 09:15".to_string(),
                duration: "120s".to_string(),
                score: Some(6.2),
                status: HistoryStatus::Completed,
            },
            HistoryEntry {
                id: "sess_3".to_string(),
                question_id: "3".to_string(),
                question_title: title("Tell me about a time you failed", "请分享一次你失败的经历"),
                date: "2023-10-22 18:00".to_string(),
                duration: "-".to_string(),
                score: None,
                status: HistoryStatus::Incomplete,
            },
        ])
    }
}
