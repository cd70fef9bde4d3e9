//! Task module - the kinds of model requests the pipeline issues

use serde::{Deserialize, Serialize};

/// Kind of extraction request
///
/// Each task selects one prompt template and one expected output shape:
/// - Qa: question/answer pairs from documentation
/// - ScriptJudge: yes/no gate deciding whether a segment holds scripts
/// - Script: script-usage descriptions
/// - KnowledgeAdvice: rewrites an existing Q&A row as design advice
/// - Code: describes an existing prompt/code row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Question/answer extraction
    Qa,

    /// Script-presence judge
    ScriptJudge,

    /// Script description extraction
    Script,

    /// Knowledge-advice reformatting
    KnowledgeAdvice,

    /// Code description reformatting
    Code,
}

impl TaskType {
    /// Every task type
    pub const ALL: [TaskType; 5] = [
        TaskType::Qa,
        TaskType::ScriptJudge,
        TaskType::Script,
        TaskType::KnowledgeAdvice,
        TaskType::Code,
    ];

    /// Get the task name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Qa => "qa",
            TaskType::ScriptJudge => "script_judge",
            TaskType::Script => "script",
            TaskType::KnowledgeAdvice => "knowledge_advice",
            TaskType::Code => "code",
        }
    }

    /// Parse a task type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "qa" => Some(TaskType::Qa),
            "script_judge" => Some(TaskType::ScriptJudge),
            "script" => Some(TaskType::Script),
            "knowledge_advice" => Some(TaskType::KnowledgeAdvice),
            "code" => Some(TaskType::Code),
            _ => None,
        }
    }

    /// Fields every persisted record of this task carries
    ///
    /// The judge never produces records; its only field is the verdict.
    pub fn record_fields(&self) -> &'static [&'static str] {
        match self {
            TaskType::Qa => &["type", "query", "answer"],
            TaskType::ScriptJudge => &["script_found"],
            TaskType::Script => &[
                "script_name",
                "definition_description",
                "parameters",
                "values",
                "script_paradigm",
                "examples",
            ],
            TaskType::KnowledgeAdvice => &["type", "topic", "query", "answer"],
            TaskType::Code => &[
                "definition_description",
                "functionality_description",
                "inputs",
                "outputs",
                "code_paradigm",
            ],
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid task type: {}", s))
    }
}
