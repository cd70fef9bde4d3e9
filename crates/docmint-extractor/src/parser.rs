//! Validate model responses against the shape each task expects
//!
//! A response is usable when it contains a fenced JSON block that parses
//! and has the task's shape. Anything else is a validation error, which the
//! pipeline answers by asking again.

use crate::error::ExtractorError;
use docmint_domain::TaskType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("json fence pattern"));

static BARE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\n(.*?)\s*```").expect("bare fence pattern"));

/// A response that passed validation
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// Record payloads, ready to be enriched and persisted (may be empty)
    Records(Vec<Map<String, Value>>),
    /// Verdict of the script judge
    Judgement(bool),
}

impl Validated {
    /// Record payloads, empty for a judgement
    pub fn into_records(self) -> Vec<Map<String, Value>> {
        match self {
            Validated::Records(records) => records,
            Validated::Judgement(_) => Vec::new(),
        }
    }
}

/// Locate the fenced structured block in a response
///
/// Prefers a ```` ```json ```` fence and falls back to a bare fence.
pub fn extract_structured_block(response: &str) -> Result<&str, ExtractorError> {
    JSON_FENCE
        .captures(response)
        .or_else(|| BARE_FENCE.captures(response))
        .and_then(|captures| captures.get(1))
        .map(|block| block.as_str())
        .ok_or(ExtractorError::NoStructuredBlockFound)
}

/// Validate a raw response for `task`
///
/// # Errors
///
/// - `ExtractorError::NoStructuredBlockFound` if there is no fenced block
/// - `ExtractorError::MalformedData` if the block does not parse or has the wrong shape
pub fn validate_response(task: TaskType, response: &str) -> Result<Validated, ExtractorError> {
    let block = extract_structured_block(response)?;
    let value: Value = serde_json::from_str(block)?;

    if task == TaskType::ScriptJudge {
        return judge_verdict(&value).map(Validated::Judgement);
    }

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(ExtractorError::MalformedData(format!(
                "expected an object or array for {}, got {}",
                task,
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Ok(Validated::Records(Vec::new()));
    }

    let total = items.len();
    let mut records = Vec::with_capacity(total);
    for (idx, item) in items.into_iter().enumerate() {
        match check_item(task, item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Dropping {} item {}: {}", task, idx, e),
        }
    }

    if records.is_empty() {
        return Err(ExtractorError::MalformedData(format!(
            "none of the {} {} items had the expected shape",
            total, task
        )));
    }

    Ok(Validated::Records(records))
}

fn judge_verdict(value: &Value) -> Result<bool, ExtractorError> {
    value
        .get("script_found")
        .and_then(Value::as_bool)
        .ok_or_else(|| ExtractorError::MalformedData("expected boolean 'script_found'".to_string()))
}

/// Check one item and normalise it into a record payload
fn check_item(task: TaskType, item: Value) -> Result<Map<String, Value>, String> {
    let mut item = match item {
        Value::Object(map) => map,
        other => return Err(format!("item is {}, not an object", json_kind(&other))),
    };

    match task {
        TaskType::Qa => {
            require_str(&item, &["type", "query", "answer"])?;
        }
        TaskType::Script => {
            require_str(&item, &["script_name", "definition_description", "script_paradigm"])?;
            optional_kind(&item, "parameters", Value::is_object, "an object")?;
            optional_kind(&item, "examples", Value::is_array, "an array")?;
        }
        TaskType::KnowledgeAdvice => {
            require_str(&item, &["knowledge_advice_question", "knowledge_advice_answer", "topic"])?;
            let mut normalised = Map::new();
            normalised.insert("type".to_string(), Value::from(TaskType::KnowledgeAdvice.as_str()));
            normalised.insert("topic".to_string(), item.remove("topic").unwrap_or(Value::Null));
            normalised.insert(
                "query".to_string(),
                item.remove("knowledge_advice_question").unwrap_or(Value::Null),
            );
            normalised.insert(
                "answer".to_string(),
                item.remove("knowledge_advice_answer").unwrap_or(Value::Null),
            );
            return Ok(normalised);
        }
        TaskType::Code => {
            require_str(
                &item,
                &["definition_description", "functionality_description", "code_paradigm"],
            )?;
            optional_kind(&item, "inputs", Value::is_object, "an object")?;
        }
        TaskType::ScriptJudge => {
            return Err("the judge does not produce records".to_string());
        }
    }

    Ok(item)
}

fn require_str(item: &Map<String, Value>, fields: &[&str]) -> Result<(), String> {
    for field in fields {
        match item.get(*field) {
            Some(Value::String(_)) => {}
            Some(other) => return Err(format!("'{}' is {}, not a string", field, json_kind(other))),
            None => return Err(format!("missing '{}'", field)),
        }
    }
    Ok(())
}

fn optional_kind(
    item: &Map<String, Value>,
    field: &str,
    check: fn(&Value) -> bool,
    expected: &str,
) -> Result<(), String> {
    match item.get(field) {
        Some(value) if !value.is_null() && !check(value) => {
            Err(format!("'{}' must be {}", field, expected))
        }
        _ => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_fence() {
        let response = "Here you go:\n```json\n[{\"a\": 1}]\n```\nThanks";
        assert_eq!(extract_structured_block(response).unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_prefers_json_fence_over_bare_fence() {
        let response = "```\nnot this\n```\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_structured_block(response).unwrap(), "{\"b\": 2}");
    }

    #[test]
    fn test_extract_bare_fence_fallback() {
        let response = "```\n{\"script_found\": true}\n```";
        assert_eq!(extract_structured_block(response).unwrap(), "{\"script_found\": true}");
    }

    #[test]
    fn test_no_fence_is_no_structured_block() {
        let result = validate_response(TaskType::Qa, "[{\"type\": \"x\"}]");
        assert!(matches!(result, Err(ExtractorError::NoStructuredBlockFound)));
    }

    #[test]
    fn test_unparsable_block_is_malformed() {
        let result = validate_response(TaskType::Qa, "```json\n[{\"type\": }]\n```");
        assert!(matches!(result, Err(ExtractorError::MalformedData(_))));
    }

    #[test]
    fn test_qa_records() {
        let response = r#"```json
[
    {"type": "Terminology explanation", "query": "What is RTL?", "answer": "Register Transfer Level."},
    {"type": "Knowledge advice", "query": "How to close timing?", "answer": "Restructure."}
]
```"#;
        let records = validate_response(TaskType::Qa, response).unwrap().into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["query"], "What is RTL?");
    }

    #[test]
    fn test_single_object_counts_as_one_record() {
        let response = "```json\n{\"type\": \"t\", \"query\": \"q\", \"answer\": \"a\"}\n```";
        let records = validate_response(TaskType::Qa, response).unwrap().into_records();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_invalid_items_are_dropped() {
        let response = r#"```json
[{"type": "t", "query": "q", "answer": "a"}, {"type": "t", "query": 3}]
```"#;
        let records = validate_response(TaskType::Qa, response).unwrap().into_records();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_all_items_invalid_is_malformed() {
        let response = "```json\n[{\"query\": \"q\"}, 42]\n```";
        let result = validate_response(TaskType::Qa, response);
        assert!(matches!(result, Err(ExtractorError::MalformedData(_))));
    }

    #[test]
    fn test_empty_array_is_valid() {
        let result = validate_response(TaskType::Script, "```json\n[]\n```").unwrap();
        assert_eq!(result, Validated::Records(Vec::new()));
    }

    #[test]
    fn test_judge_verdict() {
        let found = validate_response(TaskType::ScriptJudge, "```json\n{\"script_found\": true}\n```");
        assert_eq!(found.unwrap(), Validated::Judgement(true));

        let missing = validate_response(TaskType::ScriptJudge, "```json\n{\"script_found\": \"yes\"}\n```");
        assert!(matches!(missing, Err(ExtractorError::MalformedData(_))));
    }

    #[test]
    fn test_script_shape() {
        let response = r#"```json
[{
    "script_name": "SetClockConstraint",
    "definition_description": "Sets a clock.",
    "parameters": {"clock_name": "name"},
    "values": "clock_name: <clk>",
    "script_paradigm": "create_clock -name <clock_name>",
    "examples": [{"query": "q", "answer": "a"}]
}, {
    "script_name": "Broken",
    "definition_description": "d",
    "script_paradigm": "p",
    "parameters": ["not", "an", "object"]
}]
```"#;
        let records = validate_response(TaskType::Script, response).unwrap().into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["script_name"], "SetClockConstraint");
    }

    #[test]
    fn test_knowledge_advice_is_normalised() {
        let response = r#"```json
{
    "knowledge_advice_question": "How to configure PDNGEN?",
    "knowledge_advice_answer": "Pick low-resistance layers.",
    "topic": "Power"
}
```"#;
        let records = validate_response(TaskType::KnowledgeAdvice, response)
            .unwrap()
            .into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["type"], "knowledge_advice");
        assert_eq!(records[0]["topic"], "Power");
        assert_eq!(records[0]["query"], "How to configure PDNGEN?");
        assert_eq!(records[0]["answer"], "Pick low-resistance layers.");
        assert!(records[0].get("knowledge_advice_question").is_none());
    }

    #[test]
    fn test_code_shape() {
        let response = r#"```
{
    "definition_description": "Reads liberty files.",
    "functionality_description": "Loops over .lib files.",
    "inputs": {"libDir": "directory"},
    "outputs": "Loaded libraries.",
    "code_paradigm": "tech.readLiberty(path)"
}
```"#;
        let records = validate_response(TaskType::Code, response).unwrap().into_records();
        assert_eq!(records[0]["outputs"], "Loaded libraries.");
    }

    #[test]
    fn test_scalar_block_is_malformed() {
        let result = validate_response(TaskType::Code, "```json\n\"just a string\"\n```");
        assert!(matches!(result, Err(ExtractorError::MalformedData(_))));
    }
}
