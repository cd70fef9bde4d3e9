//! Prompt templates and routing by task type
//!
//! Every template carries exactly one `{tool}` slot, filled with the
//! segment's source label. Templates are checked when registered, so
//! rendering a registered template cannot fail on the slot.

use crate::error::ExtractorError;
use docmint_domain::TaskType;
use std::collections::HashMap;

/// Slot replaced by the target tool name
pub const TOOL_SLOT: &str = "{tool}";

/// Tool name used when a segment has no source label
pub const GENERIC_TOOL_NAME: &str = "EDA";

/// Appended to reformatting requests so the answer comes back fenced
pub const STRUCTURED_RESPONSE_SUFFIX: &str = "Response: \n ```json\n<your json is here>```";

/// A system prompt with one `{tool}` slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    prefix: String,
    suffix: String,
}

impl PromptTemplate {
    /// Parse a template body
    ///
    /// # Errors
    ///
    /// `ExtractorError::Template` unless `{tool}` occurs exactly once.
    pub fn new(body: &str) -> Result<Self, ExtractorError> {
        let occurrences = body.matches(TOOL_SLOT).count();
        if occurrences != 1 {
            return Err(ExtractorError::Template(format!(
                "template must contain {} exactly once, found {}",
                TOOL_SLOT, occurrences
            )));
        }

        match body.split_once(TOOL_SLOT) {
            Some((prefix, suffix)) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            None => Err(ExtractorError::Template(format!("missing {}", TOOL_SLOT))),
        }
    }

    /// Fill the slot
    pub fn render(&self, tool: &str) -> String {
        let mut prompt = String::with_capacity(self.prefix.len() + tool.len() + self.suffix.len());
        prompt.push_str(&self.prefix);
        prompt.push_str(tool);
        prompt.push_str(&self.suffix);
        prompt
    }
}

/// Selects and fills the system prompt for a task
#[derive(Debug, Clone, Default)]
pub struct PromptRouter {
    templates: HashMap<TaskType, PromptTemplate>,
}

impl PromptRouter {
    /// Create a router with no templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with the built-in template for every task
    pub fn standard() -> Result<Self, ExtractorError> {
        let mut router = Self::new();
        for task in TaskType::ALL {
            router.register(task, standard_template(task))?;
        }
        Ok(router)
    }

    /// Register (or replace) the template for a task
    pub fn register(&mut self, task: TaskType, body: &str) -> Result<(), ExtractorError> {
        let template = PromptTemplate::new(body)?;
        self.templates.insert(task, template);
        Ok(())
    }

    /// Whether a task has a template
    pub fn supports(&self, task: TaskType) -> bool {
        self.templates.contains_key(&task)
    }

    /// The system prompt for `task`, targeted at `source_label`
    pub fn render(&self, task: TaskType, source_label: &str) -> Result<String, ExtractorError> {
        let template = self
            .templates
            .get(&task)
            .ok_or_else(|| ExtractorError::Template(format!("no template registered for {}", task)))?;

        let tool = if source_label.is_empty() {
            GENERIC_TOOL_NAME
        } else {
            source_label
        };
        Ok(template.render(tool))
    }
}

/// Built-in template body for a task
pub fn standard_template(task: TaskType) -> &'static str {
    match task {
        TaskType::Qa => QA_PROMPT,
        TaskType::ScriptJudge => SCRIPT_JUDGE_PROMPT,
        TaskType::Script => SCRIPT_PROMPT,
        TaskType::KnowledgeAdvice => KNOWLEDGE_ADVICE_PROMPT,
        TaskType::Code => CODE_PROMPT,
    }
}

const QA_PROMPT: &str = r#"You will act as an EDA tool expert, extracting key information from {tool} tool documentation or community discussions to create a series of Q&A pairs.
Each Q&A pair must accurately reflect the content from the documentation or discussions, and the output must follow the JSON format.
The `type` of each Q&A pair must be one of the following two types:

1. **Terminology explanation**: Explains fundamental concepts and terminology related to EDA processes, helping the user understand various stages from RTL to GDSII.

2. **Knowledge advice**: Provides EDA tool recommendations, optimizations, and solutions, addressing design challenges such as power reduction, area optimization, and timing closure.

Based on the content of each question and answer, you should select the appropriate `type`.

Output format:

```json
[
    {
        "type": "Terminology explanation",
        "query": "What is RTL?",
        "answer": "RTL (Register Transfer Level) is an abstraction used in digital circuit design, describing how data moves between registers and how operations are performed on the data."
    },
    {
        "type": "Knowledge advice",
        "query": "During timing closure, the critical paths in a design can often exceed the timing constraints. How can OpenROAD be used to address this issue?",
        "answer": "OpenROAD's optimization tools, like the delay mode in the restructuring module, focus on enhancing critical path timing by restructuring logic and optimizing the placement of cells to meet timing requirements without compromising on design area."
    }
]
```
Ensure each question and answer is accurately aligned with the documentation or discussion content, avoiding vague or overly general responses.
"#;

const SCRIPT_JUDGE_PROMPT: &str = r#"You are an EDA tool script usage expert. Your task is to determine if the provided {tool} tool content contains any extractable scripts. If the content contains scripts, return the flag "script_found": true; if not, return the flag "script_found": false.

Output format:

```json
{
    "script_found": <true/false>
}
```
"#;

const SCRIPT_PROMPT: &str = r#"You are an EDA tool script usage expert. Your task is to generate script descriptions in the specified format based on the content of the provided {tool} EDA tool documentation. Each script description should include the following fields:

```json
[
    {
        "script_name": "<Name of the script>",
        "definition_description": "<A brief description of the script purpose>",
        "parameters": {
            "parameter1": "<Description of the first input parameter and its role>",
            "parameterN": "Add more parameters as needed"
        },
        "values": "<Values corresponding to each script in the text>",
        "script_paradigm": "<The specific tcl/python code template for the script>",
        "examples": [
            {
                "query": "A summary of the specific example described in the text into question",
                "answer": "Specific code for the example"
            }
        ]
    }
]
```

Example:
```json
{
    "script_name": "SetClockConstraint",
    "definition_description": "This script sets a clock constraint for timing analysis in the design.",
    "parameters": {
        "clock_name": "The name of the clock to be set",
        "clock_period": "The period of the clock in nanoseconds"
    },
    "values": "clock_name: <clk>, clock_period: <ns>",
    "script_paradigm": "set_clock -name <clock_name> -period <clock_period>",
    "examples": [
        {
            "query": "How to set a 5ns clock constraint for clk?",
            "answer": "set_clock -name clk -period 5ns"
        }
    ]
}
```
Ensure each description is accurately aligned with the documentation content, avoiding vague or overly general responses.
Ensure that values in the script description do not contain single quotes and that all parameters are enclosed in < > to avoid any issues with JSON parsing.
"#;

const KNOWLEDGE_ADVICE_PROMPT: &str = r#"You are an assistant in the field of Electronic Design Automation (EDA), focusing on helping users convert existing questions into Knowledge Advice-type questions. Knowledge Advice questions require you to provide advanced recommendations on design optimizations and strategies related to {tool} and similar EDA tools. In the solutions, incorporate detailed insights on design optimization strategies such as power distribution network, area optimization, and timing closure.

Please output the result in the following format:

{
    "knowledge_advice_question": "<Revised Knowledge Advice question>",
    "knowledge_advice_answer": "<Detailed answer offering design recommendations, optimizations, and relevant insights>",
    "topic": "<Relevant topic, such as 'Power Optimization' or 'Timing Closure'>"
}

**Example Input**:
Question: What is PDNGEN?
Answer: The PDNGEN module (pdn) in OpenROAD aims to simplify the process of adding a power grid into a floorplan.

**Example Output**:

{
    "knowledge_advice_question": "In a high-performance design using OpenROAD, what are some recommended strategies for configuring PDNGEN to ensure a robust power distribution network across both standard cells and macros?",
    "knowledge_advice_answer": "Select layers that offer minimal resistance and ensure ample power delivery to high-demand regions. Wider and closely spaced stripes improve power integrity but may increase routing congestion, so balance stripe width and spacing. Use separate grid policies for standard cell regions and macros to account for their different power demands.",
    "topic": "Power Distribution Network (PDN) Optimization"
}

Please use the format above to process new questions and answers.
"#;

const CODE_PROMPT: &str = r#"You are an assistant familiar with {tool} and other EDA tools, focusing on helping users write and explain EDA Python API code. Your task is to organize the code snippets and explanations provided by the user into a standardized JSON format. This format helps users quickly understand the purpose, input parameters, output results, and code examples of functions in different tasks.

Please generate the output according to the following JSON structure and provide detailed descriptions:

{
    "definition_description": "<A brief description of the code purpose>",
    "functionality_description": "<Detailed explanation of the code's implementation logic and workflow>",
    "inputs": {
        "parameter1": "<Description of the first input parameter and its role>",
        "parameterN": "Add more parameters as needed"
    },
    "outputs": "<Description of what the code produces or outputs>",
    "code_paradigm": "<Brief code of the programming paradigm>"
}

Example:

query: Template of reading .lib (liberty) files
code: from openroad import Tech\nfrom pathlib import Path\n\ntech = Tech()\nlibDir = Path('lib_path')\nfor libFile in libDir.glob('*.lib'):\n  tech.readLiberty(libFile.as_posix())

Response:

{
    "definition_description": "This code reads all .lib (Liberty) files in a specified directory and loads them into the OpenROAD Tech object.",
    "functionality_description": "1. Initialize a Tech object.\n2. Define the directory containing the Liberty files.\n3. Load each .lib file into the Tech object with readLiberty.",
    "inputs": {
        "libDir": "Path to the directory containing .lib files.",
        "tech": "The OpenROAD Tech object used to load technology and cell library information."
    },
    "outputs": "Loads each .lib file in the specified directory into the Tech object.",
    "code_paradigm": "from openroad import Tech\nfrom pathlib import Path\n\ntech = Tech()\nlibDir = Path('lib_path')\nfor libFile in libDir.glob('*.lib'):\n  tech.readLiberty(libFile.as_posix())"
}

Please use the above format to process new code or instructions.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_router_covers_every_task() {
        let router = PromptRouter::standard().unwrap();
        for task in TaskType::ALL {
            assert!(router.supports(task), "missing template for {}", task);
        }
    }

    #[test]
    fn test_render_fills_tool_slot() {
        let router = PromptRouter::standard().unwrap();
        let prompt = router.render(TaskType::Qa, "yosys_hq").unwrap();

        assert!(prompt.contains("from yosys_hq tool documentation"));
        assert!(!prompt.contains(TOOL_SLOT));
    }

    #[test]
    fn test_render_is_pure() {
        let router = PromptRouter::standard().unwrap();
        assert_eq!(
            router.render(TaskType::Script, "klayout").unwrap(),
            router.render(TaskType::Script, "klayout").unwrap()
        );
    }

    #[test]
    fn test_empty_label_uses_generic_tool_name() {
        let router = PromptRouter::standard().unwrap();
        let prompt = router.render(TaskType::ScriptJudge, "").unwrap();
        assert!(prompt.contains("provided EDA tool content"));
    }

    #[test]
    fn test_judge_and_extraction_prompts_are_distinguishable() {
        let router = PromptRouter::standard().unwrap();
        let judge = router.render(TaskType::ScriptJudge, "qflow").unwrap();
        let script = router.render(TaskType::Script, "qflow").unwrap();

        assert!(judge.contains("script_found"));
        assert!(!script.contains("script_found"));
    }

    #[test]
    fn test_template_without_slot_is_rejected() {
        let result = PromptTemplate::new("no slot here");
        assert!(matches!(result, Err(ExtractorError::Template(_))));
    }

    #[test]
    fn test_template_with_two_slots_is_rejected() {
        let mut router = PromptRouter::new();
        let result = router.register(TaskType::Qa, "{tool} and {tool}");
        assert!(matches!(result, Err(ExtractorError::Template(_))));
        assert!(!router.supports(TaskType::Qa));
    }

    #[test]
    fn test_unregistered_task_is_an_error() {
        let router = PromptRouter::new();
        assert!(matches!(
            router.render(TaskType::Code, "OpenROAD"),
            Err(ExtractorError::Template(_))
        ));
    }

    #[test]
    fn test_template_render_keeps_surrounding_text() {
        let template = PromptTemplate::new("Explain {tool} scripts.").unwrap();
        assert_eq!(template.render("OpenSTA"), "Explain OpenSTA scripts.");
    }
}
