//! Task classification — deciding what kind of request an input is.
//!
//! The task type is the key the ensemble selects on. Classification is a
//! pure function of the input, so the same input always asks the ensemble
//! the same question.

use amplifai_config::{AgentSettings, TaskRuleConfig};

/// Maps an input to a task-type label.
pub trait TaskClassifier: Send + Sync {
    fn classify(&self, input: &str) -> String;
}

/// Always answers with the same task type.
#[derive(Debug, Clone)]
pub struct FixedClassifier(pub String);

impl TaskClassifier for FixedClassifier {
    fn classify(&self, _input: &str) -> String {
        self.0.clone()
    }
}

/// One keyword rule: any keyword found in the input selects `task_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRule {
    pub task_type: String,
    pub keywords: Vec<String>,
}

impl TaskRule {
    pub fn new<I, S>(task_type: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task_type: task_type.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    fn matches(&self, input_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && input_lower.contains(k.as_str()))
    }
}

impl From<&TaskRuleConfig> for TaskRule {
    fn from(cfg: &TaskRuleConfig) -> Self {
        TaskRule::new(&cfg.task_type, cfg.keywords.iter())
    }
}

/// Keyword matcher: the first rule (in order) with a hit wins.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<TaskRule>,
    default_task: String,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<TaskRule>, default_task: impl Into<String>) -> Self {
        Self {
            rules,
            default_task: default_task.into(),
        }
    }

    /// Built-in rules with "chat" as the fallback.
    pub fn with_default_rules() -> Self {
        Self::new(default_rules(), "chat")
    }

    /// Rules from `[agent]` config; built-in rules when none are configured.
    pub fn from_settings(settings: &AgentSettings) -> Self {
        let rules = if settings.task_rules.is_empty() {
            default_rules()
        } else {
            settings.task_rules.iter().map(TaskRule::from).collect()
        };
        Self::new(rules, &settings.default_task_type)
    }

    pub fn rules(&self) -> &[TaskRule] {
        &self.rules
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl TaskClassifier for KeywordClassifier {
    fn classify(&self, input: &str) -> String {
        let lower = input.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lower))
            .map(|r| r.task_type.clone())
            .unwrap_or_else(|| self.default_task.clone())
    }
}

fn default_rules() -> Vec<TaskRule> {
    vec![
        TaskRule::new("analysis", ["analyze", "analyse", "metrics", "insight"]),
        TaskRule::new("code", ["code", "function", "compile", "bug", "refactor"]),
        TaskRule::new("summarize", ["summarize", "summarise", "summary", "tl;dr"]),
        TaskRule::new("planning", ["plan", "income", "schedule", "roadmap"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_cover_common_tasks() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("Please analyze these numbers"), "analysis");
        assert_eq!(c.classify("Why won't this COMPILE?"), "code");
        assert_eq!(c.classify("Give me a summary"), "summarize");
        assert_eq!(c.classify("generate passive income ideas"), "planning");
    }

    #[test]
    fn falls_back_to_default_task() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("hi"), "chat");
        assert_eq!(c.classify(""), "chat");
    }

    #[test]
    fn earlier_rule_wins() {
        let c = KeywordClassifier::default();
        // "analyze" (analysis) comes before "code"
        assert_eq!(c.classify("analyze this code"), "analysis");
    }

    #[test]
    fn classification_is_pure() {
        let c = KeywordClassifier::default();
        let input = "refactor the parser";
        assert_eq!(c.classify(input), c.classify(input));
    }

    #[test]
    fn rules_from_settings() {
        let settings = AgentSettings {
            task_rules: vec![TaskRuleConfig {
                task_type: "rust".into(),
                keywords: vec!["Borrow".into(), "lifetime".into()],
            }],
            default_task_type: "general".into(),
            ..AgentSettings::default()
        };
        let c = KeywordClassifier::from_settings(&settings);
        assert_eq!(c.rules().len(), 1);
        assert_eq!(c.classify("the borrow checker hates me"), "rust");
        assert_eq!(c.classify("analyze this"), "general");
    }

    #[test]
    fn empty_keywords_never_match() {
        let c = KeywordClassifier::new(vec![TaskRule::new("odd", [""])], "chat");
        assert_eq!(c.classify("anything"), "chat");
    }

    #[test]
    fn fixed_classifier_ignores_input() {
        let c = FixedClassifier("chat".into());
        assert_eq!(c.classify("analyze"), "chat");
    }
}
