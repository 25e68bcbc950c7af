//! Workload analysis context
//!
//! Requests coming from the workload tracker may carry the kind of analysis
//! asked for and the activities it covers. Remote providers only see it in the
//! prompt; the Mock provider and degraded results use it to produce
//! deterministic text.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisKind {
    #[default]
    InitialSummary,
    WorkloadBalance,
    ProductivityInsights,
    WeeklyReview,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialSummary => write!(f, "initial summary"),
            Self::WorkloadBalance => write!(f, "workload balance"),
            Self::ProductivityInsights => write!(f, "productivity insights"),
            Self::WeeklyReview => write!(f, "weekly review"),
        }
    }
}

/// One tracked activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub duration_minutes: u32,
}

impl Activity {
    pub fn new(title: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            title: title.into(),
            category: None,
            duration_minutes,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub kind: AnalysisKind,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl AnalysisContext {
    pub fn new(kind: AnalysisKind, activities: Vec<Activity>) -> Self {
        Self { kind, activities }
    }

    pub fn total_minutes(&self) -> u64 {
        self.activities
            .iter()
            .map(|a| u64::from(a.duration_minutes))
            .sum()
    }

    /// Category with the most tracked minutes
    fn busiest_category(&self) -> Option<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::new();
        for activity in &self.activities {
            let category = activity
                .category
                .clone()
                .unwrap_or_else(|| "uncategorized".to_string());
            match totals.iter_mut().find(|(c, _)| *c == category) {
                Some((_, minutes)) => *minutes += u64::from(activity.duration_minutes),
                None => totals.push((category, u64::from(activity.duration_minutes))),
            }
        }
        // first-seen wins ties
        totals
            .into_iter()
            .fold(None, |best: Option<(String, u64)>, item| match best {
                Some(b) if b.1 >= item.1 => Some(b),
                _ => Some(item),
            })
    }
}

/// Deterministic analysis text for a context
///
/// Always ends with a numbered list of exactly three suggestions.
pub fn canned_analysis(context: &AnalysisContext) -> String {
    let mut text = String::new();

    if context.activities.is_empty() {
        text.push_str(&format!(
            "Workload {}: No activities recorded yet. Once you start tracking your work, \
             this summary will show where your time goes.\n\n",
            context.kind
        ));
        text.push_str("Suggestions:\n");
        text.push_str("1. Log your first activity to start building a picture of your workload.\n");
        text.push_str("2. Assign a category to each activity so time can be grouped.\n");
        text.push_str("3. Record durations as you go rather than at the end of the day.\n");
        return text;
    }

    let total = context.total_minutes();
    text.push_str(&format!(
        "Workload {}: {} activities recorded, {}h {}m tracked in total.",
        context.kind,
        context.activities.len(),
        total / 60,
        total % 60
    ));
    if let Some((category, minutes)) = context.busiest_category() {
        text.push_str(&format!(
            " Most time went to {} ({}h {}m).",
            category,
            minutes / 60,
            minutes % 60
        ));
    }
    text.push_str("\n\nSuggestions:\n");
    text.push_str("1. Block focused time for your largest category before other work.\n");
    text.push_str("2. Batch short activities together to reduce context switching.\n");
    text.push_str("3. Review this summary weekly and adjust your plan.\n");
    text
}

/// Analysis text for a request without context
pub fn generic_analysis(prompt: &str) -> String {
    let preview: String = prompt.chars().take(80).collect();
    format!(
        "Analysis unavailable from remote providers; showing a local summary for: \"{}\".\n\n\
         Suggestions:\n\
         1. Retry the request in a few moments.\n\
         2. Keep tracking activities so the next analysis has more to work with.\n\
         3. Check provider configuration if this message persists.\n",
        preview.trim()
    )
}
