//! Feedback providers.

use crate::insights::{Insight, Severity};
use crate::prompt::FeedbackPrompt;
use crate::FeedbackError;

/// Turns a prompt and rule findings into prose feedback.
///
/// Network-backed model clients implement this outside the workspace;
/// [`RuleBasedNarrator`] is the offline implementation.
pub trait FeedbackProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn narrate(
        &self,
        prompt: &FeedbackPrompt,
        insights: &[Insight],
    ) -> Result<String, FeedbackError>;
}

/// Deterministic narrator that writes feedback from the findings alone.
#[derive(Clone, Copy, Debug)]
pub struct RuleBasedNarrator {
    /// Findings listed before the rest are summarised as a count.
    pub max_points: usize,
}

impl Default for RuleBasedNarrator {
    fn default() -> Self {
        Self { max_points: 5 }
    }
}

impl FeedbackProvider for RuleBasedNarrator {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn narrate(
        &self,
        prompt: &FeedbackPrompt,
        insights: &[Insight],
    ) -> Result<String, FeedbackError> {
        if prompt.user.trim().is_empty() {
            return Err(FeedbackError::Narration("prompt has no content".into()));
        }
        let count = |s: Severity| insights.iter().filter(|i| i.severity == s).count();
        let (critical, warning) = (count(Severity::Critical), count(Severity::Warning));

        let mut out = Vec::new();
        out.push(match (critical, warning) {
            (0, 0) => "Solid run: nothing in this campaign needs urgent attention.".to_string(),
            (0, w) => format!("Decent run with {w} thing(s) worth improving."),
            (c, w) => format!("This run has {c} critical problem(s) and {w} warning(s)."),
        });

        for i in insights.iter().take(self.max_points) {
            out.push(format!("- {i}"));
        }
        if insights.len() > self.max_points {
            out.push(format!("- ...and {} more", insights.len() - self.max_points));
        }

        if let Some(top) = insights.iter().find(|i| i.severity > Severity::Info) {
            out.push(format!("Next step: fix the {} issue first.", top.area.as_str()));
        }
        Ok(out.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::Area;

    fn prompt() -> FeedbackPrompt {
        FeedbackPrompt {
            system: "s".into(),
            user: "Campaign: x".into(),
        }
    }

    fn insight(severity: Severity, area: Area) -> Insight {
        Insight {
            severity,
            area,
            message: "m".into(),
        }
    }

    #[test]
    fn clean_runs_get_praise() {
        let text = RuleBasedNarrator::default().narrate(&prompt(), &[]).unwrap();
        assert!(text.starts_with("Solid run"));
        assert!(!text.contains("Next step"));
    }

    #[test]
    fn critical_findings_lead_the_next_step() {
        let insights = vec![
            insight(Severity::Critical, Area::Conversion),
            insight(Severity::Warning, Area::Budget),
        ];
        let text = RuleBasedNarrator::default().narrate(&prompt(), &insights).unwrap();
        assert!(text.contains("1 critical problem(s) and 1 warning(s)"));
        assert!(text.ends_with("Next step: fix the conversion issue first."));
    }

    #[test]
    fn long_lists_are_truncated() {
        let insights = vec![insight(Severity::Info, Area::Budget); 4];
        let text = RuleBasedNarrator { max_points: 2 }
            .narrate(&prompt(), &insights)
            .unwrap();
        assert!(text.contains("...and 2 more"));
    }

    #[test]
    fn empty_prompt_is_an_error() {
        let err = RuleBasedNarrator::default()
            .narrate(&FeedbackPrompt::default(), &[])
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Narration(_)));
    }
}
