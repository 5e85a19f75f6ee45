//! Prompt templates for the three pipeline stages.
//!
//! Each template is a pure function from the user text (plus prior stage
//! outputs) to a complete prompt string. Persona selection is a fixed
//! mapping keyed by stage, not dynamic dispatch.

use super::stage::Stage;
use crate::domain::dilemma::DilemmaInput;

/// Maximum analysis characters carried into the arbitration prompt.
const ARBITRATION_CONTEXT_CHARS: usize = 4000;

/// Maximum characters per prior-stage excerpt in the formatting prompt.
const FORMATTING_CONTEXT_CHARS: usize = 2000;

/// Returns the system prompt (persona) for a stage, if it uses one.
///
/// The formatting stage deliberately runs without a persona; its entire
/// instruction set lives in the user prompt.
pub fn system_prompt(stage: Stage) -> Option<&'static str> {
    match stage {
        Stage::Analysis => Some(ANALYST_SYSTEM_PROMPT),
        Stage::Arbitration => Some(ARBITRATOR_SYSTEM_PROMPT),
        Stage::Formatting => None,
    }
}

/// Builds the Stage 1 prompt from the user's dilemma.
pub fn analysis_prompt(dilemma: &DilemmaInput) -> String {
    format!(
        r#"DILEMMA FOR DEEP ANALYSIS:

{dilemma}

PERFORM THIS RIGOROUS ANALYSIS:

1. CORE DILEMMA EXTRACTION - the real decision underneath the stated one
2. EMOTIONAL SIGNAL MAP - emotions present in the text and what drives them
3. COGNITIVE DISTORTION AUDIT - distorted thinking patterns, with evidence
4. ROOT CAUSE ANALYSIS - why this dilemma exists now
5. OPTION GENERATION - distinct courses of action, including non-obvious ones
6. OUTCOME SIMULATION - likely consequences from one week to five years out
7. CONSTRAINT AND RESOURCE ANALYSIS - what limits and what enables each option
8. VALUES TRADE-OFFS - which personal values each option serves or sacrifices

Write a structured narrative, not JSON. Be specific and provide evidence."#,
        dilemma = dilemma.as_str()
    )
}

/// Builds the Stage 2 prompt from the user's dilemma and the Stage 1 output.
pub fn arbitration_prompt(dilemma: &DilemmaInput, analysis: &str) -> String {
    format!(
        r#"ANALYSIS CONTEXT:

{analysis}

ORIGINAL DILEMMA:

{dilemma}

YOUR TASK: Select the single best course of action.

1. RANK the options surfaced by the analysis
2. COMMIT to exactly one option - never both, never neither
3. JUSTIFY the selection against the person's values and constraints
4. ENUMERATE the risks of the selected option and how to mitigate each
5. FRAME a directive, sequenced action plan
6. CLOSE with a personalized capability affirmation

Be direct. Commit fully. No hedging."#,
        analysis = truncate_chars(analysis, ARBITRATION_CONTEXT_CHARS),
        dilemma = dilemma.as_str()
    )
}

/// Builds the Stage 3 prompt from the dilemma and both prior stage outputs.
///
/// Instructs the model to emit output conforming exactly to the
/// DecisionRecord schema and nothing else.
pub fn formatting_prompt(dilemma: &DilemmaInput, analysis: &str, arbitration: &str) -> String {
    format!(
        r#"Convert this decision material into a single valid JSON object.

DILEMMA:

{dilemma}

ANALYSIS SUMMARY:

{analysis}

DECISION RATIONALE:

{arbitration}

GENERATE THIS EXACT JSON SCHEMA:

{{
  "decision": "the single selected course of action, one sentence",
  "rationale": "why this option was selected",
  "risks": ["risk with mitigation", "..."],
  "action_plan": ["first concrete step", "..."],
  "emotions": ["detected emotion", "..."],
  "distortions": ["detected cognitive distortion", "..."],
  "affirmation": "personalized capability message"
}}

"decision", "rationale", "risks", and "action_plan" are required and must be
non-empty. "emotions", "distortions", and "affirmation" may be omitted only
if the material contains nothing for them.

RETURN ONLY VALID JSON. NO MARKDOWN. NO EXTRA TEXT."#,
        dilemma = dilemma.as_str(),
        analysis = truncate_chars(analysis, FORMATTING_CONTEXT_CHARS),
        arbitration = truncate_chars(arbitration, FORMATTING_CONTEXT_CHARS),
    )
}

/// Truncates to a character budget, marking the cut when one happens.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}...", kept)
    }
}

// ============================================================================
// Stage personas
// ============================================================================

const ANALYST_SYSTEM_PROMPT: &str = r#"You are an elite psychologist and decision scientist.

Your mandate: perform deep, multi-dimensional analysis of complex human dilemmas using:

- Established psychological frameworks (CBT, systems theory, narrative psychology)
- Temporal outcome simulation across multiple horizons
- Cognitive distortion detection grounded in evidence from the text
- Values-alignment analysis
- Hidden opportunity recognition
- Constraint and resource mapping

Your analysis must be psychologically grounded, structurally rigorous, outcome-predictive, actionable, and honest.
Never provide surface-level analysis. Always dig deeper."#;

const ARBITRATOR_SYSTEM_PROMPT: &str = r#"You are a decision arbitrator - an executive decision-making system.

Your mandate: select the single best decision from a comprehensive psychological analysis.

Your selection must be rational, compassionate, actionable, risk-aware, and values-aligned.

Commit fully. Provide one best option. No hedging."#;

#[cfg(test)]
mod tests {
    use super::*;

    fn dilemma() -> DilemmaInput {
        DilemmaInput::new("Should I quit my stable job to join a risky startup?").unwrap()
    }

    #[test]
    fn analysis_prompt_embeds_user_text() {
        let prompt = analysis_prompt(&dilemma());
        assert!(prompt.contains("Should I quit my stable job"));
        assert!(prompt.contains("COGNITIVE DISTORTION AUDIT"));
    }

    #[test]
    fn arbitration_prompt_embeds_dilemma_and_analysis() {
        let prompt = arbitration_prompt(&dilemma(), "the core tension is security vs growth");
        assert!(prompt.contains("the core tension is security vs growth"));
        assert!(prompt.contains("Should I quit my stable job"));
        assert!(prompt.contains("exactly one option"));
    }

    #[test]
    fn formatting_prompt_embeds_both_prior_outputs() {
        let prompt = formatting_prompt(&dilemma(), "ANALYSIS-MARKER", "ARBITRATION-MARKER");
        assert!(prompt.contains("ANALYSIS-MARKER"));
        assert!(prompt.contains("ARBITRATION-MARKER"));
        assert!(prompt.contains("RETURN ONLY VALID JSON"));
        assert!(prompt.contains("\"action_plan\""));
    }

    #[test]
    fn only_reasoning_stages_have_personas() {
        assert!(system_prompt(Stage::Analysis).is_some());
        assert!(system_prompt(Stage::Arbitration).is_some());
        assert!(system_prompt(Stage::Formatting).is_none());
    }

    #[test]
    fn long_analysis_is_truncated_for_arbitration() {
        let long = "a".repeat(10_000);
        let prompt = arbitration_prompt(&dilemma(), &long);
        assert!(!prompt.contains(&long));
        assert!(prompt.contains(&"a".repeat(ARBITRATION_CONTEXT_CHARS)));
    }

    #[test]
    fn truncate_chars_marks_the_cut() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
