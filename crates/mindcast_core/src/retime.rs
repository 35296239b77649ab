//! Per-line narration speed editing between first synthesis and retime.

use crate::model::{EpisodeDetail, EpisodeId, ScriptDraft};

pub const MIN_SPEECH_RATE: f64 = 0.5;
pub const MAX_SPEECH_RATE: f64 = 2.0;
pub const DEFAULT_SPEECH_RATE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustLine {
    pub speaker: String,
    pub text: String,
    pub speech_rate: f64,
}

/// Editable speed table for one synthesized episode.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAdjustDraft {
    pub episode_id: EpisodeId,
    pub lines: Vec<AdjustLine>,
}

impl AudioAdjustDraft {
    /// Builds the table from the episode's produced dialogue.
    ///
    /// Rates are clamped; missing ones default to [`DEFAULT_SPEECH_RATE`]. An
    /// episode without dialogue falls back to the lines of the script draft
    /// that were sent for synthesis, every line at default speed.
    pub fn from_episode(
        episode_id: EpisodeId,
        episode: &EpisodeDetail,
        fallback: Option<&ScriptDraft>,
    ) -> Self {
        let lines = if episode.dialogue.is_empty() {
            fallback
                .map(|draft| {
                    draft
                        .trimmed_for_synthesis()
                        .dialogue
                        .into_iter()
                        .map(|line| AdjustLine {
                            speaker: line.speaker,
                            text: line.text,
                            speech_rate: DEFAULT_SPEECH_RATE,
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else {
            episode
                .dialogue
                .iter()
                .map(|line| AdjustLine {
                    speaker: line.speaker.clone(),
                    text: line.text.clone(),
                    speech_rate: line
                        .speech_rate
                        .map_or(DEFAULT_SPEECH_RATE, clamp_speech_rate),
                })
                .collect()
        };
        Self { episode_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Rates as transmitted to the retime endpoint, one per line.
    pub fn line_speeds(&self) -> Vec<f64> {
        self.lines
            .iter()
            .map(|line| clamp_speech_rate(line.speech_rate))
            .collect()
    }
}

/// Clamps a rate into `[MIN_SPEECH_RATE, MAX_SPEECH_RATE]`; non-finite input maps to the default first.
pub fn clamp_speech_rate(rate: f64) -> f64 {
    let rate = if rate.is_finite() {
        rate
    } else {
        DEFAULT_SPEECH_RATE
    };
    rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
}
