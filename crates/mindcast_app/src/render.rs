use mindcast_core::{PhaseKind, StageProgress, WorkflowViewModel};

/// Turns view-model changes into terminal lines, printing each fact once.
#[derive(Debug, Default)]
pub struct Renderer {
    phase: Option<PhaseKind>,
    progress: Option<StageProgress>,
    error: Option<String>,
}

impl Renderer {
    pub fn render(&mut self, view: &WorkflowViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        if self.phase != Some(view.phase) {
            self.phase = Some(view.phase);
            if let Some(line) = phase_line(view) {
                lines.push(line);
            }
        }

        if view.progress != self.progress {
            self.progress = view.progress.clone();
            if let Some(progress) = &view.progress {
                let task = view.active_task.as_deref().unwrap_or("-");
                if progress.detail.is_empty() {
                    lines.push(format!("  [{task}] {}", progress.stage));
                } else {
                    lines.push(format!("  [{task}] {}: {}", progress.stage, progress.detail));
                }
            }
        }

        if view.last_error != self.error {
            self.error = view.last_error.clone();
            if let Some(error) = &view.last_error {
                lines.push(format!("error: {error}"));
            }
        }

        lines
    }
}

fn phase_line(view: &WorkflowViewModel) -> Option<String> {
    let line = match view.phase {
        PhaseKind::Idle => return None,
        PhaseKind::NewsReady => {
            let count = view.news.as_ref().map_or(0, |news| news.items.len());
            format!("News: {count} item(s); topic {:?}", view.effective_topic)
        }
        PhaseKind::Generating => format!("Generating episode on {:?}", view.effective_topic),
        PhaseKind::PreviewRunning => format!("Writing script on {:?}", view.effective_topic),
        PhaseKind::ScriptReady => match &view.script_draft {
            Some(draft) => format!(
                "Script ready: {:?}, {} line(s)",
                draft.title,
                draft.dialogue.len()
            ),
            None => "Script ready".to_string(),
        },
        PhaseKind::Synthesizing => "Synthesizing audio".to_string(),
        PhaseKind::PreparingAdjustment => "Loading line speeds".to_string(),
        PhaseKind::AudioAdjustPending => {
            let lines = view
                .audio_adjust
                .as_ref()
                .map_or(0, |draft| draft.lines.len());
            format!("Audio ready for speed adjustment: {lines} line(s)")
        }
        PhaseKind::RetimeApplying => "Applying line speeds".to_string(),
        PhaseKind::Completed => format!(
            "Episode ready: {}",
            view.new_episode.as_deref().unwrap_or("?")
        ),
    };
    Some(line)
}
