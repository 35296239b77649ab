use crate::model::{
    EpisodeDetail, EpisodeId, Guest, NewsSnapshot, ScriptDraft, TaskId, TaskKind, TaskRequest,
    TaskResult, TaskStatus, WorkflowMode, MAX_GUESTS,
};
use crate::retime::{clamp_speech_rate, AudioAdjustDraft};
use crate::view_model::StageProgress;
use crate::{Effect, Msg, WorkflowPhase, WorkflowState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: WorkflowState, msg: Msg) -> (WorkflowState, Vec<Effect>) {
    let before = state.clone();
    let effects = match msg {
        Msg::TopicQueryChanged(query) => {
            state.topic_query = query;
            Vec::new()
        }
        Msg::FetchNewsClicked => fetch_news(&mut state),
        Msg::NewsFetched(result) => {
            on_news_fetched(&mut state, result);
            Vec::new()
        }
        Msg::TopicSelected(title) => {
            state.selected_topic = title;
            state.custom_topic.clear();
            Vec::new()
        }
        Msg::CustomTopicChanged(topic) => {
            state.custom_topic = topic;
            Vec::new()
        }
        Msg::LoadGuestsRequested => vec![Effect::LoadGuests],
        Msg::GuestsLoaded(result) => {
            on_guests_loaded(&mut state, result);
            Vec::new()
        }
        Msg::GuestToggled(name) => {
            state.toggle_guest(&name);
            Vec::new()
        }
        Msg::SaveGuestRequested { guest, is_edit } => save_guest(&mut state, guest, is_edit),
        Msg::GuestSaved { name, result } => {
            on_guest_saved(&mut state, &name, result);
            Vec::new()
        }
        Msg::RemoveGuestRequested(name) => vec![Effect::RemoveGuest { name }],
        Msg::GuestRemoved { name, result } => {
            on_guest_removed(&mut state, &name, result);
            Vec::new()
        }
        Msg::WorkflowModeChanged(mode) => {
            // Dispatch of the completion signal depends on the mode.
            if state.phase.is_settled() {
                state.mode = mode;
            }
            Vec::new()
        }
        Msg::GenerateClicked => start_generate(&mut state),
        Msg::PreviewClicked => generate_script_preview(&mut state),
        Msg::CancelPreviewClicked => cancel_script_preview(&mut state),
        Msg::DraftLineEdited { index, text } => {
            edit_draft_line(&mut state, index, text);
            Vec::new()
        }
        Msg::ConfirmSynthesisClicked => confirm_script_synthesis(&mut state),
        Msg::SegmentSpeedChanged { index, rate } => {
            if let WorkflowPhase::AudioAdjustPending {
                draft,
                applying: false,
            } = &mut state.phase
            {
                if let Some(line) = draft.lines.get_mut(index) {
                    line.speech_rate = clamp_speech_rate(rate);
                }
            }
            Vec::new()
        }
        Msg::ApplySpeedsClicked => apply_segment_speeds(&mut state),
        Msg::SkipSpeedAdjustClicked => skip_segment_speed_adjust(&mut state),
        Msg::TaskStarted { kind, task_id } => on_task_started(&mut state, kind, task_id),
        Msg::TaskStartFailed { kind, message } => {
            on_task_start_failed(&mut state, kind, message);
            Vec::new()
        }
        Msg::TaskProgress {
            task_id,
            stage,
            detail,
        } => {
            if is_outstanding(&state, &task_id) {
                state.progress = Some(StageProgress { stage, detail });
            }
            Vec::new()
        }
        Msg::TaskFinished {
            task_id,
            status,
            result,
            message,
        } => on_task_finished(&mut state, &task_id, status, result, message),
        // The synthesis being adjusted already delivered its completion.
        Msg::GenerateCompleted { .. }
            if matches!(
                state.phase,
                WorkflowPhase::PreparingAdjustment { .. } | WorkflowPhase::AudioAdjustPending { .. }
            ) =>
        {
            Vec::new()
        }
        Msg::GenerateCompleted { episode_id } => {
            let mut effects = vec![Effect::CloseSubscription];
            effects.extend(on_generate_completed(&mut state, episode_id));
            effects
        }
        Msg::EpisodeFetched { episode_id, result } => {
            prepare_audio_adjustment(&mut state, &episode_id, result);
            Vec::new()
        }
        Msg::EpisodeDismissed => {
            if matches!(state.phase, WorkflowPhase::Completed { .. }) {
                state.phase = state.settled_phase();
            }
            Vec::new()
        }
        Msg::ResetWizard => {
            state.reset();
            vec![Effect::CloseSubscription]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    if state != before {
        state.mark_dirty();
    }
    (state, effects)
}

fn is_outstanding(state: &WorkflowState, task_id: &TaskId) -> bool {
    state
        .phase
        .outstanding_task()
        .is_some_and(|(_, id)| id == task_id)
}

fn fetch_news(state: &mut WorkflowState) -> Vec<Effect> {
    if state.fetching_news {
        return Vec::new();
    }
    state.fetching_news = true;
    let query = state.topic_query.trim();
    vec![Effect::FetchNews {
        topic: (!query.is_empty()).then(|| query.to_string()),
        max_results: state.max_news_results,
    }]
}

fn on_news_fetched(state: &mut WorkflowState, result: Result<NewsSnapshot, String>) {
    // A reset while the request was in flight makes the answer stale.
    if !state.fetching_news {
        return;
    }
    state.fetching_news = false;
    match result {
        Ok(snapshot) => {
            if let Some(first) = snapshot.items.first() {
                state.selected_topic = first.title.clone();
            }
            state.custom_topic.clear();
            state.news = Some(snapshot);
            if state.phase == WorkflowPhase::Idle {
                state.phase = WorkflowPhase::NewsReady;
            }
        }
        Err(message) => state.last_error = Some(message),
    }
}

fn on_guests_loaded(state: &mut WorkflowState, result: Result<Vec<Guest>, String>) {
    match result {
        Ok(guests) => {
            if state.selected_guests.is_empty() {
                if let Some(first) = guests.first() {
                    state.selected_guests.push(first.name.clone());
                }
            }
            state.guests = guests;
        }
        Err(message) => state.last_error = Some(message),
    }
}

fn save_guest(state: &mut WorkflowState, guest: Guest, is_edit: bool) -> Vec<Effect> {
    if guest.name.trim().is_empty() {
        state.last_error = Some("Guest name is required".to_string());
        return Vec::new();
    }
    vec![Effect::SaveGuest { guest, is_edit }]
}

fn on_guest_saved(state: &mut WorkflowState, name: &str, result: Result<Vec<Guest>, String>) {
    match result {
        Ok(guests) => {
            state.guests = guests;
            if !state.selected_guests.iter().any(|g| g == name)
                && state.selected_guests.len() < MAX_GUESTS
            {
                state.selected_guests.push(name.to_string());
            }
        }
        Err(message) => state.last_error = Some(message),
    }
}

fn on_guest_removed(state: &mut WorkflowState, name: &str, result: Result<Vec<Guest>, String>) {
    match result {
        Ok(guests) => {
            state.guests = guests;
            state.selected_guests.retain(|g| g != name);
        }
        Err(message) => state.last_error = Some(message),
    }
}

fn can_start_stage(state: &WorkflowState) -> bool {
    state.can_generate() && state.phase.is_settled()
}

fn start_generate(state: &mut WorkflowState) -> Vec<Effect> {
    if !can_start_stage(state) {
        return Vec::new();
    }
    state.last_error = None;
    state.progress = None;
    state.phase = WorkflowPhase::Generating { task_id: None };
    vec![Effect::StartTask(TaskRequest::Generate {
        topic: state.effective_topic().trim().to_string(),
        selected_guests: state.selected_guests.clone(),
    })]
}

fn generate_script_preview(state: &mut WorkflowState) -> Vec<Effect> {
    if !can_start_stage(state) {
        return Vec::new();
    }
    state.last_error = None;
    state.progress = None;
    state.script_draft = None;
    state.phase = WorkflowPhase::PreviewRunning { task_id: None };
    vec![Effect::StartTask(TaskRequest::Preview {
        topic: state.effective_topic().trim().to_string(),
        selected_guests: state.selected_guests.clone(),
    })]
}

fn cancel_script_preview(state: &mut WorkflowState) -> Vec<Effect> {
    let WorkflowPhase::PreviewRunning { task_id } = &state.phase else {
        return Vec::new();
    };
    // Without an id the start request is still in flight; its late
    // `TaskStarted` finds no waiting phase and is discarded.
    let effects = task_id
        .clone()
        .map(|task_id| vec![Effect::CancelTask { task_id }])
        .unwrap_or_default();
    state.progress = Some(StageProgress::terminated());
    state.phase = state.settled_phase();
    effects
}

fn edit_draft_line(state: &mut WorkflowState, index: usize, text: String) {
    if state.phase != WorkflowPhase::ScriptReady {
        return;
    }
    if let Some(line) = state
        .script_draft
        .as_mut()
        .and_then(|draft| draft.dialogue.get_mut(index))
    {
        line.text = text;
    }
}

fn confirm_script_synthesis(state: &mut WorkflowState) -> Vec<Effect> {
    if !state.phase.is_settled() {
        return Vec::new();
    }
    let Some(draft) = state.script_draft.as_ref().filter(|d| d.has_dialogue()) else {
        return Vec::new();
    };
    let script = draft.trimmed_for_synthesis();
    if !script.has_dialogue() {
        state.last_error = Some("Script has no spoken lines".to_string());
        return Vec::new();
    }
    state.last_error = None;
    state.progress = None;
    state.phase = WorkflowPhase::Synthesizing { task_id: None };
    vec![Effect::StartTask(TaskRequest::Synthesize { script })]
}

fn on_task_started(state: &mut WorkflowState, kind: TaskKind, task_id: TaskId) -> Vec<Effect> {
    let accepted = match (&mut state.phase, kind) {
        (WorkflowPhase::Generating { task_id: slot }, TaskKind::Generate)
        | (WorkflowPhase::PreviewRunning { task_id: slot }, TaskKind::Preview)
        | (WorkflowPhase::Synthesizing { task_id: slot }, TaskKind::Synthesize)
            if slot.is_none() =>
        {
            *slot = Some(task_id.clone());
            true
        }
        (
            WorkflowPhase::AudioAdjustPending {
                draft,
                applying: true,
            },
            TaskKind::Retime,
        ) => {
            let draft = draft.clone();
            state.phase = WorkflowPhase::RetimeApplying {
                task_id: task_id.clone(),
                draft,
            };
            true
        }
        _ => false,
    };

    if accepted {
        vec![Effect::Subscribe { task_id }]
    } else {
        vec![Effect::DiscardTask { task_id }]
    }
}

fn on_task_start_failed(state: &mut WorkflowState, kind: TaskKind, message: String) {
    match (&mut state.phase, kind) {
        (WorkflowPhase::Generating { task_id: None }, TaskKind::Generate)
        | (WorkflowPhase::PreviewRunning { task_id: None }, TaskKind::Preview)
        | (WorkflowPhase::Synthesizing { task_id: None }, TaskKind::Synthesize) => {
            state.phase = state.settled_phase();
            state.last_error = Some(message);
        }
        (WorkflowPhase::AudioAdjustPending { applying, .. }, TaskKind::Retime) if *applying => {
            *applying = false;
            state.last_error = Some(message);
        }
        _ => {}
    }
}

fn on_task_finished(
    state: &mut WorkflowState,
    task_id: &TaskId,
    status: TaskStatus,
    result: Option<TaskResult>,
    message: Option<String>,
) -> Vec<Effect> {
    if !status.is_terminal() {
        return Vec::new();
    }
    // Duplicate, late or cancelled-before-delivery terminals end up here.
    let Some((kind, _)) = state
        .phase
        .outstanding_task()
        .filter(|(_, id)| *id == task_id)
    else {
        return Vec::new();
    };

    match (kind, status) {
        (TaskKind::Preview, TaskStatus::Completed) => {
            match result {
                Some(result) => state.script_draft = Some(ScriptDraft::from_result(&result)),
                None => {
                    state.last_error = Some("Script preview finished without a result".into())
                }
            }
            state.phase = state.settled_phase();
            Vec::new()
        }
        (TaskKind::Preview, TaskStatus::Cancelled) => {
            state.progress = Some(StageProgress::terminated());
            state.phase = state.settled_phase();
            Vec::new()
        }
        (_, TaskStatus::Completed) => {
            let episode_id = result.and_then(|r| r.episode_id);
            on_generate_completed(state, episode_id)
        }
        (TaskKind::Retime, _) => {
            if let WorkflowPhase::RetimeApplying { draft, .. } = std::mem::take(&mut state.phase) {
                state.phase = WorkflowPhase::AudioAdjustPending {
                    draft,
                    applying: false,
                };
            }
            state.last_error = Some(message.unwrap_or_else(|| "Retime failed".to_string()));
            Vec::new()
        }
        (kind, status) => {
            state.phase = state.settled_phase();
            if status == TaskStatus::Failed {
                state.last_error = Some(
                    message.unwrap_or_else(|| format!("{} task failed", kind.as_str())),
                );
            }
            Vec::new()
        }
    }
}

/// Decides what a finished generate, synthesize or retime task means.
fn on_generate_completed(state: &mut WorkflowState, episode_id: Option<EpisodeId>) -> Vec<Effect> {
    let previous = std::mem::take(&mut state.phase);
    let Some(episode_id) = episode_id.filter(|id| !id.is_empty()) else {
        state.phase = match previous {
            WorkflowPhase::RetimeApplying { draft, .. } => WorkflowPhase::AudioAdjustPending {
                draft,
                applying: false,
            },
            _ => state.settled_phase(),
        };
        state.last_error = Some("Task finished without an episode".to_string());
        return Vec::new();
    };

    match previous {
        WorkflowPhase::RetimeApplying { .. } => {
            state.phase = WorkflowPhase::Completed {
                episode_id: episode_id.clone(),
            };
            vec![Effect::CleanupSegments { episode_id }]
        }
        WorkflowPhase::Generating { .. } => {
            state.phase = WorkflowPhase::Completed { episode_id };
            Vec::new()
        }
        _ if state.mode == WorkflowMode::StepByStep && state.has_script_draft() => {
            state.phase = WorkflowPhase::PreparingAdjustment {
                episode_id: episode_id.clone(),
            };
            vec![Effect::FetchEpisode { episode_id }]
        }
        _ => {
            state.phase = WorkflowPhase::Completed { episode_id };
            Vec::new()
        }
    }
}

fn prepare_audio_adjustment(
    state: &mut WorkflowState,
    episode_id: &EpisodeId,
    result: Result<EpisodeDetail, String>,
) {
    match &state.phase {
        WorkflowPhase::PreparingAdjustment { episode_id: waiting } if waiting == episode_id => {}
        _ => return,
    }
    let draft = match result {
        Ok(episode) => AudioAdjustDraft::from_episode(
            episode_id.clone(),
            &episode,
            state.script_draft.as_ref(),
        ),
        // Speed editing must never block delivery of the episode.
        Err(_) => {
            state.phase = WorkflowPhase::Completed {
                episode_id: episode_id.clone(),
            };
            return;
        }
    };
    state.phase = if draft.is_empty() {
        WorkflowPhase::Completed {
            episode_id: episode_id.clone(),
        }
    } else {
        WorkflowPhase::AudioAdjustPending {
            draft,
            applying: false,
        }
    };
}

fn apply_segment_speeds(state: &mut WorkflowState) -> Vec<Effect> {
    let WorkflowPhase::AudioAdjustPending { draft, applying } = &mut state.phase else {
        return Vec::new();
    };
    if draft.is_empty() || *applying {
        return Vec::new();
    }
    *applying = true;
    let request = TaskRequest::Retime {
        episode_id: draft.episode_id.clone(),
        line_speeds: draft.line_speeds(),
    };
    state.last_error = None;
    vec![Effect::StartTask(request)]
}

fn skip_segment_speed_adjust(state: &mut WorkflowState) -> Vec<Effect> {
    let episode_id = match &state.phase {
        WorkflowPhase::AudioAdjustPending {
            draft,
            applying: false,
        } if !draft.episode_id.is_empty() => draft.episode_id.clone(),
        _ => return Vec::new(),
    };
    state.phase = WorkflowPhase::Completed {
        episode_id: episode_id.clone(),
    };
    vec![Effect::CleanupSegments { episode_id }]
}
