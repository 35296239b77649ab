use std::time::Duration;

use mindcast_core::{Effect, Guest, Msg, ScriptDraft, TaskRequest};
use mindcast_engine::{EngineCommand, EngineHandle, ScriptLine, ScriptPayload, TaskSpec};
use mindcast_logging::{mc_debug, mc_info};

use crate::events::to_msg;

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            mc_info!("Effect {}", describe(&effect));
            self.engine.send(to_command(effect));
        }
    }

    /// Next engine result as a message, waiting at most `timeout`.
    pub fn recv(&self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        let msg = to_msg(event);
        mc_debug!("Engine result {msg:?}");
        msg
    }

    pub fn shutdown(&self) {
        self.engine.send(EngineCommand::CloseSubscription);
    }
}

pub fn to_command(effect: Effect) -> EngineCommand {
    match effect {
        Effect::FetchNews { topic, max_results } => {
            EngineCommand::FetchNews { topic, max_results }
        }
        Effect::LoadGuests => EngineCommand::LoadGuests,
        Effect::SaveGuest { guest, is_edit } => EngineCommand::SaveGuest {
            guest: guest_to_wire(guest),
            is_edit,
        },
        Effect::RemoveGuest { name } => EngineCommand::RemoveGuest { name },
        Effect::StartTask(request) => EngineCommand::StartTask(task_spec(request)),
        Effect::Subscribe { task_id } => EngineCommand::Subscribe { task_id },
        Effect::CancelTask { task_id } => EngineCommand::CancelTask { task_id },
        Effect::DiscardTask { task_id } => EngineCommand::DiscardTask { task_id },
        Effect::CloseSubscription => EngineCommand::CloseSubscription,
        Effect::FetchEpisode { episode_id } => EngineCommand::FetchEpisode { episode_id },
        Effect::CleanupSegments { episode_id } => EngineCommand::CleanupSegments { episode_id },
    }
}

fn task_spec(request: TaskRequest) -> TaskSpec {
    match request {
        TaskRequest::Generate {
            topic,
            selected_guests,
        } => TaskSpec::Generate {
            topic,
            selected_guests,
        },
        TaskRequest::Preview {
            topic,
            selected_guests,
        } => TaskSpec::Preview {
            topic,
            selected_guests,
        },
        TaskRequest::Synthesize { script } => TaskSpec::Synthesize(script_payload(script)),
        TaskRequest::Retime {
            episode_id,
            line_speeds,
        } => TaskSpec::Retime {
            episode_id,
            line_speeds,
        },
    }
}

fn script_payload(script: ScriptDraft) -> ScriptPayload {
    ScriptPayload {
        title: script.title,
        topic: script.topic,
        summary: script.summary,
        guests: script.guests,
        dialogue: script
            .dialogue
            .into_iter()
            .map(|line| ScriptLine {
                speaker: line.speaker,
                text: line.text,
                emotion: line.emotion,
            })
            .collect(),
    }
}

pub fn guest_to_wire(guest: Guest) -> mindcast_engine::Guest {
    mindcast_engine::Guest {
        name: guest.name,
        gender: guest.gender,
        age: guest.age,
        mbti: guest.mbti,
        personality: guest.personality,
        occupation: guest.occupation,
        speaking_style: guest.speaking_style,
        voice_id: guest.voice_id,
        background: guest.background,
    }
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::FetchNews { topic, max_results } => {
            format!("FetchNews topic={topic:?} max_results={max_results}")
        }
        Effect::StartTask(request) => format!("StartTask kind={}", request.kind().as_str()),
        Effect::SaveGuest { guest, is_edit } => {
            format!("SaveGuest name={} edit={is_edit}", guest.name)
        }
        other => format!("{other:?}"),
    }
}
