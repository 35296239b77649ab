//! Plays the user's part in the wizard for `mindcast run`.
//!
//! The autopilot only reads the view model and answers with user messages;
//! it never sees engine internals.

use mindcast_core::{EpisodeId, Msg, PhaseKind, WorkflowMode, WorkflowViewModel, MAX_GUESTS};
use mindcast_logging::{mc_info, mc_warn};

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub topic_query: Option<String>,
    pub custom_topic: Option<String>,
    pub guests: Vec<String>,
    pub mode: WorkflowMode,
    /// Per-line rates; the last one repeats for the remaining lines.
    pub speeds: Vec<f64>,
    pub skip_adjust: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed { episode_id: EpisodeId },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Send(Vec<Msg>),
    Wait,
    Finish(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Boot,
    AwaitCatalog,
    Launch,
    Running,
}

pub struct Autopilot {
    plan: Plan,
    stage: Stage,
    guests_loaded: bool,
    news_answered: bool,
    confirmed: bool,
    adjusted: bool,
}

impl Autopilot {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            stage: Stage::Boot,
            guests_loaded: false,
            news_answered: false,
            confirmed: false,
            adjusted: false,
        }
    }

    /// Notes IO answers the view model cannot tell apart from "not asked yet".
    pub fn observe(&mut self, msg: &Msg) {
        match msg {
            Msg::GuestsLoaded(_) => self.guests_loaded = true,
            Msg::NewsFetched(_) => self.news_answered = true,
            _ => {}
        }
    }

    pub fn next(&mut self, view: &WorkflowViewModel) -> Step {
        match self.stage {
            Stage::Boot => {
                self.stage = Stage::AwaitCatalog;
                Step::Send(vec![
                    Msg::WorkflowModeChanged(self.plan.mode),
                    Msg::LoadGuestsRequested,
                    Msg::TopicQueryChanged(self.plan.topic_query.clone().unwrap_or_default()),
                    Msg::FetchNewsClicked,
                ])
            }
            Stage::AwaitCatalog => {
                if !(self.guests_loaded && self.news_answered) {
                    return Step::Wait;
                }
                if view.news.is_none() {
                    return fail(view, "no news snapshot available");
                }
                self.stage = Stage::Launch;
                let mut msgs = Vec::new();
                if let Some(topic) = &self.plan.custom_topic {
                    msgs.push(Msg::CustomTopicChanged(topic.clone()));
                }
                msgs.extend(self.guest_toggles(view));
                Step::Send(msgs)
            }
            Stage::Launch => {
                if !view.can_generate {
                    let reason = if view.effective_topic.is_empty() {
                        "no topic to talk about"
                    } else {
                        "no guest selected"
                    };
                    return Step::Finish(Outcome::Failed(format!("cannot start: {reason}")));
                }
                self.stage = Stage::Running;
                mc_info!(
                    "Starting {} run on {:?} with {:?}",
                    self.plan.mode.as_str(),
                    view.effective_topic,
                    view.selected_guests
                );
                Step::Send(vec![match self.plan.mode {
                    WorkflowMode::OneClick => Msg::GenerateClicked,
                    WorkflowMode::StepByStep => Msg::PreviewClicked,
                }])
            }
            Stage::Running => self.drive(view),
        }
    }

    fn drive(&mut self, view: &WorkflowViewModel) -> Step {
        match view.phase {
            PhaseKind::Generating
            | PhaseKind::PreviewRunning
            | PhaseKind::Synthesizing
            | PhaseKind::PreparingAdjustment
            | PhaseKind::RetimeApplying => Step::Wait,
            PhaseKind::ScriptReady if !self.confirmed => {
                self.confirmed = true;
                Step::Send(vec![Msg::ConfirmSynthesisClicked])
            }
            PhaseKind::ScriptReady => fail(view, "synthesis did not start"),
            PhaseKind::AudioAdjustPending if view.applying_speeds => Step::Wait,
            PhaseKind::AudioAdjustPending => self.adjust(view),
            PhaseKind::Completed => match &view.new_episode {
                Some(episode_id) => Step::Finish(Outcome::Completed {
                    episode_id: episode_id.clone(),
                }),
                None => fail(view, "completed without an episode"),
            },
            PhaseKind::Idle | PhaseKind::NewsReady => {
                fail(view, "workflow stopped before completion")
            }
        }
    }

    fn adjust(&mut self, view: &WorkflowViewModel) -> Step {
        if self.adjusted {
            mc_warn!("Speed adjustment did not go through; keeping the original audio");
            return Step::Send(vec![Msg::SkipSpeedAdjustClicked]);
        }
        self.adjusted = true;
        let lines = view.audio_adjust.as_ref().map_or(0, |draft| draft.lines.len());
        if self.plan.skip_adjust || self.plan.speeds.is_empty() || lines == 0 {
            return Step::Send(vec![Msg::SkipSpeedAdjustClicked]);
        }
        let mut msgs: Vec<Msg> = (0..lines)
            .filter_map(|index| {
                let rate = self
                    .plan
                    .speeds
                    .get(index)
                    .or_else(|| self.plan.speeds.last())?;
                Some(Msg::SegmentSpeedChanged { index, rate: *rate })
            })
            .collect();
        msgs.push(Msg::ApplySpeedsClicked);
        Step::Send(msgs)
    }

    fn guest_toggles(&self, view: &WorkflowViewModel) -> Vec<Msg> {
        if self.plan.guests.is_empty() {
            return Vec::new();
        }
        let mut wanted: Vec<&String> = Vec::new();
        for name in &self.plan.guests {
            if !view.guests.iter().any(|guest| &guest.name == name) {
                mc_warn!("Guest {name:?} is not in the catalog; skipping");
            } else if wanted.len() == MAX_GUESTS {
                mc_warn!("At most {MAX_GUESTS} guests per episode; skipping {name:?}");
            } else if !wanted.contains(&name) {
                wanted.push(name);
            }
        }
        let deselect = view
            .selected_guests
            .iter()
            .filter(|name| !wanted.contains(name))
            .map(|name| Msg::GuestToggled(name.clone()));
        let select = wanted
            .iter()
            .filter(|name| !view.selected_guests.contains(name))
            .map(|name| Msg::GuestToggled((*name).clone()));
        deselect.chain(select).collect()
    }
}

fn fail(view: &WorkflowViewModel, fallback: &str) -> Step {
    Step::Finish(Outcome::Failed(
        view.last_error
            .clone()
            .unwrap_or_else(|| fallback.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindcast_core::{update, AudioAdjustDraft, AdjustLine, Guest, NewsItem, NewsSnapshot, WorkflowState};
    use pretty_assertions::assert_eq;

    fn guest(name: &str) -> Guest {
        Guest {
            name: name.to_string(),
            ..Guest::default()
        }
    }

    fn news() -> NewsSnapshot {
        NewsSnapshot {
            count: 1,
            items: vec![NewsItem {
                title: "Chips".to_string(),
                ..NewsItem::default()
            }],
        }
    }

    fn apply(state: WorkflowState, msgs: Vec<Msg>) -> WorkflowState {
        msgs.into_iter().fold(state, |state, msg| update(state, msg).0)
    }

    fn send(step: Step) -> Vec<Msg> {
        match step {
            Step::Send(msgs) => msgs,
            other => panic!("expected messages, got {other:?}"),
        }
    }

    fn booted(plan: Plan) -> (Autopilot, WorkflowState) {
        let mut pilot = Autopilot::new(plan);
        let state = apply(WorkflowState::new(), send(pilot.next(&WorkflowState::new().view())));
        let answers = vec![
            Msg::GuestsLoaded(Ok(vec![guest("Ada"), guest("Bob"), guest("Cy")])),
            Msg::NewsFetched(Ok(news())),
        ];
        for msg in &answers {
            pilot.observe(msg);
        }
        (pilot, apply(state, answers))
    }

    #[test]
    fn waits_for_both_catalog_answers() {
        let mut pilot = Autopilot::new(Plan::default());
        let boot = send(pilot.next(&WorkflowViewModel::default()));
        assert_eq!(boot.last(), Some(&Msg::FetchNewsClicked));

        pilot.observe(&Msg::GuestsLoaded(Ok(vec![])));
        assert_eq!(pilot.next(&WorkflowViewModel::default()), Step::Wait);
    }

    #[test]
    fn selects_requested_guests_and_launches_preview() {
        let (mut pilot, state) = booted(Plan {
            guests: vec!["Bob".to_string(), "Zed".to_string(), "Cy".to_string()],
            mode: WorkflowMode::StepByStep,
            ..Plan::default()
        });
        let toggles = send(pilot.next(&state.view()));
        assert_eq!(
            toggles,
            vec![
                Msg::GuestToggled("Ada".to_string()),
                Msg::GuestToggled("Bob".to_string()),
                Msg::GuestToggled("Cy".to_string()),
            ]
        );
        let state = apply(state, toggles);
        assert_eq!(state.selected_guests(), ["Bob".to_string(), "Cy".to_string()]);

        assert_eq!(send(pilot.next(&state.view())), vec![Msg::PreviewClicked]);
    }

    #[test]
    fn missing_news_fails_with_surfaced_error() {
        let mut pilot = Autopilot::new(Plan::default());
        let state = apply(WorkflowState::new(), send(pilot.next(&WorkflowState::new().view())));
        let answers = vec![
            Msg::GuestsLoaded(Ok(vec![guest("Ada")])),
            Msg::NewsFetched(Err("network error: refused".to_string())),
        ];
        for msg in &answers {
            pilot.observe(msg);
        }
        let state = apply(state, answers);
        assert_eq!(
            pilot.next(&state.view()),
            Step::Finish(Outcome::Failed("network error: refused".to_string()))
        );
    }

    #[test]
    fn speeds_repeat_the_last_rate() {
        let mut pilot = Autopilot::new(Plan {
            speeds: vec![1.5, 0.8],
            ..Plan::default()
        });
        pilot.stage = Stage::Running;
        let line = |text: &str| AdjustLine {
            speaker: "Ada".to_string(),
            text: text.to_string(),
            speech_rate: 1.0,
        };
        let view = WorkflowViewModel {
            phase: PhaseKind::AudioAdjustPending,
            audio_adjust: Some(AudioAdjustDraft {
                episode_id: "ep1".to_string(),
                lines: vec![line("a"), line("b"), line("c")],
            }),
            ..WorkflowViewModel::default()
        };
        assert_eq!(
            send(pilot.next(&view)),
            vec![
                Msg::SegmentSpeedChanged { index: 0, rate: 1.5 },
                Msg::SegmentSpeedChanged { index: 1, rate: 0.8 },
                Msg::SegmentSpeedChanged { index: 2, rate: 0.8 },
                Msg::ApplySpeedsClicked,
            ]
        );
        assert_eq!(send(pilot.next(&view)), vec![Msg::SkipSpeedAdjustClicked]);
    }

    #[test]
    fn completion_and_stops_finish_the_run() {
        let mut pilot = Autopilot::new(Plan::default());
        pilot.stage = Stage::Running;
        let done = WorkflowViewModel {
            phase: PhaseKind::Completed,
            new_episode: Some("ep9".to_string()),
            ..WorkflowViewModel::default()
        };
        assert_eq!(
            pilot.next(&done),
            Step::Finish(Outcome::Completed {
                episode_id: "ep9".to_string()
            })
        );

        let stopped = WorkflowViewModel {
            phase: PhaseKind::NewsReady,
            last_error: Some("Script generation failed".to_string()),
            ..WorkflowViewModel::default()
        };
        assert_eq!(
            pilot.next(&stopped),
            Step::Finish(Outcome::Failed("Script generation failed".to_string()))
        );
    }
}
