use mindcast_core::{
    EpisodeDetail, EpisodeLine, Guest, Msg, NewsItem, NewsSnapshot, ResultLine, TaskKind,
    TaskResult, TaskStatus,
};
use mindcast_engine::{self as engine, EngineEvent, TrackerEvent};

/// `None` for events the workflow does not consume.
pub fn to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::NewsFetched(result) => {
            Msg::NewsFetched(result.map(news_snapshot).map_err(|err| err.to_string()))
        }
        EngineEvent::GuestsLoaded(result) => {
            Msg::GuestsLoaded(result.map(guest_catalog).map_err(|err| err.to_string()))
        }
        EngineEvent::GuestSaved { name, result } => Msg::GuestSaved {
            name,
            result: result.map(guest_catalog).map_err(|err| err.to_string()),
        },
        EngineEvent::GuestRemoved { name, result } => Msg::GuestRemoved {
            name,
            result: result.map(guest_catalog).map_err(|err| err.to_string()),
        },
        EngineEvent::TaskStarted { kind, task_id } => Msg::TaskStarted {
            kind: map_kind(kind),
            task_id,
        },
        EngineEvent::TaskStartFailed { kind, error } => Msg::TaskStartFailed {
            kind: map_kind(kind),
            message: error.to_string(),
        },
        EngineEvent::Task(TrackerEvent::Progress {
            task_id,
            stage,
            detail,
        }) => Msg::TaskProgress {
            task_id,
            stage,
            detail,
        },
        EngineEvent::Task(TrackerEvent::Terminal {
            task_id,
            status,
            result,
            message,
        }) => Msg::TaskFinished {
            task_id,
            status: map_status(status),
            result: result.map(task_result),
            message,
        },
        EngineEvent::EpisodeFetched { episode_id, result } => Msg::EpisodeFetched {
            episode_id,
            result: result.map(episode_detail).map_err(|err| err.to_string()),
        },
        EngineEvent::EpisodesListed(_) => return None,
    };
    Some(msg)
}

pub fn map_kind(kind: engine::TaskKind) -> TaskKind {
    match kind {
        engine::TaskKind::Generate => TaskKind::Generate,
        engine::TaskKind::Preview => TaskKind::Preview,
        engine::TaskKind::Synthesize => TaskKind::Synthesize,
        engine::TaskKind::Retime => TaskKind::Retime,
    }
}

fn map_status(status: engine::TaskStatus) -> TaskStatus {
    match status {
        engine::TaskStatus::Completed => TaskStatus::Completed,
        engine::TaskStatus::Failed => TaskStatus::Failed,
        engine::TaskStatus::Cancelled => TaskStatus::Cancelled,
        engine::TaskStatus::Started | engine::TaskStatus::Running | engine::TaskStatus::Unknown => {
            TaskStatus::Running
        }
    }
}

fn news_snapshot(news: engine::NewsResponse) -> NewsSnapshot {
    NewsSnapshot {
        count: news.count,
        items: news
            .items
            .into_iter()
            .map(|item| NewsItem {
                title: item.title,
                url: item.url,
                content: item.content,
                published_date: item.published_date,
            })
            .collect(),
    }
}

pub fn guest_catalog(guests: Vec<engine::Guest>) -> Vec<Guest> {
    guests
        .into_iter()
        .map(|guest| Guest {
            name: guest.name,
            gender: guest.gender,
            age: guest.age,
            mbti: guest.mbti,
            personality: guest.personality,
            occupation: guest.occupation,
            speaking_style: guest.speaking_style,
            voice_id: guest.voice_id,
            background: guest.background,
        })
        .collect()
}

fn task_result(result: engine::TaskResult) -> TaskResult {
    TaskResult {
        episode_id: result.episode_id,
        title: result.title,
        topic: result.topic,
        summary: result.summary,
        guests: result.guests,
        dialogue: result
            .dialogue
            .into_iter()
            .map(|line| ResultLine {
                speaker: line.speaker,
                text: line.text,
                emotion: line.emotion,
            })
            .collect(),
    }
}

fn episode_detail(episode: engine::EpisodeDetail) -> EpisodeDetail {
    EpisodeDetail {
        dialogue: episode
            .dialogue
            .iter()
            .map(|line| EpisodeLine {
                speaker: line.speaker.clone(),
                text: line.text.clone(),
                speech_rate: line.speech_rate(),
            })
            .collect(),
        id: episode.id,
        title: episode.title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindcast_engine::{ApiError, TaskEvent};
    use pretty_assertions::assert_eq;

    #[test]
    fn terminal_event_becomes_task_finished() {
        let event: TaskEvent = event_from_json(
            r#"{"status":"completed","stage":"done","detail":"","episode_id":"ep7"}"#,
        );
        let msg = to_msg(EngineEvent::Task(TrackerEvent::Terminal {
            task_id: "t1".to_string(),
            status: event.status,
            result: event.result,
            message: None,
        }));
        assert_eq!(
            msg,
            Some(Msg::TaskFinished {
                task_id: "t1".to_string(),
                status: TaskStatus::Completed,
                result: Some(TaskResult {
                    episode_id: Some("ep7".to_string()),
                    ..TaskResult::default()
                }),
                message: None,
            })
        );
    }

    #[test]
    fn failures_carry_display_text() {
        let msg = to_msg(EngineEvent::TaskStartFailed {
            kind: engine::TaskKind::Preview,
            error: ApiError::Validation {
                status: 422,
                detail: "No guests selected".to_string(),
            },
        });
        assert_eq!(
            msg,
            Some(Msg::TaskStartFailed {
                kind: TaskKind::Preview,
                message: "No guests selected".to_string(),
            })
        );

        let msg = to_msg(EngineEvent::NewsFetched(Err(ApiError::Network(
            "connection refused".to_string(),
        ))));
        assert_eq!(
            msg,
            Some(Msg::NewsFetched(Err(
                "network error: connection refused".to_string()
            )))
        );
    }

    #[test]
    fn episode_rates_are_parsed() {
        let episode = episode_from_json(
            r#"{"id":"ep1","title":"E","dialogue":[
                {"speaker":"Ada","text":"a","speech_rate":"1.5"},
                {"speaker":"Bob","text":"b","speech_rate":"n/a"}
            ]}"#,
        );
        let msg = to_msg(EngineEvent::EpisodeFetched {
            episode_id: "ep1".to_string(),
            result: Ok(episode),
        });
        let Some(Msg::EpisodeFetched { result: Ok(detail), .. }) = msg else {
            panic!("expected a fetched episode");
        };
        let rates: Vec<_> = detail.dialogue.iter().map(|line| line.speech_rate).collect();
        assert_eq!(rates, vec![Some(1.5), None]);
    }

    #[test]
    fn episode_listing_is_not_a_workflow_message() {
        assert_eq!(to_msg(EngineEvent::EpisodesListed(Ok(Vec::new()))), None);
    }

    fn event_from_json(json: &str) -> TaskEvent {
        mindcast_engine::decode_event(json).expect("event")
    }

    fn episode_from_json(json: &str) -> engine::EpisodeDetail {
        serde_json::from_str(json).expect("episode")
    }
}
