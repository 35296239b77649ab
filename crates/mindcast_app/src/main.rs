//! `mindcast`: terminal front end of the MindCast podcast workflow.
mod app;
mod autopilot;
mod cli;
mod config;
mod effects;
mod events;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use mindcast_core::WorkflowState;
use mindcast_engine::{EngineCommand, EngineEvent, EngineHandle, Guest};
use mindcast_logging::{mc_info, mc_warn};

use crate::app::Session;
use crate::autopilot::Outcome;
use crate::cli::{Cli, Command, GuestAction, GuestArgs};
use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::effects::EffectRunner;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(loaded) => (loaded.unwrap_or_default(), None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    config.apply(&cli.overrides());

    mindcast_logging::initialize(&config.log_settings());
    if let Some(err) = load_error {
        mc_warn!("{err}; using default configuration");
    }
    mc_info!("Backend at {}", config.base_url);

    let engine = EngineHandle::new(config.engine_settings())
        .with_context(|| format!("cannot use backend URL {:?}", config.base_url))?;
    let answer_timeout = config.engine_settings().api.request_timeout + Duration::from_secs(5);

    match cli.command {
        Command::Run(args) => {
            let mode = config.workflow_mode();
            let state = WorkflowState::with_settings(mode, config.max_news_results);
            let session = Session::new(EffectRunner::new(engine), state);
            match session.run(args.plan(mode)) {
                Outcome::Completed { episode_id } => {
                    println!("Episode {episode_id} is ready.");
                    Ok(())
                }
                Outcome::Failed(reason) => bail!(reason),
            }
        }
        Command::News { topic } => {
            let news = match ask(
                &engine,
                EngineCommand::FetchNews {
                    topic,
                    max_results: config.max_news_results,
                },
                answer_timeout,
            )? {
                EngineEvent::NewsFetched(result) => result?,
                other => bail!("unexpected engine answer {other:?}"),
            };
            println!("{} item(s)", news.count);
            for item in news.items {
                println!("- {} <{}>", item.title, item.url);
            }
            Ok(())
        }
        Command::Guests { action } => {
            let (command, verb) = match action {
                GuestAction::List => (EngineCommand::LoadGuests, "Guests"),
                GuestAction::Save(args) => {
                    let is_edit = args.edit;
                    (
                        EngineCommand::SaveGuest {
                            guest: guest_from_args(args),
                            is_edit,
                        },
                        "Saved; guests",
                    )
                }
                GuestAction::Remove { name } => {
                    (EngineCommand::RemoveGuest { name }, "Removed; guests")
                }
            };
            let guests = match ask(&engine, command, answer_timeout)? {
                EngineEvent::GuestsLoaded(result)
                | EngineEvent::GuestSaved { result, .. }
                | EngineEvent::GuestRemoved { result, .. } => result?,
                other => bail!("unexpected engine answer {other:?}"),
            };
            println!("{verb}:");
            for guest in guests {
                println!("- {} ({}, {})", guest.name, guest.occupation, guest.mbti);
            }
            Ok(())
        }
        Command::Episodes => {
            let episodes = match ask(&engine, EngineCommand::ListEpisodes, answer_timeout)? {
                EngineEvent::EpisodesListed(result) => result?,
                other => bail!("unexpected engine answer {other:?}"),
            };
            for episode in episodes {
                let audio = if episode.has_audio { "audio" } else { "no audio" };
                println!(
                    "{}  {}  {}  [{audio}]",
                    episode.id, episode.created_at, episode.title
                );
            }
            Ok(())
        }
    }
}

/// Sends one command and waits for its answer.
fn ask(engine: &EngineHandle, command: EngineCommand, timeout: Duration) -> Result<EngineEvent> {
    engine.send(command);
    engine
        .recv_timeout(timeout)
        .ok_or_else(|| anyhow!("backend did not answer within {}s", timeout.as_secs()))
}

fn guest_from_args(args: GuestArgs) -> Guest {
    Guest {
        name: args.name,
        gender: args.gender,
        age: args.age,
        mbti: args.mbti,
        personality: args.personality,
        occupation: args.occupation,
        speaking_style: args.speaking_style,
        voice_id: args.voice_id,
        background: args.background,
    }
}
