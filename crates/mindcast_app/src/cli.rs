use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mindcast_core::WorkflowMode;

use crate::autopilot::Plan;
use crate::config::Overrides;

/// Drive the MindCast podcast workflow from the terminal
#[derive(Parser, Debug)]
#[command(name = "mindcast", version)]
pub struct Cli {
    /// Configuration file (RON); defaults to ./mindcast.ron
    #[arg(short, long, env = "MINDCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = "MINDCAST_BASE_URL")]
    pub base_url: Option<String>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the whole wizard: news, topic, guests, script and audio
    Run(RunArgs),
    /// Show the current news snapshot
    News {
        /// Search query; trending news when omitted
        #[arg(long)]
        topic: Option<String>,
    },
    /// Manage the guest catalog
    Guests {
        #[command(subcommand)]
        action: GuestAction,
    },
    /// List produced episodes
    Episodes,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// News search query
    #[arg(long)]
    pub topic: Option<String>,

    /// Free-form topic; wins over the selected headline
    #[arg(long)]
    pub custom_topic: Option<String>,

    /// Guest to invite (repeatable, at most three)
    #[arg(long = "guest")]
    pub guests: Vec<String>,

    /// one-click or step-by-step
    #[arg(long)]
    pub mode: Option<String>,

    /// Speech rate per dialogue line (repeatable, step-by-step only)
    #[arg(long = "speed")]
    pub speeds: Vec<f64>,

    /// Keep the synthesized audio as is
    #[arg(long)]
    pub skip_adjust: bool,
}

impl RunArgs {
    pub fn plan(&self, mode: WorkflowMode) -> Plan {
        Plan {
            topic_query: self.topic.clone(),
            custom_topic: self.custom_topic.clone(),
            guests: self.guests.clone(),
            mode,
            speeds: self.speeds.clone(),
            skip_adjust: self.skip_adjust,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum GuestAction {
    List,
    /// Create a guest, or update it with --edit
    Save(GuestArgs),
    Remove { name: String },
}

#[derive(Args, Debug, Clone)]
pub struct GuestArgs {
    pub name: String,
    /// Update an existing guest instead of creating one
    #[arg(long)]
    pub edit: bool,
    #[arg(long, default_value = "")]
    pub gender: String,
    #[arg(long, default_value_t = 30)]
    pub age: u32,
    #[arg(long, default_value = "")]
    pub mbti: String,
    #[arg(long, default_value = "")]
    pub personality: String,
    #[arg(long, default_value = "")]
    pub occupation: String,
    #[arg(long, default_value = "")]
    pub speaking_style: String,
    #[arg(long, default_value = "")]
    pub voice_id: String,
    #[arg(long, default_value = "")]
    pub background: String,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let mode = match &self.command {
            Command::Run(args) => args.mode.clone(),
            _ => None,
        };
        Overrides {
            base_url: self.base_url.clone(),
            workflow_mode: mode,
            log_level: self.log_level.clone(),
        }
    }
}
