use std::time::Duration;

use mindcast_core::{update, Msg, WorkflowState};
use mindcast_logging::{mc_debug, mc_info};

use crate::autopilot::{Autopilot, Outcome, Plan, Step};
use crate::effects::EffectRunner;
use crate::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The workflow state plus everything that reacts to it.
pub struct Session {
    state: WorkflowState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl Session {
    pub fn new(runner: EffectRunner, state: WorkflowState) -> Self {
        Self {
            state,
            runner,
            renderer: Renderer::default(),
        }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if !matches!(msg, Msg::Tick) {
            mc_debug!("Dispatching {msg:?}");
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in self.renderer.render(&state.view()) {
                println!("{line}");
            }
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Drives the wizard with `plan` until it completes or stops.
    pub fn run(mut self, plan: Plan) -> Outcome {
        let mut autopilot = Autopilot::new(plan);
        loop {
            match autopilot.next(&self.state.view()) {
                Step::Send(msgs) => {
                    for msg in msgs {
                        autopilot.observe(&msg);
                        self.dispatch(msg);
                    }
                }
                Step::Wait => match self.runner.recv(POLL_INTERVAL) {
                    Some(msg) => {
                        autopilot.observe(&msg);
                        self.dispatch(msg);
                    }
                    None => self.dispatch(Msg::Tick),
                },
                Step::Finish(outcome) => {
                    mc_info!("Run finished: {outcome:?}");
                    self.runner.shutdown();
                    return outcome;
                }
            }
        }
    }
}
