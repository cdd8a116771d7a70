use crate::gym_env::{GymEnv, GymObs, GymStep, Space};

/// Classic n-state chain with discrete observations.
///
/// Action 1 advances one state, action 0 falls back to the start. Only the
/// last state pays out, which ends the episode.
pub struct ChainEnv {
    observation_space: Space,
    action_space: Space,
    state: usize,
    steps: u64,
    max_steps: u64,
}

impl ChainEnv {
    pub fn new(n_states: usize, max_steps: u64) -> Self {
        let n_states = n_states.max(2);
        Self {
            observation_space: Space::Discrete { n: n_states },
            action_space: Space::Discrete { n: 2 },
            state: 0,
            steps: 0,
            max_steps,
        }
    }

    fn last_state(&self) -> usize {
        self.observation_space.flat_dim() - 1
    }
}

impl GymEnv for ChainEnv {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self) -> GymObs {
        self.state = 0;
        self.steps = 0;
        GymObs::Index(self.state)
    }

    fn step(&mut self, action: &[f32]) -> GymStep {
        let advance = action.first().map_or(false, |a| a.round() as i64 == 1);
        self.state = if advance { (self.state + 1).min(self.last_state()) } else { 0 };
        self.steps += 1;
        let at_end = self.state == self.last_state();
        GymStep {
            obs: GymObs::Index(self.state),
            reward: if at_end { 1. } else { 0. },
            done: at_end || self.steps >= self.max_steps,
        }
    }
}
