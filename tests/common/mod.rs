#![allow(dead_code)]

use gym_loops::{
    gym_env::{GymEnv, GymObs, GymStep, Space},
    models::model_base::{CheckpointError, Model, Summary, Transition},
    vec_gym_env::{Info, ObsKind, VecEnv, VecStep},
};

/// Vectorized env where env `i` finishes every `lengths[i]` steps and always pays `reward`.
pub struct ScriptedVecEnv {
    pub lengths: Vec<u64>,
    pub reward: f32,
    pub threshold: Option<f64>,
    pub counters: Vec<u64>,
    pub resets: u64,
    pub renders: u64,
    pub steps: u64,
    pub samples: u64,
}

impl ScriptedVecEnv {
    pub fn new(lengths: Vec<u64>) -> Self {
        let n = lengths.len();
        Self {
            lengths,
            reward: 1.,
            threshold: None,
            counters: vec![0; n],
            resets: 0,
            renders: 0,
            steps: 0,
            samples: 0,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

impl VecEnv for ScriptedVecEnv {
    fn n(&self) -> usize {
        self.lengths.len()
    }

    fn obs_kind(&self) -> ObsKind {
        ObsKind::Vector
    }

    fn reward_threshold(&self) -> Option<f64> {
        self.threshold
    }

    fn reset(&mut self) -> Vec<Vec<f32>> {
        self.resets += 1;
        self.counters.iter_mut().for_each(|c| *c = 0);
        vec![vec![0.]; self.n()]
    }

    fn step(&mut self, actions: &[Vec<f32>]) -> VecStep {
        assert_eq!(actions.len(), self.n());
        self.steps += 1;
        let mut obs = Vec::new();
        let mut correct_obs = Vec::new();
        let mut done = Vec::new();
        for (c, len) in self.counters.iter_mut().zip(&self.lengths) {
            *c += 1;
            obs.push(vec![*c as f32]);
            let finished = *c >= *len;
            if finished {
                *c = 0;
            }
            correct_obs.push(vec![*c as f32]);
            done.push(finished);
        }
        VecStep {
            obs,
            reward: vec![self.reward; self.n()],
            done,
            info: vec![Info::default(); self.n()],
            correct_obs,
        }
    }

    fn render(&mut self, _record: bool) {
        self.renders += 1;
    }

    fn sample_actions(&mut self) -> Vec<Vec<f32>> {
        self.samples += 1;
        vec![vec![0.]; self.n()]
    }
}

/// Single env that finishes after `length` steps and records every action it receives.
pub struct ScriptedGymEnv {
    pub observation_space: Space,
    pub action_space: Space,
    pub length: u64,
    pub obs: GymObs,
    pub counter: u64,
    pub resets: u64,
    pub renders: u64,
    pub received: Vec<Vec<f32>>,
}

impl ScriptedGymEnv {
    pub fn new(observation_space: Space, action_space: Space, obs: GymObs, length: u64) -> Self {
        Self {
            observation_space,
            action_space,
            length,
            obs,
            counter: 0,
            resets: 0,
            renders: 0,
            received: Vec::new(),
        }
    }
}

impl GymEnv for ScriptedGymEnv {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self) -> GymObs {
        self.resets += 1;
        self.counter = 0;
        self.obs.clone()
    }

    fn step(&mut self, action: &[f32]) -> GymStep {
        self.received.push(action.to_vec());
        self.counter += 1;
        GymStep {
            obs: self.obs.clone(),
            reward: 0.5,
            done: self.counter >= self.length,
        }
    }

    fn render(&mut self) {
        self.renders += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Choose { batch: usize, evaluation: bool },
    Store { r: Vec<f32>, done: Vec<bool> },
    NoOpStore { a: Vec<Vec<f32>>, done: Vec<bool> },
    Learn { episode: u64, step: u64 },
    Reset,
    PartialReset,
    Save(u64),
    Summary(u64, Summary),
    SetCell(u32),
}

/// Model double that answers with a fixed action row and logs every call.
pub struct RecordingModel {
    pub action: Vec<f32>,
    pub calls: Vec<Call>,
    pub seen_states: Vec<Vec<Vec<f32>>>,
    pub stored_actions: Vec<Vec<Vec<f32>>>,
    pub cell: u32,
    pub fail_checkpoint: bool,
}

impl RecordingModel {
    pub fn new(action: Vec<f32>) -> Self {
        Self {
            action,
            calls: Vec::new(),
            seen_states: Vec::new(),
            stored_actions: Vec::new(),
            cell: 7,
            fail_checkpoint: false,
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn learns(&self) -> Vec<(u64, u64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Learn { episode, step } => Some((*episode, *step)),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<(u64, Summary)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Summary(step, s) => Some((*step, s.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn saves(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Save(e) => Some(*e),
                _ => None,
            })
            .collect()
    }
}

impl Model for RecordingModel {
    type CellState = u32;

    fn choose_action(&mut self, s: &[Vec<f32>], visual_s: &[Vec<f32>], evaluation: bool) -> Vec<Vec<f32>> {
        let batch = s.len().max(visual_s.len());
        self.calls.push(Call::Choose { batch, evaluation });
        self.seen_states.push(s.to_vec());
        // evaluation runs scramble the cell so restoring it is observable
        if evaluation {
            self.cell += 100;
        }
        vec![self.action.clone(); batch]
    }

    fn store_data(&mut self, transition: Transition<'_>) {
        assert_eq!(transition.s.len(), transition.r.len());
        assert_eq!(transition.s_.len(), transition.done.len());
        self.stored_actions.push(transition.a.to_vec());
        self.calls.push(Call::Store {
            r: transition.r.to_vec(),
            done: transition.done.to_vec(),
        });
    }

    fn no_op_store(&mut self, transition: Transition<'_>) {
        self.calls.push(Call::NoOpStore {
            a: transition.a.to_vec(),
            done: transition.done.to_vec(),
        });
    }

    fn learn(&mut self, episode: u64, step: u64) {
        self.calls.push(Call::Learn { episode, step });
    }

    fn reset(&mut self) {
        self.calls.push(Call::Reset);
    }

    fn partial_reset(&mut self, _done: &[bool]) {
        self.calls.push(Call::PartialReset);
    }

    fn save_checkpoint(&mut self, episode: u64) -> Result<(), CheckpointError> {
        if self.fail_checkpoint {
            return Err("disk full".into());
        }
        self.calls.push(Call::Save(episode));
        Ok(())
    }

    fn writer_summary(&mut self, global_step: u64, summary: &Summary) {
        self.calls.push(Call::Summary(global_step, summary.clone()));
    }

    fn get_cell_state(&self) -> u32 {
        self.cell
    }

    fn set_cell_state(&mut self, cell_state: u32) {
        self.calls.push(Call::SetCell(cell_state));
        self.cell = cell_state;
    }
}
