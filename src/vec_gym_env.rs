// Vectorized environment contract used by the multi-env driver loops.
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Free-form per-env diagnostics returned alongside a step.
pub type Info = FxHashMap<String, f32>;

/// Which half of the `[vector, visual]` state pair an env fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObsKind {
    Vector,
    Visual,
}

#[derive(Debug)]
pub struct VecStep {
    /// raw next observation, terminal observation for envs that just finished
    pub obs: Vec<Vec<f32>>,
    pub reward: Vec<f32>,
    pub done: Vec<bool>,
    pub info: Vec<Info>,
    /// observation to continue from, already auto-reset where `done` is set
    pub correct_obs: Vec<Vec<f32>>,
}

/// N parallel instances of an environment stepped in lockstep.
///
/// Every batch going in or out has exactly `n()` rows. Envs reset themselves
/// when they finish, `correct_obs` carries the post-reset observation.
pub trait VecEnv {
    fn n(&self) -> usize;
    fn obs_kind(&self) -> ObsKind;
    /// score at which the task counts as solved, if the env defines one
    fn reward_threshold(&self) -> Option<f64> {
        None
    }
    fn reset(&mut self) -> Vec<Vec<f32>>;
    fn step(&mut self, actions: &[Vec<f32>]) -> VecStep;
    fn render(&mut self, _record: bool) {}
    fn sample_actions(&mut self) -> Vec<Vec<f32>>;
}

/// Batched `[vector_obs, visual_obs]` state; only the slot matching the env's
/// `ObsKind` is ever populated, the other holds `n` empty rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePair {
    pub vector: Vec<Vec<f32>>,
    pub visual: Vec<Vec<f32>>,
}

impl StatePair {
    pub fn empty(n: usize) -> Self {
        Self {
            vector: vec![Vec::new(); n],
            visual: vec![Vec::new(); n],
        }
    }

    pub fn set(&mut self, kind: ObsKind, obs: Vec<Vec<f32>>) {
        match kind {
            ObsKind::Vector => self.vector = obs,
            ObsKind::Visual => self.visual = obs,
        }
    }

    pub fn get(&self, kind: ObsKind) -> &[Vec<f32>] {
        match kind {
            ObsKind::Vector => &self.vector,
            ObsKind::Visual => &self.visual,
        }
    }
}

/// returns which slot to write plus fresh `state` and `new_state` pairs sized for the env
pub fn init_variables<E: VecEnv + ?Sized>(env: &E) -> (ObsKind, StatePair, StatePair) {
    let n = env.n();
    (env.obs_kind(), StatePair::empty(n), StatePair::empty(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Visual2;

    impl VecEnv for Visual2 {
        fn n(&self) -> usize {
            2
        }
        fn obs_kind(&self) -> ObsKind {
            ObsKind::Visual
        }
        fn reset(&mut self) -> Vec<Vec<f32>> {
            vec![vec![0.; 4]; 2]
        }
        fn step(&mut self, _actions: &[Vec<f32>]) -> VecStep {
            unreachable!()
        }
        fn sample_actions(&mut self) -> Vec<Vec<f32>> {
            vec![vec![0.]; 2]
        }
    }

    #[test]
    fn init_variables_sizes_both_slots() {
        let mut env = Visual2;
        let (kind, mut state, new_state) = init_variables(&env);
        assert_eq!(kind, ObsKind::Visual);
        assert_eq!(state.vector.len(), 2);
        assert!(state.vector.iter().all(|row| row.is_empty()));
        assert_eq!(state, new_state);

        state.set(kind, env.reset());
        assert_eq!(state.get(ObsKind::Visual)[1].len(), 4);
        assert!(state.get(ObsKind::Vector)[1].is_empty());
    }
}
