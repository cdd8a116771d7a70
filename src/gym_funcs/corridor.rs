use rand::{rngs::SmallRng, thread_rng, Rng, SeedableRng};

use crate::vec_gym_env::{Info, ObsKind, VecEnv, VecStep};

const STEP_PENALTY: f32 = -0.01;
const GOAL_REWARD: f32 = 1.;

/// `n` copies of a 1-d corridor walk, observations are the one-hot position.
///
/// Action 1 moves right, anything else moves left (clamped at the wall).
/// Reaching the far end pays `GOAL_REWARD`, every other step costs a little.
/// Finished envs reset themselves, the terminal observation is still returned in `obs`.
pub struct CorridorEnv {
    length: usize,
    max_steps: u64,
    positions: Vec<usize>,
    steps: Vec<u64>,
    reward_threshold: Option<f64>,
    rng: SmallRng,
}

impl CorridorEnv {
    pub fn new(n: usize, length: usize, max_steps: u64, reward_threshold: Option<f64>, seed: Option<u64>) -> Self {
        let seed = match seed {
            Some(seed) => seed,
            None => thread_rng().gen_range(0..10000),
        };
        Self {
            length: length.max(2),
            max_steps,
            positions: vec![0; n.max(1)],
            steps: vec![0; n.max(1)],
            reward_threshold,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn observe(&self, pos: usize) -> Vec<f32> {
        let mut obs = vec![0.; self.length];
        obs[pos] = 1.;
        obs
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

impl VecEnv for CorridorEnv {
    fn n(&self) -> usize {
        self.positions.len()
    }

    fn obs_kind(&self) -> ObsKind {
        ObsKind::Vector
    }

    fn reward_threshold(&self) -> Option<f64> {
        self.reward_threshold
    }

    fn reset(&mut self) -> Vec<Vec<f32>> {
        self.positions.iter_mut().for_each(|p| *p = 0);
        self.steps.iter_mut().for_each(|s| *s = 0);
        (0..self.n()).map(|_| self.observe(0)).collect()
    }

    fn step(&mut self, actions: &[Vec<f32>]) -> VecStep {
        let n = self.n();
        let mut obs = Vec::with_capacity(n);
        let mut correct_obs = Vec::with_capacity(n);
        let mut reward = Vec::with_capacity(n);
        let mut done = Vec::with_capacity(n);
        let mut info = Vec::with_capacity(n);

        for i in 0..n {
            let right = actions
                .get(i)
                .and_then(|a| a.first())
                .map_or(false, |a| a.round() as i64 == 1);
            let pos = if right {
                (self.positions[i] + 1).min(self.length - 1)
            } else {
                self.positions[i].saturating_sub(1)
            };
            self.steps[i] += 1;
            let at_goal = pos == self.length - 1;
            let truncated = !at_goal && self.steps[i] >= self.max_steps;

            obs.push(self.observe(pos));
            reward.push(if at_goal { GOAL_REWARD } else { STEP_PENALTY });
            done.push(at_goal || truncated);
            let mut env_info = Info::default();
            if truncated {
                env_info.insert("TimeLimit.truncated".to_owned(), 1.);
            }
            info.push(env_info);

            if at_goal || truncated {
                self.positions[i] = 0;
                self.steps[i] = 0;
            } else {
                self.positions[i] = pos;
            }
            correct_obs.push(self.observe(self.positions[i]));
        }

        VecStep {
            obs,
            reward,
            done,
            info,
            correct_obs,
        }
    }

    fn sample_actions(&mut self) -> Vec<Vec<f32>> {
        (0..self.n()).map(|_| vec![self.rng.gen_range(0..2) as f32]).collect()
    }
}
