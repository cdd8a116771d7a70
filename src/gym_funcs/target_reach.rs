use rand::{rngs::SmallRng, thread_rng, Rng, SeedableRng};

use crate::gym_env::{GymEnv, GymObs, GymStep, Space};

const DT: f32 = 0.1;
const ARENA: f32 = 10.;
const TOLERANCE: f32 = 0.25;

/// Point mass steered toward a random target with a 2-d velocity command.
///
/// The action space is asymmetric ([-2, 2] x [-3, 6]), so
/// normalized actions have to be rescaled. The
/// observation is the offset from the point to the target.
pub struct TargetReachEnv {
    observation_space: Space,
    action_space: Space,
    pos: [f32; 2],
    target: [f32; 2],
    steps: u64,
    max_steps: u64,
    rng: SmallRng,
}

impl TargetReachEnv {
    pub fn new(max_steps: u64, seed: Option<u64>) -> Self {
        let seed = match seed {
            Some(seed) => seed,
            None => thread_rng().gen_range(0..10000),
        };
        Self {
            observation_space: Space::bounded(vec![-2. * ARENA; 2], vec![2. * ARENA; 2]),
            action_space: Space::bounded(vec![-2., -3.], vec![2., 6.]),
            pos: [0.; 2],
            target: [0.; 2],
            steps: 0,
            max_steps,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn offset(&self) -> Vec<f32> {
        vec![self.target[0] - self.pos[0], self.target[1] - self.pos[1]]
    }

    fn distance(&self) -> f32 {
        self.offset().iter().map(|d| d * d).sum::<f32>().sqrt()
    }
}

impl GymEnv for TargetReachEnv {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self) -> GymObs {
        self.pos = [0.; 2];
        self.target = [
            self.rng.gen_range(-ARENA..ARENA),
            self.rng.gen_range(-ARENA..ARENA),
        ];
        self.steps = 0;
        GymObs::Values(self.offset())
    }

    fn step(&mut self, action: &[f32]) -> GymStep {
        // physical units, clamp to the action bounds
        if let Space::Box { low, high, .. } = &self.action_space {
            for (d, pos) in self.pos.iter_mut().enumerate() {
                let v = action.get(d).copied().unwrap_or(0.).clamp(low[d], high[d]);
                *pos = (*pos + v * DT).clamp(-ARENA, ARENA);
            }
        }
        self.steps += 1;
        let distance = self.distance();
        GymStep {
            obs: GymObs::Values(self.offset()),
            reward: -distance,
            done: distance < TOLERANCE || self.steps >= self.max_steps,
        }
    }
}
