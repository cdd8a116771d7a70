// Single (non-vectorized) gym environment contract and the small transforms
// needed to drive it: action rescaling and one-hot observations.
use serde::Deserialize;

use crate::error::{LoopError, Result};
use crate::vec_gym_env::ObsKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Space {
    Discrete { n: usize },
    Box { low: Vec<f32>, high: Vec<f32>, shape: Vec<usize> },
}

impl Space {
    /// builds a 1-d Box space, shape is inferred from the bounds
    pub fn bounded(low: Vec<f32>, high: Vec<f32>) -> Self {
        let shape = vec![low.len()];
        Space::Box { low, high, shape }
    }

    /// image-like spaces (3-d boxes) are routed to the visual half of the state
    pub fn obs_kind(&self) -> ObsKind {
        match self {
            Space::Box { shape, .. } if shape.len() == 3 => ObsKind::Visual,
            _ => ObsKind::Vector,
        }
    }

    /// number of scalars a single sample of this space flattens to
    pub fn flat_dim(&self) -> usize {
        match self {
            Space::Discrete { n } => *n,
            Space::Box { shape, .. } => shape.iter().product(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Continuous,
    Discrete,
}

/// Maps actions out of the model's normalized [-1, 1] range into env units.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionScale {
    Identity,
    Affine { mu: Vec<f32>, sigma: Vec<f32> },
}

impl ActionScale {
    /// `action * sigma + mu`, elementwise; the action must match the bounds in length
    pub fn apply(&self, action: &[f32]) -> Result<Vec<f32>> {
        match self {
            ActionScale::Identity => Ok(action.to_vec()),
            ActionScale::Affine { mu, sigma } => {
                if action.len() != sigma.len() {
                    return Err(LoopError::Space(format!(
                        "action has {} components but the action space has {}",
                        action.len(),
                        sigma.len()
                    )));
                }
                Ok(action
                    .iter()
                    .zip(sigma.iter().zip(mu.iter()))
                    .map(|(a, (s, m))| a * s + m)
                    .collect())
            }
        }
    }
}

/// Midpoint and half-range of a continuous action space.
///
/// low = [-2, -3], high = [2, 6] gives mu = [0, 1.5], sigma = [2, 4.5].
/// Discrete action spaces are left untouched (mu = 0, sigma = 1).
pub fn get_action_normalize_factor(space: &Space, action_type: ActionType) -> Result<ActionScale> {
    match (action_type, space) {
        (ActionType::Continuous, Space::Box { low, high, .. }) => {
            if low.len() != high.len() {
                return Err(LoopError::Space(format!(
                    "action bounds differ in length: low {} vs high {}",
                    low.len(),
                    high.len()
                )));
            }
            let mu = high.iter().zip(low).map(|(h, l)| (h + l) / 2.).collect();
            let sigma = high.iter().zip(low).map(|(h, l)| (h - l) / 2.).collect();
            Ok(ActionScale::Affine { mu, sigma })
        }
        (ActionType::Continuous, Space::Discrete { n }) => Err(LoopError::Space(format!(
            "continuous actions need a Box action space, got Discrete({n})"
        ))),
        (ActionType::Discrete, _) => Ok(ActionScale::Identity),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GymObs {
    Index(usize),
    Values(Vec<f32>),
}

/// One-hot encodes observations of discrete spaces, passes everything else through.
pub fn maybe_one_hot(obs: &GymObs, obs_space: &Space) -> Result<Vec<f32>> {
    match (obs, obs_space) {
        (GymObs::Index(idx), Space::Discrete { n }) => {
            if idx >= n {
                return Err(LoopError::Space(format!(
                    "observation {idx} out of range for Discrete({n})"
                )));
            }
            let mut one_hot = vec![0.; *n];
            one_hot[*idx] = 1.;
            Ok(one_hot)
        }
        (GymObs::Index(idx), Space::Box { .. }) => Ok(vec![*idx as f32]),
        (GymObs::Values(values), Space::Box { .. }) => Ok(values.clone()),
        (GymObs::Values(_), Space::Discrete { n }) => Err(LoopError::Space(format!(
            "Discrete({n}) observation space expects an index observation"
        ))),
    }
}

/// The do-nothing action: zeros over the action shape, or index 0 for discrete actions.
pub fn zero_action(action_space: &Space, action_type: ActionType) -> Vec<f32> {
    match (action_type, action_space) {
        (ActionType::Continuous, Space::Box { shape, .. }) => vec![0.; shape.iter().product()],
        _ => vec![0.],
    }
}

#[derive(Debug)]
pub struct GymStep {
    pub obs: GymObs,
    pub reward: f32,
    pub done: bool,
}

/// A single gym-style environment.
///
/// Discrete actions arrive as a one-element slice holding the index.
pub trait GymEnv {
    fn observation_space(&self) -> &Space;
    fn action_space(&self) -> &Space;
    fn reset(&mut self) -> GymObs;
    fn step(&mut self, action: &[f32]) -> GymStep;
    fn render(&mut self) {}
}
