use std::collections::VecDeque;

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;

use crate::models::model_base::Summary;

/// Simple moving average over the reward vectors of the last `n` episodes.
///
/// Each entry of the window holds one reward per parallel env. The summary
/// averages every env over the window, then reports the spread across envs.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    n: usize,
    window: VecDeque<Vec<f64>>,
}

impl MovingAverage {
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        Self {
            n,
            window: VecDeque::with_capacity(n),
        }
    }

    pub fn update(&mut self, rewards: &[f64]) {
        if self.window.len() == self.n {
            self.window.pop_front();
        }
        self.window.push_back(rewards.to_vec());
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// per-env mean over the window
    pub fn env_means(&self) -> Vec<f64> {
        let n_envs = self.window.iter().map(Vec::len).min().unwrap_or(0);
        let episodes = self.window.len() as f64;
        (0..n_envs)
            .map(|i| self.window.iter().map(|r| r[i]).sum::<f64>() / episodes)
            .collect()
    }

    /// `sma_min`, `sma_mean` and `sma_max`; empty until the first update
    pub fn rs(&self) -> Summary {
        let means = self.env_means();
        let mut out = Summary::default();
        if means.is_empty() {
            return out;
        }
        out.insert("sma_min".to_owned(), min(&means));
        out.insert("sma_mean".to_owned(), mean(&means));
        out.insert("sma_max".to_owned(), max(&means));
        out
    }
}

/// Per-env episode return that stops accumulating once an env reports done.
///
/// The reward of the step on which an env finishes is still counted.
#[derive(Debug, Clone)]
pub struct EpisodeRewards {
    rewards: Vec<f64>,
    dones: Vec<bool>,
}

impl EpisodeRewards {
    pub fn new(n: usize) -> Self {
        Self {
            rewards: vec![0.; n],
            dones: vec![false; n],
        }
    }

    /// adds rewards for envs that were unfinished before this step, returns that mask
    pub fn add(&mut self, reward: &[f32], done: &[bool]) -> Vec<bool> {
        let unfinished: Vec<bool> = self.dones.iter().map(|d| !d).collect();
        for (i, r) in reward.iter().enumerate().take(self.rewards.len()) {
            if unfinished[i] {
                self.rewards[i] += *r as f64;
            }
        }
        for (flag, d) in self.dones.iter_mut().zip(done) {
            *flag |= *d;
        }
        unfinished
    }

    pub fn all_done(&self) -> bool {
        self.dones.iter().all(|d| *d)
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn mean(&self) -> f64 {
        mean(&self.rewards)
    }

    pub fn min(&self) -> f64 {
        min(&self.rewards)
    }

    pub fn max(&self) -> f64 {
        max(&self.rewards)
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// `[1.000, -2.500]` style formatting for reward vectors
pub fn arrprint(values: &[f64], precision: usize) -> String {
    format!(
        "[{}]",
        values.iter().map(|v| format!("{v:.precision$}")).join(", ")
    )
}

/// progress bar in the per-second style used throughout, or a hidden one
pub fn prog_bar(len: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{msg} {pos}/{len} [{per_sec}]") {
        bar.set_style(style);
    }
    bar
}
