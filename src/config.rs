use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{LoopError, Result};
use crate::gym_env::ActionType;

#[derive(Deserialize, Debug, Clone)]
pub struct Configuration {
    #[serde(default)]
    pub train: TrainConfig,
    #[serde(default)]
    pub no_op: NoOpConfig,
    #[serde(default)]
    pub gym: GymLoopConfig,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default = "default_true")]
    pub show_progress: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    #[serde(rename = "on-policy")]
    OnPolicy,
    #[serde(rename = "off-policy")]
    OffPolicy,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainMode {
    #[serde(rename = "perStep")]
    PerStep,
    #[serde(rename = "perEpisode")]
    PerEpisode,
}

/// Parameters of the vectorized training loop.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TrainConfig {
    pub begin_episode: u64,
    pub render: bool,
    /// rendering switches on for every episode after this one
    pub render_episode: u64,
    pub save_frequency: u64,
    pub max_step: u64,
    pub max_episode: u64,
    pub eval_while_train: bool,
    pub max_eval_episode: u64,
    pub off_policy_step_eval: bool,
    pub off_policy_step_eval_num: u64,
    pub policy_mode: PolicyMode,
    pub moving_average_episode: usize,
    pub add_noise2buffer: bool,
    pub add_noise2buffer_episode_interval: u64,
    pub add_noise2buffer_steps: u64,
    /// bound the run by env steps instead of episodes
    pub total_step_control: bool,
    pub eval_interval: u64,
    pub max_total_step: u64,
    /// progress bar while noise is pushed into the buffer, set from the top-level flag
    pub show_progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            begin_episode: 0,
            render: false,
            render_episode: 50_000,
            save_frequency: 100,
            max_step: 1000,
            max_episode: 5000,
            eval_while_train: false,
            max_eval_episode: 100,
            off_policy_step_eval: false,
            off_policy_step_eval_num: 1,
            policy_mode: PolicyMode::OnPolicy,
            moving_average_episode: 10,
            add_noise2buffer: false,
            add_noise2buffer_episode_interval: 10,
            add_noise2buffer_steps: 1000,
            total_step_control: false,
            eval_interval: 100,
            max_total_step: 100_000,
            show_progress: false,
        }
    }
}

/// Replay buffer prefill before training starts.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct NoOpConfig {
    // signed on purpose, a negative count from the file is reported rather than wrapped
    pub pre_fill_steps: i64,
    pub prefill_choose: bool,
}

/// Parameters of the single-env `Loop`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GymLoopConfig {
    pub action_type: ActionType,
    pub train_mode: TrainMode,
    pub begin_episode: u64,
    pub save_frequency: u64,
    pub max_step: u64,
    pub max_episode: u64,
    pub render: bool,
    pub render_episode: u64,
    pub no_op_steps: i64,
    pub inference_episodes: Option<u64>,
}

impl Default for GymLoopConfig {
    fn default() -> Self {
        Self {
            action_type: ActionType::Continuous,
            train_mode: TrainMode::PerEpisode,
            begin_episode: 0,
            save_frequency: 100,
            max_step: 200,
            max_episode: 500,
            render: false,
            render_episode: 50_000,
            no_op_steps: 100,
            inference_episodes: None,
        }
    }
}

/// Sizing of the bundled demo environments.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnvConfig {
    pub n_envs: usize,
    pub corridor_length: usize,
    pub max_episode_steps: u64,
    pub reward_threshold: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            n_envs: 4,
            corridor_length: 8,
            max_episode_steps: 64,
            reward_threshold: Some(0.9),
            seed: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info,gym_loops=info".to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            train: TrainConfig::default(),
            no_op: NoOpConfig::default(),
            gym: GymLoopConfig::default(),
            env: EnvConfig::default(),
            show_progress: default_true(),
            log_filter: default_log_filter(),
        }
    }
}

impl Configuration {
    pub fn load_configuration(config_file: &Path) -> Result<Configuration> {
        let config_err = |source| LoopError::Config {
            path: config_file.display().to_string(),
            source,
        };
        let mut file = File::open(config_file).map_err(config_err)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(config_err)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// `true` on every `interval`-th count; an interval of 0 disables the trigger
pub fn every(count: u64, interval: u64) -> bool {
    interval != 0 && count % interval == 0
}
