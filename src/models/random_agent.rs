use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use rand::{rngs::SmallRng, thread_rng, Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::gym_env::{ActionType, Space};
use crate::models::model_base::{CheckpointError, Model, Summary, Transition};

/// Counters persisted with each checkpoint.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AgentStats {
    pub stored: u64,
    pub no_op_stored: u64,
    pub learn_calls: u64,
    pub resets: u64,
}

#[derive(Serialize)]
struct CheckpointRecord<'a> {
    episode: u64,
    stats: &'a AgentStats,
}

/// Uniform random policy that never learns, used to smoke-test the driver loops.
///
/// Continuous actions are sampled in the normalized [-1, 1] range, discrete
/// ones as an index. Checkpoints are small JSON files with the call counters.
pub struct RandomAgent {
    action_space: Space,
    action_type: ActionType,
    rng: SmallRng,
    checkpoint_dir: Option<PathBuf>,
    stats: AgentStats,
    last_summary: Option<(u64, Summary)>,
}

impl RandomAgent {
    pub fn new(action_space: Space, action_type: ActionType, seed: Option<u64>) -> Self {
        let seed = match seed {
            Some(seed) => seed,
            None => thread_rng().gen_range(0..10000),
        };
        Self {
            action_space,
            action_type,
            rng: SmallRng::seed_from_u64(seed),
            checkpoint_dir: None,
            stats: AgentStats::default(),
            last_summary: None,
        }
    }

    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn last_summary(&self) -> Option<&(u64, Summary)> {
        self.last_summary.as_ref()
    }

    fn sample(&mut self) -> Vec<f32> {
        match (self.action_type, &self.action_space) {
            (ActionType::Discrete, Space::Discrete { n }) => vec![self.rng.gen_range(0..(*n).max(1)) as f32],
            (_, space) => (0..space.flat_dim()).map(|_| self.rng.gen_range(-1.0..=1.0)).collect(),
        }
    }
}

impl Model for RandomAgent {
    type CellState = ();

    fn choose_action(&mut self, s: &[Vec<f32>], visual_s: &[Vec<f32>], _evaluation: bool) -> Vec<Vec<f32>> {
        let batch = s.len().max(visual_s.len());
        (0..batch).map(|_| self.sample()).collect()
    }

    fn store_data(&mut self, transition: Transition<'_>) {
        self.stats.stored += transition.r.len() as u64;
    }

    fn no_op_store(&mut self, transition: Transition<'_>) {
        self.stats.no_op_stored += transition.r.len() as u64;
    }

    fn learn(&mut self, _episode: u64, _step: u64) {
        self.stats.learn_calls += 1;
    }

    fn reset(&mut self) {
        self.stats.resets += 1;
    }

    fn partial_reset(&mut self, _done: &[bool]) {}

    fn save_checkpoint(&mut self, episode: u64) -> Result<(), CheckpointError> {
        let Some(dir) = &self.checkpoint_dir else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("random_agent_{episode}.json"));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(
            writer,
            &CheckpointRecord {
                episode,
                stats: &self.stats,
            },
        )?;
        debug!(path = %path.display(), "saved checkpoint");
        Ok(())
    }

    fn writer_summary(&mut self, global_step: u64, summary: &Summary) {
        let mut keys: Vec<_> = summary.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        debug!(global_step, summary = ?keys, "summary");
        self.last_summary = Some((global_step, summary.clone()));
    }

    fn get_cell_state(&self) -> Self::CellState {}

    fn set_cell_state(&mut self, _cell_state: Self::CellState) {}
}
