use rustc_hash::FxHashMap;

/// Named scalars handed to the model's summary writer.
pub type Summary = FxHashMap<String, f64>;

pub type CheckpointError = Box<dyn std::error::Error + Send + Sync>;

/// One batched env transition, borrowed from the loop's buffers.
///
/// Every field has one row (or entry) per parallel env.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub s: &'a [Vec<f32>],
    pub visual_s: &'a [Vec<f32>],
    pub a: &'a [Vec<f32>],
    pub r: &'a [f32],
    pub s_: &'a [Vec<f32>],
    pub visual_s_: &'a [Vec<f32>],
    pub done: &'a [bool],
}

// the loops only sequence calls, everything interesting lives behind this trait
pub trait Model {
    /// recurrent hidden state, stashed around evaluation runs
    type CellState;

    fn choose_action(&mut self, s: &[Vec<f32>], visual_s: &[Vec<f32>], evaluation: bool) -> Vec<Vec<f32>>;
    fn store_data(&mut self, transition: Transition<'_>);
    /// like `store_data` but for prefill/noise experience that should not count as training data
    fn no_op_store(&mut self, transition: Transition<'_>);
    fn learn(&mut self, episode: u64, step: u64);
    fn reset(&mut self);
    /// resets recurrent state only for the envs flagged in `done`
    fn partial_reset(&mut self, done: &[bool]);
    fn save_checkpoint(&mut self, episode: u64) -> Result<(), CheckpointError>;
    fn writer_summary(&mut self, global_step: u64, summary: &Summary);
    fn get_cell_state(&self) -> Self::CellState;
    fn set_cell_state(&mut self, cell_state: Self::CellState);
}

/// builds a `Summary` from literal pairs
pub fn summary<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Summary {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}
