pub mod algorithms;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

/* Episode driver loops for reinforcement-learning agents.

   The loops coordinate env transitions, experience storage, periodic
   learning, moving-average reward tracking, evaluation and checkpointing.
   Action selection, learning and persistence stay behind the `Model` trait,
   simulation behind `VecEnv` / `GymEnv`.
*/
pub mod gym_env;
pub mod vec_gym_env;
pub mod gym_funcs;

pub use algorithms::gym_loop::Loop;
pub use algorithms::vec_loop::{gym_evaluate, gym_inference, gym_no_op, gym_random_sample, gym_step_eval, gym_train, EvalReport};
pub use error::{LoopError, Result};
