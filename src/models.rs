pub mod model_base;
pub mod random_agent;
