pub mod common_utils;
pub mod gym_loop;
pub mod vec_loop;
