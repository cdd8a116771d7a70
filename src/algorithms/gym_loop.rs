// Driver loops for a single, non-vectorized gym env. The model still sees
// batches, they just have one row.
use tracing::{debug, info};

use crate::{
    config::{every, GymLoopConfig, TrainMode},
    error::{LoopError, Result},
    gym_env::{get_action_normalize_factor, maybe_one_hot, zero_action, ActionType, GymEnv, GymStep},
    logging::Printer,
    models::model_base::{summary, Model, Transition},
    vec_gym_env::StatePair,
};

pub struct Loop;

impl Loop {
    /// Trains on a single env. Models act in [-1, 1] for continuous spaces, the
    /// action is rescaled to the env's bounds before stepping but stored as chosen.
    ///
    /// An episode ends when the env reports done or after `max_step` steps.
    pub fn train<E, M, P>(env: &mut E, model: &mut M, print_func: &mut P, config: &GymLoopConfig) -> Result<()>
    where
        E: GymEnv + ?Sized,
        M: Model,
        P: Printer + ?Sized,
    {
        let i = env.observation_space().obs_kind();
        let scale = get_action_normalize_factor(env.action_space(), config.action_type)?;
        let mut state = StatePair::empty(1);
        let mut new_state = StatePair::empty(1);

        for episode in config.begin_episode..config.max_episode {
            let obs = maybe_one_hot(&env.reset(), env.observation_space())?;
            state.set(i, vec![obs]);
            let mut step: u64 = 0;
            let mut r = 0.;
            loop {
                step += 1;
                if config.render || episode > config.render_episode {
                    env.render();
                }
                let action = model.choose_action(&state.vector, &state.visual, false);
                let first = action.first().map(Vec::as_slice).unwrap_or_default();
                let GymStep { obs, reward, done } = env.step(&scale.apply(first)?);
                let obs = maybe_one_hot(&obs, env.observation_space())?;
                new_state.set(i, vec![obs]);
                r += reward as f64;
                model.store_data(Transition {
                    s: &state.vector,
                    visual_s: &state.visual,
                    a: &action,
                    r: &[reward],
                    s_: &new_state.vector,
                    visual_s_: &new_state.visual,
                    done: &[done],
                });
                state.set(i, new_state.get(i).to_vec());

                if config.train_mode == TrainMode::PerStep {
                    model.learn(episode, step);
                }

                if done || step > config.max_step {
                    break;
                }
            }

            if config.train_mode == TrainMode::PerEpisode {
                model.learn(episode, step);
            }

            print_func.print(&format!("episode {episode} step {step}"), false);
            model.writer_summary(episode, &summary([("total_reward", r), ("step", step as f64)]));
            if every(episode, config.save_frequency) {
                model
                    .save_checkpoint(episode)
                    .map_err(|source| LoopError::Checkpoint { episode, source })?;
            }
        }
        Ok(())
    }

    /// Shows the model's behavior without training it. Runs forever when
    /// `max_episodes` is `None`; an episode ends on done or after `max_step` steps.
    pub fn inference<E, M>(
        env: &mut E,
        model: &mut M,
        action_type: ActionType,
        max_step: u64,
        max_episodes: Option<u64>,
    ) -> Result<()>
    where
        E: GymEnv + ?Sized,
        M: Model,
    {
        let i = env.observation_space().obs_kind();
        let scale = get_action_normalize_factor(env.action_space(), action_type)?;
        let mut state = StatePair::empty(1);
        let mut episode: u64 = 0;

        while max_episodes.map_or(true, |max| episode < max) {
            let obs = maybe_one_hot(&env.reset(), env.observation_space())?;
            state.set(i, vec![obs]);
            let mut r = 0.;
            let mut step: u64 = 0;
            loop {
                step += 1;
                env.render();
                let action = model.choose_action(&state.vector, &state.visual, true);
                let first = action.first().map(Vec::as_slice).unwrap_or_default();
                let GymStep { obs, reward, done } = env.step(&scale.apply(first)?);
                state.set(i, vec![maybe_one_hot(&obs, env.observation_space())?]);
                r += reward as f64;
                if done || step > max_step {
                    break;
                }
            }
            info!(episode, step, total_reward = r, "inference episode finished");
            episode += 1;
        }
        Ok(())
    }

    /// Steps the env `steps` times with the do-nothing action and hands every
    /// transition to `no_op_store`. The env is reset whenever it reports done.
    pub fn no_op<E, M>(env: &mut E, model: &mut M, action_type: ActionType, steps: i64) -> Result<()>
    where
        E: GymEnv + ?Sized,
        M: Model,
    {
        if steps <= 0 {
            return Err(LoopError::InvalidStepCount {
                got: steps,
                expected: "a positive integer",
            });
        }

        let i = env.observation_space().obs_kind();
        let mut state = StatePair::empty(1);
        let mut new_state = StatePair::empty(1);
        let obs = maybe_one_hot(&env.reset(), env.observation_space())?;
        state.set(i, vec![obs]);

        let action = vec![zero_action(env.action_space(), action_type)];

        for step in 0..steps {
            debug!(step, "no op step");
            let GymStep { obs, reward, done } = env.step(&action[0]);
            let obs = maybe_one_hot(&obs, env.observation_space())?;
            new_state.set(i, vec![obs]);
            model.no_op_store(Transition {
                s: &state.vector,
                visual_s: &state.visual,
                a: &action,
                r: &[reward],
                s_: &new_state.vector,
                visual_s_: &new_state.visual,
                done: &[done],
            });
            if done {
                let obs = maybe_one_hot(&env.reset(), env.observation_space())?;
                state.set(i, vec![obs]);
            } else {
                state.set(i, new_state.get(i).to_vec());
            }
        }
        Ok(())
    }
}
