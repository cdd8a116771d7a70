// Driver loops over a vectorized env: training, evaluation, replay buffer
// prefill and inference. The loops only sequence env and model calls.
use tracing::{debug, info, warn};

use crate::{
    algorithms::common_utils::{arrprint, mean, prog_bar, EpisodeRewards, MovingAverage},
    config::{every, PolicyMode, TrainConfig},
    error::{LoopError, Result},
    logging::Printer,
    models::model_base::{summary, Model, Transition},
    vec_gym_env::{init_variables, VecEnv, VecStep},
};

/// Averages produced by an evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub average_reward: f64,
    pub average_step: u64,
    pub solved: bool,
}

/// Trains `model` on `env` until `max_episode` (or `max_total_step` env steps
/// when `total_step_control` is set).
///
/// Off-policy models learn after every step and stop an episode as soon as all
/// envs are done. On-policy models keep collecting until `max_step` and learn
/// once per episode. `eval_env` is only needed for off-policy step evaluation.
pub fn gym_train<E, M, P>(
    env: &mut E,
    mut eval_env: Option<&mut dyn VecEnv>,
    model: &mut M,
    print_func: &mut P,
    config: &TrainConfig,
) -> Result<()>
where
    E: VecEnv + ?Sized,
    M: Model,
    P: Printer + ?Sized,
{
    let off_policy = config.policy_mode == PolicyMode::OffPolicy;
    let step_eval = off_policy && config.off_policy_step_eval;
    if step_eval && eval_env.is_none() {
        return Err(LoopError::MissingEvalEnv);
    }
    let max_episode = if config.total_step_control {
        config.max_total_step
    } else {
        config.max_episode
    };

    let n = env.n();
    let (i, mut state, mut new_state) = init_variables(env);
    let mut sma = MovingAverage::new(config.moving_average_episode);
    let mut total_step: u64 = 0;

    for episode in config.begin_episode..max_episode {
        model.reset();
        state.set(i, env.reset());
        let mut r = EpisodeRewards::new(n);
        let mut step: u64 = 0;
        let mut last_done_step: i64 = -1;
        loop {
            step += 1;
            if config.render || episode > config.render_episode {
                env.render(false);
            }
            let action = model.choose_action(&state.vector, &state.visual, false);
            let VecStep {
                obs,
                reward,
                done,
                correct_obs,
                ..
            } = env.step(&action);
            new_state.set(i, obs);
            r.add(&reward, &done);
            model.store_data(Transition {
                s: &state.vector,
                visual_s: &state.visual,
                a: &action,
                r: &reward,
                s_: &new_state.vector,
                visual_s_: &new_state.visual,
                done: &done,
            });
            model.partial_reset(&done);
            state.set(i, correct_obs);

            if off_policy {
                model.learn(episode, 1);
                if step_eval && every(total_step, config.eval_interval) {
                    if let Some(eval_env) = eval_env.as_deref_mut() {
                        gym_step_eval(eval_env, total_step, model, config.off_policy_step_eval_num, config.max_step);
                    }
                }
            }
            total_step += 1;
            if config.total_step_control && total_step > config.max_total_step {
                info!(total_step, episode, "reached max_total_step, stopping training");
                return Ok(());
            }

            if r.all_done() {
                if last_done_step == -1 {
                    last_done_step = step as i64;
                }
                if off_policy {
                    break;
                }
            }

            if step >= config.max_step {
                break;
            }
        }

        sma.update(r.rewards());
        if !off_policy {
            model.learn(episode, step);
        }
        let mut episode_summary = summary([
            ("reward_mean", r.mean()),
            ("reward_min", r.min()),
            ("reward_max", r.max()),
            ("step", last_done_step as f64),
        ]);
        episode_summary.extend(sma.rs());
        model.writer_summary(episode, &episode_summary);
        print_func.print(&"-".repeat(40), true);
        print_func.print(
            &format!(
                "Episode: {episode:3} | step: {step:4} | last_done_step {last_done_step:4} | rewards: {}",
                arrprint(r.rewards(), 3)
            ),
            false,
        );
        if every(episode, config.save_frequency) {
            model
                .save_checkpoint(episode)
                .map_err(|source| LoopError::Checkpoint { episode, source })?;
        }

        if config.add_noise2buffer && every(episode, config.add_noise2buffer_episode_interval) {
            gym_random_sample(env, model, config.add_noise2buffer_steps, print_func, config.show_progress);
        }

        if config.eval_while_train {
            if let Some(threshold) = env.reward_threshold() {
                if r.max() >= threshold {
                    print_func.print(
                        &format!("{}Evaluate episode: {episode:3}{}", "-".repeat(43), "-".repeat(50)),
                        false,
                    );
                    gym_evaluate(env, model, config.max_step, config.max_eval_episode, print_func);
                }
            }
        }
    }
    Ok(())
}

/// Runs `episodes_num` evaluation episodes on a single-env `env` and writes
/// `eval_return` / `eval_ave_step` at `total_step`.
///
/// The model's recurrent state is stashed before and restored after, so the
/// training rollout continues where it left off.
pub fn gym_step_eval<E, M>(env: &mut E, total_step: u64, model: &mut M, episodes_num: u64, max_step: u64) -> Option<EvalReport>
where
    E: VecEnv + ?Sized,
    M: Model,
{
    let cs = model.get_cell_state();
    model.reset();

    let (i, mut state, _) = init_variables(env);
    let mut ret = 0.;
    let mut ave_steps: u64 = 0;
    for _ in 0..episodes_num {
        state.set(i, env.reset());
        let mut r = 0.;
        let mut step: u64 = 0;
        loop {
            let action = model.choose_action(&state.vector, &state.visual, true);
            let VecStep { obs, reward, done, .. } = env.step(&action);
            state.set(i, obs);
            r += reward.first().copied().unwrap_or(0.) as f64;
            step += 1;
            if done.first().copied().unwrap_or(true) || step > max_step {
                ret += r;
                ave_steps += step;
                break;
            }
        }
        model.reset();
    }

    let report = if episodes_num > 0 {
        let eval_return = ret / episodes_num as f64;
        let eval_ave_step = ave_steps / episodes_num;
        model.writer_summary(
            total_step,
            &summary([("eval_return", eval_return), ("eval_ave_step", eval_ave_step as f64)]),
        );
        Some(EvalReport {
            average_reward: eval_return,
            average_step: eval_ave_step,
            solved: false,
        })
    } else {
        warn!("step evaluation requested with zero episodes, skipping");
        None
    };
    model.set_cell_state(cs);
    report
}

/// Pushes `steps` transitions of uniformly random actions into the model's buffer.
pub fn gym_random_sample<E, M, P>(env: &mut E, model: &mut M, steps: u64, print_func: &mut P, show_progress: bool)
where
    E: VecEnv + ?Sized,
    M: Model,
    P: Printer + ?Sized,
{
    let (i, mut state, mut new_state) = init_variables(env);
    state.set(i, env.reset());

    let bar = prog_bar(steps, show_progress);
    bar.set_message("noise");
    for _ in 0..steps {
        let action = env.sample_actions();
        let VecStep {
            obs,
            reward,
            done,
            correct_obs,
            ..
        } = env.step(&action);
        new_state.set(i, obs);
        model.no_op_store(Transition {
            s: &state.vector,
            visual_s: &state.visual,
            a: &action,
            r: &reward,
            s_: &new_state.vector,
            visual_s_: &new_state.visual,
            done: &done,
        });
        state.set(i, correct_obs);
        bar.inc(1);
    }
    bar.finish_and_clear();
    print_func.print("Noise added complete.", false);
}

/// Evaluates the model over `max_eval_episode / n` batched rounds.
///
/// A round ends once every env finished or any env hit `max_step`; rewards of
/// finished envs stop counting. Returns `None` when fewer episodes than envs
/// were requested.
pub fn gym_evaluate<E, M, P>(
    env: &mut E,
    model: &mut M,
    max_step: u64,
    max_eval_episode: u64,
    print_func: &mut P,
) -> Option<EvalReport>
where
    E: VecEnv + ?Sized,
    M: Model,
    P: Printer + ?Sized,
{
    let n = env.n();
    let (i, mut state, _) = init_variables(env);
    let episodes = max_eval_episode / n.max(1) as u64;
    if episodes == 0 {
        warn!(max_eval_episode, n, "fewer evaluation episodes than envs, skipping evaluation");
        return None;
    }
    let mut total_r = vec![0.; n];
    let mut total_steps = vec![0u64; n];

    for _ in 0..episodes {
        model.reset();
        state.set(i, env.reset());
        let mut r = EpisodeRewards::new(n);
        let mut steps = vec![0u64; n];
        loop {
            let action = model.choose_action(&state.vector, &state.visual, true);
            let VecStep {
                reward,
                done,
                correct_obs,
                ..
            } = env.step(&action);
            model.partial_reset(&done);
            let unfinished = r.add(&reward, &done);
            for (s, running) in steps.iter_mut().zip(unfinished) {
                if running {
                    *s += 1;
                }
            }
            state.set(i, correct_obs);
            if r.all_done() || steps.iter().any(|s| *s >= max_step) {
                break;
            }
        }
        for (total, ep) in total_r.iter_mut().zip(r.rewards()) {
            *total += ep;
        }
        for (total, ep) in total_steps.iter_mut().zip(&steps) {
            *total += ep;
        }
    }

    let average_reward = mean(&total_r) / episodes as f64;
    let steps_f: Vec<f64> = total_steps.iter().map(|s| *s as f64).collect();
    let average_step = (mean(&steps_f) / episodes as f64) as u64;
    let solved = env.reward_threshold().map_or(false, |t| average_reward >= t);
    print_func.print(
        &format!(
            "evaluate number: {max_eval_episode:3} | average step: {average_step} | average reward: {average_reward} | SOLVED: {solved}"
        ),
        false,
    );
    print_func.print(&"-".repeat(124), false);
    Some(EvalReport {
        average_reward,
        average_step,
        solved,
    })
}

/// Prefills the model's replay buffer with `pre_fill_steps` transitions spread
/// over the env's `n` instances, using the model's own actions when
/// `prefill_choose` is set and random actions otherwise.
pub fn gym_no_op<E, M, P>(
    env: &mut E,
    model: &mut M,
    print_func: &mut P,
    pre_fill_steps: i64,
    prefill_choose: bool,
    show_progress: bool,
) -> Result<()>
where
    E: VecEnv + ?Sized,
    M: Model,
    P: Printer + ?Sized,
{
    let pre_fill_steps = u64::try_from(pre_fill_steps).map_err(|_| LoopError::InvalidStepCount {
        got: pre_fill_steps,
        expected: "a non-negative integer",
    })?;

    let (i, mut state, mut new_state) = init_variables(env);
    model.reset();
    state.set(i, env.reset());
    let steps = pre_fill_steps / env.n().max(1) as u64;

    let bar = prog_bar(steps, show_progress);
    bar.set_message("no op");
    for step in 0..steps {
        debug!(step, "no op step");
        let action = if prefill_choose {
            model.choose_action(&state.vector, &state.visual, false)
        } else {
            env.sample_actions()
        };
        let VecStep {
            obs,
            reward,
            done,
            correct_obs,
            ..
        } = env.step(&action);
        new_state.set(i, obs);
        model.no_op_store(Transition {
            s: &state.vector,
            visual_s: &state.visual,
            a: &action,
            r: &reward,
            s_: &new_state.vector,
            visual_s_: &new_state.visual,
            done: &done,
        });
        model.partial_reset(&done);
        state.set(i, correct_obs);
        bar.inc(1);
    }
    bar.finish_and_clear();
    print_func.print(&format!("no op finished: {steps} steps x {} envs", env.n()), false);
    Ok(())
}

/// Runs the model greedily with rendering. Counts an episode each time the
/// first env finishes and stops after `max_episodes`, or never when `None`.
pub fn gym_inference<E, M>(env: &mut E, model: &mut M, max_episodes: Option<u64>)
where
    E: VecEnv + ?Sized,
    M: Model,
{
    let (i, mut state, _) = init_variables(env);
    model.reset();
    state.set(i, env.reset());
    let mut episodes: u64 = 0;
    let mut step: u64 = 0;
    while max_episodes.map_or(true, |max| episodes < max) {
        debug!(step, "inference step");
        env.render(false);
        let action = model.choose_action(&state.vector, &state.visual, true);
        step += 1;
        let VecStep {
            reward,
            done,
            correct_obs,
            ..
        } = env.step(&action);
        model.partial_reset(&done);
        if done.first().copied().unwrap_or(false) {
            info!(done = true, reward = reward.first().copied().unwrap_or(0.), step, "episode finished");
            step = 0;
            episodes += 1;
        }
        state.set(i, correct_obs);
    }
}
