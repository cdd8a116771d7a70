use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gym_loops::{
    config::{Configuration, TrainConfig},
    gym_env::{ActionType, GymEnv, Space},
    gym_funcs::{chain::ChainEnv, corridor::CorridorEnv, target_reach::TargetReachEnv},
    gym_evaluate, gym_inference, gym_no_op, gym_train,
    logging::{init_logging, TracingPrinter},
    models::random_agent::RandomAgent,
    vec_gym_env::VecEnv,
    Loop,
};

#[derive(Parser)]
#[command(name = "gym-loops", about = "Run RL driver loops against the bundled demo envs")]
struct Cli {
    /// JSON configuration file, defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// where the demo agent writes its checkpoints
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// prefill, then train on the vectorized corridor env
    Train,
    /// evaluate the agent on the corridor env
    Evaluate,
    /// only prefill the replay buffer
    NoOp,
    /// render and roll out the agent without training
    Inference {
        #[arg(long, default_value_t = 1)]
        episodes: u64,
    },
    /// single-env training on target-reach (continuous) or chain (discrete)
    GymTrain {
        #[arg(long)]
        chain: bool,
    },
}

fn corridor(config: &Configuration) -> CorridorEnv {
    CorridorEnv::new(
        config.env.n_envs,
        config.env.corridor_length,
        config.env.max_episode_steps,
        config.env.reward_threshold,
        config.env.seed,
    )
}

fn corridor_agent(config: &Configuration, checkpoint_dir: Option<PathBuf>) -> RandomAgent {
    let agent = RandomAgent::new(Space::Discrete { n: 2 }, ActionType::Discrete, config.env.seed);
    match checkpoint_dir {
        Some(dir) => agent.with_checkpoint_dir(dir),
        None => agent,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Configuration::load_configuration(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    init_logging(&config.log_filter);
    let mut printer = TracingPrinter;

    match cli.command {
        Command::Train => {
            let mut env = corridor(&config);
            let mut agent = corridor_agent(&config, cli.checkpoint_dir);
            gym_no_op(
                &mut env,
                &mut agent,
                &mut printer,
                config.no_op.pre_fill_steps,
                config.no_op.prefill_choose,
                config.show_progress,
            )?;
            // the eval env is a single instance of the same task
            let mut eval_env = CorridorEnv::new(
                1,
                config.env.corridor_length,
                config.env.max_episode_steps,
                config.env.reward_threshold,
                config.env.seed,
            );
            let train_config = TrainConfig {
                show_progress: config.show_progress,
                ..config.train.clone()
            };
            gym_train(&mut env, Some(&mut eval_env as &mut dyn VecEnv), &mut agent, &mut printer, &train_config)?;
            info!(stats = ?agent.stats(), "training finished");
        }
        Command::Evaluate => {
            let mut env = corridor(&config);
            let mut agent = corridor_agent(&config, cli.checkpoint_dir);
            let report = gym_evaluate(
                &mut env,
                &mut agent,
                config.train.max_step,
                config.train.max_eval_episode,
                &mut printer,
            );
            info!(?report, "evaluation finished");
        }
        Command::NoOp => {
            let mut env = corridor(&config);
            let mut agent = corridor_agent(&config, cli.checkpoint_dir);
            gym_no_op(
                &mut env,
                &mut agent,
                &mut printer,
                config.no_op.pre_fill_steps,
                config.no_op.prefill_choose,
                config.show_progress,
            )?;
            info!(stored = agent.stats().no_op_stored, "prefill finished");
        }
        Command::Inference { episodes } => {
            let mut env = corridor(&config);
            let mut agent = corridor_agent(&config, cli.checkpoint_dir);
            gym_inference(&mut env, &mut agent, Some(episodes));
        }
        Command::GymTrain { chain } => {
            let gym = &config.gym;
            let (mut env, action_type): (Box<dyn GymEnv>, ActionType) = if chain {
                (Box::new(ChainEnv::new(config.env.corridor_length, gym.max_step)), ActionType::Discrete)
            } else {
                (Box::new(TargetReachEnv::new(gym.max_step, config.env.seed)), ActionType::Continuous)
            };
            let mut agent = RandomAgent::new(env.action_space().clone(), action_type, config.env.seed);
            if let Some(dir) = cli.checkpoint_dir {
                agent = agent.with_checkpoint_dir(dir);
            }
            let mut gym_config = gym.clone();
            gym_config.action_type = action_type;
            Loop::no_op(env.as_mut(), &mut agent, action_type, gym_config.no_op_steps)?;
            Loop::train(env.as_mut(), &mut agent, &mut printer, &gym_config)?;
            info!(stats = ?agent.stats(), "gym training finished");
        }
    }
    Ok(())
}
