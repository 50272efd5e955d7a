//! Random-action rollout through a wrapped MiniGrid environment: builds and
//! augments the options, prints the config, registers the metric groups and
//! traces the train group for a handful of episodes.
//!
//! Requires a Python installation with `gym` and `gym_minigrid` importable.

use std::path::PathBuf;

use rand::Rng;
use utils::env::{wrap_env, Env, GymWrapper};
use utils::metrics::configure_logger;
use utils::options::{augment_options, config_to_string, Opt};
use utils::panic_hook;

const NUM_EPISODES: usize = 20;

fn main() {
    panic_hook::init();
    tracing_subscriber::fmt::init();

    let opt = Opt::builder()
        .game("MiniGrid-Empty-8x8-v0".to_owned())
        .hist_len(4)
        .device("cpu".to_owned())
        .out_dir(PathBuf::from("results"))
        .build();
    let opt = augment_options(opt).unwrap();

    println!("{}", config_to_string(&opt.to_map(), 0, true));

    let mut registry = configure_logger(&opt).unwrap();

    let env = GymWrapper::new(&opt.game).unwrap();
    let mut env = wrap_env(env, &opt);
    let action_space = env.action_space() as u32;

    let mut rng = rand::thread_rng();
    let mut frame_no = 0_u64;

    for _ in 0..NUM_EPISODES {
        let _observation = env.reset().unwrap();

        loop {
            let action = rng.gen_range(0..action_space);
            let step = env.step(action).unwrap();
            frame_no += 1;

            registry.group("train").trace(&[
                ("reward", step.reward),
                ("done", if step.done { 1.0 } else { 0.0 }),
                ("step_no", 1.0),
                ("frame_no", 1.0),
            ]);

            if step.done {
                break;
            }
        }
    }

    registry.write_summary("train", frame_no).unwrap();
    for (name, value) in registry.get("train").unwrap().summary() {
        tracing::info!(metric = %name, value, "rollout finished");
    }
    registry.close().unwrap();
}
