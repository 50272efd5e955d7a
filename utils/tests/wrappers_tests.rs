mod common;

use common::GridStub;
use tch::Device;
use utils::env::{wrap_env, Env, FrameStack, ImgObs};
use utils::options::{augment_options, Opt};

fn cpu_opt(hist_len: usize) -> Opt {
    let opt = Opt::builder()
        .game("MiniGrid-Empty-5x5-v0".to_owned())
        .hist_len(hist_len)
        .device("cpu".to_owned())
        .out_dir(std::env::temp_dir())
        .build();
    augment_options(opt).unwrap()
}

#[test]
fn img_obs_extracts_the_frame_from_the_bundle() {
    let mut env = ImgObs::new(GridStub::new(5));

    let frame = env.reset().unwrap();
    assert_eq!(frame.shape(), [7, 7, 3]);
    assert_eq!(env.observation_space(), vec![7, 7, 3]);
    assert_eq!(env.action_space(), 7);
}

#[test]
fn frame_stack_fills_history_on_reset() {
    let mut env = FrameStack::new(ImgObs::new(GridStub::new(5)), 2);

    let stacked = env.reset().unwrap();
    assert_eq!(stacked.shape(), [7, 7, 6]);

    // both history slots hold the reset frame
    for h in 0..7 {
        for w in 0..7 {
            for c in 0..3 {
                assert_eq!(stacked.at(h, w, c), stacked.at(h, w, c + 3));
            }
        }
    }
}

#[test]
fn frame_stack_evicts_the_oldest_frame() {
    let mut env = FrameStack::new(ImgObs::new(GridStub::new(5)), 2);
    env.reset().unwrap();

    let step = env.step(0).unwrap();

    // oldest half is the reset frame (t = 0), newest half is t = 1
    assert_eq!(step.obs.at(0, 0, 0), 0);
    assert_eq!(step.obs.at(0, 0, 3), 1);
}

#[test]
fn frame_stack_space_scales_with_history() {
    let env = FrameStack::new(ImgObs::new(GridStub::new(5)), 4);
    assert_eq!(env.observation_space(), vec![7, 7, 12]);
}

#[test]
fn wrap_env_produces_model_tensors() {
    let opt = cpu_opt(4);
    let mut env = wrap_env(GridStub::new(3), &opt);

    assert_eq!(env.observation_space(), vec![1, 4, 3, 7, 7]);

    let observation = env.reset().unwrap();
    assert_eq!(observation.size(), vec![1, 4, 3, 7, 7]);
    assert_eq!(observation.device(), Device::Cpu);

    let step = env.step(2).unwrap();
    assert_eq!(step.obs.size(), vec![1, 4, 3, 7, 7]);
    assert!((step.reward - 0.5).abs() < 1e-12);
    assert!(!step.done);
}

#[test]
fn wrap_env_runs_an_episode_to_completion() {
    let opt = cpu_opt(2);
    let mut env = wrap_env(GridStub::new(4), &opt);
    env.reset().unwrap();

    let mut steps = 0;
    loop {
        let step = env.step(1).unwrap();
        steps += 1;
        if step.done {
            break;
        }
    }
    assert_eq!(steps, 4);
}
