use std::collections::VecDeque;

use tch::{Device, Kind, Tensor};

use super::{Env, Frame, ObsBundle, Step};
use crate::options::Opt;
use crate::{Error, Result};

/// MiniGrid agent view is a fixed 7x7 grid.
const GRID_HEIGHT: usize = 7;
const GRID_WIDTH: usize = 7;

/// Symbolic cell values span [0, 9]; spread them over the byte range.
const MAX_RATIO: i64 = 255 / 9;

/// Converts a stacked symbolic frame into the model-input tensor.
///
/// `[H, W, C]` bytes become a `[1, hist, 3, W, H]` `Uint8` tensor on
/// `device`, every value scaled by `255 / 9` and clamped to `[0, 255]`.
/// The frame must be shaped `[7, 7, 3k]`; anything else is a
/// [`Error::ShapeMismatch`].
pub fn convert_frame(frame: &Frame, device: Device) -> Result<Tensor> {
    let [height, width, channels] = frame.shape();
    if height != GRID_HEIGHT || width != GRID_WIDTH || channels == 0 || channels % 3 != 0 {
        return Err(Error::ShapeMismatch {
            found: [height, width, channels],
        });
    }

    let hist_len = (channels / 3) as i64;

    let obs = Tensor::from_slice(frame.data())
        .view([height as i64, width as i64, channels as i64])
        .permute([2, 1, 0]);

    // [hist_len * 3, w, h] -> [1, hist_len, 3, w, h]; the permuted tensor is
    // no longer contiguous, hence reshape instead of view.
    let obs = obs
        .reshape([hist_len, 3, GRID_WIDTH as i64, GRID_HEIGHT as i64])
        .unsqueeze(0);

    let obs = (obs.to_kind(Kind::Int64) * MAX_RATIO)
        .clamp(0, 255)
        .to_kind(Kind::Uint8);

    Ok(obs.to_device(device))
}

/// Drops everything from the observation bundle except the image.
#[must_use]
#[derive(Debug)]
pub struct ImgObs<E> {
    env: E,
}

impl<E> ImgObs<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }
}

impl<E> Env for ImgObs<E>
where
    E: Env<Obs = ObsBundle>,
{
    type Obs = Frame;

    fn observation_space(&self) -> Vec<usize> {
        self.env.observation_space()
    }

    fn action_space(&self) -> usize {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Frame> {
        Ok(self.env.reset()?.image)
    }

    fn step(&mut self, action: u32) -> Result<Step<Frame>> {
        let step = self.env.step(action)?;
        Ok(Step {
            obs: step.obs.image,
            reward: step.reward,
            done: step.done,
        })
    }
}

/// Keeps the last `k` frames and exposes them concatenated along the
/// channel axis, oldest first. A reset fills the history with the initial
/// frame so the very first observation already has full channel width.
#[must_use]
#[derive(Debug)]
pub struct FrameStack<E> {
    env: E,
    k: usize,
    frames: VecDeque<Frame>,
}

impl<E> FrameStack<E> {
    pub fn new(env: E, k: usize) -> Self {
        assert!(k >= 1, "history length must be at least 1");
        Self {
            env,
            k,
            frames: VecDeque::with_capacity(k),
        }
    }

    fn stacked(&self) -> Frame {
        assert!(!self.frames.is_empty(), "stepped before reset");
        Frame::stack(self.frames.iter())
    }
}

impl<E> Env for FrameStack<E>
where
    E: Env<Obs = Frame>,
{
    type Obs = Frame;

    fn observation_space(&self) -> Vec<usize> {
        let space = self.env.observation_space();
        vec![space[0], space[1], space[2] * self.k]
    }

    fn action_space(&self) -> usize {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Frame> {
        let first = self.env.reset()?;
        self.frames.clear();
        for _ in 0..self.k {
            self.frames.push_back(first.clone());
        }
        Ok(self.stacked())
    }

    fn step(&mut self, action: u32) -> Result<Step<Frame>> {
        let step = self.env.step(action)?;
        self.frames.pop_front();
        self.frames.push_back(step.obs);
        Ok(Step {
            obs: self.stacked(),
            reward: step.reward,
            done: step.done,
        })
    }
}

/// Terminal stage of the pipeline: frames out, torch tensors in model
/// layout on the configured device.
#[must_use]
#[derive(Debug)]
pub struct TensorWrapper<E> {
    env: E,
    device: Device,
}

impl<E> TensorWrapper<E> {
    pub fn new(env: E, device: Device) -> Self {
        tracing::debug!(?device, "returning torch tensors");
        Self { env, device }
    }

    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }
}

impl<E> Env for TensorWrapper<E>
where
    E: Env<Obs = Frame>,
{
    type Obs = Tensor;

    fn observation_space(&self) -> Vec<usize> {
        let space = self.env.observation_space();
        vec![1, space[2] / 3, 3, space[1], space[0]]
    }

    fn action_space(&self) -> usize {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Tensor> {
        let frame = self.env.reset()?;
        convert_frame(&frame, self.device)
    }

    fn step(&mut self, action: u32) -> Result<Step<Tensor>> {
        let step = self.env.step(action)?;
        Ok(Step {
            obs: convert_frame(&step.obs, self.device)?,
            reward: step.reward,
            done: step.done,
        })
    }
}

/// Standard wrapper chain for a MiniGrid-style environment. The order is
/// fixed: frames must be stacked before conversion because the converter
/// assumes the pre-stacked channel width.
pub fn wrap_env<E>(env: E, opt: &Opt) -> TensorWrapper<FrameStack<ImgObs<E>>>
where
    E: Env<Obs = ObsBundle>,
{
    let env = ImgObs::new(env);
    let env = FrameStack::new(env, opt.hist_len);
    TensorWrapper::new(env, opt.device())
}
