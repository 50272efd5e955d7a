use crate::Result;

mod gym;
mod wrappers;

pub use gym::Wrapper as GymWrapper;
pub use wrappers::{convert_frame, wrap_env, FrameStack, ImgObs, TensorWrapper};

/// Raw symbolic observation for one step: `[height, width, channels]`
/// row-major bytes, channels a multiple of 3 (RGB-like triples).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    height: usize,
    width: usize,
    channels: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, height: usize, width: usize, channels: usize) -> Self {
        assert_eq!(
            data.len(),
            height * width * channels,
            "frame buffer does not match its declared shape"
        );
        Self {
            data,
            height,
            width,
            channels,
        }
    }

    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn at(&self, h: usize, w: usize, c: usize) -> u8 {
        self.data[(h * self.width + w) * self.channels + c]
    }

    /// Concatenates frames of identical spatial shape along the channel
    /// axis, oldest first.
    #[must_use]
    pub fn stack<'a, I>(frames: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let frames = frames.into_iter().collect::<Vec<_>>();
        assert!(!frames.is_empty(), "cannot stack zero frames");

        let (height, width) = (frames[0].height, frames[0].width);
        for frame in &frames {
            assert_eq!(
                (frame.height, frame.width),
                (height, width),
                "stacked frames must share spatial dimensions"
            );
        }

        let channels = frames.iter().map(|f| f.channels).sum();
        let mut data = Vec::with_capacity(height * width * channels);
        for h in 0..height {
            for w in 0..width {
                for frame in &frames {
                    for c in 0..frame.channels {
                        data.push(frame.at(h, w, c));
                    }
                }
            }
        }

        Self::new(data, height, width, channels)
    }
}

/// Structured observation emitted by a MiniGrid-style environment. The
/// wrapper chain consumes `image`; the remaining fields ride along for
/// consumers that want them.
#[derive(Debug, Clone)]
pub struct ObsBundle {
    pub image: Frame,
    pub direction: u8,
    pub mission: String,
}

/// Result of one environment transition.
#[derive(Debug)]
pub struct Step<O> {
    pub obs: O,
    pub reward: f64,
    pub done: bool,
}

pub trait Env {
    type Obs;

    fn observation_space(&self) -> Vec<usize>;
    fn action_space(&self) -> usize;
    fn reset(&mut self) -> Result<Self::Obs>;
    fn step(&mut self, action: u32) -> Result<Step<Self::Obs>>;
}
