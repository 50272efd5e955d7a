use utils::env::{Env, Frame, ObsBundle, Step};
use utils::Result;

/// Deterministic 7x7 symbolic environment: cell `(h, w, c)` at time `t`
/// holds `(h + w + c + t) % 10`, so every frame stays in the symbolic
/// value range and changes on each step.
pub struct GridStub {
    t: u32,
    horizon: u32,
    steps: u32,
}

impl GridStub {
    pub fn new(horizon: u32) -> Self {
        Self {
            t: 0,
            horizon,
            steps: 0,
        }
    }

    fn frame(&self) -> Frame {
        let mut data = Vec::with_capacity(7 * 7 * 3);
        for h in 0..7_usize {
            for w in 0..7_usize {
                for c in 0..3_usize {
                    data.push(((h + w + c + self.t as usize) % 10) as u8);
                }
            }
        }
        Frame::new(data, 7, 7, 3)
    }

    fn bundle(&self) -> ObsBundle {
        ObsBundle {
            image: self.frame(),
            direction: (self.t % 4) as u8,
            mission: "get to the green goal square".to_owned(),
        }
    }
}

impl Env for GridStub {
    type Obs = ObsBundle;

    fn observation_space(&self) -> Vec<usize> {
        vec![7, 7, 3]
    }

    fn action_space(&self) -> usize {
        7
    }

    fn reset(&mut self) -> Result<ObsBundle> {
        self.t = 0;
        self.steps = 0;
        Ok(self.bundle())
    }

    fn step(&mut self, _action: u32) -> Result<Step<ObsBundle>> {
        self.t += 1;
        self.steps += 1;
        Ok(Step {
            obs: self.bundle(),
            reward: 0.5,
            done: self.steps >= self.horizon,
        })
    }
}
