use pyo3::types::PyTuple;
use pyo3::{PyAny, PyObject, PyResult, Python};

use super::{Env, Frame, ObsBundle, Step};
use crate::Result;

fn parse_py_bundle(obs: &PyAny) -> PyResult<ObsBundle> {
    let image = obs.get_item("image")?;
    let shape: Vec<usize> = image.getattr("shape")?.extract()?;
    let data: Vec<u8> = image.call_method0("flatten")?.extract()?;

    let direction: u8 = obs.get_item("direction")?.extract()?;
    let mission: String = obs.get_item("mission")?.extract()?;

    Ok(ObsBundle {
        image: Frame::new(data, shape[0], shape[1], shape[2]),
        direction,
        mission,
    })
}

/// Bridge to a Python MiniGrid environment. Observations come back as the
/// gym dict `{image, direction, mission}` and are repacked into [`ObsBundle`].
#[derive(Debug)]
pub struct Wrapper {
    env: PyObject,
    action_space: usize,
    image_shape: Vec<usize>,
}

impl Wrapper {
    pub fn new(name: &str) -> Result<Self> {
        Python::with_gil(|py| {
            let gym = py.import("gym")?;
            // Importing gym_minigrid registers the MiniGrid-* ids with gym.
            py.import("gym_minigrid")?;

            let env = gym.call_method("make", (name,), None)?;

            let action_space = env.getattr("action_space")?;
            let action_space = action_space.getattr("n")?.extract()?;

            let spaces = env.getattr("observation_space")?.getattr("spaces")?;
            let image_shape: Vec<usize> = spaces.get_item("image")?.getattr("shape")?.extract()?;

            Ok(Self {
                env: env.into(),
                action_space,
                image_shape,
            })
        })
    }
}

impl Env for Wrapper {
    type Obs = ObsBundle;

    fn observation_space(&self) -> Vec<usize> {
        self.image_shape.clone()
    }

    fn action_space(&self) -> usize {
        self.action_space
    }

    fn reset(&mut self) -> Result<ObsBundle> {
        Python::with_gil(|py| {
            let obs = self.env.call_method(py, "reset", (), None)?;
            Ok(parse_py_bundle(obs.as_ref(py))?)
        })
    }

    fn step(&mut self, action: u32) -> Result<Step<ObsBundle>> {
        Python::with_gil(|py| {
            let step = self.env.call_method(py, "step", (action,), None)?;
            let step: &PyTuple = step.extract(py)?;

            let obs = parse_py_bundle(step.get_item(0)?)?;
            let reward = step.get_item(1)?.extract()?;
            let done = step.get_item(2)?.extract()?;

            Ok(Step { obs, reward, done })
        })
    }
}
