use std::path::PathBuf;

use derive_setters::Setters;
use rand::Rng;
use tch::Device;

use crate::{Error, Result};

/// Compute target, as named on the command line or already resolved to a
/// torch device handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    Name(String),
    Resolved(Device),
}

/// Level subset: a requested count, or the seeds already drawn for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subset {
    Count(usize),
    Seeds(Vec<u32>),
}

/// Experiment options. Built once at startup, then passed through
/// [`augment_options`] before anything else consumes it.
#[must_use]
#[derive(Debug, Clone)]
pub struct Opt {
    pub game: String,
    pub hist_len: usize,
    pub device: DeviceSpec,
    pub subset: Option<Subset>,
    pub experiment: Option<String>,
    pub out_dir: PathBuf,
}

impl Opt {
    pub fn builder() -> Builder {
        Builder {
            game: None,
            hist_len: None,
            device: None,
            subset: None,
            experiment: None,
            out_dir: None,
        }
    }

    /// The resolved device handle. Options must have gone through
    /// [`augment_options`] first.
    #[must_use]
    pub fn device(&self) -> Device {
        match &self.device {
            DeviceSpec::Resolved(device) => *device,
            DeviceSpec::Name(name) => {
                panic!("device {name:?} not resolved; run augment_options first")
            }
        }
    }

    #[must_use]
    pub fn to_map(&self) -> OptMap {
        let mut fields = vec![
            ("game".to_owned(), OptValue::Str(self.game.clone())),
            ("hist_len".to_owned(), OptValue::UInt(self.hist_len as u64)),
            (
                "device".to_owned(),
                OptValue::Str(match &self.device {
                    DeviceSpec::Name(name) => name.clone(),
                    DeviceSpec::Resolved(device) => format!("{device:?}"),
                }),
            ),
        ];

        match &self.subset {
            Some(Subset::Count(n)) => fields.push(("subset".to_owned(), OptValue::UInt(*n as u64))),
            Some(Subset::Seeds(seeds)) => {
                fields.push(("subset".to_owned(), OptValue::List(seeds.clone())));
            }
            None => {}
        }

        if let Some(experiment) = &self.experiment {
            fields.push(("experiment".to_owned(), OptValue::Str(experiment.clone())));
        }

        fields.push((
            "out_dir".to_owned(),
            OptValue::Str(self.out_dir.display().to_string()),
        ));

        OptMap(fields)
    }
}

#[must_use]
#[derive(Setters, Debug)]
#[setters(strip_option)]
pub struct Builder {
    game: Option<String>,
    hist_len: Option<usize>,
    device: Option<String>,
    subset: Option<usize>,
    experiment: Option<String>,
    out_dir: Option<PathBuf>,
}

impl Builder {
    pub fn build(self) -> Opt {
        Opt {
            game: self.game.unwrap(),
            hist_len: self.hist_len.unwrap(),
            device: DeviceSpec::Name(self.device.unwrap()),
            subset: self.subset.map(Subset::Count),
            experiment: self.experiment,
            out_dir: self.out_dir.unwrap(),
        }
    }
}

fn parse_device(name: &str) -> Result<Device> {
    match name {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Ok(Device::Cuda(0)),
        "mps" => Ok(Device::Mps),
        _ => name
            .strip_prefix("cuda:")
            .and_then(|index| index.parse().ok())
            .map(Device::Cuda)
            .ok_or_else(|| Error::InvalidDevice(name.to_owned())),
    }
}

/// Fills in the derived option fields:
///
/// - `experiment`, when unset, from the game id: split on `-`, drop the
///   first and last tokens, join the middle with no separator, append
///   `-DQN` ("MiniGrid-Empty-5x5-v0" becomes "Empty5x5-DQN");
/// - a `Subset::Count(n)` becomes `n` seeds drawn uniformly from
///   `[0, 10000]`, with replacement;
/// - the device name becomes a torch device handle, or
///   [`Error::InvalidDevice`].
///
/// Not idempotent for the subset: augmenting a fresh `Count` again draws a
/// different set of seeds.
pub fn augment_options(mut opt: Opt) -> Result<Opt> {
    if opt.experiment.is_none() {
        let tokens = opt.game.split('-').collect::<Vec<_>>();
        let middle = if tokens.len() > 2 {
            tokens[1..tokens.len() - 1].concat()
        } else {
            String::new()
        };
        opt.experiment = Some(format!("{middle}-DQN"));
    }

    if let Some(Subset::Count(n)) = opt.subset {
        let mut rng = rand::thread_rng();
        let seeds = (0..n).map(|_| rng.gen_range(0..=10_000)).collect();
        opt.subset = Some(Subset::Seeds(seeds));
    }

    if let DeviceSpec::Name(name) = &opt.device {
        let device = parse_device(name)?;
        opt.device = DeviceSpec::Resolved(device);
    }

    Ok(opt)
}

/// Ordered key/value view of an options object, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct OptMap(pub Vec<(String, OptValue)>);

#[derive(Debug, Clone, PartialEq)]
pub enum OptValue {
    Str(String),
    UInt(u64),
    Float(f64),
    List(Vec<u32>),
    Nested(OptMap),
}

const KEY_COLOR: &str = "\x1b[1;33m";
const VALUE_COLOR: &str = "\x1b[37m";
const RESET: &str = "\x1b[0m";

/// Renders an options map as an indented multi-line string, one
/// `key: value` per line, recursing into nested maps with the indent
/// increased by two. Pure; `color` only toggles ANSI escapes.
#[must_use]
pub fn config_to_string(cfg: &OptMap, indent: usize, color: bool) -> String {
    let mut text = String::new();
    for (key, value) in &cfg.0 {
        text.push_str(&" ".repeat(indent));
        if color {
            text.push_str(&format!("{KEY_COLOR}{key}{RESET}: "));
        } else {
            text.push_str(&format!("{key}: "));
        }

        match value {
            OptValue::Nested(nested) => {
                text.push('\n');
                text.push_str(&config_to_string(nested, indent + 2, color));
            }
            leaf => {
                let rendered = match leaf {
                    OptValue::Str(s) => s.clone(),
                    OptValue::UInt(u) => u.to_string(),
                    OptValue::Float(x) => x.to_string(),
                    OptValue::List(xs) => format!("{xs:?}"),
                    OptValue::Nested(_) => unreachable!(),
                };
                if color {
                    text.push_str(&format!("{VALUE_COLOR}{rendered}{RESET}"));
                } else {
                    text.push_str(&rendered);
                }
                text.push('\n');
            }
        }
    }
    text
}
