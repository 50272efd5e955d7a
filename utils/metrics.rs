//! Experiment metrics: named aggregators grouped per phase, owned by an
//! explicitly constructed registry with an init/write/close lifecycle.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use typed_builder::TypedBuilder;

use crate::options::Opt;
use crate::Result;

/// One traced step: a borrowed set of named measurements. Each metric picks
/// out the keys it consumes and ignores the rest.
pub struct Event<'a> {
    fields: &'a [(&'a str, f64)],
}

impl<'a> Event<'a> {
    #[must_use]
    pub fn new(fields: &'a [(&'a str, f64)]) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }
}

pub trait Metric {
    fn name(&self) -> &str;
    fn feed(&mut self, event: &Event);
    fn value(&self) -> f64;
    fn reset(&mut self);

    fn resetable(&self) -> bool {
        true
    }
}

/// Ratio of two accumulated measurements, e.g. reward per finished episode.
#[derive(TypedBuilder, Debug)]
pub struct AvgMetric {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    value_key: String,
    #[builder(setter(into))]
    count_key: String,
    #[builder(default, setter(skip))]
    sum: f64,
    #[builder(default, setter(skip))]
    count: f64,
}

impl Metric for AvgMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn feed(&mut self, event: &Event) {
        if let Some(value) = event.get(&self.value_key) {
            self.sum += value;
        }
        if let Some(count) = event.get(&self.count_key) {
            self.count += count;
        }
    }

    fn value(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.sum / self.count
        }
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0.0;
    }
}

/// Running sum; a non-resetable one survives group resets (episode
/// counters and the like).
#[derive(TypedBuilder, Debug)]
pub struct SumMetric {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    key: String,
    #[builder(default = true)]
    resetable: bool,
    #[builder(default, setter(skip))]
    total: f64,
}

impl Metric for SumMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn feed(&mut self, event: &Event) {
        if let Some(value) = event.get(&self.key) {
            self.total += value;
        }
    }

    fn value(&self) -> f64 {
        self.total
    }

    fn reset(&mut self) {
        self.total = 0.0;
    }

    fn resetable(&self) -> bool {
        self.resetable
    }
}

/// Accumulated count divided by wall time since creation or last reset.
#[derive(TypedBuilder, Debug)]
pub struct FpsMetric {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    key: String,
    #[builder(default = Instant::now(), setter(skip))]
    started: Instant,
    #[builder(default, setter(skip))]
    frames: f64,
}

impl Metric for FpsMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn feed(&mut self, event: &Event) {
        if let Some(frames) = event.get(&self.key) {
            self.frames += frames;
        }
    }

    fn value(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if self.frames == 0.0 || elapsed <= 0.0 {
            0.0
        } else {
            self.frames / elapsed
        }
    }

    fn reset(&mut self) {
        self.frames = 0.0;
        self.started = Instant::now();
    }
}

/// Running maximum of a measurement.
#[derive(TypedBuilder, Debug)]
pub struct MaxMetric {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    key: String,
    #[builder(default, setter(skip))]
    max: Option<f64>,
}

impl Metric for MaxMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn feed(&mut self, event: &Event) {
        if let Some(value) = event.get(&self.key) {
            self.max = Some(self.max.map_or(value, |max| max.max(value)));
        }
    }

    fn value(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    fn reset(&mut self) {
        self.max = None;
    }
}

/// A named collection of metrics fed from the same event stream.
#[must_use]
pub struct Group {
    name: String,
    metrics: Vec<Box<dyn Metric>>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            metrics: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers metrics with this group. Metric names must be unique
    /// within the group.
    pub fn add_metrics(&mut self, metrics: Vec<Box<dyn Metric>>) {
        for metric in metrics {
            assert!(
                self.metrics.iter().all(|m| m.name() != metric.name()),
                "duplicate metric {:?} in group {:?}",
                metric.name(),
                self.name,
            );
            self.metrics.push(metric);
        }
    }

    pub fn trace(&mut self, fields: &[(&str, f64)]) {
        let event = Event::new(fields);
        for metric in &mut self.metrics {
            metric.feed(&event);
        }
    }

    #[must_use]
    pub fn summary(&self) -> Vec<(String, f64)> {
        self.metrics
            .iter()
            .map(|m| (m.name().to_owned(), m.value()))
            .collect()
    }

    #[must_use]
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn reset(&mut self) {
        for metric in &mut self.metrics {
            if metric.resetable() {
                metric.reset();
            }
        }
    }
}

/// Metrics for one experiment run. Summaries are appended to
/// `<out_dir>/<experiment>.jsonl`, one JSON object per line.
#[must_use]
pub struct MetricsRegistry {
    experiment: String,
    out_dir: PathBuf,
    writer: BufWriter<File>,
    groups: Vec<Group>,
}

impl MetricsRegistry {
    /// Creates the output directory and opens the summary sink. The only
    /// blocking I/O in this module outside of summary writes.
    pub fn init(experiment: &str, out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("{experiment}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        tracing::info!(experiment, out_dir = %out_dir.display(), "metrics registry ready");

        Ok(Self {
            experiment: experiment.to_owned(),
            out_dir: out_dir.to_owned(),
            writer: BufWriter::new(file),
            groups: Vec::new(),
        })
    }

    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// The named group, created empty on first use.
    pub fn group(&mut self, name: &str) -> &mut Group {
        if let Some(index) = self.groups.iter().position(|g| g.name == name) {
            &mut self.groups[index]
        } else {
            self.groups.push(Group::new(name));
            self.groups.last_mut().unwrap()
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Appends one summary line for the named group. The payload is small
    /// and encoded by hand.
    pub fn write_summary(&mut self, group: &str, step: u64) -> Result<()> {
        let group = self.get(group).expect("unknown metric group");

        let mut line = format!(
            "{{\"experiment\":\"{}\",\"group\":\"{}\",\"step\":{}",
            self.experiment,
            group.name(),
            step,
        );
        for (name, value) in group.summary() {
            line.push_str(&format!(",\"{name}\":{value}"));
        }
        line.push('}');

        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    /// Flushes the sink and ends the registry's lifecycle.
    pub fn close(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Sets up the registry for an augmented options object, with the standard
/// train and test groups.
pub fn configure_logger(opt: &Opt) -> Result<MetricsRegistry> {
    let experiment = opt
        .experiment
        .as_deref()
        .expect("experiment unset; run augment_options first");
    let mut registry = MetricsRegistry::init(experiment, &opt.out_dir)?;

    let train = registry.group("train");
    train.add_metrics(vec![
        Box::new(
            AvgMetric::builder()
                .name("R/ep")
                .value_key("reward")
                .count_key("done")
                .build(),
        ),
        Box::new(
            SumMetric::builder()
                .name("ep_cnt")
                .key("done")
                .resetable(false)
                .build(),
        ),
        Box::new(
            AvgMetric::builder()
                .name("steps/ep")
                .value_key("step_no")
                .count_key("done")
                .build(),
        ),
        Box::new(
            FpsMetric::builder()
                .name("learning_fps")
                .key("frame_no")
                .build(),
        ),
    ]);

    let test = registry.group("test");
    test.add_metrics(vec![
        Box::new(
            AvgMetric::builder()
                .name("R/ep")
                .value_key("reward")
                .count_key("done")
                .build(),
        ),
        Box::new(
            SumMetric::builder()
                .name("ep_cnt")
                .key("done")
                .resetable(false)
                .build(),
        ),
        Box::new(
            AvgMetric::builder()
                .name("steps/ep")
                .value_key("frame_no")
                .count_key("done")
                .build(),
        ),
        Box::new(FpsMetric::builder().name("test_fps").key("frame_no").build()),
        Box::new(MaxMetric::builder().name("max_q").key("qval").build()),
    ]);

    Ok(registry)
}
