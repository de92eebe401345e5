//! The training loop.
//!
//! Training is online stochastic gradient descent: one in-place update per
//! example, in dataset order, one full pass per epoch. After every epoch the
//! train and test MSE losses are recorded and logged; the full loss curves
//! are returned so a plotting collaborator can render them.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::{Dataset, Error, MultiLayerPerceptron, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Per-epoch learning-rate policy.
pub enum LrSchedule {
    /// The base learning rate for every epoch.
    Constant,
    /// `base * decay^epoch` with `decay` in `(0, 1]`.
    ExponentialDecay { decay: f64 },
}

impl LrSchedule {
    /// Validate schedule parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            LrSchedule::Constant => Ok(()),
            LrSchedule::ExponentialDecay { decay } => {
                if !(decay.is_finite() && decay > 0.0 && decay <= 1.0) {
                    return Err(Error::InvalidConfig(format!(
                        "decay must be finite and in (0, 1], got {decay}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Effective learning rate for a 0-based epoch index.
    #[inline]
    pub fn lr_at(self, base: f64, epoch: usize) -> f64 {
        match self {
            LrSchedule::Constant => base,
            LrSchedule::ExponentialDecay { decay } => base * decay.powi(epoch as i32),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub schedule: LrSchedule,
    /// When set, a plain-text run summary is written here after training.
    pub summary_path: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.1,
            schedule: LrSchedule::Constant,
            summary_path: None,
        }
    }
}

/// Per-epoch loss curves from one training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub train_losses: Vec<f64>,
    pub test_losses: Vec<f64>,
}

impl MultiLayerPerceptron {
    /// Train on `training_data`, tracking generalization on `testing_data`.
    ///
    /// Each epoch applies one [`backward_propagate`](Self::backward_propagate)
    /// per training example in dataset order, then records both MSE losses.
    /// Example order matters: updates are applied immediately, so reordering
    /// the data changes the trajectory.
    pub fn train(
        &mut self,
        training_data: &Dataset,
        testing_data: &Dataset,
        cfg: &TrainConfig,
    ) -> Result<TrainReport> {
        if cfg.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if !(cfg.learning_rate.is_finite() && cfg.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                cfg.learning_rate
            )));
        }
        cfg.schedule.validate()?;
        self.validate_dataset(training_data, "training")?;
        self.validate_dataset(testing_data, "testing")?;

        let started = Instant::now();
        let started_at = unix_seconds();

        let mut train_losses = Vec::with_capacity(cfg.epochs);
        let mut test_losses = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            let lr = cfg.schedule.lr_at(cfg.learning_rate, epoch);
            for (input, expected) in training_data.iter() {
                self.backward_propagate(input, expected, lr)?;
            }

            let train_loss = self.mse_loss(training_data)?;
            let test_loss = self.mse_loss(testing_data)?;
            info!(
                "epoch {}/{} | lr {:.6} | train loss {:.6} | test loss {:.6}",
                epoch + 1,
                cfg.epochs,
                lr,
                train_loss,
                test_loss
            );
            train_losses.push(train_loss);
            test_losses.push(test_loss);
        }

        let report = TrainReport {
            train_losses,
            test_losses,
        };

        if let Some(path) = &cfg.summary_path {
            let summary = render_summary(
                cfg,
                training_data,
                testing_data,
                &report,
                started_at,
                started.elapsed().as_secs_f64(),
            );
            debug!("writing run summary to {}", path.display());
            std::fs::write(path, summary).map_err(|e| {
                Error::InvalidData(format!("failed to write {}: {e}", path.display()))
            })?;
        }

        Ok(report)
    }

    fn validate_dataset(&self, data: &Dataset, label: &str) -> Result<()> {
        if data.input_dim() != self.input_dim() {
            return Err(Error::InvalidData(format!(
                "{label} input_dim {} does not match model input_dim {}",
                data.input_dim(),
                self.input_dim()
            )));
        }
        if data.target_dim() != self.output_dim() {
            return Err(Error::InvalidData(format!(
                "{label} target_dim {} does not match model output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }
        Ok(())
    }
}

fn render_summary(
    cfg: &TrainConfig,
    training_data: &Dataset,
    testing_data: &Dataset,
    report: &TrainReport,
    started_at: u64,
    elapsed_secs: f64,
) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "training run summary");
    let _ = writeln!(s, "epochs: {}", cfg.epochs);
    let _ = writeln!(s, "learning rate: {}", cfg.learning_rate);
    let _ = writeln!(s, "schedule: {:?}", cfg.schedule);
    let _ = writeln!(
        s,
        "examples: {} total ({} train / {} test)",
        training_data.len() + testing_data.len(),
        training_data.len(),
        testing_data.len()
    );
    let _ = writeln!(s, "started at (unix): {started_at}");
    let _ = writeln!(s, "finished at (unix): {}", unix_seconds());
    let _ = writeln!(s, "elapsed: {elapsed_secs:.3}s");
    if let (Some(train), Some(test)) = (report.train_losses.last(), report.test_losses.last()) {
        let _ = writeln!(s, "final train loss: {train:.6}");
        let _ = writeln!(s, "final test loss: {test:.6}");
    }
    s
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
