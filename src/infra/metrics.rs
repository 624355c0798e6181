// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two jobs:
//
//   MetricsLogger        → appends one row per training epoch
//                          to checkpoints/metrics.csv
//                            epoch,train_loss,batches
//                            1,1.843211,625
//
//   ClassificationReport → per-class precision / recall / F1 /
//   ConfusionMatrix        support, accuracy, macro and weighted
//                          averages, printed with 4 digits
//
// Classes in the report are the sorted union of the ids seen
// in the true and the predicted labels. A ratio with a zero
// denominator is reported as 0.
//
// Reference: Rust Book §12 (I/O and File Handling)
//            scikit-learn classification_report layout

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::label_map::LabelMap;

// ─── Epoch log ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean cross-entropy over the epoch's batches
    pub train_loss: f64,

    pub batches: usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, batches: usize) -> Self {
        Self { epoch, train_loss, batches }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file does not exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,batches")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{:.6},{}", m.epoch, m.train_loss, m.batches)?;
        tracing::debug!("Logged epoch {} metrics: train_loss={:.4}", m.epoch, m.train_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Classification report ────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class:     usize,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Averages {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub classes:  Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total:    usize,
    pub macro_avg:    Averages,
    pub weighted_avg: Averages,
    names: Vec<String>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1(p: f64, r: f64) -> f64 {
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

fn class_union(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    y_true.iter().chain(y_pred).copied().collect::<BTreeSet<_>>().into_iter().collect()
}

impl ClassificationReport {
    /// `y_true` and `y_pred` are paired by position.
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Self {
        let total   = y_true.len().min(y_pred.len());
        let pairs   = || y_true.iter().zip(y_pred);
        let correct = pairs().filter(|(t, p)| t == p).count();

        let classes: Vec<ClassMetrics> = class_union(y_true, y_pred)
            .into_iter()
            .map(|c| {
                let tp        = pairs().filter(|&(&t, &p)| t == c && p == c).count();
                let predicted = pairs().filter(|&(_, &p)| p == c).count();
                let support   = pairs().filter(|&(&t, _)| t == c).count();
                let precision = ratio(tp, predicted);
                let recall    = ratio(tp, support);
                ClassMetrics { class: c, precision, recall, f1: f1(precision, recall), support }
            })
            .collect();

        let n = classes.len().max(1) as f64;
        let macro_avg = Averages {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall:    classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1:        classes.iter().map(|c| c.f1).sum::<f64>() / n,
        };

        let weight = |get: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| get(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = Averages {
            precision: weight(|c| c.precision),
            recall:    weight(|c| c.recall),
            f1:        weight(|c| c.f1),
        };

        let names = classes.iter().map(|c| c.class.to_string()).collect();
        Self { classes, accuracy: ratio(correct, total), total, macro_avg, weighted_avg, names }
    }

    /// Print `id (label)` instead of the bare class id.
    pub fn with_label_names(mut self, map: &LabelMap) -> Self {
        self.names = self
            .classes
            .iter()
            .map(|c| match map.name(c.class) {
                Some(name) => format!("{} ({name})", c.class),
                None       => c.class.to_string(),
            })
            .collect();
        self
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.names.iter().map(String::len).max().unwrap_or(0).max("weighted avg".len());

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for (c, name) in self.classes.iter().zip(&self.names) {
            writeln!(
                f, "{:>width$} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$} {:>9} {:>9} {:>9.4} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f, "{:>width$} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                label, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

// ─── Confusion matrix ─────────────────────────────────────────────────────────
/// `counts[i][j]` = rows of class `classes[i]` predicted as `classes[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub classes: Vec<usize>,
    pub counts:  Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Self {
        let classes = class_union(y_true, y_pred);
        let pos     = |c: usize| classes.binary_search(&c).unwrap_or(0);

        let mut counts = vec![vec![0usize; classes.len()]; classes.len()];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[pos(t)][pos(p)] += 1;
        }
        Self { classes, counts }
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Bracketed rows with right-aligned columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self
            .counts
            .iter()
            .flatten()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);

        write!(f, "[")?;
        for (i, row) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>w$}")).collect();
            write!(f, "[{}]", cells.join(" "))?;
        }
        write!(f, "]")
    }
}
