//! Descriptive statistics over a fetched price series.

use crate::history::PriceSeries;

/// Summary of one numeric column: count, mean, sample standard deviation,
/// minimum, quartiles and maximum. `std` is absent with fewer than two
/// observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Computes the summary for a column. Returns `None` for an empty
    /// column.
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;

        let std = if count > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (count as f64 - 1.0);
            Some(variance.sqrt())
        } else {
            None
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(ColumnStats {
            count,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linear-interpolated quantile over an ascending-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Per-column summaries for one series, in the column order of the source
/// data (open, high, low, close, volume).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub open: ColumnStats,
    pub high: ColumnStats,
    pub low: ColumnStats,
    pub close: ColumnStats,
    pub volume: ColumnStats,
}

impl SeriesStats {
    /// Summarizes a series. Returns `None` when the series has no bars.
    pub fn describe(series: &PriceSeries) -> Option<Self> {
        let column = |extract: fn(&crate::history::Bar) -> f64| {
            let values: Vec<f64> = series.bars.iter().map(extract).collect();
            ColumnStats::describe(&values)
        };

        Some(SeriesStats {
            open: column(|b| b.open)?,
            high: column(|b| b.high)?,
            low: column(|b| b.low)?,
            close: column(|b| b.close)?,
            volume: column(|b| b.volume as f64)?,
        })
    }
}
