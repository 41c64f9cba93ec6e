//! Equally-spaced time series, calendar frequencies and seasonal categories.

use crate::error::{DecompositionError, Result};
use crate::gaps::fill_gaps;
use crate::imputation::{impute, FillMethod};
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Sampling frequency of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Self::Daily),
            "w" | "week" | "weekly" => Ok(Self::Weekly),
            "m" | "ms" | "month" | "monthly" => Ok(Self::Monthly),
            "q" | "qs" | "quarter" | "quarterly" => Ok(Self::Quarterly),
            "y" | "a" | "ys" | "as" | "year" | "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(DecompositionError::invalid_parameter(
                "frequency",
                s,
                "expected one of daily, weekly, monthly, quarterly, yearly",
            )),
        }
    }
}

impl Frequency {
    /// Number of calendar months in one step, for month-based frequencies.
    fn months_per_step(self) -> Option<u32> {
        match self {
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::Yearly => Some(12),
            Frequency::Daily | Frequency::Weekly => None,
        }
    }

    /// The grid point `steps` periods away from `origin`.
    ///
    /// Month-based steps are always taken from `origin` so that month-end
    /// anchors clamp the same way for every point of the grid.
    pub fn advance(self, origin: NaiveDate, steps: i64) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => origin.checked_add_signed(Duration::try_days(steps)?),
            Frequency::Weekly => {
                origin.checked_add_signed(Duration::try_days(steps.checked_mul(7)?)?)
            }
            _ => {
                let per_step = i64::from(self.months_per_step()?);
                let months = u32::try_from(steps.checked_mul(per_step)?.unsigned_abs()).ok()?;
                if steps >= 0 {
                    origin.checked_add_months(Months::new(months))
                } else {
                    origin.checked_sub_months(Months::new(months))
                }
            }
        }
    }

    /// Number of periods from `origin` to `date`, or `None` when `date` is
    /// not on the grid anchored at `origin`.
    pub fn periods_between(self, origin: NaiveDate, date: NaiveDate) -> Option<i64> {
        let steps = match self {
            Frequency::Daily => (date - origin).num_days(),
            Frequency::Weekly => {
                let days = (date - origin).num_days();
                if days % 7 != 0 {
                    return None;
                }
                days / 7
            }
            _ => {
                let per_step = i64::from(self.months_per_step()?);
                let months = month_ordinal(date) - month_ordinal(origin);
                if months % per_step != 0 {
                    return None;
                }
                months / per_step
            }
        };

        (self.advance(origin, steps)? == date).then_some(steps)
    }

    /// Nominal spacing in days, used when inferring a frequency from dates.
    pub(crate) fn nominal_days(self) -> std::ops::RangeInclusive<i64> {
        match self {
            Frequency::Daily => 1..=1,
            Frequency::Weekly => 7..=7,
            Frequency::Monthly => 28..=31,
            Frequency::Quarterly => 89..=92,
            Frequency::Yearly => 365..=366,
        }
    }
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Calendar granularity of the seasonal regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeasonalGranularity {
    /// Calendar quarter (Q1..Q4)
    #[default]
    Quarter,
    /// Calendar month (Jan..Dec)
    Month,
}

impl FromStr for SeasonalGranularity {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "q" | "quarter" | "quarterly" => Ok(Self::Quarter),
            "m" | "month" | "monthly" => Ok(Self::Month),
            _ => Err(DecompositionError::invalid_parameter(
                "granularity",
                s,
                "expected 'quarter' or 'month'",
            )),
        }
    }
}

impl SeasonalGranularity {
    /// Number of categories in one full seasonal cycle.
    pub fn cycle_length(self) -> usize {
        match self {
            SeasonalGranularity::Quarter => 4,
            SeasonalGranularity::Month => 12,
        }
    }

    /// Seasonal category a date falls into.
    pub fn category_of(self, date: NaiveDate) -> SeasonalCategory {
        let label = match self {
            SeasonalGranularity::Quarter => date.month0() / 3 + 1,
            SeasonalGranularity::Month => date.month(),
        };
        SeasonalCategory {
            granularity: self,
            label,
        }
    }
}

/// A seasonal category label such as `Q2` or `Mar`.
///
/// Categories order by granularity and then by calendar position, so the
/// smallest observed category is the first of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonalCategory {
    granularity: SeasonalGranularity,
    label: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl SeasonalCategory {
    /// Create a category from its 1-based label (quarter 1..=4 or month 1..=12).
    pub fn new(granularity: SeasonalGranularity, label: u32) -> Result<Self> {
        if label == 0 || label as usize > granularity.cycle_length() {
            return Err(DecompositionError::invalid_parameter(
                "label",
                label,
                format!("must be between 1 and {}", granularity.cycle_length()),
            ));
        }
        Ok(Self { granularity, label })
    }

    pub fn quarter(label: u32) -> Result<Self> {
        Self::new(SeasonalGranularity::Quarter, label)
    }

    pub fn month(label: u32) -> Result<Self> {
        Self::new(SeasonalGranularity::Month, label)
    }

    pub fn granularity(&self) -> SeasonalGranularity {
        self.granularity
    }

    pub fn label(&self) -> u32 {
        self.label
    }
}

impl fmt::Display for SeasonalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            SeasonalGranularity::Quarter => write!(f, "Q{}", self.label),
            SeasonalGranularity::Month => {
                let name = self
                    .label
                    .checked_sub(1)
                    .and_then(|i| MONTH_NAMES.get(i as usize))
                    .copied()
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

/// A single (timestamp, value) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// An ordered, gap-free series of observations at a fixed frequency.
///
/// Construction validates the grid; a `TimeSeries` value is therefore always
/// non-empty, strictly increasing and exactly one period apart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeSeries {
    observations: Vec<Observation>,
    frequency: Frequency,
}

impl TimeSeries {
    /// Build a series from observations sorted ascending.
    ///
    /// # Errors
    /// * `InsufficientData` if `observations` is empty
    /// * `InvalidInput` if a value is not finite
    /// * `IrregularSeries` on duplicates, out-of-order timestamps or gaps
    pub fn new(observations: Vec<Observation>, frequency: Frequency) -> Result<Self> {
        let Some(first) = observations.first() else {
            return Err(DecompositionError::InsufficientData { needed: 1, got: 0 });
        };
        let origin = first.timestamp;

        for (i, obs) in observations.iter().enumerate() {
            if !obs.value.is_finite() {
                return Err(DecompositionError::InvalidInput(format!(
                    "non-finite value {} at {}",
                    obs.value, obs.timestamp
                )));
            }
            if i == 0 {
                continue;
            }

            let prev = observations[i - 1].timestamp;
            if obs.timestamp == prev {
                return Err(DecompositionError::irregular(
                    i,
                    format!("duplicate timestamp {}", obs.timestamp),
                ));
            }
            if obs.timestamp < prev {
                return Err(DecompositionError::irregular(
                    i,
                    format!("timestamp {} precedes {}", obs.timestamp, prev),
                ));
            }

            let expected = frequency.advance(origin, i as i64);
            if expected != Some(obs.timestamp) {
                let expected = expected
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "out of calendar range".to_string());
                return Err(DecompositionError::irregular(
                    i,
                    format!(
                        "expected {:?} step to {}, found {}",
                        frequency, expected, obs.timestamp
                    ),
                ));
            }
        }

        Ok(Self {
            observations,
            frequency,
        })
    }

    /// Build a series from parallel date and value slices.
    pub fn from_parts(dates: &[NaiveDate], values: &[f64], frequency: Frequency) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(DecompositionError::InvalidInput(format!(
                "Dates and values must have the same length: {} vs {}",
                dates.len(),
                values.len()
            )));
        }

        let observations = dates
            .iter()
            .zip(values.iter())
            .map(|(&d, &v)| Observation::new(d, v))
            .collect();
        Self::new(observations, frequency)
    }

    /// Build a series from raw rows that may have missing periods or values.
    ///
    /// Missing grid points are inserted and every gap is imputed with
    /// `method` before validation.
    pub fn regularize(
        dates: &[NaiveDate],
        values: &[Option<f64>],
        frequency: Frequency,
        method: FillMethod,
    ) -> Result<Self> {
        let (filled_dates, filled_values) = fill_gaps(dates, values, frequency)?;
        let imputed = impute(&filled_values, method)?;
        Self::from_parts(&filled_dates, &imputed, frequency)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    pub fn start(&self) -> NaiveDate {
        self.observations[0].timestamp
    }

    pub fn end(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].timestamp
    }

    /// Elapsed period count since the series start (0-based).
    pub fn period_index(&self) -> Vec<usize> {
        (0..self.observations.len()).collect()
    }

    /// Seasonal category of every observation.
    pub fn categories(&self, granularity: SeasonalGranularity) -> Vec<SeasonalCategory> {
        self.observations
            .iter()
            .map(|o| granularity.category_of(o.timestamp))
            .collect()
    }
}
