//! Balance timeline resolution.
//!
//! A timeline is the balance series of one account, resolved from either
//! its balance snapshots or the running total of its operations, and
//! queried at arbitrary days:
//!
//! - before the first known day the balance is 0;
//! - with more than three known days, days inside the known range use a
//!   monotone cubic interpolant;
//! - otherwise the balance is linearly interpolated, and held at the last
//!   known value after the end of the series.

mod pchip;

use chrono::{Datelike, NaiveDate};

use crate::ledger::{AccountEntry, AccountTypes, Series};
use crate::models::value::{Metadata, Value};
use pchip::Pchip;

/// Minimum number of known days above which the cubic interpolant is used.
const CUBIC_MIN_POINTS: usize = 4;

/// Resolved balance series of one account.
#[derive(Debug, Clone)]
pub struct BalanceTimeline {
    series: Series,
    x: Vec<f64>,
    y: Vec<f64>,
    cubic: Option<Pchip>,
}

impl BalanceTimeline {
    pub fn from_series(series: Series) -> Self {
        let x: Vec<f64> = series.keys().map(|d| day_number(*d)).collect();
        let y: Vec<f64> = series.values().copied().collect();
        let cubic = if x.len() >= CUBIC_MIN_POINTS {
            Pchip::new(x.clone(), y.clone())
        } else {
            None
        };
        Self { series, x, y, cubic }
    }

    /// Timeline of `entry` using its effective `properties`
    /// (`share`, `input`).
    pub fn for_account(entry: &AccountEntry, properties: &Metadata) -> Self {
        Self::from_series(materialize(entry, properties))
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.series.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Interpolated balance on `day`.
    pub fn at(&self, day: NaiveDate) -> f64 {
        let (Some(&first), Some(&last)) = (self.x.first(), self.x.last()) else {
            return 0.0;
        };
        let at = day_number(day);
        if let Some(cubic) = &self.cubic {
            if at >= first && at <= last {
                return cubic.evaluate(at);
            }
        }
        self.linear(at)
    }

    /// Balance on `day` relative to the balance on January 1st of the
    /// same year.
    pub fn yearly_at(&self, day: NaiveDate) -> f64 {
        self.at(day) - self.at(first_day_of_year(day))
    }

    /// Last known value on or before `day`, 0 before the series starts.
    pub fn exact_at(&self, day: NaiveDate) -> f64 {
        self.series
            .range(..=day)
            .next_back()
            .map_or(0.0, |(_, value)| *value)
    }

    fn linear(&self, at: f64) -> f64 {
        let n = self.x.len();
        if at < self.x[0] {
            return 0.0;
        }
        if at >= self.x[n - 1] {
            return self.y[n - 1];
        }
        let k = self.x.partition_point(|&xk| xk <= at) - 1;
        let t = (at - self.x[k]) / (self.x[k + 1] - self.x[k]);
        self.y[k] + t * (self.y[k + 1] - self.y[k])
    }
}

/// Resolve the balance series of an account.
///
/// Balance snapshots are used directly unless the account's `input` is
/// `operations` or it has no balances; then the series is the running
/// total of its operations, seeded by the first balance when that
/// balance predates every operation. Both series are scaled by `share`.
pub fn materialize(entry: &AccountEntry, properties: &Metadata) -> Series {
    let share = properties
        .get("share")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    let scaled = |series: &Series| -> Series {
        series.iter().map(|(day, value)| (*day, value * share)).collect()
    };

    let balances = scaled(&entry.balances);
    let from_operations =
        properties.get("input").and_then(Value::as_str) == Some("operations");
    if !from_operations && !balances.is_empty() {
        return balances;
    }

    let mut operations = scaled(&entry.operations);
    if let Some((&seed_day, &seed)) = balances.iter().next() {
        let predates = operations
            .keys()
            .next()
            .map_or(true, |&first| seed_day < first);
        if predates {
            operations.insert(seed_day, seed);
        }
    }

    let mut total = 0.0;
    operations
        .into_iter()
        .map(|(day, operation)| {
            total += operation;
            (day, total)
        })
        .collect()
}

/// Balance of `entry` on `day`, with the entry's properties overlaid on
/// the defaults of its `account-type`. With `yearly`, the balance is reset
/// to zero every January 1st.
pub fn balance_at(entry: &AccountEntry, types: &AccountTypes, day: NaiveDate, yearly: bool) -> f64 {
    let timeline = BalanceTimeline::for_account(entry, &types.properties(&entry.account));
    if yearly {
        timeline.yearly_at(day)
    } else {
        timeline.at(day)
    }
}

/// Year-to-date series: every known day with its yearly value, plus a
/// zero on each January 1st preceded by the previous year's closing
/// value when it is not zero.
pub fn yearly_series(timeline: &BalanceTimeline) -> Series {
    let mut yearly = Series::new();
    for day in timeline.dates() {
        let new_year = first_day_of_year(day);
        if let Some(closing_day) = new_year.pred_opt() {
            let closing = timeline.yearly_at(closing_day);
            if closing != 0.0 {
                yearly.insert(closing_day, closing);
                yearly.insert(new_year, 0.0);
            }
        }
        yearly.insert(day, timeline.yearly_at(day));
    }
    yearly
}

fn first_day_of_year(day: NaiveDate) -> NaiveDate {
    day.with_ordinal(1).unwrap_or(day)
}

fn day_number(day: NaiveDate) -> f64 {
    f64::from(day.num_days_from_ce())
}
