//! Display periods and the sampling interval each one is charted at.

use clap::ValueEnum;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Time span selectable for the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, ValueEnum)]
pub enum Period {
    #[strum(serialize = "1d")]
    #[value(name = "1d")]
    OneDay,
    #[strum(serialize = "5d")]
    #[value(name = "5d")]
    FiveDays,
    #[strum(serialize = "1mo")]
    #[value(name = "1mo")]
    OneMonth,
    #[strum(serialize = "3mo")]
    #[value(name = "3mo")]
    ThreeMonths,
    #[strum(serialize = "6mo")]
    #[value(name = "6mo")]
    SixMonths,
    #[strum(serialize = "1y")]
    #[value(name = "1y")]
    OneYear,
    #[strum(serialize = "2y")]
    #[value(name = "2y")]
    TwoYears,
    #[strum(serialize = "5y")]
    #[value(name = "5y")]
    FiveYears,
    #[strum(serialize = "10y")]
    #[value(name = "10y")]
    TenYears,
    #[strum(serialize = "ytd")]
    #[value(name = "ytd")]
    YearToDate,
    #[strum(serialize = "max")]
    #[value(name = "max")]
    Max,
}

/// Bar width requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Interval {
    #[strum(serialize = "2m")]
    TwoMinutes,
    #[strum(serialize = "15m")]
    FifteenMinutes,
    #[strum(serialize = "1d")]
    OneDay,
}

impl Interval {
    pub fn is_intraday(self) -> bool {
        !matches!(self, Interval::OneDay)
    }
}

/// Concrete history lookup: a period sampled at an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub period: Period,
    pub interval: Interval,
}

impl HistoryQuery {
    /// Today's single daily bar, used for the current price.
    pub fn latest_daily() -> Self {
        HistoryQuery {
            period: Period::OneDay,
            interval: Interval::OneDay,
        }
    }
}

/// Intraday periods get finer sampling so the chart stays legible.
pub fn resolve(period: Period) -> HistoryQuery {
    let interval = match period {
        Period::OneDay => Interval::TwoMinutes,
        Period::FiveDays => Interval::FifteenMinutes,
        _ => Interval::OneDay,
    };
    HistoryQuery { period, interval }
}

impl Period {
    pub fn all() -> Vec<Period> {
        Period::iter().collect()
    }

    /// Next period in selector order, wrapping around.
    pub fn next(self) -> Period {
        let all = Period::all();
        let idx = all.iter().position(|p| *p == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(self) -> Period {
        let all = Period::all();
        let idx = all.iter().position(|p| *p == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intraday_periods_use_fine_intervals() {
        let q = resolve(Period::OneDay);
        assert_eq!((q.period.to_string(), q.interval.to_string()), ("1d".to_string(), "2m".to_string()));

        let q = resolve(Period::FiveDays);
        assert_eq!((q.period.to_string(), q.interval.to_string()), ("5d".to_string(), "15m".to_string()));
    }

    #[test]
    fn longer_periods_use_daily_bars() {
        for period in Period::all().into_iter().skip(2) {
            assert_eq!(resolve(period).interval, Interval::OneDay, "{period}");
        }
        let q = resolve("1mo".parse::<Period>().unwrap());
        assert_eq!(q.period, Period::OneMonth);
        assert_eq!(q.interval.to_string(), "1d");
    }

    #[test]
    fn parses_every_selector_label() {
        let labels = ["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];
        let parsed: Vec<String> = labels
            .iter()
            .map(|l| l.parse::<Period>().unwrap().to_string())
            .collect();
        assert_eq!(parsed, labels);
        assert!("7d".parse::<Period>().is_err());
    }

    #[test]
    fn next_and_prev_wrap() {
        assert_eq!(Period::Max.next(), Period::OneDay);
        assert_eq!(Period::OneDay.prev(), Period::Max);
        assert_eq!(Period::FiveDays.next(), Period::OneMonth);
    }
}
