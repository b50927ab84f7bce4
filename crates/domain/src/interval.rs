use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, TimeDelta, TimeZone, Utc};
use logscope_core::{AppError, AppResult};

/// Unit of a histogram interval.
///
/// `Month`, `Quarter` and `Year` are calendar units: their buckets start on
/// wall-clock boundaries (UTC) and vary in length. Every other unit has a
/// fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    /// Milliseconds (`ms`).
    Millisecond,
    /// Seconds (`s`).
    Second,
    /// Minutes (`m`).
    Minute,
    /// Hours (`h`).
    Hour,
    /// Days (`d`).
    Day,
    /// Weeks of seven days (`w`).
    Week,
    /// Calendar months (`M`, `month`).
    Month,
    /// Calendar quarters (`q`, `quarter`).
    Quarter,
    /// Calendar years (`y`, `year`).
    Year,
}

impl IntervalUnit {
    fn parse(token: &str) -> Option<Self> {
        // `m` is minutes and `M` is months, so symbols are case-sensitive.
        match token {
            "ms" => return Some(Self::Millisecond),
            "s" => return Some(Self::Second),
            "m" => return Some(Self::Minute),
            "h" => return Some(Self::Hour),
            "d" => return Some(Self::Day),
            "w" => return Some(Self::Week),
            "M" => return Some(Self::Month),
            "q" => return Some(Self::Quarter),
            "y" => return Some(Self::Year),
            _ => {}
        }

        match token.to_ascii_lowercase().as_str() {
            "month" | "months" => Some(Self::Month),
            "quarter" | "quarters" => Some(Self::Quarter),
            "year" | "years" => Some(Self::Year),
            _ => None,
        }
    }

    /// Returns the unit symbol.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "M",
            Self::Quarter => "q",
            Self::Year => "y",
        }
    }

    fn fixed_millis(&self) -> Option<i64> {
        match self {
            Self::Millisecond => Some(1),
            Self::Second => Some(1_000),
            Self::Minute => Some(60_000),
            Self::Hour => Some(3_600_000),
            Self::Day => Some(86_400_000),
            Self::Week => Some(604_800_000),
            Self::Month | Self::Quarter | Self::Year => None,
        }
    }

    fn calendar_months(&self) -> Option<u32> {
        match self {
            Self::Month => Some(1),
            Self::Quarter => Some(3),
            Self::Year => Some(12),
            _ => None,
        }
    }
}

/// Parsed histogram bucket width such as `30m` or `1M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramInterval {
    amount: u32,
    unit: IntervalUnit,
}

impl HistogramInterval {
    /// Creates a validated interval.
    pub fn new(amount: u32, unit: IntervalUnit) -> AppResult<Self> {
        if amount == 0 {
            return Err(AppError::Validation(
                "interval amount must be greater than zero".to_owned(),
            ));
        }
        if unit.calendar_months().is_some() && amount != 1 {
            return Err(AppError::Validation(format!(
                "calendar interval '{amount}{}' only supports a single unit",
                unit.symbol()
            )));
        }
        if let Some(millis) = unit.fixed_millis()
            && millis.checked_mul(i64::from(amount)).is_none()
        {
            return Err(AppError::Validation("interval is too large".to_owned()));
        }

        Ok(Self { amount, unit })
    }

    /// Returns the number of units per bucket.
    #[must_use]
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Returns the interval unit.
    #[must_use]
    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Returns whether buckets follow calendar boundaries.
    #[must_use]
    pub fn is_calendar(&self) -> bool {
        self.unit.calendar_months().is_some()
    }

    /// Returns the bucket width in milliseconds for fixed units.
    #[must_use]
    pub fn fixed_millis(&self) -> Option<i64> {
        self.unit
            .fixed_millis()
            .and_then(|millis| millis.checked_mul(i64::from(self.amount)))
    }

    /// Returns the interval in the notation search backends accept: weeks are
    /// expressed as days for fixed intervals.
    #[must_use]
    pub fn backend_token(&self) -> String {
        match self.unit {
            IntervalUnit::Week => format!("{}d", u64::from(self.amount) * 7),
            _ => self.to_string(),
        }
    }

    /// Returns the start of the bucket containing `timestamp`.
    pub fn align(&self, timestamp: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        if let Some(step) = self.fixed_millis() {
            let millis = timestamp.timestamp_millis();
            let floor = millis - millis.rem_euclid(step);
            return DateTime::from_timestamp_millis(floor).ok_or_else(out_of_range);
        }

        let months = self.unit.calendar_months().unwrap_or(1);
        let month0 = timestamp.month0() / months * months;
        Utc.with_ymd_and_hms(timestamp.year(), month0 + 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(out_of_range)
    }

    /// Returns the start of the bucket following the one starting at
    /// `bucket_start`.
    pub fn next(&self, bucket_start: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        if let Some(step) = self.fixed_millis() {
            return bucket_start
                .checked_add_signed(TimeDelta::milliseconds(step))
                .ok_or_else(out_of_range);
        }

        let months = self.unit.calendar_months().unwrap_or(1) * self.amount;
        bucket_start
            .checked_add_months(Months::new(months))
            .ok_or_else(out_of_range)
    }

    /// Returns every bucket start overlapping `[from, to)`, ascending.
    ///
    /// Fails when the grid would hold more than `max_buckets` buckets.
    pub fn bucket_starts(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_buckets: usize,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let mut starts = Vec::new();
        if from >= to {
            return Ok(starts);
        }

        let mut cursor = self.align(from)?;
        while cursor < to {
            if starts.len() >= max_buckets {
                return Err(AppError::Validation(format!(
                    "interval '{self}' yields more than {max_buckets} buckets for the requested range"
                )));
            }
            starts.push(cursor);
            cursor = self.next(cursor)?;
        }

        Ok(starts)
    }
}

fn out_of_range() -> AppError {
    AppError::Validation("histogram bucket is outside the supported time range".to_owned())
}

impl Display for HistogramInterval {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}{}", self.amount, self.unit.symbol())
    }
}

impl FromStr for HistogramInterval {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::Validation("interval must not be empty".to_owned()));
        }

        let digits_end = value
            .find(|character: char| !character.is_ascii_digit())
            .unwrap_or(value.len());
        let (digits, unit) = value.split_at(digits_end);
        let amount = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|error| {
                AppError::Validation(format!("invalid interval amount '{digits}': {error}"))
            })?
        };
        let unit = IntervalUnit::parse(unit).ok_or_else(|| {
            AppError::Validation(format!(
                "invalid interval '{value}': unit must be one of ms, s, m, h, d, w, M, q, y"
            ))
        })?;

        Self::new(amount, unit)
    }
}
