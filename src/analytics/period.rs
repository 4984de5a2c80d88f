use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::errors::AnalyticsError;

/// Half-open reporting interval `[start, end)` over ledger timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if start >= end {
            return Err(AnalyticsError::InvalidPeriod(format!(
                "start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Both dates are inclusive calendar days in UTC.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidPeriod(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        let end_exclusive = end.succ_opt().ok_or_else(|| {
            AnalyticsError::InvalidPeriod(format!("end_date {end} is out of range"))
        })?;
        Self::new(midnight(start), midnight(end_exclusive))
    }

    /// `7d`, `30d`, `90d` or `1y`, ending with (and including) `today`.
    pub fn preset(range: &str, today: NaiveDate) -> Result<Self, AnalyticsError> {
        let days = match range {
            "7d" => 7,
            "30d" => 30,
            "90d" => 90,
            "1y" => 365,
            other => {
                return Err(AnalyticsError::InvalidPeriod(format!(
                    "unknown range '{other}', expected one of 7d, 30d, 90d, 1y"
                )))
            }
        };
        Self::from_dates(today - Duration::days(days - 1), today)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// The same-length interval immediately preceding this one. Fails when
    /// that interval would start before the earliest representable instant.
    pub fn previous(&self) -> Result<Self, AnalyticsError> {
        let start = self.start.checked_sub_signed(self.length()).ok_or_else(|| {
            AnalyticsError::InvalidPeriod(format!(
                "no comparison period precedes {}",
                self.start.date_naive()
            ))
        })?;
        Ok(Self { start, end: self.start })
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Ledger scope shared by every query of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageFilter {
    pub period: ReportPeriod,
    pub team_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

impl UsageFilter {
    pub fn new(period: ReportPeriod) -> Self {
        Self {
            period,
            team_id: None,
            project_id: None,
        }
    }

    pub fn with_team(mut self, team_id: Option<Uuid>) -> Self {
        self.team_id = team_id;
        self
    }

    pub fn with_project(mut self, project_id: Option<Uuid>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Same scope, shifted onto the preceding period.
    pub fn previous(&self) -> Result<Self, AnalyticsError> {
        Ok(Self {
            period: self.period.previous()?,
            ..self.clone()
        })
    }
}
