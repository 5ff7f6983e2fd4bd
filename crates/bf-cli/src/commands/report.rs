//! Report command for the 7-day care dashboard.
//!
//! Renders daily averages, trends with their polarity, the coarse sleep
//! quality label and feeding regularity per quadrant of the day, either as
//! text or as JSON (`--json`).

use std::io::{self, Write};

use anyhow::Result;
use bf_core::plan::visible_history;
use bf_core::{
    Clock, DailyStats, Event, EventStore, EventType, SleepQuality, TimeOfDayPattern, TimeWindow,
    Trend, TrendAssessment, TrendMetric, aggregate_window, average_daily_count,
    average_daily_sleep_minutes, classify_sleep_quality_coarse, classify_sleep_trend,
    classify_trend, feeding_patterns,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;

use super::open_database;
use super::util::{format_minutes, start_of_day};
use crate::Config;

/// Number of calendar days covered, today included.
const REPORT_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub generated_at: DateTime<FixedOffset>,
    pub timezone: String,
    pub period: ReportPeriod,
    pub event_count: usize,
    pub averages: Averages,
    pub sleep_quality: SleepQuality,
    pub trends: Vec<TrendEntry>,
    pub feeding_patterns: Vec<TimeOfDayPattern>,
    pub days: Vec<DailyStats>,
}

#[derive(Debug, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Per-day averages over days that have events.
#[derive(Debug, Serialize)]
pub struct Averages {
    pub sleep_minutes: f64,
    pub feedings: f64,
    pub diapers: f64,
    pub cries: f64,
}

#[derive(Debug, Serialize)]
pub struct TrendEntry {
    pub metric: TrendMetric,
    pub trend: Trend,
    pub assessment: TrendAssessment,
}

impl TrendEntry {
    fn new(metric: TrendMetric, trend: Trend) -> Self {
        Self {
            metric,
            trend,
            assessment: metric.assess(trend),
        }
    }
}

/// Builds the report for the seven calendar days ending at `now`.
pub fn generate_report_data(
    events: &[Event],
    now: DateTime<FixedOffset>,
    timezone: String,
) -> Result<ReportData> {
    let end = now.date_naive();
    let start = end - Duration::days(REPORT_DAYS - 1);
    let window = TimeWindow::new(start_of_day(now)? - Duration::days(REPORT_DAYS - 1), now);
    let in_window: Vec<Event> = window.select(events).cloned().collect();

    let sleep_minutes = average_daily_sleep_minutes(&in_window);
    let trends = vec![
        TrendEntry::new(TrendMetric::Feeding, classify_trend(EventType::Fed, events, now)),
        TrendEntry::new(TrendMetric::Crying, classify_trend(EventType::Cried, events, now)),
        TrendEntry::new(TrendMetric::Sleep, classify_sleep_trend(sleep_minutes)),
    ];

    Ok(ReportData {
        generated_at: now,
        timezone,
        period: ReportPeriod { start, end },
        event_count: in_window.len(),
        averages: Averages {
            sleep_minutes,
            feedings: average_daily_count(&in_window, EventType::Fed),
            diapers: average_daily_count(&in_window, EventType::DiaperChanged),
            cries: average_daily_count(&in_window, EventType::Cried),
        },
        sleep_quality: classify_sleep_quality_coarse(sleep_minutes),
        trends,
        feeding_patterns: feeding_patterns(&in_window),
        days: aggregate_window(&in_window, start, end),
    })
}

fn trend_suffix(data: &ReportData, metric: TrendMetric) -> String {
    data.trends
        .iter()
        .find(|t| t.metric == metric)
        .map(|t| match t.assessment {
            TrendAssessment::Neutral => format!(", trend {}", t.trend.as_str()),
            assessment => format!(", trend {} ({})", t.trend.as_str(), assessment.as_str()),
        })
        .unwrap_or_default()
}

/// Writes the human-readable report.
pub fn write_report<W: Write>(output: &mut W, data: &ReportData) -> io::Result<()> {
    writeln!(output, "CARE REPORT: {} to {}", data.period.start, data.period.end)?;

    if data.event_count == 0 {
        writeln!(output)?;
        writeln!(output, "No events recorded in the last {REPORT_DAYS} days.")?;
        writeln!(output)?;
        writeln!(output, "Hint: Run 'bf log <type>' to record one.")?;
        return Ok(());
    }

    let avg = &data.averages;
    writeln!(output)?;
    writeln!(output, "AVERAGES")?;
    writeln!(output, "────────")?;
    writeln!(
        output,
        "Sleep:     {}/day ({}){}",
        format_minutes(avg.sleep_minutes),
        data.sleep_quality,
        trend_suffix(data, TrendMetric::Sleep)
    )?;
    writeln!(
        output,
        "Feedings:  {:.1}/day{}",
        avg.feedings,
        trend_suffix(data, TrendMetric::Feeding)
    )?;
    writeln!(output, "Diapers:   {:.1}/day", avg.diapers)?;
    writeln!(
        output,
        "Crying:    {:.1}/day{}",
        avg.cries,
        trend_suffix(data, TrendMetric::Crying)
    )?;

    writeln!(output)?;
    writeln!(output, "FEEDING PATTERNS")?;
    writeln!(output, "────────────────")?;
    for pattern in &data.feeding_patterns {
        write!(
            output,
            "{:<20}{:>3} feeding(s)",
            pattern.period.label(),
            pattern.frequency
        )?;
        if pattern.frequency >= 2 {
            write!(
                output,
                ", every {}, consistency {:.0}%",
                format_minutes(pattern.average_interval_minutes),
                pattern.consistency
            )?;
        }
        writeln!(output)?;
    }

    writeln!(output)?;
    writeln!(output, "DAILY")?;
    writeln!(output, "─────")?;
    for day in &data.days {
        writeln!(
            output,
            "{}  sleep {:>7}  fed {}  diapers {}  cried {}",
            day.day,
            format_minutes(day.total_sleep_minutes),
            day.feeding_count,
            day.diaper_count,
            day.cry_count
        )?;
    }

    Ok(())
}

pub fn run<W: Write>(writer: &mut W, json: bool, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();
    let subject = config.subject_id()?;
    let plan = config.subscription().effective_plan(now);
    let db = open_database(config)?;

    let events = db.list_events(&subject, None)?;
    let events: Vec<Event> = visible_history(&events, plan, now).into_iter().cloned().collect();

    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
    let data = generate_report_data(&events, now, timezone)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&data)?)?;
    } else {
        write_report(writer, &data)?;
    }
    Ok(())
}
