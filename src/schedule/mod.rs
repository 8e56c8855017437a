//! Scan scheduler: two independent triggers, each firing whole scan cycles.
//!
//! - Interval: fires immediately at start, then every `every`.
//! - Daily: fires at a wall-clock time on selected weekdays in one timezone.
//!
//! Each firing spawns its own cycle task and does not wait for it, so the
//! timing of a trigger never depends on how long a cycle takes. Cycles may
//! overlap; they only share the read-only `ScanCycle`. The scheduler has no
//! terminal state and runs until the process exits.

use crate::config::ScheduleConfig;
use crate::scan::{ScanCycle, TriggerKind};
use crate::utils::error::Result;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Days searched ahead for the next daily firing.
const DAILY_LOOKAHEAD_DAYS: i64 = 14;

/// Wall-clock source for the daily trigger.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// One trigger, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleEntry {
    Interval { every: Duration },
    DailyAt { at: NaiveTime, weekdays: Vec<Weekday>, tz: Tz },
}

impl ScheduleEntry {
    pub fn trigger_kind(&self) -> TriggerKind {
        match self {
            | ScheduleEntry::Interval { .. } => TriggerKind::Interval,
            | ScheduleEntry::DailyAt { .. } => TriggerKind::Daily,
        }
    }

    /// The interval entry and the daily entry described by `cfg`.
    pub fn from_config(cfg: &ScheduleConfig) -> Result<Vec<ScheduleEntry>> {
        Ok(vec![
            ScheduleEntry::Interval { every: Duration::from_secs(cfg.interval_secs) },
            ScheduleEntry::DailyAt {
                at: cfg.parse_daily_time()?,
                weekdays: cfg.parse_weekdays()?,
                tz: cfg.parse_timezone()?,
            },
        ])
    }
}

/// First firing strictly after `after`, or `None` if no weekday is selected.
///
/// A local time skipped by a DST jump has no firing that day; an ambiguous
/// one fires at its earlier instant.
pub fn next_daily_fire(
    after: DateTime<Utc>, at: NaiveTime, weekdays: &[Weekday], tz: Tz,
) -> Option<DateTime<Utc>> {
    let start = after.with_timezone(&tz).date_naive();
    (0..=DAILY_LOOKAHEAD_DAYS)
        .map(|offset| start + ChronoDuration::days(offset))
        .filter(|date| weekdays.contains(&date.weekday()))
        .filter_map(|date| tz.from_local_datetime(&date.and_time(at)).earliest())
        .map(|local| local.with_timezone(&Utc))
        .find(|fire| *fire > after)
}

pub struct ScanScheduler {
    entries: Vec<ScheduleEntry>,
    cycle: Arc<ScanCycle>,
    clock: Clock,
}

impl ScanScheduler {
    pub fn new(entries: Vec<ScheduleEntry>, cycle: Arc<ScanCycle>) -> Self {
        Self { entries, cycle, clock: Arc::new(Utc::now) }
    }

    /// Replace the wall clock used by daily entries.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Spawn one timer task per entry.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.entries
            .iter()
            .cloned()
            .map(|entry| {
                let cycle = Arc::clone(&self.cycle);
                let clock = Arc::clone(&self.clock);
                tokio::spawn(async move {
                    match entry {
                        | ScheduleEntry::Interval { every } => run_interval(cycle, every).await,
                        | ScheduleEntry::DailyAt { at, weekdays, tz } => {
                            run_daily(cycle, clock, at, weekdays, tz).await
                        }
                    }
                })
            })
            .collect()
    }

    /// Start all triggers and wait on them (they only end if cancelled).
    pub async fn run(self) {
        for handle in self.start() {
            if let Err(e) = handle.await {
                log::error!("scheduler trigger stopped: {}", e);
            }
        }
    }
}

fn fire(cycle: &Arc<ScanCycle>, trigger: TriggerKind) {
    let cycle = Arc::clone(cycle);
    tokio::spawn(async move {
        let outcome = cycle.run(trigger).await;
        log::info!(
            "[{}] cycle finished: confluence={} delivered={}",
            trigger,
            outcome.confluence(),
            outcome.delivered
        );
    });
}

async fn run_interval(cycle: Arc<ScanCycle>, every: Duration) {
    log::info!("⏰ Interval trigger every {:?}, first scan now", every);
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        fire(&cycle, TriggerKind::Interval);
    }
}

async fn run_daily(cycle: Arc<ScanCycle>, clock: Clock, at: NaiveTime, weekdays: Vec<Weekday>, tz: Tz) {
    log::info!("⏰ Daily trigger at {} {} on {:?}", at.format("%H:%M"), tz.name(), weekdays);
    let mut last_fire: Option<DateTime<Utc>> = None;
    loop {
        let now = clock();
        let after = match last_fire {
            | Some(last) if last > now => last,
            | _ => now,
        };
        let Some(next) = next_daily_fire(after, at, &weekdays, tz) else {
            log::error!("daily trigger has no firing within {} days; stopping", DAILY_LOOKAHEAD_DAYS);
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        log::debug!("next daily scan at {} (in {:?})", next.with_timezone(&tz), wait);
        tokio::time::sleep(wait).await;
        fire(&cycle, TriggerKind::Daily);
        last_fire = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn weekdays() -> Vec<Weekday> {
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    }

    fn seven_thirty() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 30, 0).unwrap()
    }

    const NY: Tz = chrono_tz::America::New_York;

    #[test]
    fn test_same_day_before_time() {
        // Wed 2024-01-10 06:00 EST
        let next = next_daily_fire(utc("2024-01-10T11:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-10T12:30:00Z")));
    }

    #[test]
    fn test_after_time_moves_to_next_weekday() {
        // Wed 2024-01-10 08:00 EST
        let next = next_daily_fire(utc("2024-01-10T13:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-11T12:30:00Z")));
    }

    #[test]
    fn test_exact_time_is_not_repeated() {
        let next = next_daily_fire(utc("2024-01-10T12:30:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-11T12:30:00Z")));
    }

    #[test]
    fn test_weekend_skipped() {
        // Fri 2024-01-12 09:00 EST -> Mon 2024-01-15
        let next = next_daily_fire(utc("2024-01-12T14:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-15T12:30:00Z")));
        // Sat 2024-01-13 noon -> Mon
        let next = next_daily_fire(utc("2024-01-13T17:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-15T12:30:00Z")));
    }

    #[test]
    fn test_local_time_follows_dst() {
        // Fri 2024-03-08 is EST; Mon 2024-03-11 is EDT (UTC-4).
        let next = next_daily_fire(utc("2024-03-08T13:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-03-11T11:30:00Z")));
    }

    #[test]
    fn test_utc_evening_is_still_same_local_day() {
        // Mon 2024-01-08 23:00 EST == Tue 04:00 UTC; next is Tue 07:30 EST.
        let next = next_daily_fire(utc("2024-01-09T04:00:00Z"), seven_thirty(), &weekdays(), NY);
        assert_eq!(next, Some(utc("2024-01-09T12:30:00Z")));
    }

    #[test]
    fn test_no_weekdays() {
        assert_eq!(next_daily_fire(utc("2024-01-10T11:00:00Z"), seven_thirty(), &[], NY), None);
    }

    #[test]
    fn test_entries_from_default_config() {
        let entries = ScheduleEntry::from_config(&ScheduleConfig::default()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ScheduleEntry::Interval { every: Duration::from_secs(900) });
        assert_eq!(
            entries[1],
            ScheduleEntry::DailyAt { at: seven_thirty(), weekdays: weekdays(), tz: NY }
        );
        assert_eq!(entries[1].trigger_kind(), TriggerKind::Daily);
    }
}
