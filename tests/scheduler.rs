//! Scheduler timing against a paused tokio clock.

mod common;

use chrono::{DateTime, Utc};
use common::{asset, sources, Fixed, Recording};
use mercator::config::ScheduleConfig;
use mercator::scan::ScanCycle;
use mercator::schedule::{Clock, ScanScheduler, ScheduleEntry};
use std::sync::Arc;
use std::time::Duration;

/// Wall clock pinned to `base` at the moment of the call, then moving with
/// tokio's (paused) time.
fn clock_from(base: &str) -> Clock {
    let base = DateTime::parse_from_rfc3339(base).unwrap().with_timezone(&Utc);
    let start = tokio::time::Instant::now();
    Arc::new(move || base + chrono::Duration::from_std(start.elapsed()).unwrap())
}

fn cycle(dispatcher: Arc<Recording>, ta: Arc<Fixed>) -> Arc<ScanCycle> {
    Arc::new(ScanCycle::new(
        asset(),
        sources(ta, Fixed::new("social", 0.0), Fixed::new("flow", 0.0), Fixed::new("liquidity", 0.0)),
        dispatcher,
        Duration::from_secs(5),
    ))
}

fn daily_entry() -> ScheduleEntry {
    ScheduleEntry::from_config(&ScheduleConfig::default()).unwrap().remove(1)
}

#[tokio::test(start_paused = true)]
async fn scenario_c_interval_and_daily_in_same_second() {
    let dispatcher = Recording::ok();
    let ta = Fixed::new("ta", 0.5);
    // Monday 2024-01-08 07:29:59.5 America/New_York
    let scheduler = ScanScheduler::new(
        vec![ScheduleEntry::Interval { every: Duration::from_secs(900) }, daily_entry()],
        cycle(dispatcher.clone(), ta.clone()),
    )
    .with_clock(clock_from("2024-01-08T12:29:59.500Z"));

    let handles = scheduler.start();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let messages = dispatcher.messages();
    assert_eq!(messages.len(), 2, "{:?}", messages);
    assert!(messages.iter().all(|m| m == "Signal: 0.2 (TA 0.5, Soc 0.0, Flow 0, Liq 0.0)"));
    assert_eq!(ta.calls(), 2);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn interval_fires_immediately_then_every_period() {
    let dispatcher = Recording::ok();
    let scheduler = ScanScheduler::new(
        vec![ScheduleEntry::Interval { every: Duration::from_secs(900) }],
        cycle(dispatcher.clone(), Fixed::new("ta", 0.0)),
    );

    let handles = scheduler.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(dispatcher.messages().len(), 1);

    tokio::time::sleep(Duration::from_secs(1_800)).await;
    assert_eq!(dispatcher.messages().len(), 3);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn slow_cycle_does_not_delay_next_firing() {
    // Each dispatch takes longer than the interval.
    let dispatcher = Recording::slow(Duration::from_secs(2_000));
    let scheduler = ScanScheduler::new(
        vec![ScheduleEntry::Interval { every: Duration::from_secs(900) }],
        cycle(dispatcher.clone(), Fixed::new("ta", 0.0)),
    );

    let handles = scheduler.start();
    tokio::time::sleep(Duration::from_secs(1_801)).await;
    assert_eq!(dispatcher.messages().len(), 3);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn daily_trigger_skips_weekend() {
    let dispatcher = Recording::ok();
    // Saturday 2024-01-13 07:29:59 America/New_York
    let scheduler = ScanScheduler::new(vec![daily_entry()], cycle(dispatcher.clone(), Fixed::new("ta", 0.0)))
        .with_clock(clock_from("2024-01-13T12:29:59Z"));

    let handles = scheduler.start();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(dispatcher.messages().is_empty());

    // Through Sunday into Monday 07:30 (48h after the start)
    tokio::time::sleep(Duration::from_secs(48 * 3_600)).await;
    assert_eq!(dispatcher.messages().len(), 1);

    for handle in handles {
        handle.abort();
    }
}
