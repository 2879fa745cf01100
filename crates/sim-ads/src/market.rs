//! Synthetic, day-indexed market conditions.

use crate::benchmarks::{benchmark, day_of_week_factor, hourly_ctr, hourly_traffic, seasonality};
use chrono::Datelike;
use rand::Rng;
use sim_core::{AdSchedule, Campaign, MarketConditions};
use std::f64::consts::TAU;

/// Multiplicative noise factor uniform in `[1 - frac, 1 + frac]`; exactly 1 when `frac` is 0.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, frac: f64) -> f64 {
    if frac <= 0.0 {
        return 1.0;
    }
    1.0 + rng.gen_range(-frac..=frac)
}

/// CTR multiplier and traffic share of the scheduled hours.
///
/// Without a schedule every hour is active and both values are 1.
pub fn time_of_day(schedule: Option<&AdSchedule>) -> (f64, f64) {
    let all = || 0u8..24;
    let active = || all().filter(move |h| schedule.map(|s| s.is_active(*h)).unwrap_or(true));

    let total_traffic: f64 = all().map(hourly_traffic).sum();
    let all_ctr: f64 =
        all().map(|h| hourly_traffic(h) * hourly_ctr(h)).sum::<f64>() / total_traffic;

    let active_traffic: f64 = active().map(hourly_traffic).sum();
    if active_traffic <= 0.0 {
        return (1.0, 0.0);
    }
    let active_ctr: f64 =
        active().map(|h| hourly_traffic(h) * hourly_ctr(h)).sum::<f64>() / active_traffic;

    (active_ctr / all_ctr, active_traffic / total_traffic)
}

/// Market conditions for simulation day `day_index`.
///
/// Draws one value from `rng` for competition jitter when `noise` is positive.
pub fn market_conditions<R: Rng + ?Sized>(
    c: &Campaign,
    day_index: u16,
    rng: &mut R,
    noise: f64,
) -> MarketConditions {
    let date = c.date_for_day(day_index);
    let i = f64::from(day_index);

    let month_factor = seasonality(c.industry, date.month());
    let weekday = day_of_week_factor(c.platform, date.weekday());
    let cycle = 1.0 + 0.03 * (TAU * i / 30.0).sin();

    let base = benchmark(c.platform, c.industry).competition;
    let wave = 1.0 + 0.10 * (TAU * (i + 3.0) / 14.0).sin();
    let competition = base * wave * month_factor.sqrt() * jitter(rng, noise / 2.0);

    let (time_of_day_ctr, time_of_day_share) = time_of_day(c.schedule.as_ref());

    MarketConditions {
        day_index,
        date,
        seasonality: month_factor * weekday * cycle,
        competition,
        time_of_day_ctr,
        time_of_day_share,
    }
}
