//! Benchmark lookup tables by platform, industry, month, weekday, hour and device.
//!
//! Values approximate published industry averages and are only meant to
//! produce plausible simulated numbers.

use chrono::Weekday;
use serde::Serialize;
use sim_core::{CampaignGoal, Device, Industry, Platform};

/// Baseline rates for a platform and industry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Benchmark {
    /// Click-through rate.
    pub ctr: f64,
    /// Cost per click in USD.
    pub cpc: f64,
    /// Conversion rate per click.
    pub cvr: f64,
    /// Auction pressure multiplier (1.0 = average).
    pub competition: f64,
}

/// Device share of traffic and its rate multipliers on a platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceProfile {
    pub share: f64,
    pub ctr: f64,
    pub cvr: f64,
}

/// Multipliers an objective applies to the baseline rates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalProfile {
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
}

fn platform_base(platform: Platform) -> (f64, f64, f64) {
    match platform {
        Platform::Google => (0.0317, 2.69, 0.0375),
        Platform::Meta => (0.0090, 1.72, 0.0910),
        Platform::LinkedIn => (0.0056, 5.26, 0.0600),
    }
}

// (ctr, cpc, cvr, competition)
fn industry_multipliers(industry: Industry) -> (f64, f64, f64, f64) {
    match industry {
        Industry::Ecommerce => (0.85, 0.45, 0.75, 1.15),
        Industry::Saas => (0.76, 1.41, 0.78, 1.10),
        Industry::Finance => (0.92, 1.28, 1.38, 1.25),
        Industry::Healthcare => (1.03, 0.97, 0.93, 1.00),
        Industry::Education => (1.19, 0.89, 0.98, 0.95),
        Industry::Travel => (1.32, 0.57, 0.95, 1.05),
        Industry::RealEstate => (1.17, 0.88, 0.64, 0.90),
        Industry::Other => (1.00, 1.00, 1.00, 1.00),
    }
}

/// Baseline rates for `platform` in `industry`.
pub fn benchmark(platform: Platform, industry: Industry) -> Benchmark {
    let (ctr, cpc, cvr) = platform_base(platform);
    let (m_ctr, m_cpc, m_cvr, competition) = industry_multipliers(industry);
    Benchmark {
        ctr: ctr * m_ctr,
        cpc: cpc * m_cpc,
        cvr: cvr * m_cvr,
        competition,
    }
}

#[rustfmt::skip]
const SEASONALITY: [(Industry, [f64; 12]); 8] = [
    (Industry::Ecommerce, [0.85, 0.82, 0.90, 0.92, 0.95, 0.93, 0.95, 1.00, 0.98, 1.05, 1.30, 1.45]),
    (Industry::Saas, [1.05, 1.02, 1.04, 1.00, 0.98, 0.92, 0.88, 0.90, 1.05, 1.08, 1.02, 0.85]),
    (Industry::Finance, [1.15, 1.10, 1.12, 1.08, 0.98, 0.95, 0.92, 0.93, 0.98, 1.00, 0.92, 0.88]),
    (Industry::Healthcare, [1.10, 1.02, 1.00, 0.98, 0.97, 0.95, 0.95, 0.98, 1.00, 1.02, 1.05, 0.98]),
    (Industry::Education, [1.15, 1.00, 0.95, 0.92, 0.90, 0.85, 1.05, 1.25, 1.15, 0.95, 0.90, 0.80]),
    (Industry::Travel, [1.10, 1.05, 1.15, 1.08, 1.12, 1.20, 1.18, 1.05, 0.92, 0.88, 0.85, 0.95]),
    (Industry::RealEstate, [0.85, 0.92, 1.08, 1.15, 1.18, 1.12, 1.05, 1.00, 0.95, 0.90, 0.85, 0.80]),
    (Industry::Other, [1.0; 12]),
];

/// Demand multiplier for `industry` in calendar `month` (1..=12).
pub fn seasonality(industry: Industry, month: u32) -> f64 {
    let idx = (month.clamp(1, 12) - 1) as usize;
    SEASONALITY
        .iter()
        .find(|(i, _)| *i == industry)
        .map(|(_, table)| table[idx])
        .unwrap_or(1.0)
}

/// Demand multiplier for a weekday on a platform.
pub fn day_of_week_factor(platform: Platform, weekday: Weekday) -> f64 {
    let table: [f64; 7] = match platform {
        Platform::Google => [1.05, 1.06, 1.05, 1.03, 0.98, 0.90, 0.93],
        Platform::Meta => [0.96, 0.97, 0.98, 0.99, 1.02, 1.06, 1.05],
        Platform::LinkedIn => [1.12, 1.15, 1.14, 1.10, 1.00, 0.55, 0.60],
    };
    table[weekday.num_days_from_monday() as usize]
}

const HOURLY_TRAFFIC: [f64; 24] = [
    0.25, 0.18, 0.14, 0.12, 0.13, 0.20, 0.40, 0.65, 0.85, 0.95, 1.00, 1.02, 1.00, 0.98, 0.97,
    0.96, 0.98, 1.02, 1.08, 1.12, 1.10, 0.95, 0.70, 0.42,
];

/// Relative search/feed traffic in an hour of the day.
pub fn hourly_traffic(hour: u8) -> f64 {
    HOURLY_TRAFFIC[usize::from(hour.min(23))]
}

/// CTR multiplier in an hour of the day; evenings engage best.
pub fn hourly_ctr(hour: u8) -> f64 {
    match hour {
        0..=5 => 0.85,
        6..=8 => 0.95,
        9..=16 => 1.00,
        17..=21 => 1.10,
        _ => 0.95,
    }
}

/// Traffic share and rate multipliers of a device on a platform.
pub fn device_profile(platform: Platform, device: Device) -> DeviceProfile {
    let (share, ctr, cvr) = match (platform, device) {
        (Platform::Google, Device::Desktop) => (0.38, 1.00, 1.15),
        (Platform::Google, Device::Mobile) => (0.57, 1.08, 0.88),
        (Platform::Google, Device::Tablet) => (0.05, 0.95, 1.00),
        (Platform::Meta, Device::Desktop) => (0.10, 0.85, 1.10),
        (Platform::Meta, Device::Mobile) => (0.86, 1.03, 0.98),
        (Platform::Meta, Device::Tablet) => (0.04, 0.95, 1.00),
        (Platform::LinkedIn, Device::Desktop) => (0.55, 1.05, 1.10),
        (Platform::LinkedIn, Device::Mobile) => (0.42, 0.95, 0.88),
        (Platform::LinkedIn, Device::Tablet) => (0.03, 0.90, 0.95),
    };
    DeviceProfile { share, ctr, cvr }
}

/// Rate multipliers for a campaign objective.
pub fn goal_profile(goal: CampaignGoal) -> GoalProfile {
    let (ctr, cvr, cpc) = match goal {
        CampaignGoal::Awareness => (0.80, 0.50, 0.70),
        CampaignGoal::Traffic => (1.10, 0.80, 1.00),
        CampaignGoal::Engagement => (1.05, 0.70, 0.90),
        CampaignGoal::Leads => (0.95, 1.20, 1.10),
        CampaignGoal::Conversions => (0.90, 1.35, 1.20),
    };
    GoalProfile { ctr, cvr, cpc }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_industry_is_platform_baseline() {
        let b = benchmark(Platform::Google, Industry::Other);
        assert_eq!(b.ctr, 0.0317);
        assert_eq!(b.cpc, 2.69);
        assert_eq!(b.competition, 1.0);
    }

    #[test]
    fn linkedin_is_the_expensive_platform() {
        for industry in Industry::ALL {
            let li = benchmark(Platform::LinkedIn, industry);
            let meta = benchmark(Platform::Meta, industry);
            assert!(li.cpc > meta.cpc);
            assert!(li.ctr < meta.ctr);
        }
    }

    #[test]
    fn ecommerce_peaks_in_december() {
        let dec = seasonality(Industry::Ecommerce, 12);
        for m in 1..12 {
            assert!(seasonality(Industry::Ecommerce, m) < dec);
        }
        assert_eq!(seasonality(Industry::Other, 7), 1.0);
    }

    #[test]
    fn linkedin_weekends_are_quiet() {
        assert!(day_of_week_factor(Platform::LinkedIn, Weekday::Sat) < 0.7);
        assert!(day_of_week_factor(Platform::Meta, Weekday::Sat) > 1.0);
    }

    #[test]
    fn device_shares_sum_to_one() {
        for p in Platform::ALL {
            let total: f64 = Device::ALL.iter().map(|d| device_profile(p, *d).share).sum();
            assert!((total - 1.0).abs() < 1e-9, "{p}: {total}");
        }
    }

    #[test]
    fn hourly_tables_cover_the_day() {
        assert!(hourly_traffic(3) < hourly_traffic(19));
        assert!(hourly_ctr(20) > hourly_ctr(3));
        assert_eq!(hourly_traffic(99), hourly_traffic(23));
    }
}
