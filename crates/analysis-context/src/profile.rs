use valuation_core::{BusinessSize, BusinessStage, CompetitivePosition};

use crate::input::ProfessionalTierData;
use crate::types::BusinessProfile;

const MEDIUM_REVENUE_THRESHOLD: f64 = 10_000_000.0;
const LARGE_REVENUE_THRESHOLD: f64 = 100_000_000.0;

pub const DEFAULT_YEARS_IN_BUSINESS: f64 = 5.0;

pub fn determine_business_size(revenue: f64) -> BusinessSize {
    if revenue >= LARGE_REVENUE_THRESHOLD {
        BusinessSize::Large
    } else if revenue >= MEDIUM_REVENUE_THRESHOLD {
        BusinessSize::Medium
    } else {
        BusinessSize::Small
    }
}

/// Stage from company age (years) and revenue growth (percent).
pub fn determine_business_stage(years_in_business: f64, growth_rate: f64) -> BusinessStage {
    if years_in_business < 3.0 {
        BusinessStage::Startup
    } else if growth_rate >= 20.0 {
        BusinessStage::Growth
    } else if growth_rate < -5.0 {
        BusinessStage::Transition
    } else {
        BusinessStage::Mature
    }
}

/// Position from market share (percent) when the questionnaire leaves it blank.
pub fn position_from_market_share(market_share: Option<f64>) -> CompetitivePosition {
    match market_share {
        Some(s) if s >= 20.0 => CompetitivePosition::Leader,
        Some(s) if s >= 10.0 => CompetitivePosition::Challenger,
        Some(s) if s >= 2.0 => CompetitivePosition::Follower,
        Some(_) => CompetitivePosition::Niche,
        None => CompetitivePosition::Follower,
    }
}

pub fn build_business_profile(data: &ProfessionalTierData) -> BusinessProfile {
    let info = data.business_info.clone().unwrap_or_default();
    let revenue = data
        .financial_performance
        .as_ref()
        .and_then(|f| f.annual_revenue)
        .unwrap_or(0.0);
    let growth = crate::financial::resolve_growth_rate(data);
    let years = info
        .years_in_business
        .filter(|y| y.is_finite())
        .unwrap_or(DEFAULT_YEARS_IN_BUSINESS);

    let competitive_position = info.competitive_position.unwrap_or_else(|| {
        position_from_market_share(data.market.as_ref().and_then(|m| m.market_share))
    });

    let geography = if info.geographic_markets.is_empty() {
        vec!["domestic".to_string()]
    } else {
        info.geographic_markets.clone()
    };

    BusinessProfile {
        name: info.business_name.clone(),
        industry: info
            .industry
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "general".to_string()),
        size: determine_business_size(revenue),
        stage: determine_business_stage(years, growth),
        business_model: info
            .business_model
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "b2b".to_string()),
        geography,
        competitive_position,
        years_in_business: years,
        employee_count: info.employee_count,
    }
}
