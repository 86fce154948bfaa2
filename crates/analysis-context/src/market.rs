use crate::input::ProfessionalTierData;
use crate::types::{Intensity, MarketContext};

pub fn competitive_intensity(competitor_count: Option<u32>) -> Intensity {
    match competitor_count {
        Some(n) if n > 50 => Intensity::High,
        Some(n) if n > 10 => Intensity::Moderate,
        Some(_) => Intensity::Low,
        None => Intensity::Moderate,
    }
}

pub fn build_market_context(data: &ProfessionalTierData) -> MarketContext {
    let market = data.market.clone().unwrap_or_default();
    MarketContext {
        market_size: market.market_size,
        growth_rate: market
            .market_growth_rate
            .filter(|g| g.is_finite())
            .unwrap_or(0.0),
        market_share: market.market_share,
        competitor_count: market.competitor_count,
        competitive_intensity: competitive_intensity(market.competitor_count),
        trends: market.market_trends,
        regulatory_environment: market
            .regulatory_environment
            .map(Intensity::from)
            .unwrap_or(Intensity::Moderate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competitive_intensity_thresholds() {
        assert_eq!(competitive_intensity(Some(51)), Intensity::High);
        assert_eq!(competitive_intensity(Some(50)), Intensity::Moderate);
        assert_eq!(competitive_intensity(Some(11)), Intensity::Moderate);
        assert_eq!(competitive_intensity(Some(10)), Intensity::Low);
        assert_eq!(competitive_intensity(None), Intensity::Moderate);
    }

    #[test]
    fn test_market_defaults() {
        let market = build_market_context(&ProfessionalTierData::default());
        assert_eq!(market.growth_rate, 0.0);
        assert_eq!(market.regulatory_environment, Intensity::Moderate);
        assert!(market.trends.is_empty());
    }
}
