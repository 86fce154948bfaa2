use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValuationError;

/// Subscription tier gating features and token allowances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[serde(alias = "basic", alias = "free")]
    Consumer,
    Professional,
    Enterprise,
}

impl Tier {
    /// Prompt token budget for the tier
    pub fn token_limit(&self) -> usize {
        match self {
            Tier::Consumer => 1000,
            Tier::Professional => 3000,
            Tier::Enterprise => 8000,
        }
    }

    /// Priority multiplier used when ranking requests
    pub fn multiplier(&self) -> f64 {
        match self {
            Tier::Consumer => 0.5,
            Tier::Professional => 0.75,
            Tier::Enterprise => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Consumer => "consumer",
            Tier::Professional => "professional",
            Tier::Enterprise => "enterprise",
        }
    }

    pub fn all() -> [Tier; 3] {
        [Tier::Consumer, Tier::Professional, Tier::Enterprise]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consumer" | "basic" | "free" => Ok(Tier::Consumer),
            "professional" => Ok(Tier::Professional),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(ValuationError::UnsupportedTier(other.to_string())),
        }
    }
}

/// Kind of analysis requested from the LLM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Comprehensive,
    Valuation,
    FinancialAnalysis,
    RiskAssessment,
    StrategicPlanning,
    MarketAnalysis,
    OperationalAnalysis,
    CompetitiveAnalysis,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::Valuation => "valuation",
            AnalysisType::FinancialAnalysis => "financial_analysis",
            AnalysisType::RiskAssessment => "risk_assessment",
            AnalysisType::StrategicPlanning => "strategic_planning",
            AnalysisType::MarketAnalysis => "market_analysis",
            AnalysisType::OperationalAnalysis => "operational_analysis",
            AnalysisType::CompetitiveAnalysis => "competitive_analysis",
        }
    }

    /// Human-readable label for prompts and reports
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "Comprehensive Business Analysis",
            AnalysisType::Valuation => "Business Valuation",
            AnalysisType::FinancialAnalysis => "Financial Analysis",
            AnalysisType::RiskAssessment => "Risk Assessment",
            AnalysisType::StrategicPlanning => "Strategic Planning",
            AnalysisType::MarketAnalysis => "Market Analysis",
            AnalysisType::OperationalAnalysis => "Operational Analysis",
            AnalysisType::CompetitiveAnalysis => "Competitive Analysis",
        }
    }

    pub fn all() -> [AnalysisType; 8] {
        [
            AnalysisType::Comprehensive,
            AnalysisType::Valuation,
            AnalysisType::FinancialAnalysis,
            AnalysisType::RiskAssessment,
            AnalysisType::StrategicPlanning,
            AnalysisType::MarketAnalysis,
            AnalysisType::OperationalAnalysis,
            AnalysisType::CompetitiveAnalysis,
        ]
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        AnalysisType::all()
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValuationError::UnknownAnalysisType(s.to_string()))
    }
}

/// How soon the caller needs the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn score(&self) -> f64 {
        match self {
            Urgency::Low => 0.3,
            Urgency::Medium => 0.5,
            Urgency::High => 0.8,
            Urgency::Critical => 1.0,
        }
    }
}

impl FromStr for Urgency {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            other => Err(ValuationError::InvalidInput(format!("unknown urgency '{}'", other))),
        }
    }
}

/// Bucketed priority of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => PriorityLevel::Critical,
            s if s >= 0.6 => PriorityLevel::High,
            s if s >= 0.4 => PriorityLevel::Medium,
            _ => PriorityLevel::Low,
        }
    }
}

/// Revenue-derived size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
}

impl BusinessSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessSize::Small => "small",
            BusinessSize::Medium => "medium",
            BusinessSize::Large => "large",
        }
    }
}

/// Lifecycle stage derived from company age and growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStage {
    Startup,
    Growth,
    Mature,
    Transition,
}

impl BusinessStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStage::Startup => "startup",
            BusinessStage::Growth => "growth",
            BusinessStage::Mature => "mature",
            BusinessStage::Transition => "transition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitivePosition {
    Leader,
    Challenger,
    Follower,
    Niche,
}

impl CompetitivePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitivePosition::Leader => "leader",
            CompetitivePosition::Challenger => "challenger",
            CompetitivePosition::Follower => "follower",
            CompetitivePosition::Niche => "niche",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing_accepts_aliases() {
        assert_eq!("basic".parse::<Tier>().unwrap(), Tier::Consumer);
        assert_eq!("Free".parse::<Tier>().unwrap(), Tier::Consumer);
        assert_eq!(" Enterprise ".parse::<Tier>().unwrap(), Tier::Enterprise);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_limits_increase() {
        assert_eq!(Tier::Consumer.token_limit(), 1000);
        assert_eq!(Tier::Professional.token_limit(), 3000);
        assert_eq!(Tier::Enterprise.token_limit(), 8000);
        assert!(Tier::Enterprise.multiplier() > Tier::Professional.multiplier());
    }

    #[test]
    fn test_analysis_type_round_trip_names() {
        for t in AnalysisType::all() {
            assert_eq!(t.as_str().parse::<AnalysisType>().unwrap(), t);
        }
        assert_eq!("Risk Assessment".parse::<AnalysisType>().unwrap(), AnalysisType::RiskAssessment);
    }

    #[test]
    fn test_priority_buckets() {
        assert_eq!(PriorityLevel::from_score(0.85), PriorityLevel::Critical);
        assert_eq!(PriorityLevel::from_score(0.8), PriorityLevel::Critical);
        assert_eq!(PriorityLevel::from_score(0.6), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_score(0.45), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_score(0.1), PriorityLevel::Low);
    }

    #[test]
    fn test_tier_serde_lowercase() {
        let json = serde_json::to_string(&Tier::Professional).unwrap();
        assert_eq!(json, "\"professional\"");
        let parsed: Tier = serde_json::from_str("\"basic\"").unwrap();
        assert_eq!(parsed, Tier::Consumer);
    }
}
