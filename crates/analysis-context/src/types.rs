use serde::{Deserialize, Serialize};
use valuation_core::{
    AnalysisType, BusinessSize, BusinessStage, CompetitivePosition, RiskTolerance, Tier,
};

use crate::input::RegulatoryEnvironment;

/// Normalized, tier-aware snapshot built once per analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub tier: Tier,
    pub business_profile: BusinessProfile,
    pub financial_metrics: ProcessedFinancialMetrics,
    pub operational_metrics: OperationalMetrics,
    pub strategic_context: StrategicContext,
    pub market_context: MarketContext,
    pub risk_profile: RiskProfile,
    pub benchmark_comparisons: BenchmarkComparisons,
    pub data_quality: DataQuality,
    pub enriched_insights: EnrichedInsights,
    /// Set by `prioritize_context_data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<AnalysisFocus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub name: Option<String>,
    pub industry: String,
    pub size: BusinessSize,
    pub stage: BusinessStage,
    pub business_model: String,
    pub geography: Vec<String>,
    pub competitive_position: CompetitivePosition,
    pub years_in_business: f64,
    pub employee_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Financial metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFinancialMetrics {
    pub performance: FinancialPerformance,
    pub trends: FinancialTrends,
    pub projections: Option<FinancialProjections>,
    pub valuation: Option<ValuationRanges>,
    /// Input fields that were absent and replaced by named defaults
    pub defaulted_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialPerformance {
    pub revenue: RevenueMetrics,
    pub profitability: Profitability,
    pub cash_flow: CashFlowMetrics,
    pub efficiency: EfficiencyMetrics,
    pub leverage: LeverageMetrics,
    pub liquidity: LiquidityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMetrics {
    pub current: f64,
    /// Percent
    pub growth_rate: f64,
    pub historical: Vec<f64>,
}

/// Absolute amount and its margin on revenue (percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginMetric {
    pub amount: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    pub gross: MarginMetric,
    pub operating: MarginMetric,
    pub net: MarginMetric,
    pub ebitda: MarginMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowMetrics {
    pub operating: f64,
    pub capital_expenditures: f64,
    pub free_cash_flow: f64,
    /// Operating cash flow as percent of net income
    pub cash_conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    pub asset_turnover: f64,
    pub receivables_days: f64,
    pub inventory_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageMetrics {
    pub total_debt: f64,
    pub debt_to_equity: f64,
    pub debt_to_assets: f64,
    pub interest_coverage: f64,
    /// Enterprise-only capital structure overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_structure: Option<CapitalStructure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalStructure {
    pub debt_to_equity: f64,
    /// Percent
    pub wacc: f64,
    pub credit_rating: String,
    pub equity_value: f64,
    /// Equity share of total capital, percent
    pub equity_ratio: f64,
    pub debt_maturity_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityMetrics {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub cash: f64,
    pub working_capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTrends {
    pub revenue: TrendAnalysis,
    pub net_income: TrendAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InflectionKind {
    Peak,
    Trough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflectionPoint {
    pub index: usize,
    pub kind: InflectionKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Absolute average period-over-period relative change
    pub strength: f64,
    /// 0-100, higher means steadier changes
    pub consistency: f64,
    pub inflection_points: Vec<InflectionPoint>,
    pub forecast: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    TrendExtrapolation,
    Scenario,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedYear {
    pub year_offset: u32,
    pub revenue: f64,
    /// Percent
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    /// Percent per year
    pub growth_rate: f64,
    pub probability: f64,
    pub projected_revenue: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProjections {
    pub method: ProjectionMethod,
    pub years: Vec<ProjectedYear>,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfEstimate {
    /// Percent
    pub discount_rate: f64,
    /// Percent
    pub terminal_growth: f64,
    pub enterprise_value: f64,
    pub equity_value: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRanges {
    pub revenue_multiple: ValueRange,
    pub ebitda_multiple: ValueRange,
    /// Enterprise only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcf: Option<DcfEstimate>,
}

// ---------------------------------------------------------------------------
// Operational / strategic / market / risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalMetrics {
    pub efficiency: OperationalEfficiency,
    pub customer: CustomerMetrics,
    pub scalability_score: f64,
    pub process_maturity: f64,
    pub technology_adoption: f64,
    pub key_person_dependency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalEfficiency {
    pub overall: f64,
    pub revenue_per_employee: f64,
    /// Percent
    pub capacity_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMetrics {
    pub count: Option<f64>,
    /// Percent
    pub retention_rate: f64,
    pub acquisition_cost: Option<f64>,
    pub lifetime_value: Option<f64>,
    pub ltv_to_cac: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicContext {
    pub competitive_advantages: Vec<String>,
    pub growth_strategies: Vec<String>,
    pub strategic_priorities: Vec<String>,
    /// Percent of revenue
    pub innovation_investment: f64,
    /// 0-100
    pub moat_strength: f64,
    pub partnerships: Vec<String>,
    /// Enterprise-only strategic value drivers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_drivers: Option<StrategicValueDrivers>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicValueDrivers {
    pub intellectual_property: Vec<String>,
    pub synergy_opportunities: Vec<String>,
    pub brand_strength: f64,
    pub recurring_revenue_percent: f64,
    /// 0-100 composite
    pub driver_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }
}

impl From<RegulatoryEnvironment> for Intensity {
    fn from(env: RegulatoryEnvironment) -> Self {
        match env {
            RegulatoryEnvironment::Low => Intensity::Low,
            RegulatoryEnvironment::Moderate => Intensity::Moderate,
            RegulatoryEnvironment::High => Intensity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    pub market_size: Option<f64>,
    /// Percent
    pub growth_rate: f64,
    /// Percent
    pub market_share: Option<f64>,
    pub competitor_count: Option<u32>,
    pub competitive_intensity: Intensity,
    pub trends: Vec<String>,
    pub regulatory_environment: Intensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 60.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Category risk scores, 0 (no risk) to 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategories {
    pub financial: f64,
    pub operational: f64,
    pub market: f64,
    pub regulatory: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub overall_score: f64,
    pub level: RiskLevel,
    pub categories: RiskCategories,
    pub key_risks: Vec<String>,
    pub risk_tolerance: RiskTolerance,
}

// ---------------------------------------------------------------------------
// Benchmarks / quality / insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkPosition {
    Above,
    At,
    Below,
}

impl BenchmarkPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkPosition::Above => "above",
            BenchmarkPosition::At => "at",
            BenchmarkPosition::Below => "below",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub metric: String,
    pub company_value: f64,
    pub industry_value: f64,
    /// company - industry
    pub variance: f64,
    pub position: BenchmarkPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparisons {
    pub industry: String,
    pub metrics: Vec<BenchmarkComparison>,
    /// 0-100
    pub overall_percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    pub overall: f64,
    pub financial: f64,
    pub operational: f64,
    pub strategic: f64,
    pub market: f64,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub completeness: Completeness,
    pub accuracy: f64,
    pub timeliness: f64,
    pub overall_score: f64,
    pub issues: Vec<String>,
    /// Financial inputs replaced by named defaults
    pub defaulted_fields: Vec<String>,
    /// Questionnaire values that could not be read
    pub rejected_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedInsights {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub opportunities: Vec<String>,
    pub red_flags: Vec<String>,
    pub value_drivers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Prioritization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextArea {
    Financial,
    Operational,
    Strategic,
    Market,
    Risk,
}

impl ContextArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextArea::Financial => "financial",
            ContextArea::Operational => "operational",
            ContextArea::Strategic => "strategic",
            ContextArea::Market => "market",
            ContextArea::Risk => "risk",
        }
    }
}

/// Relative importance (0-1) of each context area for an analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub financial: f64,
    pub operational: f64,
    pub strategic: f64,
    pub market: f64,
    pub risk: f64,
}

impl PriorityWeights {
    pub fn get(&self, area: ContextArea) -> f64 {
        match area {
            ContextArea::Financial => self.financial,
            ContextArea::Operational => self.operational,
            ContextArea::Strategic => self.strategic,
            ContextArea::Market => self.market,
            ContextArea::Risk => self.risk,
        }
    }

    pub fn entries(&self) -> [(ContextArea, f64); 5] {
        [
            (ContextArea::Financial, self.financial),
            (ContextArea::Operational, self.operational),
            (ContextArea::Strategic, self.strategic),
            (ContextArea::Market, self.market),
            (ContextArea::Risk, self.risk),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedInsight {
    pub area: ContextArea,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFocus {
    pub analysis_type: AnalysisType,
    pub weights: PriorityWeights,
    pub enhanced_areas: Vec<ContextArea>,
    pub filtered_fields: Vec<String>,
    pub derived: Vec<DerivedInsight>,
}
