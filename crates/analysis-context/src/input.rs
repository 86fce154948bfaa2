//! Questionnaire input schemas.
//!
//! Every field is optional: questionnaires arrive partially filled and the
//! builders substitute named defaults instead of rejecting the input. Missing
//! or unreadable fields only lower the data-quality completeness score;
//! unreadable ones are also listed in `rejected_fields`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use valuation_core::{CompetitivePosition, RiskTolerance};

use crate::lenient;

/// Data collected by the Professional questionnaire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct ProfessionalTierData {
    pub business_info: Option<BusinessInfo>,
    pub financial_performance: Option<FinancialPerformanceData>,
    pub operations: Option<OperationsData>,
    pub strategy: Option<StrategyData>,
    pub market: Option<MarketData>,
    pub risk: Option<RiskData>,
    /// Sections or `section.field` paths whose values could not be read
    #[serde(skip)]
    pub rejected_fields: Vec<String>,
}

impl ProfessionalTierData {
    fn read(map: &serde_json::Map<String, Value>, rejected: &mut Vec<String>) -> Self {
        Self {
            business_info: lenient::section(map, "businessInfo", rejected),
            financial_performance: lenient::section(map, "financialPerformance", rejected),
            operations: lenient::section(map, "operations", rejected),
            strategy: lenient::section(map, "strategy", rejected),
            market: lenient::section(map, "market", rejected),
            risk: lenient::section(map, "risk", rejected),
            rejected_fields: Vec::new(),
        }
    }
}

impl From<Value> for ProfessionalTierData {
    fn from(raw: Value) -> Self {
        let mut rejected = Vec::new();
        let map = lenient::object(raw, &mut rejected);
        let mut data = Self::read(&map, &mut rejected);
        data.rejected_fields = rejected;
        data
    }
}

/// Data collected by the Enterprise questionnaire: the Professional sections
/// plus capital structure, value drivers and scenario planning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct EnterpriseTierData {
    #[serde(flatten)]
    pub professional: ProfessionalTierData,
    pub capital_structure: Option<CapitalStructureData>,
    pub value_drivers: Option<ValueDriverData>,
    pub scenario_planning: Option<ScenarioPlanningData>,
}

impl From<Value> for EnterpriseTierData {
    fn from(raw: Value) -> Self {
        let mut rejected = Vec::new();
        let map = lenient::object(raw, &mut rejected);
        let mut professional = ProfessionalTierData::read(&map, &mut rejected);
        let capital_structure = lenient::section(&map, "capitalStructure", &mut rejected);
        let value_drivers = lenient::section(&map, "valueDrivers", &mut rejected);
        let scenario_planning = lenient::section(&map, "scenarioPlanning", &mut rejected);
        professional.rejected_fields = rejected;
        Self {
            professional,
            capital_structure,
            value_drivers,
            scenario_planning,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    #[serde(deserialize_with = "lenient::text")]
    pub business_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub industry: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub business_model: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub years_in_business: Option<f64>,
    #[serde(deserialize_with = "lenient::count")]
    pub employee_count: Option<u32>,
    #[serde(deserialize_with = "lenient::strings")]
    pub geographic_markets: Vec<String>,
    #[serde(deserialize_with = "lenient::choice")]
    pub competitive_position: Option<CompetitivePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialPerformanceData {
    #[serde(deserialize_with = "lenient::number")]
    pub annual_revenue: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub gross_profit: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub operating_income: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub ebitda: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub net_income: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub operating_cash_flow: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub capital_expenditures: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_assets: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_liabilities: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub current_assets: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub current_liabilities: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub cash: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub inventory: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub accounts_receivable: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_debt: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub interest_expense: Option<f64>,
    /// Year-over-year growth in percent
    #[serde(deserialize_with = "lenient::number")]
    pub revenue_growth_rate: Option<f64>,
    /// Oldest first
    #[serde(deserialize_with = "lenient::numbers")]
    pub historical_revenue: Vec<f64>,
    /// Oldest first
    #[serde(deserialize_with = "lenient::numbers")]
    pub historical_net_income: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationsData {
    #[serde(deserialize_with = "lenient::number")]
    pub customer_count: Option<f64>,
    /// Percent
    #[serde(deserialize_with = "lenient::number")]
    pub customer_retention_rate: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub customer_acquisition_cost: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub customer_lifetime_value: Option<f64>,
    /// Percent
    #[serde(deserialize_with = "lenient::number")]
    pub capacity_utilization: Option<f64>,
    /// 0-100 self assessment
    #[serde(deserialize_with = "lenient::number")]
    pub process_documentation: Option<f64>,
    /// 0-100 self assessment
    #[serde(deserialize_with = "lenient::number")]
    pub technology_adoption: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub key_person_dependency: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyData {
    #[serde(deserialize_with = "lenient::strings")]
    pub competitive_advantages: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub growth_strategies: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub strategic_priorities: Vec<String>,
    /// Percent of revenue
    #[serde(deserialize_with = "lenient::number")]
    pub innovation_investment: Option<f64>,
    #[serde(deserialize_with = "lenient::strings")]
    pub partnerships: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatoryEnvironment {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketData {
    #[serde(deserialize_with = "lenient::number")]
    pub market_size: Option<f64>,
    /// Percent
    #[serde(deserialize_with = "lenient::number")]
    pub market_growth_rate: Option<f64>,
    /// Percent
    #[serde(deserialize_with = "lenient::number")]
    pub market_share: Option<f64>,
    #[serde(deserialize_with = "lenient::count")]
    pub competitor_count: Option<u32>,
    #[serde(deserialize_with = "lenient::strings")]
    pub market_trends: Vec<String>,
    #[serde(deserialize_with = "lenient::choice")]
    pub regulatory_environment: Option<RegulatoryEnvironment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskData {
    #[serde(deserialize_with = "lenient::strings")]
    pub key_risks: Vec<String>,
    /// Percent of revenue from the largest customer
    #[serde(deserialize_with = "lenient::number")]
    pub customer_concentration: Option<f64>,
    /// Percent of purchases from the largest supplier
    #[serde(deserialize_with = "lenient::number")]
    pub supplier_concentration: Option<f64>,
    #[serde(deserialize_with = "lenient::choice")]
    pub risk_tolerance: Option<RiskTolerance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapitalStructureData {
    #[serde(deserialize_with = "lenient::number")]
    pub debt_to_equity: Option<f64>,
    /// Percent
    #[serde(deserialize_with = "lenient::number")]
    pub weighted_average_cost_of_capital: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub credit_rating: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub equity_value: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub debt_maturity_years: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueDriverData {
    #[serde(deserialize_with = "lenient::strings")]
    pub intellectual_property: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub synergy_opportunities: Vec<String>,
    /// 0-100
    #[serde(deserialize_with = "lenient::number")]
    pub brand_strength: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub recurring_revenue_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioPlanningData {
    /// Percent per year
    #[serde(deserialize_with = "lenient::number")]
    pub base_case_growth: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub optimistic_growth: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub pessimistic_growth: Option<f64>,
    #[serde(deserialize_with = "lenient::count")]
    pub projection_years: Option<u32>,
}

/// Count present vs expected fields for completeness scoring.
pub(crate) trait FieldPresence {
    fn presence(&self) -> (usize, usize);
}

fn count(flags: &[bool]) -> (usize, usize) {
    (flags.iter().filter(|&&f| f).count(), flags.len())
}

impl FieldPresence for FinancialPerformanceData {
    fn presence(&self) -> (usize, usize) {
        count(&[
            self.annual_revenue.is_some(),
            self.gross_profit.is_some(),
            self.operating_income.is_some(),
            self.net_income.is_some(),
            self.operating_cash_flow.is_some(),
            self.capital_expenditures.is_some(),
            self.total_assets.is_some(),
            self.total_liabilities.is_some(),
            self.current_assets.is_some(),
            self.current_liabilities.is_some(),
            self.cash.is_some(),
            !self.historical_revenue.is_empty(),
        ])
    }
}

impl FieldPresence for OperationsData {
    fn presence(&self) -> (usize, usize) {
        count(&[
            self.customer_count.is_some(),
            self.customer_retention_rate.is_some(),
            self.customer_acquisition_cost.is_some(),
            self.customer_lifetime_value.is_some(),
            self.capacity_utilization.is_some(),
            self.process_documentation.is_some(),
            self.technology_adoption.is_some(),
            self.key_person_dependency.is_some(),
        ])
    }
}

impl FieldPresence for StrategyData {
    fn presence(&self) -> (usize, usize) {
        count(&[
            !self.competitive_advantages.is_empty(),
            !self.growth_strategies.is_empty(),
            !self.strategic_priorities.is_empty(),
            self.innovation_investment.is_some(),
            !self.partnerships.is_empty(),
        ])
    }
}

impl FieldPresence for MarketData {
    fn presence(&self) -> (usize, usize) {
        count(&[
            self.market_size.is_some(),
            self.market_growth_rate.is_some(),
            self.market_share.is_some(),
            self.competitor_count.is_some(),
            !self.market_trends.is_empty(),
            self.regulatory_environment.is_some(),
        ])
    }
}

impl FieldPresence for RiskData {
    fn presence(&self) -> (usize, usize) {
        count(&[
            !self.key_risks.is_empty(),
            self.customer_concentration.is_some(),
            self.supplier_concentration.is_some(),
            self.risk_tolerance.is_some(),
        ])
    }
}

/// Completeness percentage of an optional section; an absent section counts as empty.
pub(crate) fn section_completeness<T: FieldPresence + Default>(section: Option<&T>) -> f64 {
    let (present, expected) = match section {
        Some(s) => s.presence(),
        None => T::default().presence(),
    };
    if expected == 0 {
        return 0.0;
    }
    present as f64 / expected as f64 * 100.0
}
