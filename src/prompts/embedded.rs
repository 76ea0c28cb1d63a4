//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time,
//! along with the default registry manifest.

use tracing::debug;

/// Default registry manifest (documents, agents, budgets)
pub const MANIFEST: &str = include_str!("../../prompts/manifest.yml");

// Pitch deck sections
pub const PITCH_DECK_PROBLEM: &str = include_str!("../../prompts/pitch-deck-problem.pmt");
pub const PITCH_DECK_SOLUTION: &str = include_str!("../../prompts/pitch-deck-solution.pmt");
pub const PITCH_DECK_MARKET: &str = include_str!("../../prompts/pitch-deck-market.pmt");
pub const PITCH_DECK_BUSINESS_MODEL: &str = include_str!("../../prompts/pitch-deck-business-model.pmt");
pub const PITCH_DECK_COMPETITION: &str = include_str!("../../prompts/pitch-deck-competition.pmt");
pub const PITCH_DECK_ASK: &str = include_str!("../../prompts/pitch-deck-ask.pmt");

// Financial model sections
pub const FINANCIAL_REVENUE_MODEL: &str = include_str!("../../prompts/financial-revenue-model.pmt");
pub const FINANCIAL_COST_STRUCTURE: &str = include_str!("../../prompts/financial-cost-structure.pmt");
pub const FINANCIAL_PROJECTIONS: &str = include_str!("../../prompts/financial-projections.pmt");
pub const FINANCIAL_FUNDING_PLAN: &str = include_str!("../../prompts/financial-funding-plan.pmt");

// Legal pack sections
pub const LEGAL_INCORPORATION: &str = include_str!("../../prompts/legal-incorporation.pmt");
pub const LEGAL_FOUNDER_AGREEMENT: &str = include_str!("../../prompts/legal-founder-agreement.pmt");
pub const LEGAL_IP_ASSIGNMENT: &str = include_str!("../../prompts/legal-ip-assignment.pmt");
pub const LEGAL_PRIVACY_POLICY: &str = include_str!("../../prompts/legal-privacy-policy.pmt");

// Roadmap sections
pub const ROADMAP_MILESTONES: &str = include_str!("../../prompts/roadmap-milestones.pmt");
pub const ROADMAP_HIRING_PLAN: &str = include_str!("../../prompts/roadmap-hiring-plan.pmt");
pub const ROADMAP_METRICS: &str = include_str!("../../prompts/roadmap-metrics.pmt");

// Analyst agents
pub const AGENT_VIABILITY: &str = include_str!("../../prompts/agent-viability.pmt");
pub const AGENT_MARKET_SIZE: &str = include_str!("../../prompts/agent-market-size.pmt");
pub const AGENT_COMPETITOR_SCAN: &str = include_str!("../../prompts/agent-competitor-scan.pmt");
pub const AGENT_RISK_ASSESSMENT: &str = include_str!("../../prompts/agent-risk-assessment.pmt");

/// Get an embedded prompt template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "pitch-deck-problem" => Some(PITCH_DECK_PROBLEM),
        "pitch-deck-solution" => Some(PITCH_DECK_SOLUTION),
        "pitch-deck-market" => Some(PITCH_DECK_MARKET),
        "pitch-deck-business-model" => Some(PITCH_DECK_BUSINESS_MODEL),
        "pitch-deck-competition" => Some(PITCH_DECK_COMPETITION),
        "pitch-deck-ask" => Some(PITCH_DECK_ASK),
        "financial-revenue-model" => Some(FINANCIAL_REVENUE_MODEL),
        "financial-cost-structure" => Some(FINANCIAL_COST_STRUCTURE),
        "financial-projections" => Some(FINANCIAL_PROJECTIONS),
        "financial-funding-plan" => Some(FINANCIAL_FUNDING_PLAN),
        "legal-incorporation" => Some(LEGAL_INCORPORATION),
        "legal-founder-agreement" => Some(LEGAL_FOUNDER_AGREEMENT),
        "legal-ip-assignment" => Some(LEGAL_IP_ASSIGNMENT),
        "legal-privacy-policy" => Some(LEGAL_PRIVACY_POLICY),
        "roadmap-milestones" => Some(ROADMAP_MILESTONES),
        "roadmap-hiring-plan" => Some(ROADMAP_HIRING_PLAN),
        "roadmap-metrics" => Some(ROADMAP_METRICS),
        "agent-viability" => Some(AGENT_VIABILITY),
        "agent-market-size" => Some(AGENT_MARKET_SIZE),
        "agent-competitor-scan" => Some(AGENT_COMPETITOR_SCAN),
        "agent-risk-assessment" => Some(AGENT_RISK_ASSESSMENT),
        _ => {
            debug!(%name, "get_embedded: no match found");
            None
        }
    }
}
