//! Business profile and proposal data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rough size classification of a business.
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
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }
}

/// Structured business profile extracted once, in full, from the
/// terminal message history of a session.
///
/// The schema is closed: all five list fields are always present
/// (possibly empty) and the extractor must not invent extra fields —
/// `deny_unknown_fields` rejects any it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessProfile {
    pub business_name: String,
    pub industry: String,
    pub business_size: Option<BusinessSize>,
    pub main_pain_points: Vec<String>,
    pub time_wasters: Vec<String>,
    pub bottlenecks: Vec<String>,
    pub automation_opportunities: Vec<String>,
    pub customer_service_challenges: Vec<String>,
}

/// A persisted business profile row (at most one per session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub profile: BusinessProfile,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn new(session_id: Uuid, profile: BusinessProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            profile,
            created_at: Utc::now(),
        }
    }
}

/// Pricing tier recommended by the proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
    Starter,
    Pro,
}

impl PricingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pro" => Self::Pro,
            _ => Self::Starter,
        }
    }
}

/// One recommended agent in a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAgent {
    pub name: String,
    pub purpose: String,
}

/// Generated proposal content. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposalContent {
    pub pricing_tier: PricingTier,
    pub recommended_agents: Vec<RecommendedAgent>,
    pub implementation_timeline: String,
    pub estimated_cost: Option<String>,
    pub key_benefits: Vec<String>,
    pub technical_requirements: Vec<String>,
    pub integration_points: Vec<String>,
    pub proposal_summary: String,
    pub full_proposal_content: String,
}

/// A persisted proposal. The content is immutable; only the
/// externally-uploaded-artifact fields may be recorded afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub session_id: Uuid,
    pub profile_id: Uuid,
    pub content: ProposalContent,
    pub drive_file_id: Option<String>,
    pub pdf_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(session_id: Uuid, profile_id: Uuid, content: ProposalContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            profile_id,
            content,
            drive_file_id: None,
            pdf_generated: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_rejects_extra_fields() {
        let raw = serde_json::json!({
            "business_name": "Acme Cleaning",
            "industry": "services",
            "business_size": "small",
            "main_pain_points": [],
            "time_wasters": [],
            "bottlenecks": [],
            "automation_opportunities": [],
            "customer_service_challenges": [],
            "invented_field": "nope"
        });
        let result: Result<BusinessProfile, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn profile_requires_all_list_fields() {
        let raw = serde_json::json!({
            "business_name": "Acme Cleaning",
            "industry": "services",
            "business_size": null,
            "main_pain_points": ["scheduling chaos"]
        });
        let result: Result<BusinessProfile, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn profile_accepts_null_business_size() {
        let raw = serde_json::json!({
            "business_name": "Acme Cleaning",
            "industry": "services",
            "business_size": null,
            "main_pain_points": [],
            "time_wasters": [],
            "bottlenecks": [],
            "automation_opportunities": [],
            "customer_service_challenges": []
        });
        let profile: BusinessProfile = serde_json::from_value(raw).unwrap();
        assert!(profile.business_size.is_none());
    }

    #[test]
    fn business_size_roundtrip() {
        for size in [BusinessSize::Small, BusinessSize::Medium, BusinessSize::Large] {
            assert_eq!(BusinessSize::parse(size.as_str()), Some(size));
        }
        assert_eq!(BusinessSize::parse("enterprise"), None);
    }

    #[test]
    fn pricing_tier_defaults_to_starter_on_unknown() {
        assert_eq!(PricingTier::parse("pro"), PricingTier::Pro);
        assert_eq!(PricingTier::parse("unknown"), PricingTier::Starter);
    }
}
