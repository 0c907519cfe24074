//! Proposal generation.
//!
//! Runs once per session after the readiness handoff: extract the
//! profile (if not already persisted), generate the proposal content,
//! persist it, and complete the session. Regeneration is idempotent —
//! a session with a stored proposal gets that proposal back.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::model::{MessageRole, SessionFlag, SessionStatus};
use crate::error::{ExtractionError, Result, SessionError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider, ResponseSchema};
use crate::proposal::extractor::ProfileExtractor;
use crate::proposal::model::{BusinessProfile, ProfileRecord, Proposal, ProposalContent};
use crate::store::Database;

const PROPOSAL_SYSTEM_PROMPT: &str = "\
You design AI agent systems for small and medium businesses. Given a structured \
business profile, recommend a concrete agent system: which agents to deploy, what \
each one does, how long implementation takes, and what it requires technically. \
Pick the 'starter' pricing tier for simple single-agent setups and 'pro' for \
multi-agent systems. Ground every recommendation in the profile's stated problems.";

fn proposal_schema() -> ResponseSchema {
    ResponseSchema {
        name: "proposal_recommendation",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pricing_tier": { "type": "string", "enum": ["starter", "pro"] },
                "recommended_agents": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "purpose": { "type": "string" }
                        },
                        "required": ["name", "purpose"],
                        "additionalProperties": false
                    }
                },
                "implementation_timeline": { "type": "string" },
                "estimated_cost": { "type": ["string", "null"] },
                "key_benefits": { "type": "array", "items": { "type": "string" } },
                "technical_requirements": { "type": "array", "items": { "type": "string" } },
                "integration_points": { "type": "array", "items": { "type": "string" } },
                "proposal_summary": { "type": "string" },
                "full_proposal_content": { "type": "string" }
            },
            "required": [
                "pricing_tier",
                "recommended_agents",
                "implementation_timeline",
                "estimated_cost",
                "key_benefits",
                "technical_requirements",
                "integration_points",
                "proposal_summary",
                "full_proposal_content"
            ],
            "additionalProperties": false
        }),
    }
}

/// Render the profile as prompt input.
fn render_profile(profile: &BusinessProfile) -> String {
    let size = profile
        .business_size
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    format!(
        "Business: {name}\nIndustry: {industry}\nSize: {size}\n\
         Main pain points: {pain}\nTime wasters: {time}\nBottlenecks: {bottle}\n\
         Automation opportunities: {auto}\nCustomer service challenges: {cs}",
        name = profile.business_name,
        industry = profile.industry,
        pain = profile.main_pain_points.join("; "),
        time = profile.time_wasters.join("; "),
        bottle = profile.bottlenecks.join("; "),
        auto = profile.automation_opportunities.join("; "),
        cs = profile.customer_service_challenges.join("; "),
    )
}

/// Generates and persists proposals for ready sessions.
pub struct ProposalGenerator {
    db: Arc<dyn Database>,
    llm: Arc<dyn LlmProvider>,
    extractor: ProfileExtractor,
    min_user_messages: usize,
}

impl ProposalGenerator {
    pub fn new(db: Arc<dyn Database>, llm: Arc<dyn LlmProvider>, config: &EngineConfig) -> Self {
        let extractor = ProfileExtractor::new(llm.clone());
        Self {
            db,
            llm,
            extractor,
            min_user_messages: config.min_user_messages,
        }
    }

    /// Generate a proposal for the session, or return the stored one.
    ///
    /// A session can only complete through here once its history has
    /// crossed the readiness floor — the same user-message floor the
    /// classifier gates on, so a never-ready session can never be
    /// extracted. On success the session is marked completed with its
    /// capture fields and the proposal-generated flag set.
    pub async fn generate(&self, session_id: Uuid) -> Result<Proposal> {
        self.db
            .get_session(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))?;

        if let Some(existing) = self.db.get_proposal_by_session(session_id).await? {
            info!(session_id = %session_id, "Proposal already exists, returning stored one");
            return Ok(existing);
        }

        let history = self.db.list_messages(session_id).await?;
        let user_messages = history
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        if user_messages < self.min_user_messages {
            return Err(SessionError::NotReady {
                id: session_id,
                user_messages,
                required: self.min_user_messages,
            }
            .into());
        }

        let record = match self.db.get_profile_by_session(session_id).await? {
            Some(record) => record,
            None => {
                let profile = self.extractor.extract(&history).await?;
                let record = ProfileRecord::new(session_id, profile);
                self.db.create_profile(&record).await?;
                record
            }
        };

        let content = self.generate_content(&record.profile).await?;
        let proposal = Proposal::new(session_id, record.id, content);
        self.db.create_proposal(&proposal).await?;

        self.db
            .update_session_capture(
                session_id,
                &record.profile.business_name,
                &record.profile.industry,
            )
            .await?;
        self.db
            .set_session_flag(session_id, SessionFlag::ProposalGenerated)
            .await?;
        self.db
            .update_session_status(session_id, SessionStatus::Completed, Some(chrono::Utc::now()))
            .await?;

        info!(
            session_id = %session_id,
            tier = proposal.content.pricing_tier.as_str(),
            agents = proposal.content.recommended_agents.len(),
            "Proposal generated"
        );
        Ok(proposal)
    }

    async fn generate_content(&self, profile: &BusinessProfile) -> Result<ProposalContent> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(PROPOSAL_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Business profile:\n{}\n\nDesign the agent system proposal.",
                render_profile(profile)
            )),
        ])
        .with_max_tokens(3000)
        .with_temperature(0.5);

        let value = self.llm.complete_structured(request, proposal_schema()).await?;
        let content: ProposalContent = serde_json::from_value(value)
            .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;

        if content.recommended_agents.is_empty() {
            warn!("Proposal recommends no agents");
        }
        Ok(content)
    }

    /// Record identifiers of externally uploaded artifacts (document
    /// store file, rendered PDF) and the matching session flag.
    pub async fn record_artifacts(
        &self,
        session_id: Uuid,
        drive_file_id: Option<&str>,
        pdf_generated: bool,
    ) -> Result<()> {
        let proposal = self
            .db
            .get_proposal_by_session(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))?;
        self.db
            .set_proposal_artifacts(proposal.id, drive_file_id, pdf_generated)
            .await?;
        if drive_file_id.is_some() {
            self.db
                .set_session_flag(session_id, SessionFlag::ProfileUploaded)
                .await?;
        }
        Ok(())
    }
}
