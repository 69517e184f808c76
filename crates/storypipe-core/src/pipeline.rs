//! Story pipeline composition.
//!
//! One story flows through one agent at a time, strictly sequentially —
//! there is no fan-out and no concurrent tool invocation. Every handoff
//! is validated against the shared edge table before the next agent
//! runs, and every step is recorded as an event in the project ledger
//! together with the contract digest at that point.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use storypipe_state::{
    AccuracyMetric, InteractionRecord, MetricsStore, ProjectLedger, StakeholderStore, StoryEvent,
    StoryStatus,
};

use crate::agents::{
    DeveloperAgent, GameDesignerAgent, PipelineAgent, ProjectManagerAgent, QaTesterAgent,
    QualityReviewerAgent, TestEngineerAgent,
};
use crate::config::PipelineConfig;
use crate::domain::contract::Contract;
use crate::domain::error::{PipelineError, Result};
use crate::domain::payload::FeatureRequest;
use crate::domain::stage::AgentId;
use crate::validator::ContractValidator;

/// One stage transition in the trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTrace {
    /// The stage that produced the contract.
    pub stage: AgentId,
    /// Where the contract was routed.
    pub target: AgentId,
    /// Digest of the produced contract.
    pub contract_digest: String,
}

/// Final outcome of one story run.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryOutcome {
    pub story_id: String,
    pub approved: bool,
    /// `deployment` when approved, `developer` when the story ran out of
    /// rework cycles.
    pub final_target: AgentId,
    pub rework_cycles: u32,
    pub trail: Vec<StageTrace>,
    pub duration_ms: u64,
}

/// The assembled pipeline.
pub struct StoryPipeline {
    validator: ContractValidator,
    config: PipelineConfig,
    ledger: Arc<dyn ProjectLedger>,
    stakeholders: Option<Arc<dyn StakeholderStore>>,
    metrics: Option<Arc<dyn MetricsStore>>,
    project_manager: ProjectManagerAgent,
    game_designer: GameDesignerAgent,
    developer: DeveloperAgent,
    test_engineer: TestEngineerAgent,
    qa_tester: QaTesterAgent,
    quality_reviewer: QualityReviewerAgent,
}

impl StoryPipeline {
    pub fn new(config: PipelineConfig, ledger: Arc<dyn ProjectLedger>) -> Self {
        let thresholds = config.thresholds.clone();
        Self {
            validator: ContractValidator::new(),
            ledger,
            stakeholders: None,
            metrics: None,
            project_manager: ProjectManagerAgent::new(thresholds.clone()),
            game_designer: GameDesignerAgent::new(thresholds.clone()),
            developer: DeveloperAgent::new(thresholds.clone()),
            test_engineer: TestEngineerAgent::new(thresholds.clone()),
            qa_tester: QaTesterAgent::new(thresholds.clone()),
            quality_reviewer: QualityReviewerAgent::new(thresholds),
            config,
        }
    }

    /// Record stakeholder interactions as stories finish.
    pub fn with_stakeholder_store(mut self, store: Arc<dyn StakeholderStore>) -> Self {
        self.stakeholders = Some(store);
        self
    }

    /// Record estimate-accuracy metrics as stories finish.
    pub fn with_metrics_store(mut self, store: Arc<dyn MetricsStore>) -> Self {
        self.metrics = Some(store);
        self
    }

    fn agent_for(&self, stage: AgentId) -> Option<&dyn PipelineAgent> {
        match stage {
            AgentId::ProjectManager => Some(&self.project_manager),
            AgentId::GameDesigner => Some(&self.game_designer),
            AgentId::Developer => Some(&self.developer),
            AgentId::TestEngineer => Some(&self.test_engineer),
            AgentId::QaTester => Some(&self.qa_tester),
            AgentId::QualityReviewer => Some(&self.quality_reviewer),
            AgentId::Deployment => None,
        }
    }

    /// Run one feature request through the whole pipeline.
    #[instrument(skip(self, feature), fields(stakeholder = ?feature.requested_by))]
    pub async fn run_story(&self, feature: &FeatureRequest) -> Result<StoryOutcome> {
        let started = std::time::Instant::now();

        info!(
            timeout_secs = self.config.timeout_secs,
            max_rework_cycles = self.config.max_rework_cycles,
            "starting story run"
        );

        // Project manager intake: the only stage fed by a raw feature
        // request instead of a contract.
        let mut contract = self
            .project_manager
            .process_feature(feature)
            .await
            .map_err(|e| e.in_stage("pending", AgentId::ProjectManager))?;

        let story_id = contract.story_id.clone();
        let feature_digest = feature_digest(feature);
        self.ledger
            .create_story(&story_id, &feature_digest, feature.requested_by.clone())
            .await?;

        let estimated_effort = contract.output_specifications.deliverable_data
            ["estimated_effort_hours"]
            .as_f64();

        let mut recorder = EventRecorder::new(self.ledger.clone(), story_id.clone());
        let mut trail = vec![StageTrace {
            stage: AgentId::ProjectManager,
            target: contract.target_agent,
            contract_digest: contract.digest(),
        }];
        recorder
            .record(
                "stage_completed",
                serde_json::json!({
                    "stage": AgentId::ProjectManager,
                    "target": contract.target_agent,
                    "digest": contract.digest(),
                }),
            )
            .await?;

        let mut rework_cycles = 0u32;

        let approved = loop {
            if contract.target_agent == AgentId::Deployment {
                break true;
            }

            let stage = contract.target_agent;
            let Some(agent) = self.agent_for(stage) else {
                break false;
            };

            self.accept_handoff(&mut recorder, &contract).await?;

            recorder
                .record("stage_started", serde_json::json!({ "stage": stage }))
                .await?;

            let gates_before = contract.quality_gates.clone();
            let output = match agent.process_contract(&contract).await {
                Ok(output) => output,
                Err(e) => {
                    let err = e.in_stage(&story_id, stage);
                    recorder
                        .record(
                            "stage_failed",
                            serde_json::json!({ "stage": stage, "error": err.to_string() }),
                        )
                        .await?;
                    self.ledger
                        .finish_story(&story_id, StoryStatus::Failed, rework_cycles)
                        .await?;
                    return Err(err);
                }
            };

            check_gates_append_only(&gates_before, &output);

            recorder
                .record(
                    "stage_completed",
                    serde_json::json!({
                        "stage": stage,
                        "target": output.target_agent,
                        "digest": output.digest(),
                    }),
                )
                .await?;
            trail.push(StageTrace {
                stage,
                target: output.target_agent,
                contract_digest: output.digest(),
            });
            contract = output;

            // Reviewer rejection: loop back to the developer while rework
            // budget remains.
            if contract.source_agent == AgentId::QualityReviewer
                && contract.target_agent == AgentId::Developer
            {
                if rework_cycles >= self.config.max_rework_cycles {
                    break false;
                }
                rework_cycles += 1;
                recorder
                    .record(
                        "rework_started",
                        serde_json::json!({ "cycle": rework_cycles }),
                    )
                    .await?;
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let final_target = contract.target_agent;

        if approved {
            recorder
                .record(
                    "story_approved",
                    serde_json::json!({ "digest": contract.digest() }),
                )
                .await?;
            self.ledger
                .finish_story(&story_id, StoryStatus::Approved, rework_cycles)
                .await?;
            info!(%story_id, rework_cycles, "story approved for deployment");
        } else {
            recorder
                .record(
                    "story_rejected",
                    serde_json::json!({ "digest": contract.digest() }),
                )
                .await?;
            self.ledger
                .finish_story(&story_id, StoryStatus::Rejected, rework_cycles)
                .await?;
            info!(%story_id, rework_cycles, "story rejected after rework budget exhausted");
        }

        self.record_collaborators(feature, &story_id, approved, rework_cycles, estimated_effort)
            .await?;

        Ok(StoryOutcome {
            story_id,
            approved,
            final_target,
            rework_cycles,
            trail,
            duration_ms,
        })
    }

    /// Validate a contract at the handoff boundary. A contract that does
    /// not validate or travels a forbidden edge stops the story.
    async fn accept_handoff(
        &self,
        recorder: &mut EventRecorder,
        contract: &Contract,
    ) -> Result<()> {
        let report = self.validator.validate_contract(&contract.to_value());
        if !report.is_valid {
            return Err(PipelineError::BusinessLogic {
                story_id: contract.story_id.clone(),
                detail: format!("handoff rejected: {}", report.errors.join("; ")),
            });
        }
        recorder
            .record(
                "handoff_accepted",
                serde_json::json!({
                    "from": contract.source_agent,
                    "to": contract.target_agent,
                    "digest": contract.digest(),
                }),
            )
            .await?;
        Ok(())
    }

    /// Post-run bookkeeping against the collaborator stores, when wired.
    async fn record_collaborators(
        &self,
        feature: &FeatureRequest,
        story_id: &str,
        approved: bool,
        rework_cycles: u32,
        estimated_effort: Option<f64>,
    ) -> Result<()> {
        if let (Some(store), Some(stakeholder_id)) = (&self.stakeholders, &feature.requested_by) {
            store
                .record_interaction(InteractionRecord {
                    stakeholder_id: stakeholder_id.clone(),
                    story_id: story_id.to_string(),
                    kind: if approved {
                        "story_approved".to_string()
                    } else {
                        "story_rejected".to_string()
                    },
                    notes: None,
                    occurred_at: Utc::now(),
                })
                .await?;
        }

        if let (Some(store), Some(predicted)) = (&self.metrics, estimated_effort) {
            // Every rework cycle doubles the effort actually spent.
            let actual = predicted * (1.0 + rework_cycles as f64);
            store
                .record_accuracy(AccuracyMetric {
                    story_id: story_id.to_string(),
                    metric: "estimated_effort_hours".to_string(),
                    predicted,
                    actual,
                    recorded_at: Utc::now(),
                })
                .await?;
        }

        Ok(())
    }
}

/// Gates are meant to be append-only across the pipeline. This is not
/// enforced as an error anywhere in the contract schema, so a dropped
/// gate is surfaced as a warning only.
fn check_gates_append_only(before: &[String], output: &Contract) {
    for gate in before {
        if !output.quality_gates.contains(gate) {
            warn!(
                story_id = %output.story_id,
                stage = %output.source_agent,
                gate = %gate,
                "predecessor quality gate dropped from contract"
            );
        }
    }
}

fn feature_digest(feature: &FeatureRequest) -> String {
    use sha2::Digest as _;
    let bytes = serde_json::to_vec(feature).expect("feature serialization is infallible");
    hex::encode(sha2::Sha256::digest(&bytes))
}

/// Sequenced event appends for one story.
struct EventRecorder {
    ledger: Arc<dyn ProjectLedger>,
    story_id: String,
    seq: u64,
}

impl EventRecorder {
    fn new(ledger: Arc<dyn ProjectLedger>, story_id: String) -> Self {
        Self {
            ledger,
            story_id,
            seq: 0,
        }
    }

    async fn record(&mut self, kind: &str, payload: serde_json::Value) -> Result<()> {
        self.seq += 1;
        self.ledger
            .append_event(
                &self.story_id,
                StoryEvent {
                    seq: self.seq,
                    kind: kind.to_string(),
                    payload,
                    timestamp: Utc::now(),
                },
            )
            .await?;
        Ok(())
    }
}
