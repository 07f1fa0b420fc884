//! Orchestration driver
//!
//! Obtains the orchestrator's actor token once, then mints one delegated
//! token per worker agent: each worker first proves its own identity through
//! the token-exchanger application, then its actor token is fused with the
//! orchestrator's via token exchange into a scope-restricted token.
//!
//! Per-worker failures are isolated; a run ends with a report rather than
//! aborting on the first broken worker. Only the loss of the orchestrator's
//! own token is fatal to the whole run, since no delegation is possible
//! without a subject token.

use crate::error::Result;
use crate::exchange::exchange_downscope;
use crate::flow::get_actor_token;
use crate::identity::{AgentIdentity, ClientApplication};
use crate::provider::ProviderConfig;
use crate::token::{ActorToken, DelegatedToken};
use tracing::{error, info, warn};

/// Outcome of one worker's delegation attempt.
#[derive(Debug)]
pub struct WorkerReport {
    /// Worker agent identifier
    pub agent_id: String,

    /// Exact scope string requested at exchange time
    pub requested_scope: String,

    /// Delegated token, or the failure that stopped this worker
    pub result: Result<DelegatedToken>,
}

/// Aggregate result of one orchestration run.
#[derive(Debug)]
pub struct OrchestrationReport {
    /// The orchestrator's actor token, reused as the subject for every
    /// exchange. Never forwarded to any domain API.
    pub orchestrator_token: ActorToken,

    /// Per-worker outcomes, in configuration order
    pub workers: Vec<WorkerReport>,
}

impl OrchestrationReport {
    /// Number of workers that received a delegated token
    pub fn succeeded(&self) -> usize {
        self.workers.iter().filter(|w| w.result.is_ok()).count()
    }

    /// Number of workers whose delegation failed
    pub fn failed(&self) -> usize {
        self.workers.len() - self.succeeded()
    }
}

/// Sequences actor-token acquisition and downscoping for a set of workers.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    provider: ProviderConfig,
    orchestrator: AgentIdentity,
    orchestrator_app: ClientApplication,
    token_exchanger_app: ClientApplication,
    workers: Vec<AgentIdentity>,
}

impl Orchestrator {
    /// Create a driver with no workers configured yet.
    pub fn new(
        provider: ProviderConfig,
        orchestrator: AgentIdentity,
        orchestrator_app: ClientApplication,
        token_exchanger_app: ClientApplication,
    ) -> Self {
        Self {
            provider,
            orchestrator,
            orchestrator_app,
            token_exchanger_app,
            workers: Vec::new(),
        }
    }

    /// Configure the ordered worker set.
    pub fn with_workers(mut self, workers: Vec<AgentIdentity>) -> Self {
        self.workers = workers;
        self
    }

    /// Append one worker.
    pub fn add_worker(&mut self, worker: AgentIdentity) {
        self.workers.push(worker);
    }

    /// Run the full orchestration.
    ///
    /// Fails outright only when the orchestrator's own actor token cannot
    /// be obtained; everything after that is reported per worker.
    pub async fn run(&self) -> Result<OrchestrationReport> {
        info!(
            orchestrator = %self.orchestrator.agent_id,
            workers = self.workers.len(),
            "starting delegation run"
        );

        let orchestrator_token = get_actor_token(
            &self.provider,
            &self.orchestrator,
            &self.orchestrator_app,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "failed to obtain orchestrator actor token; aborting run");
            e
        })?;

        let mut workers = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            let result = self.delegate(&orchestrator_token, worker).await;
            if let Err(e) = &result {
                warn!(
                    agent_id = %worker.agent_id,
                    error = %e,
                    "worker delegation failed; continuing with remaining workers"
                );
            }
            workers.push(WorkerReport {
                agent_id: worker.agent_id.clone(),
                requested_scope: worker.scope_param(),
                result,
            });
        }

        let report = OrchestrationReport {
            orchestrator_token,
            workers,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "delegation run finished"
        );

        Ok(report)
    }

    /// One worker's pipeline: own actor token, then downscope against the
    /// orchestrator's subject token.
    async fn delegate(
        &self,
        subject: &ActorToken,
        worker: &AgentIdentity,
    ) -> Result<DelegatedToken> {
        let actor = get_actor_token(&self.provider, worker, &self.token_exchanger_app).await?;

        exchange_downscope(
            &self.provider,
            &self.token_exchanger_app,
            subject,
            &actor,
            &worker.scopes,
        )
        .await
    }
}
