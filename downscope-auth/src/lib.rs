//! # downscope-auth: delegated token orchestration for autonomous agents
//!
//! Issues narrowly-scoped, delegated access tokens to worker agents acting
//! on behalf of an orchestrating identity. Each worker proves its own
//! identity through a three-step handshake; its actor token is then fused
//! with the orchestrator's session via RFC 8693 token exchange into a
//! downscoped token. The orchestrator's full-privilege token is never
//! forwarded to any domain API.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  ORCHESTRATOR AGENT                                  │
//! │  3-step handshake via Orchestrator application       │
//! │  -> orchestrator actor token (subject)               │
//! └──────────────────────────────────────────────────────┘
//!                        ↓  per worker
//! ┌──────────────────────────────────────────────────────┐
//! │  WORKER AGENT                                        │
//! │  3-step handshake via Token-Exchanger application    │
//! │  -> worker actor token (actor)                       │
//! └──────────────────────────────────────────────────────┘
//!                        ↓
//! ┌──────────────────────────────────────────────────────┐
//! │  TOKEN EXCHANGE (RFC 8693)                           │
//! │  subject + actor + worker scopes -> delegated token  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The core is a stateless per-invocation protocol driver: no token cache,
//! no retries. Callers layer retry policy around whole-flow invocations.

#![warn(missing_docs)]

pub mod claims;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod identity;
pub mod orchestrator;
pub mod pkce;
pub mod provider;
pub mod token;

// Re-exports for convenience
pub use claims::decode_claims;
pub use error::{AuthError, Result};
pub use exchange::{exchange_downscope, GRANT_TYPE_TOKEN_EXCHANGE, TOKEN_TYPE_ACCESS_TOKEN};
pub use flow::{get_actor_token, FlowState};
pub use identity::{AgentIdentity, ClientApplication};
pub use orchestrator::{OrchestrationReport, Orchestrator, WorkerReport};
pub use pkce::PkcePair;
pub use provider::ProviderConfig;
pub use token::{ActorToken, DelegatedToken};
