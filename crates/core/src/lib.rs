pub mod audit;
pub mod config;
pub mod flows;
pub mod membership;
pub mod pricing;
pub mod session;

pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use flows::{ConversationEngine, ConversationService, ConversationState, Reply, ReplyKind};
pub use membership::{MembershipError, MembershipOracle, StaticMembershipOracle};
pub use pricing::tables::{FoilForm, FoilSize, PricingTables};
pub use pricing::{Estimate, EstimateRequest, HeliumCalculator, PricingError, StandardCalculator};
pub use session::{ConversationKey, Session, SessionStore};
