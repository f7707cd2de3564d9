//! Service layer: the reconciliation pipeline and the operations built on it.

pub mod agent_reconciler;
pub mod agent_service;
pub mod annotation_projector;
pub mod identity_locks;
pub mod parameter_materializer;
pub mod reference_resolver;
pub mod tool_skill_validator;

pub use agent_reconciler::AgentReconciler;
pub use agent_service::AgentService;
pub use annotation_projector::AnnotationProjector;
pub use identity_locks::{IdentityGuard, IdentityLocks};
pub use parameter_materializer::{MaterializedParameters, ParameterMaterializer};
pub use reference_resolver::{ReferenceResolver, ResolvedEngine, ResolverSettings};
pub use tool_skill_validator::ToolSkillValidator;
