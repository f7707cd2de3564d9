//! Annotation keys shared with other tooling. These strings are a stable
//! wire contract.

/// Dashboard icon, copied from the engine or model.
pub const DASHBOARD_ICON_ANNOTATION: &str = "ark.mckinsey.com/dashboard-icon";
/// Service the agent is exposed through.
pub const SERVICE_ANNOTATION: &str = "ark.mckinsey.com/service";
/// Compact JSON of the resolved references.
pub const RESOURCES_ANNOTATION: &str = "ark.mckinsey.com/resources";

/// Address of the external A2A server.
pub const A2A_SERVER_ADDRESS_ANNOTATION: &str = "a2a.server/address";

/// Keys the projector owns and rewrites on every pass.
pub const MANAGED_ANNOTATIONS: [&str; 3] = [
    SERVICE_ANNOTATION,
    RESOURCES_ANNOTATION,
    A2A_SERVER_ADDRESS_ANNOTATION,
];
