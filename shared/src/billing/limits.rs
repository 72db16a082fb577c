//! Free-plan resource caps
//!
//! After a downgrade, resources beyond the cap are marked inactive instead of
//! being deleted, so an upgrade brings them back untouched.

use super::{PlanType, ResourceType};

/// Per-type resource cap on the free plan
pub const FREE_PLAN_LIMITS: [(ResourceType, usize); 3] = [
    (ResourceType::Tariffs, 3),
    (ResourceType::Budgets, 5),
    (ResourceType::Users, 1),
];

/// Free-plan cap for a resource type
pub fn free_limit(resource_type: ResourceType) -> usize {
    match resource_type {
        ResourceType::Tariffs => 3,
        ResourceType::Budgets => 5,
        ResourceType::Users => 1,
    }
}

/// Whether the resource at zero-based `index` (ordered by creation) exceeds
/// the cap of its type under `current_plan`.
///
/// Only the free plan has caps. Callers pass the *effective* plan from the
/// policy decision, which is already forced to free for canceled/past-due.
pub fn should_mark_resource_inactive(
    index: usize,
    resource_type: ResourceType,
    current_plan: PlanType,
) -> bool {
    current_plan == PlanType::Free && index >= free_limit(resource_type)
}
