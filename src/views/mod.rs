//! Read-only views computed from cache contents
//!
//! Everything here is recomputed from scratch on each call; nothing is
//! memoized.

mod aggregates;
mod dashboard;

pub use aggregates::{
    project_charge_views, project_payment_views, ProjectChargesView, ProjectPaymentsView,
    RECENT_DEFAULT,
};
pub use dashboard::{Activity, ActivityKind, DashboardSummary};

use crate::cache::Stores;

impl Stores {
    /// Dashboard summary over the current cache contents
    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary::build(
            &self.notes.records(),
            &self.projects.records(),
            &self.charges.records(),
            &self.payments.records(),
        )
    }

    pub fn project_charges(&self, project_id: &str) -> Option<ProjectChargesView> {
        let project = self.projects.find(project_id)?;
        Some(ProjectChargesView::build(&project, &self.charges.records()))
    }

    pub fn project_payments(&self, project_id: &str) -> Option<ProjectPaymentsView> {
        let project = self.projects.find(project_id)?;
        Some(ProjectPaymentsView::build(
            &project,
            &self.payments.records(),
            &self.charges.records(),
        ))
    }
}
