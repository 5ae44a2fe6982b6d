//! Per-project joins of the project, charge and payment caches

use crate::models::{ClientCharge, Currency, PartnerPayment, Project};
use serde::Serialize;
use tracing::warn;

/// Number of entries `recent()` shows by default
pub const RECENT_DEFAULT: usize = 3;

/// A project with the client charges recorded against it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChargesView {
    pub project: Project,
    /// In cache order
    pub charges: Vec<ClientCharge>,
    pub total_charged: f64,
    /// Project amount minus everything charged so far
    pub remaining: f64,
    /// False when some charge is in another currency than the project
    pub currencies_consistent: bool,
}

impl ProjectChargesView {
    pub fn build(project: &Project, charges: &[ClientCharge]) -> Self {
        let charges: Vec<ClientCharge> = charges
            .iter()
            .filter(|c| c.project_id == project.id)
            .cloned()
            .collect();
        let total_charged = charges.iter().map(|c| c.amount).sum::<f64>();
        let currencies_consistent =
            check_currencies(project, charges.iter().map(|c| c.currency), "charges");

        Self {
            remaining: project.amount - total_charged,
            project: project.clone(),
            charges,
            total_charged,
            currencies_consistent,
        }
    }

    /// First `n` charges in cache order (no sorting)
    pub fn recent(&self, n: usize) -> &[ClientCharge] {
        &self.charges[..n.min(self.charges.len())]
    }
}

/// A project with its partner payments and the cash still available to pay out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPaymentsView {
    pub project: Project,
    pub payments: Vec<PartnerPayment>,
    pub total_paid: f64,
    pub total_charged: f64,
    /// Charged minus paid
    pub available: f64,
    pub currencies_consistent: bool,
}

impl ProjectPaymentsView {
    pub fn build(project: &Project, payments: &[PartnerPayment], charges: &[ClientCharge]) -> Self {
        let payments: Vec<PartnerPayment> = payments
            .iter()
            .filter(|p| p.project_id == project.id)
            .cloned()
            .collect();
        let project_charges = charges.iter().filter(|c| c.project_id == project.id);

        let total_paid = payments.iter().map(|p| p.amount).sum::<f64>();
        let total_charged = project_charges.clone().map(|c| c.amount).sum::<f64>();
        let currencies_consistent = check_currencies(
            project,
            payments
                .iter()
                .map(|p| p.currency)
                .chain(project_charges.map(|c| c.currency)),
            "payments",
        );

        Self {
            project: project.clone(),
            payments,
            total_paid,
            total_charged,
            available: total_charged - total_paid,
            currencies_consistent,
        }
    }

    pub fn recent(&self, n: usize) -> &[PartnerPayment] {
        &self.payments[..n.min(self.payments.len())]
    }
}

/// Charge view for every project, in project cache order
pub fn project_charge_views(
    projects: &[Project],
    charges: &[ClientCharge],
) -> Vec<ProjectChargesView> {
    projects
        .iter()
        .map(|p| ProjectChargesView::build(p, charges))
        .collect()
}

/// Payment view for every project, in project cache order
pub fn project_payment_views(
    projects: &[Project],
    payments: &[PartnerPayment],
    charges: &[ClientCharge],
) -> Vec<ProjectPaymentsView> {
    projects
        .iter()
        .map(|p| ProjectPaymentsView::build(p, payments, charges))
        .collect()
}

/// Amounts are summed as raw numbers; a mismatch is only reported.
fn check_currencies(
    project: &Project,
    currencies: impl Iterator<Item = Currency>,
    what: &'static str,
) -> bool {
    let mut mismatched: Vec<Currency> = currencies.filter(|c| *c != project.currency).collect();
    if mismatched.is_empty() {
        return true;
    }
    mismatched.dedup();
    warn!(
        project = %project.id,
        expected = %project.currency,
        found = ?mismatched,
        what,
        "mixed currencies summed without conversion"
    );
    false
}
