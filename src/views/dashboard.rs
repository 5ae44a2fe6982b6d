//! Dashboard summary: record counts, money totals and recent activity

use crate::models::{ClientCharge, Currency, Note, PartnerPayment, Project};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Entries taken from the head of each list before merging
const PER_KIND: usize = 3;
/// Entries kept after merging
const ACTIVITY_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Note,
    Project,
    Charge,
    Payment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_notes: usize,
    pub total_projects: usize,
    pub total_client_charges: usize,
    pub total_partner_payments: usize,
    /// Sum of every charge, currency-naive
    pub total_revenue: f64,
    /// Sum of every partner payment, currency-naive
    pub total_expenses: f64,
    pub net_amount: f64,
    /// Newest first
    pub recent_activity: Vec<Activity>,
}

impl DashboardSummary {
    pub fn build(
        notes: &[Note],
        projects: &[Project],
        charges: &[ClientCharge],
        payments: &[PartnerPayment],
    ) -> Self {
        let total_revenue = charges.iter().map(|c| c.amount).sum::<f64>();
        let total_expenses = payments.iter().map(|p| p.amount).sum::<f64>();

        let mut recent_activity: Vec<Activity> = notes
            .iter()
            .take(PER_KIND)
            .map(|n| Activity {
                kind: ActivityKind::Note,
                title: n.title.clone(),
                amount: None,
                currency: None,
                date: n.created_at,
            })
            .chain(projects.iter().take(PER_KIND).map(|p| Activity {
                kind: ActivityKind::Project,
                title: p.name.clone(),
                amount: Some(p.amount),
                currency: Some(p.currency),
                date: p.created_at,
            }))
            .chain(charges.iter().take(PER_KIND).map(|c| Activity {
                kind: ActivityKind::Charge,
                title: money_title("Charge", c.description.as_deref()),
                amount: Some(c.amount),
                currency: Some(c.currency),
                date: c.date,
            }))
            .chain(payments.iter().take(PER_KIND).map(|p| Activity {
                kind: ActivityKind::Payment,
                title: money_title("Payment", p.description.as_deref()),
                amount: Some(p.amount),
                currency: Some(p.currency),
                date: p.date,
            }))
            .collect();
        // Stable: equal dates keep note, project, charge, payment order
        recent_activity.sort_by(|a, b| b.date.cmp(&a.date));
        recent_activity.truncate(ACTIVITY_LEN);

        Self {
            total_notes: notes.len(),
            total_projects: projects.len(),
            total_client_charges: charges.len(),
            total_partner_payments: payments.len(),
            total_revenue,
            total_expenses,
            net_amount: total_revenue - total_expenses,
            recent_activity,
        }
    }
}

fn money_title(label: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("{} - {}", label, d),
        None => format!("{} - No description", label),
    }
}
