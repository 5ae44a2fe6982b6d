//! Projects: the billable unit charges and payments hang off

use super::{impl_entity, impl_list_filters, ClientCharge, Currency, EntityKind, Paging, PartnerPayment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
    Pending,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::OnHold => write!(f, "on-hold"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "on-hold" => Ok(Self::OnHold),
            "cancelled" => Ok(Self::Cancelled),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Nominal contract amount, in `currency`
    pub amount: f64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub amount: f64,
    pub currency: Currency,
}

impl ProjectDraft {
    pub fn is_submittable(&self) -> bool {
        !super::is_blank(&self.name) && super::is_valid_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilters {
    pub paging: Paging,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl_entity!(Project, EntityKind::Project, ProjectDraft, ProjectPatch, ProjectFilters);

impl_list_filters!(ProjectFilters, |f, params| {
    params.push_str("name", f.name.as_deref());
    params.push_str("description", f.description.as_deref());
    params.push("status", f.status);
});

/// Aggregate computed by the backend for `GET /projects/:id/with-charges`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub client_charges: Vec<ClientCharge>,
    #[serde(default)]
    pub partner_payments: Vec<PartnerPayment>,
    pub total_client_charges: f64,
    pub total_partner_payments: f64,
    pub net_amount: f64,
}
