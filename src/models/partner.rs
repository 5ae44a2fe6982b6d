//! Partners: the people payouts are made to

use super::{impl_entity, impl_list_filters, EntityKind, Paging};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PartnerRole {
    Owner,
    #[default]
    Collaborator,
}

impl fmt::Display for PartnerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Collaborator => write!(f, "collaborator"),
        }
    }
}

impl FromStr for PartnerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "collaborator" => Ok(Self::Collaborator),
            _ => Err(format!("Unknown partner role: {}", s)),
        }
    }
}

/// Function a partner covers inside the company
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PistechRole {
    Developer,
    Designer,
    Manager,
    Rrhh,
    Accountant,
    Marketing,
    Sales,
    #[default]
    Other,
}

impl fmt::Display for PistechRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Developer => write!(f, "developer"),
            Self::Designer => write!(f, "designer"),
            Self::Manager => write!(f, "manager"),
            Self::Rrhh => write!(f, "rrhh"),
            Self::Accountant => write!(f, "accountant"),
            Self::Marketing => write!(f, "marketing"),
            Self::Sales => write!(f, "sales"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for PistechRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "developer" => Ok(Self::Developer),
            "designer" => Ok(Self::Designer),
            "manager" => Ok(Self::Manager),
            "rrhh" => Ok(Self::Rrhh),
            "accountant" => Ok(Self::Accountant),
            "marketing" => Ok(Self::Marketing),
            "sales" => Ok(Self::Sales),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown company role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: String,
    pub full_name: String,
    pub nickname: String,
    /// Contact phone number
    pub number: String,
    pub partner_role: PartnerRole,
    pub pistech_role: PistechRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDraft {
    pub full_name: String,
    pub nickname: String,
    pub number: String,
    pub partner_role: PartnerRole,
    pub pistech_role: PistechRole,
}

impl PartnerDraft {
    pub fn is_submittable(&self) -> bool {
        !super::is_blank(&self.full_name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_role: Option<PartnerRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pistech_role: Option<PistechRole>,
}

#[derive(Debug, Clone, Default)]
pub struct PartnerFilters {
    pub paging: Paging,
    pub full_name: Option<String>,
    pub nickname: Option<String>,
    pub partner_role: Option<PartnerRole>,
    pub pistech_role: Option<PistechRole>,
}

impl_entity!(Partner, EntityKind::Partner, PartnerDraft, PartnerPatch, PartnerFilters);

impl_list_filters!(PartnerFilters, |f, params| {
    params.push_str("fullName", f.full_name.as_deref());
    params.push_str("nickname", f.nickname.as_deref());
    params.push("partnerRole", f.partner_role);
    params.push("pistechRole", f.pistech_role);
});
