//! Money-carrying records: client charges and partner payments

use super::{impl_entity, impl_list_filters, EntityKind, Paging};
use crate::api::query::QueryParams;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ars,
    Usd,
    Eur,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ars => write!(f, "ARS"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ARS" => Ok(Self::Ars),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    #[default]
    Transfer,
    Card,
    Check,
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Transfer => write!(f, "transfer"),
            Self::Card => write!(f, "card"),
            Self::Check => write!(f, "check"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            "card" => Ok(Self::Card),
            "check" => Ok(Self::Check),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

// ============================================================================
// Client charges
// ============================================================================

/// Money received from a client against a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCharge {
    pub id: String,
    pub project_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChargeDraft {
    pub project_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClientChargeDraft {
    pub fn is_submittable(&self) -> bool {
        !super::is_blank(&self.project_id) && super::is_valid_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChargePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Amount and date bounds shared by both money filters
#[derive(Debug, Clone, Default)]
pub struct MoneyFilters {
    pub project_id: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub currency: Option<Currency>,
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MoneyFilters {
    fn push_into(&self, params: &mut QueryParams) {
        params.push_str("projectId", self.project_id.as_deref());
        params.push("minAmount", self.min_amount);
        params.push("maxAmount", self.max_amount);
        params.push("currency", self.currency);
        params.push("paymentMethod", self.payment_method);
        params.push_str("description", self.description.as_deref());
        params.push_date("startDate", self.start_date);
        params.push_date("endDate", self.end_date);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientChargeFilters {
    pub paging: Paging,
    pub money: MoneyFilters,
}

impl_entity!(
    ClientCharge,
    EntityKind::ClientCharge,
    ClientChargeDraft,
    ClientChargePatch,
    ClientChargeFilters
);

impl_list_filters!(ClientChargeFilters, |f, params| {
    f.money.push_into(params);
});

// ============================================================================
// Partner payments
// ============================================================================

/// Money paid out to a partner from a project's collected charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPayment {
    pub id: String,
    pub project_id: String,
    pub partner_name: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPaymentDraft {
    pub project_id: String,
    pub partner_name: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PartnerPaymentDraft {
    pub fn is_submittable(&self) -> bool {
        !super::is_blank(&self.project_id)
            && !super::is_blank(&self.partner_name)
            && super::is_valid_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PartnerPaymentFilters {
    pub paging: Paging,
    pub partner_name: Option<String>,
    pub money: MoneyFilters,
}

impl_entity!(
    PartnerPayment,
    EntityKind::PartnerPayment,
    PartnerPaymentDraft,
    PartnerPaymentPatch,
    PartnerPaymentFilters
);

impl_list_filters!(PartnerPaymentFilters, |f, params| {
    params.push_str("partnerName", f.partner_name.as_deref());
    f.money.push_into(params);
});
