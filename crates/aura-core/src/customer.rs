//! # Customers
//!
//! Customer records, analytics recomputed from order history, and RFM
//! scoring for segmentation.
//!
//! ## Analytics Are Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  all orders (open shift + closed shifts)                                │
//! │      │ filter: customer_id matches, status Paid, not training           │
//! │      ▼                                                                  │
//! │  total_spent = Σ total        visit_count = count                       │
//! │  average     = total / count  last_visit  = max(created_at)             │
//! │                                                                         │
//! │  The `analytics` field on Customer is a cached copy of this result,     │
//! │  refreshed by recomputation. It is never incremented in place.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## RFM Scores
//! | Score | Recency (days) | Frequency (visits) | Monetary (spent) |
//! |-------|----------------|--------------------|------------------|
//! | 5     | ≤ 30           | ≥ 20               | ≥ $1000          |
//! | 4     | ≤ 60           | ≥ 10               | ≥ $500           |
//! | 3     | ≤ 90           | ≥ 5                | ≥ $200           |
//! | 2     | ≤ 180          | ≥ 2                | ≥ $50            |
//! | 1     | older / never  | fewer              | less             |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::order::Order;
use crate::types::OrderStatus;

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub analytics: CustomerAnalytics,
}

impl Customer {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    fn matches(&self, needle: &str) -> bool {
        let contains = |s: &str| s.to_lowercase().contains(needle);
        contains(&self.name())
            || self.email.as_deref().is_some_and(contains)
            || self.phone.as_deref().is_some_and(contains)
    }
}

/// Fields supplied when creating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl CustomerDraft {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        CustomerDraft {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..CustomerDraft::default()
        }
    }

    pub fn into_customer(self) -> Customer {
        Customer {
            id: crate::new_id(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            tags: self.tags,
            notes: self.notes,
            created_at: Utc::now(),
            analytics: CustomerAnalytics::default(),
        }
    }
}

/// Partial update. `None` leaves a field as it is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl CustomerPatch {
    pub fn apply(self, customer: &mut Customer) {
        if let Some(v) = self.first_name {
            customer.first_name = v;
        }
        if let Some(v) = self.last_name {
            customer.last_name = v;
        }
        if let Some(v) = self.email {
            customer.email = Some(v);
        }
        if let Some(v) = self.phone {
            customer.phone = Some(v);
        }
        if let Some(v) = self.tags {
            customer.tags = v;
        }
        if let Some(v) = self.notes {
            customer.notes = Some(v);
        }
    }
}

/// Case-insensitive match on full name, email or phone.
pub fn search<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    let needle = query.trim().to_lowercase();
    customers.iter().filter(|c| c.matches(&needle)).collect()
}

// =============================================================================
// Analytics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerAnalytics {
    pub total_spent: Money,
    pub visit_count: u32,
    pub average_order_value: Money,
    pub lifetime_value: Money,
    #[ts(as = "Option<String>")]
    pub last_visit: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub first_visit: Option<DateTime<Utc>>,
}

impl CustomerAnalytics {
    /// Recomputes from scratch over the given orders.
    pub fn compute<'a, I>(customer_id: &str, orders: I) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let mut total_spent = Money::zero();
        let mut visit_count = 0u32;
        let mut last_visit: Option<DateTime<Utc>> = None;
        let mut first_visit: Option<DateTime<Utc>> = None;

        for order in orders.into_iter().filter(|o| {
            o.customer_id.as_deref() == Some(customer_id)
                && o.status == OrderStatus::Paid
                && !o.is_training
        }) {
            total_spent += order.total;
            visit_count += 1;
            last_visit = last_visit.max(Some(order.created_at));
            first_visit = Some(first_visit.map_or(order.created_at, |f| f.min(order.created_at)));
        }

        CustomerAnalytics {
            total_spent,
            visit_count,
            average_order_value: total_spent.divide_rounded(visit_count as i64),
            lifetime_value: total_spent,
            last_visit,
            first_visit,
        }
    }

    /// Whole days since the last visit, `None` if never visited.
    pub fn days_since_last_visit(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_visit.map(|d| (now - d).num_days())
    }
}

// =============================================================================
// RFM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Champions,
    Loyal,
    New,
    AtRisk,
    Lost,
    Potential,
}

impl Segment {
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::Loyal => "Loyal Customers",
            Segment::New => "New Customers",
            Segment::AtRisk => "At Risk",
            Segment::Lost => "Lost",
            Segment::Potential => "Potential",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Vip,
    New,
    Churned,
    AtRisk,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RfmScore {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
    pub segment: Segment,
}

impl RfmScore {
    pub fn from_analytics(analytics: &CustomerAnalytics, now: DateTime<Utc>) -> Self {
        let recency = match analytics.days_since_last_visit(now) {
            Some(d) if d <= 30 => 5,
            Some(d) if d <= 60 => 4,
            Some(d) if d <= 90 => 3,
            Some(d) if d <= 180 => 2,
            _ => 1,
        };
        let frequency = match analytics.visit_count {
            v if v >= 20 => 5,
            v if v >= 10 => 4,
            v if v >= 5 => 3,
            v if v >= 2 => 2,
            _ => 1,
        };
        let monetary = match analytics.total_spent.cents() {
            c if c >= 100_000 => 5,
            c if c >= 50_000 => 4,
            c if c >= 20_000 => 3,
            c if c >= 5_000 => 2,
            _ => 1,
        };
        let segment = if recency >= 4 && frequency >= 4 && monetary >= 4 {
            Segment::Champions
        } else if recency >= 3 && frequency >= 3 && monetary >= 3 {
            Segment::Loyal
        } else if recency >= 4 && frequency <= 2 {
            Segment::New
        } else if recency <= 2 && frequency >= 3 && monetary >= 3 {
            Segment::AtRisk
        } else if recency <= 2 && frequency <= 2 {
            Segment::Lost
        } else {
            Segment::Potential
        };
        RfmScore {
            recency,
            frequency,
            monetary,
            segment,
        }
    }

    /// Sum of the three scores, 3..=15.
    pub fn combined(&self) -> u8 {
        self.recency + self.frequency + self.monetary
    }
}

/// Lifecycle stage from purchase history.
///
/// Customers whose first purchase was within 30 days (or who have none yet)
/// are new, unless already VIP.
pub fn lifecycle_stage(analytics: &CustomerAnalytics, now: DateTime<Utc>) -> LifecycleStage {
    if analytics.lifetime_value.cents() >= 50_000 && analytics.visit_count >= 10 {
        return LifecycleStage::Vip;
    }
    let customer_age = analytics.first_visit.map_or(0, |f| (now - f).num_days());
    if customer_age <= 30 {
        return LifecycleStage::New;
    }
    match analytics.days_since_last_visit(now).unwrap_or(0) {
        d if d > 180 => LifecycleStage::Churned,
        d if d > 90 => LifecycleStage::AtRisk,
        _ => LifecycleStage::Active,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn analytics(visits: u32, spent_cents: i64, last_days_ago: i64, first_days_ago: i64) -> CustomerAnalytics {
        let now = Utc::now();
        CustomerAnalytics {
            total_spent: Money::from_cents(spent_cents),
            visit_count: visits,
            average_order_value: Money::from_cents(spent_cents).divide_rounded(visits as i64),
            lifetime_value: Money::from_cents(spent_cents),
            last_visit: Some(now - Duration::days(last_days_ago)),
            first_visit: Some(now - Duration::days(first_days_ago)),
        }
    }

    #[test]
    fn test_no_visits_scores_lowest_recency() {
        let score = RfmScore::from_analytics(&CustomerAnalytics::default(), Utc::now());
        assert_eq!(score.recency, 1);
        assert_eq!(score.frequency, 1);
        assert_eq!(score.monetary, 1);
        assert_eq!(score.segment, Segment::Lost);
        assert_eq!(score.combined(), 3);
    }

    #[test]
    fn test_segments() {
        let now = Utc::now();
        let champ = RfmScore::from_analytics(&analytics(25, 150_000, 3, 400), now);
        assert_eq!(champ.segment, Segment::Champions);

        let loyal = RfmScore::from_analytics(&analytics(6, 25_000, 80, 400), now);
        assert_eq!(loyal.segment, Segment::Loyal);

        let new = RfmScore::from_analytics(&analytics(1, 1_000, 2, 2), now);
        assert_eq!(new.segment, Segment::New);

        let at_risk = RfmScore::from_analytics(&analytics(12, 60_000, 150, 400), now);
        assert_eq!(at_risk.segment, Segment::AtRisk);

        let potential = RfmScore::from_analytics(&analytics(3, 3_000, 80, 400), now);
        assert_eq!(potential.recency, 3);
        assert_eq!(potential.segment, Segment::Potential);
    }

    #[test]
    fn test_lifecycle() {
        let now = Utc::now();
        assert_eq!(lifecycle_stage(&analytics(10, 50_000, 200, 400), now), LifecycleStage::Vip);
        assert_eq!(lifecycle_stage(&analytics(1, 500, 5, 5), now), LifecycleStage::New);
        assert_eq!(lifecycle_stage(&CustomerAnalytics::default(), now), LifecycleStage::New);
        assert_eq!(lifecycle_stage(&analytics(4, 5_000, 200, 400), now), LifecycleStage::Churned);
        assert_eq!(lifecycle_stage(&analytics(4, 5_000, 120, 400), now), LifecycleStage::AtRisk);
        assert_eq!(lifecycle_stage(&analytics(4, 5_000, 10, 400), now), LifecycleStage::Active);
    }

    #[test]
    fn test_patch_and_search() {
        let mut c = CustomerDraft {
            email: Some("jo@example.com".into()),
            phone: Some("555-0100".into()),
            ..CustomerDraft::new("Jo", "Park")
        }
        .into_customer();
        assert_eq!(c.name(), "Jo Park");

        CustomerPatch {
            last_name: Some("Lee".into()),
            ..CustomerPatch::default()
        }
        .apply(&mut c);
        assert_eq!(c.name(), "Jo Lee");
        assert_eq!(c.email.as_deref(), Some("jo@example.com"));

        let all = vec![c];
        assert_eq!(search(&all, "LEE").len(), 1);
        assert_eq!(search(&all, "0100").len(), 1);
        assert!(search(&all, "smith").is_empty());
    }
}
