//! Customer records and their analytics.
//!
//! Analytics are never incremented. Each read scans the order history of
//! every shift; the `analytics` field on a customer is the last such scan,
//! refreshed whenever an order touching that customer is written.

use chrono::Utc;
use tracing::{debug, info};

use super::{refuse, PosStore};
use crate::customer::{
    self, lifecycle_stage, Customer, CustomerAnalytics, CustomerDraft, CustomerPatch,
    LifecycleStage, RfmScore,
};
use crate::error::{CoreError, CoreResult, ValidationError};

impl PosStore {
    pub fn add_customer(&mut self, draft: CustomerDraft) -> CoreResult<&Customer> {
        if draft.first_name.trim().is_empty() && draft.last_name.trim().is_empty() {
            return refuse(
                ValidationError::Required {
                    field: "name".to_string(),
                }
                .into(),
            );
        }
        let customer = draft.into_customer();
        info!(customer_id = %customer.id, name = %customer.name(), "customer added");
        self.customers.push(customer);
        let idx = self.customers.len() - 1;
        Ok(&self.customers[idx])
    }

    pub fn update_customer(&mut self, customer_id: &str, patch: CustomerPatch) -> CoreResult<&Customer> {
        let Some(customer) = self.customers.iter_mut().find(|c| c.id == customer_id) else {
            return refuse(CoreError::CustomerNotFound(customer_id.to_string()));
        };
        patch.apply(customer);
        debug!(customer_id, "customer updated");
        Ok(&*customer)
    }

    /// Deletes a customer and detaches them from the active cart. Past
    /// orders keep the id.
    pub fn delete_customer(&mut self, customer_id: &str) -> CoreResult<Customer> {
        let Some(idx) = self.customers.iter().position(|c| c.id == customer_id) else {
            return refuse(CoreError::CustomerNotFound(customer_id.to_string()));
        };
        if self.cart.customer_id.as_deref() == Some(customer_id) {
            self.cart.customer_id = None;
        }
        info!(customer_id, "customer deleted");
        Ok(self.customers.remove(idx))
    }

    pub fn customer(&self, customer_id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == customer_id)
    }

    pub fn search_customers(&self, query: &str) -> Vec<&Customer> {
        customer::search(&self.customers, query)
    }

    /// Fresh analytics from every shift's orders.
    pub fn customer_analytics(&self, customer_id: &str) -> CoreResult<CustomerAnalytics> {
        if self.customer(customer_id).is_none() {
            return refuse(CoreError::CustomerNotFound(customer_id.to_string()));
        }
        Ok(CustomerAnalytics::compute(customer_id, self.all_orders()))
    }

    pub fn customer_rfm(&self, customer_id: &str) -> CoreResult<RfmScore> {
        let analytics = self.customer_analytics(customer_id)?;
        Ok(RfmScore::from_analytics(&analytics, Utc::now()))
    }

    pub fn customer_lifecycle(&self, customer_id: &str) -> CoreResult<LifecycleStage> {
        let analytics = self.customer_analytics(customer_id)?;
        Ok(lifecycle_stage(&analytics, Utc::now()))
    }

    /// Rewrites the cached analytics snapshot for one customer.
    pub(crate) fn refresh_customer_analytics(&mut self, customer_id: &str) {
        let analytics = CustomerAnalytics::compute(customer_id, self.all_orders());
        if let Some(customer) = self.customers.iter_mut().find(|c| c.id == customer_id) {
            customer.analytics = analytics;
            debug!(
                customer_id,
                visits = analytics.visit_count,
                total_spent = %analytics.total_spent,
                "customer analytics refreshed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::customer::Segment;
    use crate::money::Money;
    use crate::order::{CheckoutRequest, PaymentLine};

    fn buy_fries_for(store: &mut PosStore, customer_id: &str) -> crate::order::Order {
        store.set_customer(Some(customer_id)).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        store
            .checkout(CheckoutRequest::new(vec![PaymentLine::card(
                Money::from_cents(378),
                "4242",
            )]))
            .unwrap()
    }

    #[test]
    fn test_crud_and_search() {
        let mut store = open_store();
        assert!(store.add_customer(CustomerDraft::new(" ", "")).is_err());

        let mut draft = CustomerDraft::new("Grace", "Hopper");
        draft.email = Some("grace@navy.mil".into());
        let id = store.add_customer(draft).unwrap().id.clone();
        store.add_customer(CustomerDraft::new("Alan", "Turing")).unwrap();

        assert_eq!(store.search_customers("hopper").len(), 1);
        assert_eq!(store.search_customers("NAVY")[0].id, id);

        let updated = store
            .update_customer(
                &id,
                CustomerPatch {
                    phone: Some("555-010-0000".into()),
                    ..CustomerPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-010-0000"));
        assert_eq!(updated.first_name, "Grace");

        store.set_customer(Some(&id)).unwrap();
        store.delete_customer(&id).unwrap();
        assert!(store.cart().customer_id.is_none());
        assert!(store.customer(&id).is_none());
        assert!(store.delete_customer(&id).is_err());
    }

    #[test]
    fn test_analytics_recompute_is_idempotent() {
        let mut store = open_store();
        let id = store.add_customer(CustomerDraft::new("Ada", "L")).unwrap().id.clone();
        buy_fries_for(&mut store, &id);
        buy_fries_for(&mut store, &id);

        let first = store.customer_analytics(&id).unwrap();
        let second = store.customer_analytics(&id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.visit_count, 2);
        assert_eq!(first.total_spent.cents(), 756);
        assert_eq!(first.lifetime_value, first.total_spent);
        assert!(store.customer_analytics("ghost").is_err());
    }

    #[test]
    fn test_voided_orders_drop_out_of_analytics() {
        let mut store = open_store();
        let id = store.add_customer(CustomerDraft::new("Ada", "L")).unwrap().id.clone();
        let order = buy_fries_for(&mut store, &id);
        buy_fries_for(&mut store, &id);
        store.void_order(&order.id, "mistake").unwrap();

        assert_eq!(store.customer(&id).unwrap().analytics.visit_count, 1);
        assert_eq!(store.customer_analytics(&id).unwrap().visit_count, 1);
    }

    #[test]
    fn test_new_customer_scores() {
        let mut store = open_store();
        let id = store.add_customer(CustomerDraft::new("Ada", "L")).unwrap().id.clone();
        assert_eq!(store.customer_lifecycle(&id), Ok(LifecycleStage::New));

        buy_fries_for(&mut store, &id);
        let rfm = store.customer_rfm(&id).unwrap();
        assert_eq!((rfm.recency, rfm.frequency, rfm.monetary), (5, 1, 1));
        assert_eq!(rfm.segment, Segment::New);
    }
}
