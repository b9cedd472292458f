//! Webhook subscriptions declared by a manifest.

mod events;
mod graphql;
mod headers;
mod query;

use std::collections::BTreeMap;

use serde::Serialize;

pub use events::{type_name_to_event_name, EventKind, EventType, ASYNC_EVENTS, SYNC_EVENTS};
pub use headers::{
    DefaultHeaderPolicy, HeaderPolicy, HeaderPolicyError, MAX_HEADERS, MAX_HEADER_LENGTH,
};
pub use query::{QueryError, SubscriptionQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub name: String,
    pub is_active: bool,
    pub target_url: String,
    pub query: SubscriptionQuery,
    pub async_events: Vec<EventType>,
    pub sync_events: Vec<EventType>,
    pub custom_headers: BTreeMap<String, String>,
}

impl Webhook {
    /// Declared event names, or the events named by the query when none are declared.
    pub fn events(&self) -> Vec<&'static str> {
        let declared: Vec<&'static str> = self
            .async_events
            .iter()
            .chain(&self.sync_events)
            .map(EventType::name)
            .collect();
        if declared.is_empty() {
            self.query.events()
        } else {
            declared
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(async_events: Vec<EventType>) -> Webhook {
        Webhook {
            name: "orders".to_string(),
            is_active: true,
            target_url: "https://example.com/webhooks".to_string(),
            query: SubscriptionQuery::new(
                "subscription { event { ... on OrderCreated { order { id } } ... on OrderPaid { order { id } } } }",
            ),
            async_events,
            sync_events: Vec::new(),
            custom_headers: BTreeMap::new(),
        }
    }

    #[test]
    fn events_fall_back_to_query() {
        assert_eq!(webhook(Vec::new()).events(), vec!["ORDER_CREATED", "ORDER_PAID"]);
    }

    #[test]
    fn declared_events_take_precedence() {
        let declared = vec![EventType::lookup(EventKind::Async, "PRODUCT_CREATED").unwrap()];
        assert_eq!(webhook(declared).events(), vec!["PRODUCT_CREATED"]);
    }
}
