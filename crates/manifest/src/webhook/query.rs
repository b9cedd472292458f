//! Subscription queries attached to webhooks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::events::EventType;
use super::graphql::{
    Document, DocumentParser, Fragment, OperationKind, Selection, MAX_DEPTH, TOO_DEEP,
};

/// Field of the subscription root that carries the event payload.
const EVENT_FIELD: &str = "event";
/// Interface type matching any event; its selections are searched for concrete types.
const EVENT_INTERFACE: &str = "Event";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Invalid(String),
}

/// A subscription query together with the outcome of checking it.
///
/// Construction never fails; callers inspect [`SubscriptionQuery::is_valid`]
/// and [`SubscriptionQuery::error_msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionQuery {
    query: String,
    result: Result<Vec<EventType>, QueryError>,
}

impl SubscriptionQuery {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let result = extract_events(&query);
        Self { query, result }
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    /// Message describing why the query was rejected.
    pub fn error_msg(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.result.as_ref().err()
    }

    /// Event names the query subscribes to, in order of first appearance.
    pub fn events(&self) -> Vec<&'static str> {
        self.event_types().iter().map(EventType::name).collect()
    }

    pub fn event_types(&self) -> &[EventType] {
        match &self.result {
            Ok(events) => events,
            Err(_) => &[],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for SubscriptionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

impl Serialize for SubscriptionQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.query)
    }
}

fn extract_events(query: &str) -> Result<Vec<EventType>, QueryError> {
    let document = DocumentParser::parse(query).map_err(QueryError::Syntax)?;
    let fragments = index_fragments(&document)?;

    let subscription = document
        .operations
        .iter()
        .find(|operation| operation.kind == OperationKind::Subscription)
        .ok_or_else(|| {
            QueryError::Invalid("Subscription operation can't be found.".to_string())
        })?;
    if document.operations.len() > 1 {
        return Err(QueryError::Invalid(
            "Subscription query must define a single operation.".to_string(),
        ));
    }

    let mut event_fields = Vec::new();
    collect_event_fields(
        &subscription.selections,
        &fragments,
        &mut BTreeSet::new(),
        &mut event_fields,
        0,
    )?;
    if event_fields.is_empty() {
        return Err(QueryError::Invalid(
            "Subscription must select the \"event\" field.".to_string(),
        ));
    }

    let mut collector = EventCollector {
        fragments: &fragments,
        visiting: BTreeSet::new(),
        events: Vec::new(),
    };
    for selections in event_fields {
        collector.collect(selections, 0)?;
    }
    if collector.events.is_empty() {
        return Err(QueryError::Invalid("Can't find a single event.".to_string()));
    }
    Ok(collector.events)
}

fn index_fragments(document: &Document) -> Result<BTreeMap<&str, &Fragment>, QueryError> {
    let mut fragments = BTreeMap::new();
    for fragment in &document.fragments {
        if fragments.insert(fragment.name.as_str(), fragment).is_some() {
            return Err(QueryError::Invalid(format!(
                "There can be only one fragment named \"{}\".",
                fragment.name
            )));
        }
    }
    for fragment in &document.fragments {
        check_spreads(&fragment.selections, &fragments)?;
    }
    for operation in &document.operations {
        check_spreads(&operation.selections, &fragments)?;
    }
    Ok(fragments)
}

fn check_spreads(
    selections: &[Selection],
    fragments: &BTreeMap<&str, &Fragment>,
) -> Result<(), QueryError> {
    for selection in selections {
        match selection {
            Selection::FragmentSpread(name) if !fragments.contains_key(name.as_str()) => {
                return Err(QueryError::Invalid(format!("Unknown fragment \"{name}\".")));
            }
            Selection::FragmentSpread(_) => {}
            Selection::Field { selections, .. }
            | Selection::InlineFragment { selections, .. } => {
                check_spreads(selections, fragments)?;
            }
        }
    }
    Ok(())
}

/// Finds the selection sets of every root `event` field, looking through
/// fragments applied at the root.
fn collect_event_fields<'doc>(
    selections: &'doc [Selection],
    fragments: &BTreeMap<&str, &'doc Fragment>,
    visiting: &mut BTreeSet<&'doc str>,
    found: &mut Vec<&'doc [Selection]>,
    depth: usize,
) -> Result<(), QueryError> {
    if depth >= MAX_DEPTH {
        return Err(too_deep());
    }
    for selection in selections {
        match selection {
            Selection::Field { name, selections } if name == EVENT_FIELD => {
                found.push(selections);
            }
            Selection::Field { .. } => {}
            Selection::InlineFragment { selections, .. } => {
                collect_event_fields(selections, fragments, visiting, found, depth + 1)?;
            }
            Selection::FragmentSpread(name) => {
                if let Some(fragment) = fragments.get(name.as_str()).copied() {
                    if visiting.insert(fragment.name.as_str()) {
                        collect_event_fields(
                            &fragment.selections,
                            fragments,
                            visiting,
                            found,
                            depth + 1,
                        )?;
                        visiting.remove(fragment.name.as_str());
                    }
                }
            }
        }
    }
    Ok(())
}

fn too_deep() -> QueryError {
    QueryError::Invalid(TOO_DEEP.to_string())
}

struct EventCollector<'doc, 'map> {
    fragments: &'map BTreeMap<&'doc str, &'doc Fragment>,
    visiting: BTreeSet<&'doc str>,
    events: Vec<EventType>,
}

impl<'doc, 'map> EventCollector<'doc, 'map> {
    fn collect(&mut self, selections: &'doc [Selection], depth: usize) -> Result<(), QueryError> {
        if depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        for selection in selections {
            match selection {
                Selection::Field { .. } => {}
                Selection::InlineFragment {
                    type_condition: None,
                    selections,
                } => self.collect(selections, depth + 1)?,
                Selection::InlineFragment {
                    type_condition: Some(type_name),
                    selections,
                } => self.on_type(type_name, selections, depth + 1)?,
                Selection::FragmentSpread(name) => {
                    let Some(fragment) = self.fragments.get(name.as_str()).copied() else {
                        continue;
                    };
                    if !self.visiting.insert(fragment.name.as_str()) {
                        return Err(QueryError::Invalid(format!(
                            "Cannot spread fragment \"{name}\" within itself."
                        )));
                    }
                    self.on_type(&fragment.type_condition, &fragment.selections, depth + 1)?;
                    self.visiting.remove(fragment.name.as_str());
                }
            }
        }
        Ok(())
    }

    fn on_type(
        &mut self,
        type_name: &str,
        selections: &'doc [Selection],
        depth: usize,
    ) -> Result<(), QueryError> {
        if type_name == EVENT_INTERFACE {
            return self.collect(selections, depth);
        }
        let event = EventType::from_type_name(type_name)
            .ok_or_else(|| QueryError::Invalid(format!("Unknown event type \"{type_name}\".")))?;
        if !self.events.contains(&event) {
            self.events.push(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::EventKind;

    #[test]
    fn extracts_events_from_inline_fragments() {
        let query = SubscriptionQuery::new(
            r#"
            subscription {
              event {
                ... on OrderCreated { order { id } }
                ... on OrderFullyPaid { order { id } }
              }
            }
            "#,
        );
        assert!(query.is_valid(), "{:?}", query.error_msg());
        assert_eq!(query.events(), vec!["ORDER_CREATED", "ORDER_FULLY_PAID"]);
        assert_eq!(query.error_msg(), None);
    }

    #[test]
    fn extracts_events_from_named_fragments() {
        let query = SubscriptionQuery::new(
            r#"
            fragment OrderFields on Order { id number }
            fragment Created on OrderCreated { order { ...OrderFields } }
            subscription { event { ...Created ... on CheckoutCalculateTaxes { __typename } } }
            "#,
        );
        assert_eq!(query.events(), vec!["ORDER_CREATED", "CHECKOUT_CALCULATE_TAXES"]);
        assert_eq!(query.event_types()[1].kind(), EventKind::Sync);
    }

    #[test]
    fn event_interface_fragments_are_searched() {
        let query = SubscriptionQuery::new(
            "subscription { event { issuedAt ... on Event { ... on ProductUpdated { product { id } } } } }",
        );
        assert_eq!(query.events(), vec!["PRODUCT_UPDATED"]);
    }

    #[test]
    fn duplicate_events_are_reported_once() {
        let query = SubscriptionQuery::new(
            "subscription { event { ... on OrderCreated { a: __typename } ... on OrderCreated { b: __typename } } }",
        );
        assert_eq!(query.events(), vec!["ORDER_CREATED"]);
    }

    #[test]
    fn rejects_syntax_errors() {
        let query = SubscriptionQuery::new("subscription { event { ... on OrderCreated { id }");
        assert!(!query.is_valid());
        assert!(matches!(query.error(), Some(QueryError::Syntax(_))));
        assert!(query.events().is_empty());
    }

    #[test]
    fn requires_a_subscription_operation() {
        let query = SubscriptionQuery::new("query { shop { name } }");
        assert_eq!(
            query.error_msg().as_deref(),
            Some("Subscription operation can't be found.")
        );
    }

    #[test]
    fn rejects_multiple_operations() {
        let query = SubscriptionQuery::new(
            "subscription A { event { ... on OrderCreated { __typename } } } query B { shop { name } }",
        );
        assert!(!query.is_valid());
    }

    #[test]
    fn rejects_unknown_event_types_and_fragments() {
        let query = SubscriptionQuery::new("subscription { event { ... on OrderExploded { id } } }");
        assert_eq!(
            query.error_msg().as_deref(),
            Some("Unknown event type \"OrderExploded\".")
        );

        let query = SubscriptionQuery::new("subscription { event { ...Missing } }");
        assert_eq!(query.error_msg().as_deref(), Some("Unknown fragment \"Missing\"."));
    }

    #[test]
    fn rejects_queries_without_events() {
        let query = SubscriptionQuery::new("subscription { event { issuedAt } }");
        assert_eq!(query.error_msg().as_deref(), Some("Can't find a single event."));

        let query = SubscriptionQuery::new("subscription { shop { name } }");
        assert!(!query.is_valid());
    }

    #[test]
    fn rejects_recursive_fragments() {
        let query = SubscriptionQuery::new(
            "fragment A on Event { ...A } subscription { event { ...A } }",
        );
        assert!(!query.is_valid());
    }

    #[test]
    fn serializes_as_the_query_text() {
        let text = "subscription { event { ... on OrderCreated { __typename } } }";
        let query = SubscriptionQuery::new(text);
        assert_eq!(serde_json::to_value(&query).unwrap(), serde_json::json!(text));
        assert_eq!(query.to_string(), text);
    }

    #[test]
    fn deeply_nested_selections_are_rejected() {
        let depth = 10_000;
        let query = SubscriptionQuery::new(format!(
            "subscription {{ event {{ ... on OrderCreated {{ {}id{} }} }} }}",
            "a { ".repeat(depth),
            " }".repeat(depth)
        ));
        assert!(!query.is_valid());
        assert_eq!(query.error_msg().as_deref(), Some(TOO_DEEP));
        assert!(query.events().is_empty());
    }

    #[test]
    fn long_fragment_chains_are_rejected() {
        let links = 1_000;
        let mut source = String::from("subscription { event { ...Link0 } }\n");
        for index in 0..links {
            source.push_str(&format!("fragment Link{index} on Event {{ ...Link{} }}\n", index + 1));
        }
        source.push_str(&format!("fragment Link{links} on OrderCreated {{ __typename }}\n"));

        let query = SubscriptionQuery::new(source);
        assert_eq!(
            query.error(),
            Some(&QueryError::Invalid(TOO_DEEP.to_string()))
        );
    }

    #[test]
    fn long_flat_queries_are_accepted() {
        let query = SubscriptionQuery::new(format!(
            "subscription {{ event {{ {} }} }}",
            "... on OrderCreated { order { id number } } ".repeat(5_000)
        ));
        assert!(query.is_valid(), "{:?}", query.error_msg());
        assert_eq!(query.events(), vec!["ORDER_CREATED"]);
    }
}
