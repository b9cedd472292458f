//! Webhook event types known to the host.

use std::fmt;

use serde::{Serialize, Serializer};

pub const ASYNC_EVENTS: &[&str] = &[
    "ADDRESS_CREATED",
    "ADDRESS_UPDATED",
    "ADDRESS_DELETED",
    "APP_INSTALLED",
    "APP_UPDATED",
    "APP_DELETED",
    "APP_STATUS_CHANGED",
    "ATTRIBUTE_CREATED",
    "ATTRIBUTE_UPDATED",
    "ATTRIBUTE_DELETED",
    "ATTRIBUTE_VALUE_CREATED",
    "ATTRIBUTE_VALUE_UPDATED",
    "ATTRIBUTE_VALUE_DELETED",
    "CATEGORY_CREATED",
    "CATEGORY_UPDATED",
    "CATEGORY_DELETED",
    "CHANNEL_CREATED",
    "CHANNEL_UPDATED",
    "CHANNEL_DELETED",
    "CHANNEL_STATUS_CHANGED",
    "CHECKOUT_CREATED",
    "CHECKOUT_UPDATED",
    "CHECKOUT_FULLY_PAID",
    "CHECKOUT_METADATA_UPDATED",
    "COLLECTION_CREATED",
    "COLLECTION_UPDATED",
    "COLLECTION_DELETED",
    "CUSTOMER_CREATED",
    "CUSTOMER_UPDATED",
    "CUSTOMER_DELETED",
    "CUSTOMER_METADATA_UPDATED",
    "DRAFT_ORDER_CREATED",
    "DRAFT_ORDER_UPDATED",
    "DRAFT_ORDER_DELETED",
    "FULFILLMENT_CREATED",
    "FULFILLMENT_CANCELED",
    "FULFILLMENT_APPROVED",
    "GIFT_CARD_CREATED",
    "GIFT_CARD_UPDATED",
    "GIFT_CARD_DELETED",
    "GIFT_CARD_SENT",
    "GIFT_CARD_STATUS_CHANGED",
    "INVOICE_REQUESTED",
    "INVOICE_DELETED",
    "INVOICE_SENT",
    "MENU_CREATED",
    "MENU_UPDATED",
    "MENU_DELETED",
    "MENU_ITEM_CREATED",
    "MENU_ITEM_UPDATED",
    "MENU_ITEM_DELETED",
    "NOTIFY_USER",
    "OBSERVABILITY",
    "ORDER_CREATED",
    "ORDER_CONFIRMED",
    "ORDER_PAID",
    "ORDER_FULLY_PAID",
    "ORDER_REFUNDED",
    "ORDER_FULLY_REFUNDED",
    "ORDER_UPDATED",
    "ORDER_CANCELLED",
    "ORDER_EXPIRED",
    "ORDER_FULFILLED",
    "ORDER_METADATA_UPDATED",
    "ORDER_BULK_CREATED",
    "PAGE_CREATED",
    "PAGE_UPDATED",
    "PAGE_DELETED",
    "PRODUCT_CREATED",
    "PRODUCT_UPDATED",
    "PRODUCT_DELETED",
    "PRODUCT_METADATA_UPDATED",
    "PRODUCT_VARIANT_CREATED",
    "PRODUCT_VARIANT_UPDATED",
    "PRODUCT_VARIANT_DELETED",
    "PRODUCT_VARIANT_OUT_OF_STOCK",
    "PRODUCT_VARIANT_BACK_IN_STOCK",
    "PRODUCT_VARIANT_STOCK_UPDATED",
    "PROMOTION_CREATED",
    "PROMOTION_UPDATED",
    "PROMOTION_DELETED",
    "PROMOTION_STARTED",
    "PROMOTION_ENDED",
    "PROMOTION_RULE_CREATED",
    "PROMOTION_RULE_UPDATED",
    "PROMOTION_RULE_DELETED",
    "SALE_CREATED",
    "SALE_UPDATED",
    "SALE_DELETED",
    "SALE_TOGGLE",
    "SHIPPING_PRICE_CREATED",
    "SHIPPING_PRICE_UPDATED",
    "SHIPPING_PRICE_DELETED",
    "SHIPPING_ZONE_CREATED",
    "SHIPPING_ZONE_UPDATED",
    "SHIPPING_ZONE_DELETED",
    "STAFF_CREATED",
    "STAFF_UPDATED",
    "STAFF_DELETED",
    "TRANSACTION_ITEM_METADATA_UPDATED",
    "TRANSLATION_CREATED",
    "TRANSLATION_UPDATED",
    "VOUCHER_CREATED",
    "VOUCHER_UPDATED",
    "VOUCHER_DELETED",
    "WAREHOUSE_CREATED",
    "WAREHOUSE_UPDATED",
    "WAREHOUSE_DELETED",
];

pub const SYNC_EVENTS: &[&str] = &[
    "CHECKOUT_CALCULATE_TAXES",
    "ORDER_CALCULATE_TAXES",
    "CHECKOUT_FILTER_SHIPPING_METHODS",
    "ORDER_FILTER_SHIPPING_METHODS",
    "SHIPPING_LIST_METHODS_FOR_CHECKOUT",
    "PAYMENT_LIST_GATEWAYS",
    "PAYMENT_AUTHORIZE",
    "PAYMENT_CAPTURE",
    "PAYMENT_REFUND",
    "PAYMENT_VOID",
    "PAYMENT_CONFIRM",
    "PAYMENT_PROCESS",
    "PAYMENT_GATEWAY_INITIALIZE_SESSION",
    "TRANSACTION_INITIALIZE_SESSION",
    "TRANSACTION_PROCESS_SESSION",
    "TRANSACTION_CHARGE_REQUESTED",
    "TRANSACTION_REFUND_REQUESTED",
    "TRANSACTION_CANCELATION_REQUESTED",
];

/// Whether an event is delivered asynchronously or awaited by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Async,
    Sync,
}

impl EventKind {
    fn names(self) -> &'static [&'static str] {
        match self {
            Self::Async => ASYNC_EVENTS,
            Self::Sync => SYNC_EVENTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType {
    name: &'static str,
    kind: EventKind,
}

impl EventType {
    /// Looks up an event by its enum name (`ORDER_CREATED`) within one kind.
    pub fn lookup(kind: EventKind, name: &str) -> Option<Self> {
        kind.names()
            .iter()
            .copied()
            .find(|known| *known == name)
            .map(|known| Self { name: known, kind })
    }

    /// Resolves a subscription payload type (`OrderCreated`) to its event.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        let name = type_name_to_event_name(type_name);
        Self::lookup(EventKind::Async, &name).or_else(|| Self::lookup(EventKind::Sync, &name))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// `OrderFullyPaid` -> `ORDER_FULLY_PAID`.
pub fn type_name_to_event_name(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let mut name = String::with_capacity(type_name.len() + 4);
    for (index, current) in chars.iter().enumerate() {
        if index > 0 && current.is_uppercase() {
            let previous = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            if previous.is_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_uppercase() && next_is_lower)
            {
                name.push('_');
            }
        }
        name.extend(current.to_uppercase());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_type_names() {
        assert_eq!(type_name_to_event_name("OrderCreated"), "ORDER_CREATED");
        assert_eq!(type_name_to_event_name("OrderFullyPaid"), "ORDER_FULLY_PAID");
        assert_eq!(
            type_name_to_event_name("ProductVariantOutOfStock"),
            "PRODUCT_VARIANT_OUT_OF_STOCK"
        );
        assert_eq!(type_name_to_event_name("SALE"), "SALE");
    }

    #[test]
    fn looks_up_events_by_kind() {
        let event = EventType::lookup(EventKind::Async, "ORDER_CREATED").unwrap();
        assert_eq!(event.name(), "ORDER_CREATED");
        assert_eq!(event.kind(), EventKind::Async);
        assert!(EventType::lookup(EventKind::Sync, "ORDER_CREATED").is_none());
        assert!(EventType::lookup(EventKind::Sync, "CHECKOUT_CALCULATE_TAXES").is_some());
    }

    #[test]
    fn resolves_type_names_across_kinds() {
        assert_eq!(
            EventType::from_type_name("CheckoutCalculateTaxes").map(|e| e.kind()),
            Some(EventKind::Sync)
        );
        assert_eq!(
            EventType::from_type_name("OrderCreated").map(|e| e.kind()),
            Some(EventKind::Async)
        );
        assert!(EventType::from_type_name("Order").is_none());
    }
}
