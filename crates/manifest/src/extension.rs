//! Dashboard extensions contributed by an app.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::permissions::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtensionTarget {
    #[default]
    Popup,
    AppPage,
}

impl ExtensionTarget {
    pub const ALL: &'static [Self] = &[Self::Popup, Self::AppPage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Popup => "POPUP",
            Self::AppPage => "APP_PAGE",
        }
    }
}

/// Place in the dashboard where an extension is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionMount {
    CategoryOverviewCreate,
    CategoryOverviewMoreActions,
    CategoryDetailsMoreActions,
    CollectionOverviewCreate,
    CollectionOverviewMoreActions,
    CollectionDetailsMoreActions,
    CustomerOverviewCreate,
    CustomerOverviewMoreActions,
    CustomerDetailsMoreActions,
    DiscountDetailsMoreActions,
    DiscountOverviewCreate,
    DiscountOverviewMoreActions,
    DraftOrderDetailsMoreActions,
    DraftOrderOverviewCreate,
    DraftOrderOverviewMoreActions,
    GiftCardDetailsMoreActions,
    GiftCardOverviewCreate,
    GiftCardOverviewMoreActions,
    NavigationCatalog,
    NavigationOrders,
    NavigationCustomers,
    NavigationDiscounts,
    NavigationTranslations,
    NavigationPages,
    OrderDetailsMoreActions,
    OrderOverviewCreate,
    OrderOverviewMoreActions,
    PageDetailsMoreActions,
    PageOverviewCreate,
    PageOverviewMoreActions,
    ProductDetailsMoreActions,
    ProductOverviewCreate,
    ProductOverviewMoreActions,
    VoucherDetailsMoreActions,
    VoucherOverviewCreate,
    VoucherOverviewMoreActions,
}

impl ExtensionMount {
    pub const ALL: &'static [Self] = &[
        Self::CategoryOverviewCreate,
        Self::CategoryOverviewMoreActions,
        Self::CategoryDetailsMoreActions,
        Self::CollectionOverviewCreate,
        Self::CollectionOverviewMoreActions,
        Self::CollectionDetailsMoreActions,
        Self::CustomerOverviewCreate,
        Self::CustomerOverviewMoreActions,
        Self::CustomerDetailsMoreActions,
        Self::DiscountDetailsMoreActions,
        Self::DiscountOverviewCreate,
        Self::DiscountOverviewMoreActions,
        Self::DraftOrderDetailsMoreActions,
        Self::DraftOrderOverviewCreate,
        Self::DraftOrderOverviewMoreActions,
        Self::GiftCardDetailsMoreActions,
        Self::GiftCardOverviewCreate,
        Self::GiftCardOverviewMoreActions,
        Self::NavigationCatalog,
        Self::NavigationOrders,
        Self::NavigationCustomers,
        Self::NavigationDiscounts,
        Self::NavigationTranslations,
        Self::NavigationPages,
        Self::OrderDetailsMoreActions,
        Self::OrderOverviewCreate,
        Self::OrderOverviewMoreActions,
        Self::PageDetailsMoreActions,
        Self::PageOverviewCreate,
        Self::PageOverviewMoreActions,
        Self::ProductDetailsMoreActions,
        Self::ProductOverviewCreate,
        Self::ProductOverviewMoreActions,
        Self::VoucherDetailsMoreActions,
        Self::VoucherOverviewCreate,
        Self::VoucherOverviewMoreActions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryOverviewCreate => "CATEGORY_OVERVIEW_CREATE",
            Self::CategoryOverviewMoreActions => "CATEGORY_OVERVIEW_MORE_ACTIONS",
            Self::CategoryDetailsMoreActions => "CATEGORY_DETAILS_MORE_ACTIONS",
            Self::CollectionOverviewCreate => "COLLECTION_OVERVIEW_CREATE",
            Self::CollectionOverviewMoreActions => "COLLECTION_OVERVIEW_MORE_ACTIONS",
            Self::CollectionDetailsMoreActions => "COLLECTION_DETAILS_MORE_ACTIONS",
            Self::CustomerOverviewCreate => "CUSTOMER_OVERVIEW_CREATE",
            Self::CustomerOverviewMoreActions => "CUSTOMER_OVERVIEW_MORE_ACTIONS",
            Self::CustomerDetailsMoreActions => "CUSTOMER_DETAILS_MORE_ACTIONS",
            Self::DiscountDetailsMoreActions => "DISCOUNT_DETAILS_MORE_ACTIONS",
            Self::DiscountOverviewCreate => "DISCOUNT_OVERVIEW_CREATE",
            Self::DiscountOverviewMoreActions => "DISCOUNT_OVERVIEW_MORE_ACTIONS",
            Self::DraftOrderDetailsMoreActions => "DRAFT_ORDER_DETAILS_MORE_ACTIONS",
            Self::DraftOrderOverviewCreate => "DRAFT_ORDER_OVERVIEW_CREATE",
            Self::DraftOrderOverviewMoreActions => "DRAFT_ORDER_OVERVIEW_MORE_ACTIONS",
            Self::GiftCardDetailsMoreActions => "GIFT_CARD_DETAILS_MORE_ACTIONS",
            Self::GiftCardOverviewCreate => "GIFT_CARD_OVERVIEW_CREATE",
            Self::GiftCardOverviewMoreActions => "GIFT_CARD_OVERVIEW_MORE_ACTIONS",
            Self::NavigationCatalog => "NAVIGATION_CATALOG",
            Self::NavigationOrders => "NAVIGATION_ORDERS",
            Self::NavigationCustomers => "NAVIGATION_CUSTOMERS",
            Self::NavigationDiscounts => "NAVIGATION_DISCOUNTS",
            Self::NavigationTranslations => "NAVIGATION_TRANSLATIONS",
            Self::NavigationPages => "NAVIGATION_PAGES",
            Self::OrderDetailsMoreActions => "ORDER_DETAILS_MORE_ACTIONS",
            Self::OrderOverviewCreate => "ORDER_OVERVIEW_CREATE",
            Self::OrderOverviewMoreActions => "ORDER_OVERVIEW_MORE_ACTIONS",
            Self::PageDetailsMoreActions => "PAGE_DETAILS_MORE_ACTIONS",
            Self::PageOverviewCreate => "PAGE_OVERVIEW_CREATE",
            Self::PageOverviewMoreActions => "PAGE_OVERVIEW_MORE_ACTIONS",
            Self::ProductDetailsMoreActions => "PRODUCT_DETAILS_MORE_ACTIONS",
            Self::ProductOverviewCreate => "PRODUCT_OVERVIEW_CREATE",
            Self::ProductOverviewMoreActions => "PRODUCT_OVERVIEW_MORE_ACTIONS",
            Self::VoucherDetailsMoreActions => "VOUCHER_DETAILS_MORE_ACTIONS",
            Self::VoucherOverviewCreate => "VOUCHER_OVERVIEW_CREATE",
            Self::VoucherOverviewMoreActions => "VOUCHER_OVERVIEW_MORE_ACTIONS",
        }
    }
}

/// Returned when a string names no member of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

macro_rules! closed_enum_impls {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == value)
                    .ok_or_else(|| UnknownVariant(value.to_string()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

closed_enum_impls!(ExtensionTarget);
closed_enum_impls!(ExtensionMount);

/// Extension URL, either absolute or a path relative to the app URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionUrl {
    Absolute(String),
    Relative(String),
}

impl ExtensionUrl {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Absolute(url) | Self::Relative(url) => url,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Relative(_))
    }
}

impl fmt::Display for ExtensionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExtensionUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub label: String,
    pub target: ExtensionTarget,
    pub mount: ExtensionMount,
    pub url: ExtensionUrl,
    pub permissions: Vec<Permission>,
}
