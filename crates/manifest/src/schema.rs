//! JSON Schema describing the manifest format, published for app developers.

use serde_json::{json, Value};

use crate::extension::{ExtensionMount, ExtensionTarget};
use crate::permissions::DEFAULT_PERMISSIONS;
use crate::url::{HTTP_URL, WEBHOOK_TARGET_URL};
use crate::webhook::{ASYNC_EVENTS, MAX_HEADERS, SYNC_EVENTS};

/// Draft-07 schema for a manifest, with field descriptions and an example.
pub fn manifest_json_schema() -> Value {
    let targets: Vec<&str> = ExtensionTarget::ALL.iter().map(|t| t.as_str()).collect();
    let mounts: Vec<&str> = ExtensionMount::ALL.iter().map(|m| m.as_str()).collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Manifest",
        "type": "object",
        "required": ["id", "version", "name", "tokenTargetUrl"],
        "properties": {
            "id": {
                "type": "string",
                "maxLength": 256,
                "description": "Id of application used internally by Saleor"
            },
            "version": { "type": "string", "maxLength": 60, "description": "App version" },
            "name": {
                "type": "string",
                "maxLength": 60,
                "description": "App name displayed in the dashboard"
            },
            "tokenTargetUrl": http_url("Endpoint used during process of app installation"),
            "about": {
                "type": "string",
                "description": "Description of the app displayed in the dashboard"
            },
            "requiredSaleorVersion": {
                "type": "string",
                "description": "Version range, in the semver format, which specifies Saleor \
                    version required by the app. The field will be respected starting from \
                    Saleor 3.13"
            },
            "author": {
                "type": "string",
                "minLength": 1,
                "maxLength": 60,
                "description": "App author name displayed in the dashboard (starting from Saleor 3.13)"
            },
            "appUrl": http_url("App website rendered in the dashboard"),
            "configurationUrl": http_url(
                "Address to the app configuration page, which is rendered in the dashboard \
                (deprecated in Saleor 3.5, use appUrl instead)"
            ),
            "dataPrivacy": {
                "type": "string",
                "description": "Short description of privacy policy displayed in the dashboard \
                    (deprecated in Saleor 3.5, use dataPrivacyUrl instead)"
            },
            "dataPrivacyUrl": http_url("URL to the full privacy policy"),
            "homepageUrl": http_url("External URL to the app homepage"),
            "supportUrl": http_url("External URL to the page where app users can find support"),
            "audience": { "type": "string", "maxLength": 256 },
            "permissions": {
                "type": "array",
                "default": [],
                "items": { "$ref": "#/definitions/Permission" },
                "description": "Array of permissions requested by the app"
            },
            "webhooks": {
                "type": "array",
                "default": [],
                "items": { "$ref": "#/definitions/Webhook" },
                "description": "List of webhooks that will be set"
            },
            "extensions": {
                "type": "array",
                "default": [],
                "items": { "$ref": "#/definitions/Extension" },
                "description": "List of extensions that will be mounted in Saleor's dashboard"
            }
        },
        "definitions": {
            "Permission": { "type": "string", "enum": DEFAULT_PERMISSIONS },
            "AsyncEventType": { "type": "string", "enum": ASYNC_EVENTS },
            "SyncEventType": { "type": "string", "enum": SYNC_EVENTS },
            "Webhook": {
                "type": "object",
                "required": ["name", "targetUrl", "query"],
                "properties": {
                    "name": { "type": "string", "maxLength": 255 },
                    "isActive": { "type": "boolean", "default": true },
                    "targetUrl": {
                        "type": "string",
                        "format": "uri",
                        "maxLength": WEBHOOK_TARGET_URL.max_length,
                        "description": format!(
                            "Allowed schemes: {}",
                            WEBHOOK_TARGET_URL.allowed_schemes.join(", ")
                        )
                    },
                    "query": { "type": "string", "description": "Subscription query" },
                    "asyncEvents": {
                        "type": "array",
                        "default": [],
                        "items": { "$ref": "#/definitions/AsyncEventType" }
                    },
                    "syncEvents": {
                        "type": "array",
                        "default": [],
                        "items": { "$ref": "#/definitions/SyncEventType" }
                    },
                    "customHeaders": {
                        "type": "object",
                        "default": {},
                        "maxProperties": MAX_HEADERS,
                        "additionalProperties": { "type": "string" }
                    }
                }
            },
            "Extension": {
                "type": "object",
                "required": ["label", "mount", "url"],
                "properties": {
                    "label": { "type": "string", "maxLength": 256 },
                    "target": { "type": "string", "enum": targets, "default": "POPUP" },
                    "mount": { "type": "string", "enum": mounts },
                    "url": {
                        "anyOf": [
                            http_url("Absolute extension URL"),
                            {
                                "type": "string",
                                "pattern": "^(/[^\\s?#]*)(\\?[^\\s#]*)?(#[^\\s#]*)?$",
                                "description": "Path relative to the app URL"
                            }
                        ]
                    },
                    "permissions": {
                        "type": "array",
                        "default": [],
                        "items": { "$ref": "#/definitions/Permission" }
                    }
                }
            }
        },
        "example": example_manifest()
    })
}

fn http_url(description: &str) -> Value {
    json!({
        "type": "string",
        "format": "uri",
        "minLength": 1,
        "maxLength": HTTP_URL.max_length,
        "description": description
    })
}

fn example_manifest() -> Value {
    json!({
        "id": "example.app.wonderful",
        "version": "1.0.0",
        "requiredSaleorVersion": "^3.13",
        "name": "My Wonderful App",
        "author": "My Wonderful Company",
        "about": "My Wonderful App is a wonderful App for Saleor.",
        "permissions": ["MANAGE_USERS", "MANAGE_STAFF", "MANAGE_PRODUCTS"],
        "appUrl": "http://localhost:3001/app",
        "tokenTargetUrl": "http://localhost:3001/register",
        "dataPrivacyUrl": "http://localhost:3001/app-data-privacy",
        "homepageUrl": "http://localhost:3001/homepage",
        "supportUrl": "http://localhost:3001/support",
        "extensions": [
            {
                "label": "Create with Sample app",
                "mount": "PRODUCT_OVERVIEW_CREATE",
                "target": "POPUP",
                "permissions": ["MANAGE_PRODUCTS"],
                "url": "https://example.com/extension/"
            },
            {
                "label": "Create with App and redirect",
                "mount": "PRODUCT_OVERVIEW_CREATE",
                "target": "APP_PAGE",
                "permissions": ["MANAGE_PRODUCTS"],
                "url": "/extension/redirect"
            }
        ],
        "webhooks": [
            {
                "name": "Order created",
                "asyncEvents": ["ORDER_CREATED"],
                "query": "subscription { event { ... on OrderCreated { order { id }}}}",
                "targetUrl": "https://example.com/api/webhooks/order-created",
                "isActive": false
            },
            {
                "name": "Multiple order's events",
                "asyncEvents": ["ORDER_CREATED", "ORDER_FULLY_PAID"],
                "query": "subscription { event { ... on OrderCreated { order { id }} ... on OrderFullyPaid { order { id }}}}",
                "targetUrl": "https://example.com/api/webhooks/order-event",
                "isActive": true
            }
        ]
    })
}
