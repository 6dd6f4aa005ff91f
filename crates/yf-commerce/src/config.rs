//! Storefront configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::checkout::{DeliveryPolicy, SubmissionMode};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use yf_data::{RetryPolicy, TimeoutConfig};

/// Top-level storefront configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Backend endpoints.
    #[serde(default)]
    pub api: ApiConfig,

    /// Checkout pricing and submission.
    #[serde(default)]
    pub checkout: CheckoutConfig,

    /// Catalog presentation defaults.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Backend endpoints and transport policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API (`/api/...`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the record store holding orders and cart rows.
    /// Falls back to `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_url: Option<String>,

    /// API key sent to the record store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_key: Option<String>,

    /// Per-request timeouts.
    #[serde(default)]
    pub timeout: TimeoutConfig,

    /// Retries for idempotent requests.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl ApiConfig {
    /// The record store URL, or the REST base URL when unset.
    pub fn records_url(&self) -> &str {
        self.records_url.as_deref().unwrap_or(&self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            records_url: None,
            records_key: None,
            timeout: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Checkout pricing and submission settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Cart totals at or above this ship free.
    #[serde(default = "default_free_delivery_threshold")]
    pub free_delivery_threshold: Money,

    /// Flat delivery charge below the threshold.
    #[serde(default = "default_delivery_charge")]
    pub delivery_charge: Money,

    /// How orders are submitted.
    #[serde(default)]
    pub mode: SubmissionMode,

    /// Delete the created order when a later submission step fails.
    ///
    /// When off, the order record is left on the server as `pending`.
    #[serde(default = "default_true")]
    pub compensate_partial_failure: bool,
}

fn default_free_delivery_threshold() -> Money {
    Money::from_rupees(999)
}

fn default_delivery_charge() -> Money {
    Money::from_rupees(99)
}

fn default_true() -> bool {
    true
}

impl CheckoutConfig {
    /// Delivery pricing derived from this config.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::new(self.free_delivery_threshold, self.delivery_charge)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            free_delivery_threshold: default_free_delivery_threshold(),
            delivery_charge: default_delivery_charge(),
            mode: SubmissionMode::default(),
            compensate_partial_failure: true,
        }
    }
}

/// Catalog presentation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Category shown for products the backend leaves uncategorised.
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_category() -> String {
    "General".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: StorefrontConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.checkout.free_delivery_threshold, Money::from_rupees(999));
        assert_eq!(config.checkout.delivery_charge, Money::from_rupees(99));
        assert!(config.checkout.compensate_partial_failure);
        assert_eq!(config.catalog.default_category, "General");
        assert_eq!(config.api.records_url(), "http://localhost:8080");
    }

    #[test]
    fn test_partial_override() {
        let config: StorefrontConfig = serde_json::from_str(
            r#"{
                "api": { "base_url": "https://shop.example.com", "records_url": "https://db.example.com" },
                "checkout": { "mode": "atomic", "compensate_partial_failure": false }
            }"#,
        )
        .unwrap();
        assert_eq!(config.api.records_url(), "https://db.example.com");
        assert_eq!(config.checkout.mode, SubmissionMode::Atomic);
        assert!(!config.checkout.compensate_partial_failure);
        assert_eq!(config.checkout.delivery_charge, Money::from_rupees(99));
    }
}
