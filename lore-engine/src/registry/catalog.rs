//! Built-in assumptions catalog
//!
//! Single source of truth for the compiled-in metric definitions. Order here is
//! the display order of every category.

use crate::types::{MetricDefinition, MetricKey};

/// Version of the compiled-in catalog; bump when definitions change
pub const BUILTIN_CATALOG_VERSION: u32 = 1;

/// Static form of a metric definition
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub category: &'static str,
    pub unit: &'static str,
    pub label: &'static str,
    pub default_value: f64,
}

impl CatalogEntry {
    pub fn to_definition(&self) -> MetricDefinition {
        MetricDefinition {
            key: MetricKey::from(self.key),
            category: self.category.to_string(),
            unit: self.unit.to_string(),
            label: self.label.to_string(),
            default_value: self.default_value,
        }
    }
}

pub const BUILTIN_CATALOG: &[CatalogEntry] = &[
    // Growth
    CatalogEntry {
        key: "monthly_audience_growth_rate",
        category: "growth",
        unit: "percent",
        label: "Monthly audience growth",
        default_value: 5.0,
    },
    CatalogEntry {
        key: "starting_monthly_listeners",
        category: "growth",
        unit: "count",
        label: "Starting monthly listeners",
        default_value: 1000.0,
    },
    CatalogEntry {
        key: "organic_share",
        category: "growth",
        unit: "ratio",
        label: "Share of growth that is organic",
        default_value: 0.7,
    },
    CatalogEntry {
        key: "paid_acquisition_cost",
        category: "growth",
        unit: "currency",
        label: "Cost per acquired listener",
        default_value: 2.5,
    },
    // Subscriptions
    CatalogEntry {
        key: "free_to_paid_conversion_rate",
        category: "subscriptions",
        unit: "percent",
        label: "Free to paid conversion",
        default_value: 2.0,
    },
    CatalogEntry {
        key: "monthly_churn_rate",
        category: "subscriptions",
        unit: "percent",
        label: "Monthly subscriber churn",
        default_value: 5.0,
    },
    CatalogEntry {
        key: "subscription_price_monthly",
        category: "subscriptions",
        unit: "currency",
        label: "Monthly subscription price",
        default_value: 9.99,
    },
    CatalogEntry {
        key: "annual_plan_share",
        category: "subscriptions",
        unit: "ratio",
        label: "Share of subscribers on annual plans",
        default_value: 0.2,
    },
    // Advertising
    CatalogEntry {
        key: "cpm_rate",
        category: "advertising",
        unit: "currency",
        label: "CPM rate",
        default_value: 18.0,
    },
    CatalogEntry {
        key: "ad_fill_rate",
        category: "advertising",
        unit: "percent",
        label: "Ad inventory fill rate",
        default_value: 60.0,
    },
    CatalogEntry {
        key: "ad_slots_per_episode",
        category: "advertising",
        unit: "count",
        label: "Ad slots per episode",
        default_value: 3.0,
    },
    CatalogEntry {
        key: "sponsorship_revenue_monthly",
        category: "advertising",
        unit: "currency",
        label: "Direct sponsorship revenue per month",
        default_value: 0.0,
    },
    // Impressions
    CatalogEntry {
        key: "episodes_per_month",
        category: "impressions",
        unit: "count",
        label: "Episodes published per month",
        default_value: 4.0,
    },
    CatalogEntry {
        key: "downloads_per_episode",
        category: "impressions",
        unit: "count",
        label: "Downloads per episode (30 day)",
        default_value: 1500.0,
    },
    CatalogEntry {
        key: "impressions_per_download",
        category: "impressions",
        unit: "ratio",
        label: "Ad impressions per download",
        default_value: 0.9,
    },
    // Events
    CatalogEntry {
        key: "events_per_year",
        category: "events",
        unit: "count",
        label: "Live events per year",
        default_value: 2.0,
    },
    CatalogEntry {
        key: "average_ticket_price",
        category: "events",
        unit: "currency",
        label: "Average ticket price",
        default_value: 35.0,
    },
    CatalogEntry {
        key: "venue_capacity_utilization",
        category: "events",
        unit: "percent",
        label: "Venue capacity utilization",
        default_value: 75.0,
    },
    CatalogEntry {
        key: "event_setup_cost",
        category: "events",
        unit: "currency",
        label: "One-off setup cost per event",
        default_value: 0.0,
    },
];
