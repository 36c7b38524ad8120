//! Conversion of wire-coded records into named fields.

use crate::page::ResultRecord;
use builtwith_core::Timestamp;
use serde::Serialize;
use serde_json::Value;

/// A [`ResultRecord`] with descriptive names and typed timestamps.
///
/// Absent values stay `None`. Use the `*_or_zero` accessors where a numeric
/// default is wanted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedRecord {
    /// Domain (`D`)
    pub domain: Option<String>,
    /// Where on the site the technology was seen (`LOS`)
    pub locations_on_site: Vec<String>,
    /// First detection (`FD`)
    pub first_detected: Option<Timestamp>,
    /// Last detection (`LD`)
    pub last_detected: Option<Timestamp>,
    /// Monthly technology spend in USD (`S`)
    pub monthly_spend_usd: Option<i64>,
    /// Unique products (`SKU`)
    pub unique_products: Option<i64>,
    /// Estimated revenue (`R`)
    pub estimated_revenue: Option<i64>,
    /// Social followers (`F`)
    pub social_followers: Option<i64>,
    /// Employees (`E`)
    pub employee_count: Option<i64>,
    /// Page rank (`A`)
    pub page_rank: Option<i64>,
    /// Tranco rank (`Q`)
    pub tranco_rank: Option<i64>,
    /// Majestic rank (`M`)
    pub majestic_rank: Option<i64>,
    /// Umbrella rank (`U`)
    pub umbrella_rank: Option<i64>,
    /// Company metadata (`META`)
    pub metadata: Option<Value>,
}

impl ParsedRecord {
    /// Monthly spend, 0 when unknown.
    #[must_use]
    pub fn monthly_spend_usd_or_zero(&self) -> i64 {
        self.monthly_spend_usd.unwrap_or_default()
    }

    /// Unique products, 0 when unknown.
    #[must_use]
    pub fn unique_products_or_zero(&self) -> i64 {
        self.unique_products.unwrap_or_default()
    }

    /// Estimated revenue, 0 when unknown.
    #[must_use]
    pub fn estimated_revenue_or_zero(&self) -> i64 {
        self.estimated_revenue.unwrap_or_default()
    }

    /// Social followers, 0 when unknown.
    #[must_use]
    pub fn social_followers_or_zero(&self) -> i64 {
        self.social_followers.unwrap_or_default()
    }

    /// Employee count, 0 when unknown.
    #[must_use]
    pub fn employee_count_or_zero(&self) -> i64 {
        self.employee_count.unwrap_or_default()
    }
}

/// Convert one record. Pure and total.
///
/// `FD`/`LD` epoch seconds become UTC instants. Epoch 0 is a real instant;
/// seconds outside chrono's range are dropped.
#[must_use]
pub fn parse(record: &ResultRecord) -> ParsedRecord {
    ParsedRecord {
        domain: record.domain.clone(),
        locations_on_site: record.locations.clone(),
        first_detected: record.first_detected.and_then(Timestamp::from_epoch_seconds),
        last_detected: record.last_detected.and_then(Timestamp::from_epoch_seconds),
        monthly_spend_usd: record.spend,
        unique_products: record.sku,
        estimated_revenue: record.revenue,
        social_followers: record.followers,
        employee_count: record.employees,
        page_rank: record.page_rank,
        tranco_rank: record.tranco_rank,
        majestic_rank: record.majestic_rank,
        umbrella_rank: record.umbrella_rank,
        metadata: record.meta.clone(),
    }
}
