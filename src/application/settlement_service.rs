use std::sync::Arc;

use log::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::order::LineSource;
use crate::domain::ports::{OrderRepository, VendorDirectory};
use crate::domain::settlement::{aggregate, VendorStat, VendorStats, VendorTotals};
use crate::domain::vendor::{VendorRef, UNKNOWN_VENDOR_NAME};

pub struct SettlementService {
    orders: Arc<dyn OrderRepository>,
    vendors: Arc<dyn VendorDirectory>,
}

impl SettlementService {
    pub fn new(orders: Arc<dyn OrderRepository>, vendors: Arc<dyn VendorDirectory>) -> Self {
        Self { orders, vendors }
    }

    /// Revenue per vendor over all non-cancelled orders, split into settled
    /// and outstanding amounts.
    pub async fn vendor_stats(&self) -> Result<VendorStats, DomainError> {
        let totals = aggregate(self.orders.settlement_lines().await?);
        let mut stats = VendorStats::default();
        for t in totals {
            let name = self.display_name(&t).await;
            let source = t.source;
            let stat = VendorStat {
                id: t.source_id,
                name,
                total_revenue: t.total_revenue,
                settled_amount: t.settled_amount,
                unsettled_amount: t.unsettled_amount,
            };
            match source {
                LineSource::Store => stats.store_stats.push(stat),
                LineSource::Vending => stats.vending_stats.push(stat),
            }
        }
        Ok(stats)
    }

    /// Marks every outstanding line of `source_id` as paid out.
    pub async fn settle_vendor(&self, source_id: &str) -> Result<u64, DomainError> {
        if source_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("sourceId is required".to_string()));
        }
        let settled = self.orders.settle_vendor(source_id).await?;
        info!("Settled {settled} lines for vendor {source_id}");
        Ok(settled)
    }

    async fn display_name(&self, totals: &VendorTotals) -> String {
        let vendor = VendorRef::parse(totals.source.vendor_kind(), &totals.source_id);
        match self.vendors.resolve(&vendor).await {
            Ok(Some(v)) => v.name,
            Ok(None) => UNKNOWN_VENDOR_NAME.to_string(),
            Err(e) => {
                warn!("Vendor lookup for {} {} failed: {e}", totals.source, totals.source_id);
                UNKNOWN_VENDOR_NAME.to_string()
            }
        }
    }
}
