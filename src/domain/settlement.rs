use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};

use super::order::LineSource;

/// The money-relevant projection of one order line of a non-cancelled order.
#[derive(Debug, Clone)]
pub struct SettlementLine {
    pub source: LineSource,
    pub source_id: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub is_settled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorTotals {
    pub source: LineSource,
    pub source_id: String,
    pub total_revenue: BigDecimal,
    pub settled_amount: BigDecimal,
    pub unsettled_amount: BigDecimal,
}

impl VendorTotals {
    fn empty(source: LineSource, source_id: String) -> Self {
        Self {
            source,
            source_id,
            total_revenue: BigDecimal::zero(),
            settled_amount: BigDecimal::zero(),
            unsettled_amount: BigDecimal::zero(),
        }
    }
}

/// Groups lines by `(source, source_id)`.
///
/// `total_revenue` is accumulated from the two buckets, so it always equals
/// `settled_amount + unsettled_amount`.
pub fn aggregate<I>(lines: I) -> Vec<VendorTotals>
where
    I: IntoIterator<Item = SettlementLine>,
{
    let mut groups: BTreeMap<(LineSource, String), VendorTotals> = BTreeMap::new();
    for line in lines {
        let amount = &line.price * BigDecimal::from(line.quantity);
        let totals = groups
            .entry((line.source, line.source_id.clone()))
            .or_insert_with(|| VendorTotals::empty(line.source, line.source_id));
        if line.is_settled {
            totals.settled_amount += &amount;
        } else {
            totals.unsettled_amount += &amount;
        }
        totals.total_revenue += amount;
    }
    groups.into_values().collect()
}

/// One row of the settlement report.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorStat {
    pub id: String,
    pub name: String,
    pub total_revenue: BigDecimal,
    pub settled_amount: BigDecimal,
    pub unsettled_amount: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorStats {
    pub store_stats: Vec<VendorStat>,
    pub vending_stats: Vec<VendorStat>,
}

impl VendorStats {
    pub fn find(&self, id: &str) -> Option<&VendorStat> {
        self.store_stats
            .iter()
            .chain(self.vending_stats.iter())
            .find(|s| s.id == id)
    }
}
