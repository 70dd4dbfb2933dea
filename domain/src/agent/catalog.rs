//! Built-in domain knowledge for the default specialists.

use super::domain_tag::DomainTag;
use super::knowledge::{DomainKnowledge, KeywordTable};

/// Default knowledge for a built-in tag.
///
/// Returns `None` for [`DomainTag::General`] and custom tags.
pub fn builtin_knowledge(tag: &DomainTag) -> Option<DomainKnowledge> {
    let knowledge = match tag {
        DomainTag::Shipments => DomainKnowledge::new(
            DomainTag::Shipments,
            "Shipments",
            KeywordTable::new(
                [
                    ("shipment", 3.0),
                    ("shipped", 2.5),
                    ("ship", 2.0),
                    ("shipping", 2.0),
                    ("carrier", 2.0),
                    ("tracking", 2.0),
                    ("freight", 1.5),
                    ("dispatch", 1.5),
                    ("in transit", 1.5),
                    ("warehouse", 1.0),
                    ("container", 1.0),
                ],
                5.0,
            ),
        )
        .with_description("Outbound shipments, carriers and tracking")
        .with_facts([
            "A shipment is created when an order leaves the warehouse.",
            "Shipments are tracked per carrier with a tracking number.",
            "Typical shipment states are pending, in transit and delivered.",
        ])
        .with_key_metrics(["shipment_count", "in_transit", "delayed", "avg_transit_days"]),

        DomainTag::Orders => DomainKnowledge::new(
            DomainTag::Orders,
            "Orders",
            KeywordTable::new(
                [
                    ("order", 3.0),
                    ("purchase", 2.0),
                    ("sales", 2.0),
                    ("cart", 1.5),
                    ("checkout", 1.5),
                    ("backorder", 1.5),
                    ("sku", 1.0),
                    ("quantity", 1.0),
                    ("cancelled", 1.0),
                ],
                5.0,
            ),
        )
        .with_description("Customer orders, order lines and order status")
        .with_facts([
            "An order must be placed before anything can be shipped for it.",
            "Order status moves from pending to confirmed, shipped and completed.",
            "Average order value is total revenue divided by order count.",
        ])
        .with_key_metrics(["order_count", "total_revenue", "avg_order_value", "cancelled"]),

        DomainTag::Finance => DomainKnowledge::new(
            DomainTag::Finance,
            "Finance",
            KeywordTable::new(
                [
                    ("revenue", 3.0),
                    ("invoice", 3.0),
                    ("payment", 2.5),
                    ("profit", 2.5),
                    ("cost", 2.0),
                    ("expense", 2.0),
                    ("margin", 2.0),
                    ("budget", 1.5),
                    ("cash flow", 1.5),
                    ("overdue", 1.5),
                    ("billing", 1.5),
                ],
                6.0,
            ),
        )
        .with_description("Revenue, invoices, payments and margins")
        .with_facts([
            "An invoice must be issued before a payment can be recorded against it.",
            "Profit margin is (revenue - cost) / revenue.",
            "Invoices past their due date without payment are overdue.",
        ])
        .with_key_metrics(["revenue", "cost", "profit_margin", "overdue_invoices"]),

        DomainTag::Deliveries => DomainKnowledge::new(
            DomainTag::Deliveries,
            "Deliveries",
            KeywordTable::new(
                [
                    ("delivery", 3.0),
                    ("delivered", 3.0),
                    ("deliver", 2.0),
                    ("on time", 2.0),
                    ("late", 1.5),
                    ("delayed", 1.5),
                    ("route", 1.5),
                    ("driver", 1.5),
                    ("proof of delivery", 2.0),
                    ("last mile", 1.5),
                ],
                5.0,
            ),
        )
        .with_description("Last-mile deliveries, delivery performance and delays")
        .with_facts([
            "A delivery can only happen after the goods were shipped.",
            "On-time delivery rate is on-time deliveries divided by all deliveries.",
            "Failed deliveries are usually re-attempted the next business day.",
        ])
        .with_key_metrics(["delivery_count", "on_time_rate", "failed", "avg_delay_hours"]),

        DomainTag::Customers => DomainKnowledge::new(
            DomainTag::Customers,
            "Customers",
            KeywordTable::new(
                [
                    ("customer", 3.0),
                    ("client", 2.5),
                    ("account", 1.5),
                    ("churn", 2.0),
                    ("retention", 2.0),
                    ("signup", 1.5),
                    ("loyalty", 1.5),
                    ("segment", 1.0),
                ],
                5.0,
            ),
        )
        .with_description("Customer base, segments and retention")
        .with_facts([
            "Active customers placed at least one order in the period.",
            "Churn rate is customers lost divided by customers at period start.",
        ])
        .with_key_metrics(["active_customers", "new_customers", "churn_rate"]),

        DomainTag::Inventory => DomainKnowledge::new(
            DomainTag::Inventory,
            "Inventory",
            KeywordTable::new(
                [
                    ("inventory", 3.0),
                    ("stock", 3.0),
                    ("restock", 2.0),
                    ("out of stock", 2.5),
                    ("reorder", 2.0),
                    ("units", 1.0),
                    ("supplier", 1.5),
                ],
                5.0,
            ),
        )
        .with_description("Stock levels, reorder points and suppliers")
        .with_facts([
            "Items below their reorder point should be restocked.",
            "Stock-out rate is out-of-stock SKUs divided by all SKUs.",
        ])
        .with_key_metrics(["sku_count", "out_of_stock", "units_on_hand"]),

        DomainTag::General | DomainTag::Custom(_) => return None,
    };
    Some(knowledge)
}

/// Knowledge for every built-in specialist, in registry order
pub fn builtin_catalog() -> Vec<DomainKnowledge> {
    DomainTag::builtin()
        .iter()
        .filter_map(builtin_knowledge)
        .collect()
}
