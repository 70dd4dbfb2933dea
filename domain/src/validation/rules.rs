//! Fixed rule tables used by the critic.

use super::result::ValidationCategory;

/// A declared process ordering: `earlier` must happen before `later`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencingRule {
    pub name: &'static str,
    /// Count unit of the earlier event ("order")
    pub earlier_unit: &'static str,
    /// Count unit of the later event ("shipment")
    pub later_unit: &'static str,
    /// Phrases asserting the later event happened
    pub later_terms: &'static [&'static str],
    /// Phrases asserting the earlier event did not happen
    pub earlier_negations: &'static [&'static str],
}

pub const SEQUENCING_RULES: &[SequencingRule] = &[
    SequencingRule {
        name: "order must precede shipment",
        earlier_unit: "order",
        later_unit: "shipment",
        later_terms: &["shipped", "shipment", "in transit"],
        earlier_negations: &[
            "no order",
            "never ordered",
            "not ordered",
            "without an order",
            "order not placed",
            "order was not placed",
        ],
    },
    SequencingRule {
        name: "shipment must precede delivery",
        earlier_unit: "shipment",
        later_unit: "delivery",
        later_terms: &["delivered", "delivery completed", "received by"],
        earlier_negations: &[
            "not shipped",
            "never shipped",
            "not yet shipped",
            "has not shipped",
            "unshipped",
            "no shipment",
        ],
    },
    SequencingRule {
        name: "invoice must precede payment",
        earlier_unit: "invoice",
        later_unit: "payment",
        later_terms: &["paid", "payment received", "settled"],
        earlier_negations: &[
            "no invoice",
            "not invoiced",
            "never invoiced",
            "uninvoiced",
            "invoice not issued",
            "invoice was not issued",
        ],
    },
];

/// Words that contradict each other when two answers use one each
pub const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("increased", "decreased"),
    ("increasing", "decreasing"),
    ("growth", "decline"),
    ("rising", "falling"),
    ("approved", "pending"),
    ("approved", "rejected"),
    ("paid", "unpaid"),
    ("on time", "delayed"),
    ("delivered", "undelivered"),
    ("profit", "loss"),
    ("in stock", "out of stock"),
];

/// Phrases asserting that nothing was found
pub const NO_DATA_PHRASES: &[&str] = &[
    "no data",
    "no records",
    "no results",
    "no matching",
    "not found",
    "nothing found",
    "none found",
    "could not find",
    "couldn t find",
    "no information",
    "zero results",
    "there are no",
    "there were no",
];

/// Phrases asserting that data was found
pub const FOUND_DATA_PHRASES: &[&str] = &[
    "found",
    "there are",
    "there were",
    "total of",
    "totaled",
    "totalled",
    "recorded",
    "we have",
    "shows",
];

/// Recommendations, keyed by the category with the most inconsistencies
pub fn recommendations_for(category: ValidationCategory) -> &'static [&'static str] {
    match category {
        ValidationCategory::Temporal => &[
            "Confirm the reporting period; the answers reference different or implausible dates.",
            "Restate the query with an explicit date range.",
        ],
        ValidationCategory::DataAvailability => &[
            "Check data-source coverage; some agents found data while others found none.",
            "Re-run the query against the domain that reported data to confirm the result.",
        ],
        ValidationCategory::Numeric => &[
            "Reconcile the reported figures against the source data before relying on them.",
            "Check that the answers aggregate over the same scope, period and currency.",
        ],
        ValidationCategory::BusinessRules => &[
            "Review record status; the answers break the expected process order.",
            "Look for missing upstream records (orders, shipments or invoices).",
        ],
    }
}
