//! Domain tag value object identifying a business area

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Business area a specialist agent is responsible for (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DomainTag {
    Shipments,
    Orders,
    Finance,
    Deliveries,
    Customers,
    Inventory,
    /// The basic agent answering when no specialist is relevant
    General,
    Custom(String),
}

impl DomainTag {
    pub fn as_str(&self) -> &str {
        match self {
            DomainTag::Shipments => "shipments",
            DomainTag::Orders => "orders",
            DomainTag::Finance => "finance",
            DomainTag::Deliveries => "deliveries",
            DomainTag::Customers => "customers",
            DomainTag::Inventory => "inventory",
            DomainTag::General => "general",
            DomainTag::Custom(s) => s,
        }
    }

    /// Tags with a built-in specialist
    pub fn builtin() -> Vec<DomainTag> {
        vec![
            DomainTag::Shipments,
            DomainTag::Orders,
            DomainTag::Finance,
            DomainTag::Deliveries,
            DomainTag::Customers,
            DomainTag::Inventory,
        ]
    }

    pub fn is_general(&self) -> bool {
        matches!(self, DomainTag::General)
    }
}

impl std::fmt::Display for DomainTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DomainTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "shipments" | "shipment" | "shipping" => DomainTag::Shipments,
            "orders" | "order" => DomainTag::Orders,
            "finance" | "financial" | "financials" => DomainTag::Finance,
            "deliveries" | "delivery" => DomainTag::Deliveries,
            "customers" | "customer" => DomainTag::Customers,
            "inventory" | "stock" => DomainTag::Inventory,
            "general" | "basic" | "default" => DomainTag::General,
            other => DomainTag::Custom(other.to_string()),
        })
    }
}

impl Serialize for DomainTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DomainTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(DomainTag::Custom(s)))
    }
}
