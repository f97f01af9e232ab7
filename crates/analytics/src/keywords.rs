//! Column-name keyword table for financial roles.

use serde::{Deserialize, Serialize};

/// Financial role a column can play.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricRole {
    Revenue,
    Cost,
    Profit,
}

impl MetricRole {
    /// Roles in matching priority order.
    pub const ALL: [MetricRole; 3] = [MetricRole::Revenue, MetricRole::Cost, MetricRole::Profit];

    /// Metric key fragment (`total_{key}`, `avg_{key}`).
    pub fn key(self) -> &'static str {
        match self {
            MetricRole::Revenue => "revenue",
            MetricRole::Cost => "cost",
            MetricRole::Profit => "profit",
        }
    }
}

/// Multilingual keyword lists per role.
///
/// Matching is a case-insensitive substring test on the column name. A
/// column takes the first role (revenue, then cost, then profit) whose list
/// matches, so "revenue_cost_ratio" is a revenue column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    pub revenue: Vec<String>,
    pub cost: Vec<String>,
    pub profit: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        fn words(ws: &[&str]) -> Vec<String> {
            ws.iter().map(|w| w.to_string()).collect()
        }
        Self {
            revenue: words(&["выручка", "revenue", "доход", "sales", "income"]),
            cost: words(&["расход", "cost", "expense", "затрат", "издерж"]),
            profit: words(&["прибыль", "profit", "марж", "margin"]),
        }
    }
}

impl KeywordTable {
    pub fn keywords(&self, role: MetricRole) -> &[String] {
        match role {
            MetricRole::Revenue => &self.revenue,
            MetricRole::Cost => &self.cost,
            MetricRole::Profit => &self.profit,
        }
    }

    pub fn role_of(&self, column: &str) -> Option<MetricRole> {
        let name = column.to_lowercase();
        MetricRole::ALL.into_iter().find(|role| {
            self.keywords(*role)
                .iter()
                .any(|kw| !kw.is_empty() && name.contains(&kw.to_lowercase()))
        })
    }

    pub fn is_empty(&self) -> bool {
        MetricRole::ALL
            .into_iter()
            .all(|role| self.keywords(role).iter().all(|kw| kw.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitive_substrings() {
        let table = KeywordTable::default();
        assert_eq!(table.role_of("Total_Revenue"), Some(MetricRole::Revenue));
        assert_eq!(table.role_of("Выручка, руб"), Some(MetricRole::Revenue));
        assert_eq!(table.role_of("marketing_expenses"), Some(MetricRole::Cost));
        assert_eq!(table.role_of("Net Profit"), Some(MetricRole::Profit));
        assert_eq!(table.role_of("region"), None);
    }

    #[test]
    fn first_role_wins() {
        let table = KeywordTable::default();
        assert_eq!(table.role_of("sales_cost"), Some(MetricRole::Revenue));
    }

    #[test]
    fn extra_locales_come_from_configuration() {
        let table: KeywordTable =
            serde_json::from_str(r#"{"revenue": ["umsatz"], "cost": ["kosten"]}"#).unwrap();
        assert_eq!(table.role_of("Umsatz 2024"), Some(MetricRole::Revenue));
        assert_eq!(table.role_of("Kosten"), Some(MetricRole::Cost));
        // Unspecified lists keep their defaults.
        assert_eq!(table.role_of("profit"), Some(MetricRole::Profit));
    }
}
