use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    /// `ORDER BY` over JSONB values; Postgres orders mixed JSON types by kind first.
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"data\"->'{}' {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
