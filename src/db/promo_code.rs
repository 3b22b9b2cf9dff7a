use sqlx::PgConnection;

use super::SCHEMA;
use crate::utils::error::Result;

/// A discount code. Maintained out of band, read-only here.
#[derive(Clone, Debug, sqlx::FromRow, serde::Serialize)]
pub struct PromoCode {
    pub code: String,
    pub discount_in_percent: i32,
    /// Only an explicit `false` disables the code.
    pub active: Option<bool>,
}

impl PromoCode {
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }

    /// Lookup a promo code, case-insensitively. `code` must already be uppercase.
    pub async fn lookup(conn: &mut PgConnection, code: &str) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(&lookup_sql()).bind(code).fetch_optional(conn).await?;
        Ok(row)
    }
}

/// Binds `$1` to the uppercased code.
fn lookup_sql() -> String {
    format!(
        "SELECT code, discount_in_percent, active \
         FROM {SCHEMA}.promo_codes \
         WHERE UPPER(code) = $1"
    )
}
