use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::{Connection as _, PgConnection, Postgres};

use super::SCHEMA;
use crate::utils::error::Result;

/// Placeholder name for customers who don't give one.
pub const ANONYMOUS: &str = "Аноним";

/// A customer's support message and the admin's reply, if any.
///
/// `admin_response` and `responded_at` are set together, exactly when `status` is
/// [`MessageStatus::Answered`].
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct SupportMessage {
    pub id: i32,
    pub user_name: String,
    pub message: String,
    pub admin_response: Option<String>,
    pub status: MessageStatus,
    pub created_at: Option<NaiveDateTime>,
    pub responded_at: Option<NaiveDateTime>,
}

/// A validated customer submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSupportMessage {
    pub user_name: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Answered,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "answered" => Ok(Self::Answered),
            _ => Err(format!("invalid message status: {s}")),
        }
    }
}

impl sqlx::Type<Postgres> for MessageStatus {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for MessageStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl SupportMessage {
    /// List all messages, newest first.
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Self>> {
        let messages = sqlx::query_as::<_, Self>(&list_sql()).fetch_all(conn).await?;
        Ok(messages)
    }

    /// Create a new pending message.
    pub async fn create(conn: &mut PgConnection, new: &NewSupportMessage) -> Result<Self> {
        let sql = create_sql();
        let mut tx = conn.begin().await?;
        let message = sqlx::query_as::<_, Self>(&sql)
            .bind(&new.user_name)
            .bind(&new.message)
            .bind(MessageStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(message)
    }

    /// Answer a message. Update and read-back are one statement, so there's no separate existence check.
    pub async fn respond(
        conn: &mut PgConnection, id: i32, admin_response: &str,
    ) -> Result<Option<Self>> {
        let sql = respond_sql();
        let mut tx = conn.begin().await?;
        let message = sqlx::query_as::<_, Self>(&sql)
            .bind(admin_response)
            .bind(MessageStatus::Answered.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(message)
    }
}

const COLUMNS: &str = "id, user_name, message, admin_response, status, created_at, responded_at";

fn list_sql() -> String {
    format!(
        "SELECT {COLUMNS} \
         FROM {SCHEMA}.support_messages \
         ORDER BY created_at DESC NULLS LAST, id DESC"
    )
}

/// Binds `$1` user_name, `$2` message, `$3` status.
fn create_sql() -> String {
    format!(
        "INSERT INTO {SCHEMA}.support_messages \
            (user_name, message, status, created_at) \
            VALUES ($1, $2, $3, NOW()) \
         RETURNING {COLUMNS}"
    )
}

/// Binds `$1` admin_response, `$2` status, `$3` id.
fn respond_sql() -> String {
    format!(
        "UPDATE {SCHEMA}.support_messages \
         SET admin_response = $1, status = $2, responded_at = NOW() \
         WHERE id = $3 \
         RETURNING {COLUMNS}"
    )
}
