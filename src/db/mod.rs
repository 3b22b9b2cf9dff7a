use async_trait::async_trait;
use sqlx::{Connection as _, PgConnection};

use crate::utils::error::Result;

pub mod promo_code;
pub mod support_message;

#[cfg(test)]
pub mod memory;

pub use promo_code::PromoCode;
pub use support_message::{MessageStatus, NewSupportMessage, SupportMessage};

/// Schema every table of the site lives in.
pub const SCHEMA: &str = "t_p90162129_fartburger_site";

/// Opens one connection per invocation. There is no pool.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Store>>;
}

/// The queries the handlers run against an open connection.
#[async_trait]
pub trait Store: Send {
    /// Lookup a promo code by its uppercased form.
    async fn find_promo_code(&mut self, code: &str) -> Result<Option<PromoCode>>;

    /// All support messages, newest first.
    async fn list_support_messages(&mut self) -> Result<Vec<SupportMessage>>;

    /// Insert a pending message and commit.
    async fn create_support_message(&mut self, new: &NewSupportMessage) -> Result<SupportMessage>;

    /// Record an admin response and commit. `None` if no message has this id.
    async fn respond_to_support_message(
        &mut self, id: i32, admin_response: &str,
    ) -> Result<Option<SupportMessage>>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Close `store` and hand back `result`. The store is closed whether or not `result` is an error.
pub async fn release<T>(store: Box<dyn Store>, result: Result<T>) -> Result<T> {
    let closed = store.close().await;
    let value = result?;
    closed?;
    Ok(value)
}

/// Connects to Postgres with `sqlx`.
pub struct Postgres;

#[async_trait]
impl Connector for Postgres {
    async fn connect(&self, url: &str) -> Result<Box<dyn Store>> {
        let conn = PgConnection::connect(url).await?;
        Ok(Box::new(PgStore(conn)))
    }
}

pub struct PgStore(PgConnection);

#[async_trait]
impl Store for PgStore {
    async fn find_promo_code(&mut self, code: &str) -> Result<Option<PromoCode>> {
        PromoCode::lookup(&mut self.0, code).await
    }

    async fn list_support_messages(&mut self) -> Result<Vec<SupportMessage>> {
        SupportMessage::list(&mut self.0).await
    }

    async fn create_support_message(&mut self, new: &NewSupportMessage) -> Result<SupportMessage> {
        SupportMessage::create(&mut self.0, new).await
    }

    async fn respond_to_support_message(
        &mut self, id: i32, admin_response: &str,
    ) -> Result<Option<SupportMessage>> {
        SupportMessage::respond(&mut self.0, id, admin_response).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.0.close().await?;
        Ok(())
    }
}
