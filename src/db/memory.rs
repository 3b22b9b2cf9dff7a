//! In-memory stand-in for Postgres, for driving handlers in tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::*;
use crate::app::AppState;
use crate::utils::config::Config;

#[derive(Default)]
struct Tables {
    promo_codes: Vec<PromoCode>,
    support_messages: Vec<SupportMessage>,
    next_id: i32,
    opened: usize,
    closed: usize,
    failing: bool,
}

/// Hands out stores over one shared set of tables, counting opened and closed connections.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_promo_code(self, code: &str, discount_in_percent: i32, active: Option<bool>) -> Self {
        self.tables.lock().unwrap().promo_codes.push(PromoCode {
            code: code.into(),
            discount_in_percent,
            active,
        });
        self
    }

    /// Make every query fail as if the database went away.
    pub fn failing(self) -> Self {
        self.tables.lock().unwrap().failing = true;
        self
    }

    /// App state with a configured database URL, backed by this connector.
    pub fn state(&self) -> AppState {
        let config = Config::default().with_database_url(Some("postgres://memory/fartburger".into()));
        AppState { config, connector: Arc::new(self.clone()) }
    }

    /// App state with no database URL configured.
    pub fn unconfigured_state(&self) -> AppState {
        AppState { config: Config::default(), connector: Arc::new(self.clone()) }
    }

    pub fn opened(&self) -> usize {
        self.tables.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.tables.lock().unwrap().closed
    }

    pub fn support_messages(&self) -> Vec<SupportMessage> {
        self.tables.lock().unwrap().support_messages.clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn Store>> {
        self.tables.lock().unwrap().opened += 1;
        Ok(Box::new(MemoryStore { tables: Arc::clone(&self.tables) }))
    }
}

pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        let tables = self.tables.lock().unwrap();
        if tables.failing {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(tables)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_promo_code(&mut self, code: &str) -> Result<Option<PromoCode>> {
        let tables = self.tables()?;
        Ok(tables.promo_codes.iter().find(|p| p.code.to_uppercase() == code).cloned())
    }

    async fn list_support_messages(&mut self) -> Result<Vec<SupportMessage>> {
        let mut messages = self.tables()?.support_messages.clone();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn create_support_message(&mut self, new: &NewSupportMessage) -> Result<SupportMessage> {
        let mut tables = self.tables()?;
        tables.next_id += 1;
        let message = SupportMessage {
            id: tables.next_id,
            user_name: new.user_name.clone(),
            message: new.message.clone(),
            admin_response: None,
            status: MessageStatus::Pending,
            created_at: Some(Utc::now().naive_utc()),
            responded_at: None,
        };
        tables.support_messages.push(message.clone());
        Ok(message)
    }

    async fn respond_to_support_message(
        &mut self, id: i32, admin_response: &str,
    ) -> Result<Option<SupportMessage>> {
        let mut tables = self.tables()?;
        let Some(message) = tables.support_messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        message.admin_response = Some(admin_response.into());
        message.status = MessageStatus::Answered;
        message.responded_at = Some(Utc::now().naive_utc());
        Ok(Some(message.clone()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.tables.lock().unwrap().closed += 1;
        Ok(())
    }
}
