pub use std::collections::HashMap;
pub use std::sync::Arc;

pub use axum::extract::{Query, State};
pub use axum::http::{HeaderMap, StatusCode};
pub use axum::routing::any;
pub use serde_json::json;

pub use crate::app::event::{ApiEvent, ApiResponse, Context};
pub use crate::app::{AppState, Invocation};
pub use crate::db::{Connector, Store};
pub use crate::utils::config::Config;
pub use crate::utils::error::{AppError, Result};
pub use crate::utils::types::{AxumRouter, SharedAppState};
