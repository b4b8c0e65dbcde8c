//! Read path: windowed, chronologically ordered history.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::Result;
use crate::provider::ConnectionProvider;
use crate::sqlite::repositories::ChatLogRepo;
use crate::types::{HistoryQuery, Interaction};

/// Reads stored turns back for a sender.
///
/// Storage failures always propagate; there is no muting on this path.
#[derive(Clone)]
pub struct InteractionHistoryReader {
    provider: Arc<dyn ConnectionProvider>,
}

impl InteractionHistoryReader {
    /// Reader over the given provider.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Up to `query.limit` interactions inside the query window, oldest first.
    #[instrument(skip_all, fields(sender_id = %query.sender_id))]
    pub async fn get_interactions(&self, query: &HistoryQuery) -> Result<Vec<Interaction>> {
        let window = query.window();
        let conn = self.provider.connection().await?;

        let sender_id = query.sender_id.clone();
        let addressing = query.addressing.clone();
        let limit = query.limit;
        let rows = tokio::task::spawn_blocking(move || {
            ChatLogRepo::query_window(&conn, &sender_id, &addressing, &window, limit)
        })
        .await??;

        debug!(rows = rows.len(), direction = ?window.direction, "history read");
        let interactions = rows
            .into_iter()
            .map(Interaction::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(window.arrange(interactions))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
