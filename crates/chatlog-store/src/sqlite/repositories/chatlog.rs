//! Chat log repository: the insert and the windowed history read.

use std::fmt::Write as _;

use rusqlite::types::ToSql;
use rusqlite::{Connection, params};

use crate::errors::{Result, StoreError};
use crate::sqlite::row_types::{ChatLogRow, NewChatLogRow};
use crate::types::{Addressing, Window};

/// Chat log repository. Stateless; every method takes `&Connection`.
pub struct ChatLogRepo;

impl ChatLogRepo {
    /// Insert one row.
    pub fn insert(conn: &Connection, row: &NewChatLogRow) -> Result<()> {
        let _ = conn
            .execute(
                "INSERT INTO chatlogs (senderId, time, request, responses, pageId, metadata, flag, timestamp, err)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.sender_id,
                    row.time,
                    row.request,
                    row.responses,
                    row.page_id,
                    row.metadata,
                    row.flag,
                    row.timestamp,
                    row.err,
                ],
            )
            .map_err(StoreError::Write)?;
        Ok(())
    }

    /// Read up to `limit` rows for a sender within a window, in fetch order.
    ///
    /// `limit == 0` reads every matching row. Ties on `timestamp` fall back
    /// to insertion order in the same direction.
    pub fn query_window(
        conn: &Connection,
        sender_id: &str,
        addressing: &Addressing,
        window: &Window,
        limit: u32,
    ) -> Result<Vec<ChatLogRow>> {
        let mut params: Vec<(&str, Box<dyn ToSql>)> = Vec::new();
        let predicate = match addressing {
            Addressing::ByPage { page_id } => {
                params.push((":sender_id", Box::new(sender_id.to_string())));
                params.push((":page_id", Box::new(page_id.clone())));
                "senderId = :sender_id AND pageId = :page_id"
            }
            Addressing::ByFlag => {
                params.push((":sender_id", Box::new(sender_id.to_string())));
                "flag = :sender_id"
            }
        };

        let mut sql = format!(
            "SELECT senderId, request, responses, metadata, pageId, timestamp, err
             FROM chatlogs INDEXED BY {index}
             WHERE {predicate}",
            index = addressing.index_name(),
        );
        if let Some((lower, upper)) = window.range {
            sql.push_str(" AND timestamp BETWEEN :lower AND :upper");
            params.push((":lower", Box::new(lower)));
            params.push((":upper", Box::new(upper)));
        }
        let dir = window.direction.as_sql();
        let _ = write!(sql, " ORDER BY timestamp {dir}, rowid {dir}");
        if limit > 0 {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let named: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (*name, value.as_ref()))
            .collect();

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Read)?;
        let rows = stmt
            .query_map(named.as_slice(), Self::map_row)
            .map_err(StoreError::Read)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Read)?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatLogRow> {
        Ok(ChatLogRow {
            sender_id: row.get(0)?,
            request: row.get(1)?,
            responses: row.get(2)?,
            metadata: row.get(3)?,
            page_id: row.get(4)?,
            timestamp: row.get(5)?,
            err: row.get(6)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
