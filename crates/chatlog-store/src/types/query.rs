//! History query parameters and window resolution.

/// Number of interactions returned when the caller does not set a limit.
pub const DEFAULT_LIMIT: u32 = 10;

/// How a history query selects its rows.
///
/// Records written with a page identity are found by sender and page; records
/// without one are found through their correlation `flag`, which the query
/// matches against the sender id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// `senderId = ? AND pageId = ?`, served by the `page_sender_timestamp` index.
    ByPage {
        /// Page the conversation happened on.
        page_id: String,
    },
    /// `flag = senderId`, served by the `flag` index.
    ByFlag,
}

impl Addressing {
    /// Address by page.
    pub fn by_page(page_id: impl Into<String>) -> Self {
        Self::ByPage {
            page_id: page_id.into(),
        }
    }

    /// `ByPage` when a non-empty page id is given, `ByFlag` otherwise.
    pub fn from_page_id(page_id: Option<&str>) -> Self {
        match page_id {
            Some(id) if !id.is_empty() => Self::by_page(id),
            _ => Self::ByFlag,
        }
    }

    /// Name of the index this addressing mode is served by.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::ByPage { .. } => "page_sender_timestamp",
            Self::ByFlag => "flag",
        }
    }
}

/// Fetch order used against storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Oldest first: rows closest to and after the lower bound.
    Ascending,
    /// Newest first: rows closest to and before the upper bound.
    Descending,
}

impl Direction {
    /// SQL keyword for `ORDER BY`.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// The resolved selection window of a history query.
///
/// Which anchors a caller passes decides which rows are picked; the output
/// is always oldest first. [`Window::arrange`] is the single place that
/// restores that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// Fetch order.
    pub direction: Direction,
    /// Inclusive `(lower, upper)` bounds on `timestamp`, or `None` for no filter.
    pub range: Option<(i64, i64)>,
}

impl Window {
    /// Resolve anchors into a window.
    ///
    /// - no anchors: newest rows overall
    /// - `end_at` (with or without `start_at`): newest rows in
    ///   `[start_at or 0, end_at]`
    /// - `start_at` only: oldest rows in `[start_at, i64::MAX]`
    ///
    /// An anchor of `0` is the same as no anchor.
    pub fn resolve(end_at: Option<i64>, start_at: Option<i64>) -> Self {
        let given = |anchor: Option<i64>| anchor.filter(|v| *v != 0);
        match (given(end_at), given(start_at)) {
            (None, None) => Self {
                direction: Direction::Descending,
                range: None,
            },
            (Some(end), start) => Self {
                direction: Direction::Descending,
                range: Some((start.unwrap_or(0), end)),
            },
            (None, Some(start)) => Self {
                direction: Direction::Ascending,
                range: Some((start, i64::MAX)),
            },
        }
    }

    /// Put fetched rows into chronological (ascending) order.
    pub fn arrange<T>(self, mut rows: Vec<T>) -> Vec<T> {
        if self.direction == Direction::Descending {
            rows.reverse();
        }
        rows
    }
}

/// Parameters of a history read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Sender whose history is read.
    pub sender_id: String,
    /// Page or flag addressing.
    pub addressing: Addressing,
    /// Maximum rows returned; `0` means unbounded.
    pub limit: u32,
    /// Inclusive upper anchor; selects the rows at or before it.
    pub end_at: Option<i64>,
    /// Inclusive lower anchor; alone, selects the rows at or after it.
    pub start_at: Option<i64>,
}

impl HistoryQuery {
    /// Latest [`DEFAULT_LIMIT`] interactions for a sender.
    pub fn new(sender_id: impl Into<String>, addressing: Addressing) -> Self {
        Self {
            sender_id: sender_id.into(),
            addressing,
            limit: DEFAULT_LIMIT,
            end_at: None,
            start_at: None,
        }
    }

    /// Set the row limit (`0` for unbounded).
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Read backwards from `end_at`.
    #[must_use]
    pub fn end_at(mut self, end_at: i64) -> Self {
        self.end_at = Some(end_at);
        self
    }

    /// Read forwards from `start_at`, or bound a backwards read from below.
    #[must_use]
    pub fn start_at(mut self, start_at: i64) -> Self {
        self.start_at = Some(start_at);
        self
    }

    /// Resolve the selection window.
    pub fn window(&self) -> Window {
        Window::resolve(self.end_at, self.start_at)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
