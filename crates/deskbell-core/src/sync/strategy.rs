use crate::api::{DocListQuery, NotificationApi};
use crate::error::SyncError;
use crate::models::{FetchMode, NotificationRecord, SyncOptions, UserInfoMap};

/// Result of one fetch, whatever the strategy
#[derive(Debug, Clone, Default)]
pub(crate) struct FetchOutcome {
    pub records: Vec<NotificationRecord>,
    /// Only the simple strategy returns user metadata
    pub user_info: Option<UserInfoMap>,
    pub has_more: bool,
}

/// Fetch shape resolved once from `SyncOptions::mode`
#[derive(Debug, Clone)]
pub(crate) enum FetchStrategy {
    Simple { limit: usize },
    Paginated { query: DocListQuery },
}

impl FetchStrategy {
    pub fn from_options(options: &SyncOptions) -> Self {
        match options.mode {
            FetchMode::Simple => FetchStrategy::Simple {
                limit: options.effective_limit(),
            },
            FetchMode::Paginated => FetchStrategy::Paginated {
                query: DocListQuery::for_notifications(options),
            },
        }
    }

    pub fn mode(&self) -> FetchMode {
        match self {
            FetchStrategy::Simple { .. } => FetchMode::Simple,
            FetchStrategy::Paginated { .. } => FetchMode::Paginated,
        }
    }

    pub async fn fetch(&self, api: &dyn NotificationApi) -> Result<FetchOutcome, SyncError> {
        match self {
            FetchStrategy::Simple { limit } => {
                let logs = api.get_notification_logs(*limit).await?;
                Ok(FetchOutcome {
                    records: logs.notification_logs,
                    user_info: Some(logs.user_info),
                    has_more: false,
                })
            }
            FetchStrategy::Paginated { query } => {
                let records = api.get_doc_list(query).await?;
                // Heuristic: a full page means there may be another one
                let has_more = records.len() >= query.limit;
                Ok(FetchOutcome {
                    records,
                    user_info: None,
                    has_more,
                })
            }
        }
    }
}
