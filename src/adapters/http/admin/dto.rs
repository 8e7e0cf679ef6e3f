use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainerSearchQuery {
    pub search: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImpersonateRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookListQuery {
    #[serde(default)]
    pub unprocessed: bool,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequeueRequest {
    /// Queue delivery jobs for the requeued rows.
    #[serde(default)]
    pub deliver: bool,
}
