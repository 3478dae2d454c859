use serde::{Deserialize, Serialize};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 15)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 4)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Page request resolved against configured defaults.
///
/// Pages below 1 become 1; page sizes are clamped to `1..=max_per_page`.
pub fn resolve_page(
    page: Option<u64>,
    per_page: Option<u64>,
    default_per_page: u64,
    max_per_page: u64,
) -> (u64, u64) {
    let page = Ord::max(page.unwrap_or(1), 1);
    let max = Ord::max(max_per_page, 1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, max);
    (page, per_page)
}

/// Row offset of a resolved page, or `None` when the page lies past the last item.
pub fn page_offset(page: u64, per_page: u64, total: u64) -> Option<u64> {
    let offset = page.saturating_sub(1).checked_mul(per_page)?;
    (offset < total).then_some(offset)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
}

/// One-shot status message shown by the view the client navigates to next.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[schema(example = "Product created")]
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }
}

/// Result of a state-changing action: where to go next, what to tell the user,
/// and the record that was acted on.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Redirect<T> {
    pub alert: Alert,
    #[schema(example = "/api/v1/products")]
    pub redirect_to: String,
    pub data: T,
}

impl<T> Redirect<T> {
    pub fn success(redirect_to: &str, message: &str, data: T) -> Self {
        Self {
            alert: Alert::success(message),
            redirect_to: redirect_to.to_string(),
            data,
        }
    }
}
