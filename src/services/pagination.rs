use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::pipeline::{Outcome, RequestContext};
use crate::processor::Processor;
use crate::server::Request;

/// Class annotation that installs pagination.
pub const PAGINATED: &str = "Paginated";

/// Attribute holding the request's [`PaginationState`].
pub const PAGINATION_ATTR: &str = "paginationContext";

const PAGE_PARAM: &str = "page";
const PER_PAGE_PARAM: &str = "perPage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: 30,
            max_per_page: 100,
        }
    }
}

/// Number of pages needed for `total_items`; an empty collection still has
/// one page.
#[must_use]
pub fn compute_total_pages(total_items: u64, per_page: u32) -> u32 {
    if total_items == 0 || per_page == 0 {
        return 1;
    }
    let pages = total_items.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Paging state of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    page: u32,
    per_page: u32,
    total_pages: Option<u32>,
}

/// Serializable view used by templates and the `pagination` parameter kind.
///
/// Navigation fields are `null` when not applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSummary {
    pub current: u32,
    pub next: Option<u32>,
    pub last: Option<u32>,
    pub prev: Option<u32>,
    pub first: Option<u32>,
    pub per_page: u32,
    pub total: Option<u32>,
}

impl PaginationState {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            total_pages: None,
        }
    }

    /// Read `page` and `perPage` from the query string.
    ///
    /// Fails with 400 on non-integers, values below 1 or `perPage` above the
    /// configured maximum.
    pub fn from_request(request: &Request, config: &PaginationConfig) -> Result<Self, PipelineError> {
        let page = parse_param(request, PAGE_PARAM)?.unwrap_or(1);
        let per_page =
            parse_param(request, PER_PAGE_PARAM)?.unwrap_or(i64::from(config.default_per_page));

        if page < 1 {
            return Err(PipelineError::bad_request(format!(
                "Invalid {PAGE_PARAM} parameter, must be at least 1"
            )));
        }
        if per_page < 1 {
            return Err(PipelineError::bad_request(format!(
                "Invalid {PER_PAGE_PARAM} parameter, must be at least 1"
            )));
        }
        if per_page > i64::from(config.max_per_page) {
            return Err(PipelineError::bad_request(format!(
                "Invalid {PER_PAGE_PARAM} parameter, max is {}",
                config.max_per_page
            )));
        }
        // Both bounds checked above.
        Ok(Self::new(
            u32::try_from(page).unwrap_or(u32::MAX),
            u32::try_from(per_page).unwrap_or(config.max_per_page),
        ))
    }

    pub fn from_context(ctx: &RequestContext) -> Option<&Self> {
        ctx.attributes.get::<Self>(PAGINATION_ATTR)
    }

    pub fn from_context_mut(ctx: &mut RequestContext) -> Option<&mut Self> {
        ctx.attributes.get_mut::<Self>(PAGINATION_ATTR)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Unset until the handler reports a total.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Report the size of the whole collection.
    pub fn set_total_items(&mut self, total_items: u64) {
        self.total_pages = Some(compute_total_pages(total_items, self.per_page));
    }

    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.total_pages.is_some_and(|total| total > self.page)
    }

    /// Zero-based offset of the first item on this page.
    #[must_use]
    pub fn first_item_in_page(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.saturating_sub(1))
    }

    /// Exclusive end offset of this page.
    #[must_use]
    pub fn last_item_in_page(&self) -> u64 {
        self.first_item_in_page() + u64::from(self.per_page)
    }

    pub fn summary(&self) -> PaginationSummary {
        let not_last = self.total_pages.filter(|&total| self.page < total);
        let not_first = self.page > 1;
        PaginationSummary {
            current: self.page,
            next: not_last.map(|_| self.page + 1),
            last: not_last,
            prev: not_first.then(|| self.page - 1),
            first: not_first.then_some(1),
            per_page: self.per_page,
            total: self.total_pages,
        }
    }

    /// `Link` header value for `url`, or `None` when the total is unknown or
    /// there is nowhere to navigate.
    ///
    /// Relations are emitted in the order first, prev, last, next.
    pub fn build_link_header(&self, url: &str) -> Option<String> {
        let total = self.total_pages?;
        let mut links = Vec::with_capacity(4);
        if self.page > 1 {
            links.push(self.page_link(url, 1, "first"));
            links.push(self.page_link(url, self.page - 1, "prev"));
        }
        if self.page < total {
            links.push(self.page_link(url, total, "last"));
            links.push(self.page_link(url, self.page + 1, "next"));
        }
        if links.is_empty() {
            None
        } else {
            Some(links.join(", "))
        }
    }

    fn page_link(&self, url: &str, page: u32, rel: &str) -> String {
        format!("<{}>; rel=\"{}\"", self.page_url(url, page), rel)
    }

    /// Rewrite every `page` parameter of `url` to `page`, appending one if
    /// absent, and append `perPage` unless already present.
    fn page_url(&self, url: &str, page: u32) -> String {
        let (base, query) = url.split_once('?').unwrap_or((url, ""));
        let mut parts: Vec<String> = Vec::new();
        let mut saw_page = false;
        let mut saw_per_page = false;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let key = pair.split('=').next().unwrap_or(pair);
            if key == PAGE_PARAM {
                saw_page = true;
                parts.push(format!("{PAGE_PARAM}={page}"));
            } else {
                saw_per_page |= key == PER_PAGE_PARAM;
                parts.push(pair.to_string());
            }
        }
        if !saw_page {
            parts.push(format!("{PAGE_PARAM}={page}"));
        }
        if !saw_per_page {
            parts.push(format!("{PER_PAGE_PARAM}={}", self.per_page));
        }
        format!("{base}?{}", parts.join("&"))
    }
}

fn parse_param(request: &Request, name: &str) -> Result<Option<i64>, PipelineError> {
    request
        .get_query_param(name)
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                PipelineError::bad_request(format!(
                    "Invalid pagination parameters: expecting an integer for {name}"
                ))
            })
        })
        .transpose()
}

/// Stores [`PaginationState`] before the handler and emits the `Link`
/// header after it.
#[derive(Debug, Clone, Default)]
pub struct PaginationProcessor {
    config: PaginationConfig,
}

impl PaginationProcessor {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }
}

impl Processor for PaginationProcessor {
    fn name(&self) -> &str {
        "pagination"
    }

    fn pre_handle(&self, ctx: &mut RequestContext) -> Outcome {
        match PaginationState::from_request(&ctx.request, &self.config) {
            Ok(state) => {
                debug!(
                    request_id = %ctx.request_id,
                    page = state.page,
                    per_page = state.per_page,
                    "Pagination state stored"
                );
                ctx.attributes.insert(PAGINATION_ATTR, state);
                Outcome::Continue
            }
            Err(err) => Outcome::Fail(err),
        }
    }

    fn post_handle(&self, ctx: &mut RequestContext) -> Outcome {
        let Some(state) = PaginationState::from_context(ctx) else {
            return Outcome::Continue;
        };
        if state.total_pages.is_none() {
            warn!(
                request_id = %ctx.request_id,
                controller = %ctx.controller,
                handler = %ctx.handler,
                "Total item count was not set, response won't be paginated"
            );
            return Outcome::Continue;
        }
        if let Some(link) = state.build_link_header(&ctx.request.url) {
            ctx.response.add_header("Link", link);
        }
        Outcome::Continue
    }
}
