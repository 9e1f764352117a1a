//! Paginated list controller.
//!
//! One controller backs one list view. It owns the view's filter, the records
//! loaded so far and the pagination cursor, and it is the only thing allowed to
//! mutate them. The state machine is synchronous: a transition that needs data
//! hands out a [`PageTicket`], and the response is fed back through
//! [`ListController::complete`]. The async drivers (`load_initial`, `load_more`,
//! ...) simply combine the two against a [`PageSource`].
//!
//! At most one ticket is outstanding per controller. Responses for tickets that
//! were superseded by a filter change, or issued before the view was closed, are
//! discarded without touching state.

use crate::errors::{ErrorKind, GatewayError};
use crate::models::PageRequest;
use crate::post_filter::{self, RecordFilter, VisibleOutcome};
use crate::query::{BusinessQuery, CheckinQuery, ListQuery, ReviewQuery, TipQuery, UserQuery};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Anything that can serve one page of a list query.
///
/// The gateway client implements this for every query type; tests use stubs.
#[allow(async_fn_in_trait)]
pub trait PageSource<Q: ListQuery> {
    async fn fetch_page(
        &self,
        query: &Q,
        page: PageRequest,
    ) -> Result<Vec<Q::Record>, GatewayError>;
}

/// Whether a request loads the first page or appends a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    More,
}

/// The view's state. Each variant carries only what is meaningful in it.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    /// Nothing requested yet, or the view was closed.
    Idle,
    /// First page in flight. Results from any previous filter are gone.
    LoadingInitial,
    /// A later page is in flight; `items` stay visible.
    LoadingMore {
        items: Vec<T>,
        /// `skip` of the in-flight request.
        cursor: u32,
    },
    /// No request in flight.
    Loaded {
        items: Vec<T>,
        /// `skip` of the next page.
        cursor: u32,
        has_more: bool,
    },
    /// The last request failed. `items` holds whatever loaded before it.
    Failed {
        items: Vec<T>,
        error: GatewayError,
        failed: PageRequest,
        kind: FetchKind,
    },
}

/// Fieldless mirror of [`ListState`], handy for assertions and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    LoadingInitial,
    LoadingMore,
    Loaded,
    Failed,
}

impl<T> ListState<T> {
    pub fn phase(&self) -> ListPhase {
        match self {
            ListState::Idle => ListPhase::Idle,
            ListState::LoadingInitial => ListPhase::LoadingInitial,
            ListState::LoadingMore { .. } => ListPhase::LoadingMore,
            ListState::Loaded { .. } => ListPhase::Loaded,
            ListState::Failed { .. } => ListPhase::Failed,
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            ListState::Idle | ListState::LoadingInitial => &[],
            ListState::LoadingMore { items, .. }
            | ListState::Loaded { items, .. }
            | ListState::Failed { items, .. } => items,
        }
    }
}

/// What a view shows for its current state.
#[derive(Debug, Clone, PartialEq)]
pub enum ListStatus {
    Idle,
    Loading,
    LoadingMore { count: usize },
    Ready { count: usize, has_more: bool },
    /// The filter matched nothing on the server.
    NoResults,
    /// A request failed; `message` is user-facing.
    Failed {
        kind: ErrorKind,
        message: String,
        count: usize,
    },
}

/// Shared flag that goes false when the owning view is torn down.
///
/// Every ticket captures a clone at issue time and checks it before its
/// response may touch state.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether both handles belong to the same view.
    fn same_view(&self, other: &Liveness) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Permission to perform one fetch and apply its result.
#[derive(Debug)]
pub struct PageTicket<Q> {
    id: u64,
    query: Q,
    page: PageRequest,
    kind: FetchKind,
    liveness: Liveness,
}

impl<Q: ListQuery> PageTicket<Q> {
    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Performs the request this ticket stands for. Does not touch any controller.
    pub async fn fetch<S: PageSource<Q>>(
        &self,
        source: &S,
    ) -> Result<Vec<Q::Record>, GatewayError> {
        source.fetch_page(&self.query, self.page).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The view was closed after the request was issued.
    TornDown,
    /// A newer request replaced this one.
    Superseded,
    /// The ticket was issued by another controller.
    ForeignTicket,
}

/// Result of driving one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response was applied.
    Applied,
    /// The transition is not allowed in the current state; nothing was sent.
    Refused,
    /// The response arrived but was dropped.
    Discarded(DiscardReason),
}

/// Paginated, filter-driven list state for one view.
#[derive(Debug)]
pub struct ListController<Q: ListQuery> {
    query: Q,
    page_size: u32,
    state: ListState<Q::Record>,
    next_request_id: u64,
    outstanding: Option<u64>,
    liveness: Liveness,
}

pub type BusinessList = ListController<BusinessQuery>;
pub type ReviewList = ListController<ReviewQuery>;
pub type UserList = ListController<UserQuery>;
pub type TipList = ListController<TipQuery>;
pub type CheckinList = ListController<CheckinQuery>;

impl<Q: ListQuery> ListController<Q> {
    /// Creates an idle controller. Nothing is fetched until `reload` or `load_initial`.
    pub fn new(query: Q, page_size: u32) -> Self {
        Self {
            query,
            page_size: page_size.max(1),
            state: ListState::Idle,
            next_request_id: 0,
            outstanding: None,
            liveness: Liveness::new(),
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn state(&self) -> &ListState<Q::Record> {
        &self.state
    }

    pub fn phase(&self) -> ListPhase {
        self.state.phase()
    }

    /// Raw records in server order, before any post-filter.
    pub fn items(&self) -> &[Q::Record] {
        self.state.items()
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Whether another page is believed to exist.
    ///
    /// Optimistic until a short page proves otherwise; a failed request keeps
    /// the door open so the user can retry.
    pub fn has_more(&self) -> bool {
        match &self.state {
            ListState::Idle => false,
            ListState::LoadingInitial | ListState::LoadingMore { .. } => true,
            ListState::Loaded { has_more, .. } => *has_more,
            ListState::Failed { .. } => true,
        }
    }

    /// `skip` of the next page to request.
    pub fn cursor(&self) -> u32 {
        match &self.state {
            ListState::Idle | ListState::LoadingInitial => 0,
            ListState::LoadingMore { cursor, .. } | ListState::Loaded { cursor, .. } => *cursor,
            ListState::Failed { failed, .. } => failed.skip,
        }
    }

    pub fn error(&self) -> Option<&GatewayError> {
        match &self.state {
            ListState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> ListStatus {
        match &self.state {
            ListState::Idle => ListStatus::Idle,
            ListState::LoadingInitial => ListStatus::Loading,
            ListState::LoadingMore { items, .. } => ListStatus::LoadingMore { count: items.len() },
            ListState::Loaded { items, .. } if items.is_empty() => ListStatus::NoResults,
            ListState::Loaded {
                items, has_more, ..
            } => ListStatus::Ready {
                count: items.len(),
                has_more: *has_more,
            },
            ListState::Failed { items, error, .. } => ListStatus::Failed {
                kind: error.kind(),
                message: error.user_message(),
                count: items.len(),
            },
        }
    }

    /// Loaded records that pass `filter`. Never triggers a fetch.
    pub fn visible<'a, F: RecordFilter<Q::Record>>(&'a self, filter: &F) -> Vec<&'a Q::Record> {
        post_filter::apply(self.items(), filter)
    }

    pub fn visible_outcome<F: RecordFilter<Q::Record>>(&self, filter: &F) -> VisibleOutcome {
        post_filter::outcome(self.items(), filter, self.has_more())
    }

    fn issue(&mut self, kind: FetchKind, page: PageRequest) -> PageTicket<Q> {
        self.next_request_id += 1;
        let id = self.next_request_id;
        self.outstanding = Some(id);
        tracing::debug!(
            "Issuing {:?} request #{} for {} (skip={}, limit={})",
            kind,
            id,
            self.query.describe(),
            page.skip,
            page.limit
        );
        PageTicket {
            id,
            query: self.query.clone(),
            page,
            kind,
            liveness: self.liveness.clone(),
        }
    }

    /// (Re)loads the first page for the current filter.
    ///
    /// Refused while any request is in flight.
    pub fn reload(&mut self) -> Option<PageTicket<Q>> {
        if !self.is_alive() || self.outstanding.is_some() {
            return None;
        }
        self.state = ListState::LoadingInitial;
        Some(self.issue(FetchKind::Initial, PageRequest::first(self.page_size)))
    }

    /// Switches to a new filter: results are cleared and page zero is requested.
    ///
    /// Re-submitting the filter whose first page is already loading is a no-op.
    /// Any other in-flight request is superseded and its response will be discarded.
    pub fn set_query(&mut self, query: Q) -> Option<PageTicket<Q>> {
        if !self.is_alive() {
            return None;
        }
        if query == self.query && self.phase() == ListPhase::LoadingInitial {
            tracing::debug!("Filter unchanged and first page already loading, skipping request");
            return None;
        }
        if let Some(id) = self.outstanding {
            tracing::debug!("Filter changed, superseding request #{}", id);
        }
        self.query = query;
        self.state = ListState::LoadingInitial;
        Some(self.issue(FetchKind::Initial, PageRequest::first(self.page_size)))
    }

    /// Requests the next page. Only allowed when loaded with more pages available.
    pub fn request_more(&mut self) -> Option<PageTicket<Q>> {
        if !self.is_alive() || self.outstanding.is_some() {
            tracing::debug!("Already loading, skipping request");
            return None;
        }
        match std::mem::replace(&mut self.state, ListState::Idle) {
            ListState::Loaded {
                items,
                cursor,
                has_more: true,
            } => {
                self.state = ListState::LoadingMore { items, cursor };
                Some(self.issue(FetchKind::More, PageRequest::new(cursor, self.page_size)))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Re-issues the request that failed, with the same window.
    pub fn retry(&mut self) -> Option<PageTicket<Q>> {
        if !self.is_alive() || self.outstanding.is_some() {
            return None;
        }
        match std::mem::replace(&mut self.state, ListState::Idle) {
            ListState::Failed {
                items,
                failed,
                kind: FetchKind::More,
                ..
            } => {
                self.state = ListState::LoadingMore {
                    items,
                    cursor: failed.skip,
                };
                Some(self.issue(FetchKind::More, failed))
            }
            ListState::Failed {
                failed,
                kind: FetchKind::Initial,
                ..
            } => {
                self.state = ListState::LoadingInitial;
                Some(self.issue(FetchKind::Initial, failed))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Applies the outcome of a ticket's request.
    pub fn complete(
        &mut self,
        ticket: PageTicket<Q>,
        result: Result<Vec<Q::Record>, GatewayError>,
    ) -> Completion {
        if !ticket.liveness.same_view(&self.liveness) {
            tracing::warn!(
                "Discarding response for request #{}: ticket belongs to another view",
                ticket.id
            );
            return Completion::Discarded(DiscardReason::ForeignTicket);
        }
        if !ticket.liveness.is_alive() || !self.is_alive() {
            tracing::warn!(
                "Discarding response for request #{}: view was closed",
                ticket.id
            );
            return Completion::Discarded(DiscardReason::TornDown);
        }
        if self.outstanding != Some(ticket.id) {
            tracing::debug!("Discarding response for superseded request #{}", ticket.id);
            return Completion::Discarded(DiscardReason::Superseded);
        }
        self.outstanding = None;

        let page = ticket.page;
        let previous = std::mem::replace(&mut self.state, ListState::Idle);
        let next = match (previous, result) {
            (ListState::LoadingInitial, Ok(records)) => {
                tracing::info!(
                    "Loaded {} records for {}",
                    records.len(),
                    ticket.query.describe()
                );
                loaded(records, page)
            }
            (ListState::LoadingMore { mut items, .. }, Ok(records)) => {
                let full = is_full_page(records.len(), page);
                tracing::info!(
                    "Loaded {} more records for {} ({} total)",
                    records.len(),
                    ticket.query.describe(),
                    items.len() + records.len()
                );
                items.extend(records);
                ListState::Loaded {
                    items,
                    cursor: page.next().skip,
                    has_more: full,
                }
            }
            (ListState::LoadingInitial, Err(error)) => {
                tracing::error!("Failed to load {}: {}", ticket.query.describe(), error);
                ListState::Failed {
                    items: Vec::new(),
                    error,
                    failed: page,
                    kind: FetchKind::Initial,
                }
            }
            (ListState::LoadingMore { items, .. }, Err(error)) => {
                tracing::error!(
                    "Failed to load more for {}: {}",
                    ticket.query.describe(),
                    error
                );
                ListState::Failed {
                    items,
                    error,
                    failed: page,
                    kind: FetchKind::More,
                }
            }
            (other, _) => {
                // outstanding id matched but state is not loading; keep it untouched
                self.state = other;
                return Completion::Discarded(DiscardReason::Superseded);
            }
        };
        self.state = next;
        Completion::Applied
    }

    /// Tears the view down. Loaded records are dropped and any in-flight
    /// response will be discarded on arrival.
    pub fn close(&mut self) {
        self.liveness.kill();
        self.outstanding = None;
        self.state = ListState::Idle;
    }

    async fn run<S: PageSource<Q>>(&mut self, source: &S, ticket: PageTicket<Q>) -> Completion {
        let result = ticket.fetch(source).await;
        self.complete(ticket, result)
    }

    /// Mount or refresh: clears results and loads the first page.
    pub async fn load_initial<S: PageSource<Q>>(&mut self, source: &S) -> Completion {
        match self.reload() {
            Some(ticket) => self.run(source, ticket).await,
            None => Completion::Refused,
        }
    }

    /// Filter change followed by the first-page fetch.
    pub async fn change_query<S: PageSource<Q>>(&mut self, query: Q, source: &S) -> Completion {
        match self.set_query(query) {
            Some(ticket) => self.run(source, ticket).await,
            None => Completion::Refused,
        }
    }

    pub async fn load_more<S: PageSource<Q>>(&mut self, source: &S) -> Completion {
        match self.request_more() {
            Some(ticket) => self.run(source, ticket).await,
            None => Completion::Refused,
        }
    }

    pub async fn retry_with<S: PageSource<Q>>(&mut self, source: &S) -> Completion {
        match self.retry() {
            Some(ticket) => self.run(source, ticket).await,
            None => Completion::Refused,
        }
    }
}

/// A full page implies more may exist; a short page means the sequence is exhausted.
fn is_full_page(len: usize, page: PageRequest) -> bool {
    len >= page.limit as usize
}

fn loaded<T>(records: Vec<T>, page: PageRequest) -> ListState<T> {
    let has_more = is_full_page(records.len(), page);
    ListState::Loaded {
        items: records,
        cursor: page.next().skip,
        has_more,
    }
}
