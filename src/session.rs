//! Search flow: explicit state, the Idle → Loading → Rendered/Error cycle,
//! and stale-response handling.
//!
//! A search is split in three steps so several can be in flight at once:
//! [`SearchSession::begin`] plans the request and hands out a
//! [`PendingSearch`], [`PendingSearch::execute`] performs it against a
//! [`TaxaClient`] without touching the session, and
//! [`SearchSession::finish`] applies the result.

use crate::api::{TaxaClient, TaxaPage};
use crate::query::{SearchFilter, SearchQuery};
use crate::view::{ResultsView, TaxonCard};
use crate::Result;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// Search for a (possibly untrimmed) term from page 1
    New { input: String, filter: SearchFilter },
    /// Load the next page of the current search
    Continue,
}

impl SearchAction {
    pub fn new_search(input: impl Into<String>, filter: SearchFilter) -> Self {
        SearchAction::New {
            input: input.into(),
            filter,
        }
    }
}

/// Current term, page and filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub term: String,
    /// 0 until the first search, then ≥ 1
    pub page: u32,
    pub filter: SearchFilter,
}

impl SearchState {
    /// The state after `action`, or `None` when the action is a no-op
    /// (blank input, or "continue" before any search).
    pub fn next(&self, action: &SearchAction) -> Option<SearchState> {
        match action {
            SearchAction::New { input, filter } => {
                let term = input.trim();
                if term.is_empty() {
                    return None;
                }
                Some(SearchState {
                    term: term.to_string(),
                    page: 1,
                    filter: filter.clone(),
                })
            }
            SearchAction::Continue => {
                if self.term.is_empty() {
                    return None;
                }
                Some(SearchState {
                    term: self.term.clone(),
                    page: self.page + 1,
                    filter: self.filter.clone(),
                })
            }
        }
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(self.term.clone(), self.page, self.filter.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Rendered,
    Error(String),
}

/// A planned request, tagged with its sequence token and the generation
/// of the search it belongs to.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    token: u64,
    generation: u64,
    query: SearchQuery,
}

impl PendingSearch {
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Bumped by every new search; pages of one search share it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Perform the request. Errors are carried in the completion so the
    /// session can render them.
    pub async fn execute(self, client: &TaxaClient) -> Completion {
        let outcome = client.search(&self.query).await;
        Completion {
            token: self.token,
            generation: self.generation,
            query: self.query,
            outcome,
        }
    }
}

/// Result of a finished request.
#[derive(Debug)]
pub struct Completion {
    pub token: u64,
    pub generation: u64,
    pub query: SearchQuery,
    pub outcome: Result<TaxaPage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The completion was written to the view
    Applied(SearchStatus),
    /// A newer search replaced this one; the completion was dropped
    Discarded,
}

/// Owns the search state and the results view.
#[derive(Debug)]
pub struct SearchSession {
    state: SearchState,
    view: ResultsView,
    status: SearchStatus,
    last_token: u64,
    generation: u64,
    in_flight: usize,
    discard_stale: bool,
}

impl SearchSession {
    pub fn new(discard_stale: bool) -> Self {
        Self {
            state: SearchState::default(),
            view: ResultsView::new(),
            status: SearchStatus::Idle,
            last_token: 0,
            generation: 0,
            in_flight: 0,
            discard_stale,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Change the filter that later "continue" requests use. A new search
    /// carries its own filter and replaces this one.
    pub fn set_filter(&mut self, filter: SearchFilter) {
        self.state.filter = filter;
    }

    /// Plan the next request. Returns `None` (and changes nothing) for a
    /// blank term or a "continue" with no current search.
    pub fn begin(&mut self, action: SearchAction) -> Option<PendingSearch> {
        let next = match self.state.next(&action) {
            Some(next) => next,
            None => {
                log::debug!("ignoring no-op search action {:?}", action);
                return None;
            }
        };

        if matches!(action, SearchAction::New { .. }) {
            self.view.clear();
            self.generation += 1;
        }

        self.state = next;
        self.last_token += 1;
        self.in_flight += 1;
        self.status = SearchStatus::Loading;
        self.view.set_loading(true);

        Some(PendingSearch {
            token: self.last_token,
            generation: self.generation,
            query: self.state.query(),
        })
    }

    /// Apply a completed request to the view.
    pub fn finish(&mut self, completion: Completion) -> FinishOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        let is_latest = completion.token == self.last_token;
        // pages of the current search always apply, whatever order they land in
        if self.discard_stale && completion.generation != self.generation {
            log::debug!(
                "discarding stale response for '{}' page {} (search {} < {})",
                completion.query.term,
                completion.query.page,
                completion.generation,
                self.generation
            );
            return FinishOutcome::Discarded;
        }

        let status = match completion.outcome {
            Ok(page) => {
                let cards: Vec<TaxonCard> = page.results.iter().map(TaxonCard::from).collect();
                self.view.apply_page(cards, completion.query.page == 1);
                SearchStatus::Rendered
            }
            Err(err) => {
                log::error!("Error fetching data: {}", err);
                let message = err.to_string();
                self.view.apply_error(message.clone());
                SearchStatus::Error(message)
            }
        };

        if is_latest || self.in_flight == 0 {
            self.view.set_loading(false);
        }
        self.status = status.clone();
        FinishOutcome::Applied(status)
    }

    /// Begin, execute and finish one action. `None` for no-op actions.
    pub async fn run(&mut self, client: &TaxaClient, action: SearchAction) -> Option<FinishOutcome> {
        let pending = self.begin(action)?;
        let completion = pending.execute(client).await;
        Some(self.finish(completion))
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(true)
    }
}
