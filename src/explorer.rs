//! High-level facade wiring the client, the search session and the
//! postcard composer together.

use crate::api::TaxaClient;
use crate::query::SearchFilter;
use crate::session::{FinishOutcome, SearchAction, SearchSession};
use crate::view::ResultsView;
use crate::{ExplorerConfig, Result};

#[cfg(feature = "postcard")]
use crate::postcard::{Postcard, PostcardComposer, PostcardSpec};

pub struct Explorer {
    client: TaxaClient,
    session: SearchSession,
    #[cfg(feature = "postcard")]
    composer: PostcardComposer,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let client = TaxaClient::new(&config)?;
        #[cfg(feature = "postcard")]
        let composer = PostcardComposer::new(client.http().clone(), config.postcard.clone());

        Ok(Self {
            session: SearchSession::new(config.discard_stale_responses),
            client,
            #[cfg(feature = "postcard")]
            composer,
        })
    }

    pub fn client(&self) -> &TaxaClient {
        &self.client
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SearchSession {
        &mut self.session
    }

    pub fn view(&self) -> &ResultsView {
        self.session.view()
    }

    /// Run one action to completion. `None` when the action was a no-op.
    pub async fn submit(&mut self, action: SearchAction) -> Option<FinishOutcome> {
        self.session.run(&self.client, action).await
    }

    /// Start a new search from page 1.
    pub async fn search(&mut self, input: &str, filter: SearchFilter) -> Option<FinishOutcome> {
        self.submit(SearchAction::new_search(input, filter)).await
    }

    /// Append the next page of the current search.
    pub async fn load_more(&mut self) -> Option<FinishOutcome> {
        self.submit(SearchAction::Continue).await
    }

    #[cfg(feature = "postcard")]
    pub fn composer(&self) -> &PostcardComposer {
        &self.composer
    }

    /// Compose a postcard for the card at zero-based `index`.
    #[cfg(feature = "postcard")]
    pub async fn postcard(&self, index: usize) -> Result<Postcard> {
        let card = self.view().card(index).ok_or_else(|| {
            crate::Error::InvalidQuery(format!(
                "no result #{} (showing {})",
                index + 1,
                self.view().card_count()
            ))
        })?;
        let spec = PostcardSpec::from_card(card);
        self.composer.create(&spec).await
    }
}
