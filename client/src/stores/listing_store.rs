//! Browsing and managing listings.

use std::sync::Arc;

use tokio::sync::watch;

use super::{Loadable, StateCell};
use crate::api::{ApiClient, ApiError, endpoints};
use crate::domain::ports::ApiRequest;
use crate::domain::{Listing, ListingDraft, ListingId, ListingQuery, Toasts};

/// Observable listing state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingState {
    /// Result of the last browse or search.
    pub listings: Vec<Listing>,
    /// The signed-in user's own listings, newest first.
    pub mine: Vec<Listing>,
    /// A listing request is in flight.
    pub is_loading: bool,
    /// Message from the last failed request.
    pub error: Option<String>,
}

impl Loadable for ListingState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl ListingState {
    fn replace(&mut self, updated: &Listing) {
        for listing in self.listings.iter_mut().chain(self.mine.iter_mut()) {
            if listing.id == updated.id {
                *listing = updated.clone();
            }
        }
    }

    fn remove(&mut self, id: ListingId) {
        self.listings.retain(|listing| listing.id != id);
        self.mine.retain(|listing| listing.id != id);
    }
}

/// Listing CRUD over the API.
pub struct ListingStore {
    api: Arc<ApiClient>,
    cell: StateCell<ListingState>,
}

impl ListingStore {
    /// Build an empty store.
    pub fn new(api: Arc<ApiClient>, toasts: Toasts) -> Self {
        Self {
            api,
            cell: StateCell::new(ListingState::default(), toasts),
        }
    }

    /// Observe every change.
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.cell.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> ListingState {
        self.cell.snapshot()
    }

    /// Browse or search listings.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `GET listings`.
    pub async fn browse(&self, query: &ListingQuery) -> Result<Vec<Listing>, ApiError> {
        let request = ApiRequest::get(endpoints::LISTINGS).with_query(query.to_pairs());
        self.cell
            .track(
                "Could not load listings",
                self.api.fetch(request),
                |state, listings: &Vec<Listing>| state.listings.clone_from(listings),
            )
            .await
    }

    /// Load the signed-in user's listings.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `GET listings/mine`.
    pub async fn fetch_mine(&self) -> Result<Vec<Listing>, ApiError> {
        self.cell
            .track(
                "Could not load your listings",
                self.api.get_json(endpoints::MY_LISTINGS),
                |state, listings: &Vec<Listing>| state.mine.clone_from(listings),
            )
            .await
    }

    /// Load one listing. Any cached copy is refreshed.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `GET listings/{id}`.
    pub async fn get(&self, id: ListingId) -> Result<Listing, ApiError> {
        self.cell
            .track(
                "Could not load the listing",
                self.api.get_json(&endpoints::listing(id)),
                |state, listing: &Listing| state.replace(listing),
            )
            .await
    }

    /// Publish a listing.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `POST listings`.
    pub async fn create(&self, draft: &ListingDraft) -> Result<Listing, ApiError> {
        let listing = self
            .cell
            .track(
                "Could not publish the listing",
                self.api.post_json(endpoints::LISTINGS, draft),
                |state, listing: &Listing| state.mine.insert(0, listing.clone()),
            )
            .await?;
        self.cell.toasts().success("Listing published");
        Ok(listing)
    }

    /// Replace a listing's content.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `PUT listings/{id}`.
    pub async fn update(&self, id: ListingId, draft: &ListingDraft) -> Result<Listing, ApiError> {
        let listing = self
            .cell
            .track(
                "Could not update the listing",
                self.api.put_json(&endpoints::listing(id), draft),
                |state, listing: &Listing| state.replace(listing),
            )
            .await?;
        self.cell.toasts().success("Listing updated");
        Ok(listing)
    }

    /// Delete a listing.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `DELETE listings/{id}`; nothing is removed
    /// locally on failure.
    pub async fn delete(&self, id: ListingId) -> Result<(), ApiError> {
        let path = endpoints::listing(id);
        self.cell
            .track(
                "Could not delete the listing",
                self.api.delete(&path),
                |state, _| state.remove(id),
            )
            .await?;
        self.cell.toasts().success("Listing deleted");
        Ok(())
    }
}
