//! # Veikkaus API Client
//!
//! A thin client over the three hierarchical endpoints:
//!
//! | Tier    | Path                          |
//! |---------|-------------------------------|
//! | cards   | `cards/date/{Y}-{M}-{D}`      |
//! | races   | `card/{cardId}/races`         |
//! | runners | `race/{raceId}/runners`       |
//!
//! Each returns a `{"collection": [...]}` envelope. This layer only performs
//! the requests and decodes them; failure policy lives in the fetcher.

use lib_common::retrieve::{ApiClient, ApiClientOptions, ApiError};
use serde::de::DeserializeOwned;

use super::model::{Card, Collection, Race, Runner};
use crate::target_date::TargetDate;

const USER_AGENT: &str = concat!("trot_results/", env!("CARGO_PKG_VERSION"));

/// Client for the Veikkaus trotting endpoints.
#[derive(Clone)]
pub struct VeikkausApi {
    client: ApiClient,
}

impl VeikkausApi {
    /// Creates a client rooted at `base_url`.
    pub fn new(base_url: &str, mut options: ApiClientOptions) -> Result<Self, ApiError> {
        options.user_agent.get_or_insert_with(|| USER_AGENT.to_string());
        Ok(Self {
            client: ApiClient::with_options(base_url, None, options)?,
        })
    }

    /// Path listing every card of a day.
    pub fn cards_path(target: &TargetDate) -> String {
        format!("cards/date/{}", target.api_segment())
    }

    /// Path listing the races of one card.
    pub fn races_path(card_id: i64) -> String {
        format!("card/{}/races", card_id)
    }

    /// Path listing the runners of one race.
    pub fn runners_path(race_id: i64) -> String {
        format!("race/{}/runners", race_id)
    }

    /// All cards of the target day, every country.
    pub async fn cards(&self, target: &TargetDate) -> Result<Vec<Card>, ApiError> {
        self.collection(&Self::cards_path(target)).await
    }

    /// All races of a card.
    pub async fn races(&self, card_id: i64) -> Result<Vec<Race>, ApiError> {
        self.collection(&Self::races_path(card_id)).await
    }

    /// All runners of a race, scratched ones included.
    pub async fn runners(&self, race_id: i64) -> Result<Vec<Runner>, ApiError> {
        self.collection(&Self::runners_path(race_id)).await
    }

    async fn collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        tracing::debug!(base = %self.client.base_url(), path, "GET");
        let envelope: Collection<T> = self.client.get_json(path).await?;
        Ok(envelope.into_items())
    }
}
