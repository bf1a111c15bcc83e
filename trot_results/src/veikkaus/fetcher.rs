//! # Tiered Fetcher
//!
//! Reads a race day in three tiers: cards, then the races of every card, then
//! the runners of every race that has a winner. Siblings within a tier are
//! requested concurrently and the next tier starts only once the whole tier
//! has resolved.
//!
//! Every request failure is logged and treated as "no data": the tier call
//! returns an empty list and the run carries on with whatever did arrive.

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::apicall::VeikkausApi;
use super::model::{Card, Race, Runner};
use crate::performance::Performance;
use crate::target_date::TargetDate;
use crate::transform;

/// Country code of the cards kept when none is configured.
pub const DEFAULT_COUNTRY_CODE: &str = "SE";

/// Fetches cards, races and runners and flattens them into performances.
#[derive(Clone)]
pub struct Fetcher {
    api: VeikkausApi,
    country_code: String,
}

impl Fetcher {
    /// Creates a fetcher keeping only cards from `country_code`.
    pub fn new(api: VeikkausApi, country_code: impl Into<String>) -> Self {
        Self {
            api,
            country_code: country_code.into(),
        }
    }

    /// The country whose cards are kept.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Cards of the target day in the configured country.
    pub async fn fetch_cards(&self, target: &TargetDate) -> Vec<Card> {
        match self.api.cards(target).await {
            Ok(cards) => {
                let total = cards.len();
                let kept: Vec<Card> = cards
                    .into_iter()
                    .filter(|card| card.country == self.country_code)
                    .collect();
                debug!(date = %target, total, kept = kept.len(), country = %self.country_code, "Fetched cards");
                kept
            }
            Err(e) => {
                warn!(date = %target, error = %e, "Could not find cards for date, returning empty list");
                Vec::new()
            }
        }
    }

    /// Races of one card.
    pub async fn fetch_races(&self, card: &Card) -> Vec<Race> {
        match self.api.races(card.card_id).await {
            Ok(races) => races,
            Err(e) => {
                warn!(card_id = card.card_id, track = %card.track_name, error = %e, "Could not find races for card, returning empty list");
                Vec::new()
            }
        }
    }

    /// Runners of one race that actually started.
    pub async fn fetch_runners(&self, race: &Race) -> Vec<Runner> {
        match self.api.runners(race.race_id).await {
            Ok(runners) => runners.into_iter().filter(|runner| !runner.scratched).collect(),
            Err(e) => {
                warn!(race_id = race.race_id, race_number = race.number, error = %e, "Could not find runners for race, returning empty list");
                Vec::new()
            }
        }
    }

    /// Every performance of the target day, in card, race and start order.
    ///
    /// Runners are only requested for races whose winner resolves.
    pub async fn build_results_for_date(&self, target: &TargetDate) -> Vec<Performance> {
        info!(date = %target, timestamp = target.timestamp_ms, "Building results for date");
        let cards = self.fetch_cards(target).await;

        let races: Vec<Race> = join_all(cards.iter().map(|card| self.fetch_races(card)))
            .await
            .into_iter()
            .flatten()
            .collect();
        debug!(cards = cards.len(), races = races.len(), "Fetched races");

        let per_race = join_all(races.iter().map(|race| async move {
            let Some(winner) = transform::race_winner(race) else {
                debug!(race_id = race.race_id, result = ?race.tote_result_string, "No winner for race, skipping");
                return Vec::new();
            };
            let runners = self.fetch_runners(race).await;
            transform::race_performances(winner, &runners, target.timestamp_ms)
        }))
        .await;

        per_race.into_iter().flatten().collect()
    }
}
