//! # Veikkaus Data Models
//!
//! Maps the upstream JSON payloads into Rust structs. The API is loosely
//! specified, so everything except identifiers is defaulted when missing or
//! `null`. One odd field must not cost the whole list.

#![allow(missing_docs)]

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The envelope every endpoint wraps its list in: `{"collection": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub collection: Option<Vec<T>>,
}

impl<T> Collection<T> {
    /// The wrapped items; a missing or `null` collection is empty.
    pub fn into_items(self) -> Vec<T> {
        self.collection.unwrap_or_default()
    }
}

/// Reads `null` as `T::default()`. Missing keys are handled by `#[serde(default)]`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A race day's event at one track.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub track_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub track_abbreviation: String,
}

/// One race of a card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub race_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub card_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance: u32,
    /// Finishing order as start numbers, e.g. `"4-2-7"`. Absent before the race is run.
    #[serde(default)]
    pub tote_result_string: Option<String>,
}

/// Shoeing of one pair of hooves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShoeState {
    HasShoes,
    NoShoes,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One horse entered in a race.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    #[serde(default, deserialize_with = "null_as_default")]
    pub runner_id: i64,
    /// Raw name; may carry a `*`-prefixed ownership annotation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub horse_name: String,
    /// `None` when the upstream omits it; such a runner never wins.
    #[serde(default)]
    pub start_number: Option<u32>,
    #[serde(default)]
    pub start_track: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub front_shoes: ShoeState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rear_shoes: ShoeState,
    /// Free-form statistics, kept as-is.
    #[serde(default)]
    pub stats: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coach_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub driver_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scratched: bool,
}

impl Runner {
    /// `(front, rear)` shoeing.
    pub fn shoes(&self) -> (ShoeState, ShoeState) {
        (self.front_shoes, self.rear_shoes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_card_collection() {
        let payload = json!({
            "collection": [
                {"cardId": 101, "country": "SE", "trackName": "Solvalla", "trackAbbreviation": "S", "extra": 1},
                {"cardId": 102, "country": "FI", "trackName": "Vermo", "trackAbbreviation": "Vm"}
            ]
        });
        let cards = serde_json::from_value::<Collection<Card>>(payload).unwrap().into_items();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].card_id, 101);
        assert_eq!(cards[0].track_name, "Solvalla");
        assert_eq!(cards[1].country, "FI");
    }

    #[test]
    fn missing_or_null_collection_is_empty() {
        let races = serde_json::from_value::<Collection<Race>>(json!({})).unwrap();
        assert!(races.into_items().is_empty());
        let races = serde_json::from_value::<Collection<Race>>(json!({"collection": null})).unwrap();
        assert!(races.into_items().is_empty());
    }

    #[test]
    fn decodes_race_with_and_without_result() {
        let payload = json!({"collection": [
            {"raceId": 1, "cardId": 101, "number": 1, "distance": 2140, "toteResultString": "4-2-7"},
            {"raceId": 2, "cardId": 101, "number": 2, "distance": 1640, "toteResultString": null},
            {"raceId": 3, "cardId": 101, "number": 3, "distance": 2640}
        ]});
        let races = serde_json::from_value::<Collection<Race>>(payload).unwrap().into_items();
        assert_eq!(races[0].tote_result_string.as_deref(), Some("4-2-7"));
        assert_eq!(races[0].distance, 2140);
        assert_eq!(races[1].tote_result_string, None);
        assert_eq!(races[2].tote_result_string, None);
    }

    #[test]
    fn decodes_runner_and_tolerates_unknown_shoes() {
        let runner: Runner = serde_json::from_value(json!({
            "runnerId": 9,
            "horseName": "Thunder*Johnson Stable",
            "startNumber": 4,
            "startTrack": 4,
            "distance": 2140,
            "frontShoes": "HAS_SHOES",
            "rearShoes": "SOMETHING_NEW",
            "stats": {"wins": 3},
            "coachName": "Coach",
            "driverName": "Driver",
            "scratched": false
        }))
        .unwrap();
        assert_eq!(runner.shoes(), (ShoeState::HasShoes, ShoeState::Unknown));
        assert_eq!(runner.stats["wins"], 3);
        assert!(!runner.scratched);
        assert_eq!(runner.start_number, Some(4));
    }

    #[test]
    fn null_fields_do_not_reject_the_list() {
        let payload = json!({"collection": [
            {"horseName": "Steady", "startNumber": 1, "coachName": "C", "driverName": "D"},
            {"horseName": null, "startNumber": null, "coachName": null, "driverName": null,
             "frontShoes": null, "distance": null, "scratched": null},
            {"driverName": null, "scratched": true}
        ]});
        let runners = serde_json::from_value::<Collection<Runner>>(payload).unwrap().into_items();
        assert_eq!(runners.len(), 3);
        assert_eq!(runners[0].horse_name, "Steady");
        assert_eq!(runners[1].horse_name, "");
        assert_eq!(runners[1].coach_name, "");
        assert_eq!(runners[1].driver_name, "");
        assert_eq!(runners[1].start_number, None);
        assert_eq!(runners[1].front_shoes, ShoeState::Unknown);
        assert!(!runners[1].scratched);
        assert!(runners[2].scratched);
    }

    #[test]
    fn null_race_and_card_fields_default() {
        let races = serde_json::from_value::<Collection<Race>>(json!({"collection": [
            {"raceId": 7, "cardId": null, "number": null, "distance": null, "toteResultString": "1-2"}
        ]}))
        .unwrap()
        .into_items();
        assert_eq!(races[0].number, 0);
        assert_eq!(races[0].distance, 0);
        assert_eq!(races[0].tote_result_string.as_deref(), Some("1-2"));

        let cards = serde_json::from_value::<Collection<Card>>(json!({"collection": [
            {"cardId": 5, "country": "SE", "trackName": null}
        ]}))
        .unwrap()
        .into_items();
        assert_eq!(cards[0].track_name, "");
    }
}
