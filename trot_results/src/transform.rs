//! # Result Transformation
//!
//! Pure functions turning upstream races and runners into [`Performance`]
//! records. A race only yields records when its winner can be resolved.

use crate::performance::Performance;
use crate::veikkaus::model::{Race, Runner};

/// Separates start numbers in a finishing-order string (`"4-2-7"`).
pub const RESULT_DELIMITER: char = '-';
/// Starts the ownership/breeding annotation appended to horse names.
pub const NAME_MARKER: char = '*';

/// Winning start number from a finishing-order string.
///
/// The first `-` separated segment must be all ASCII digits; anything else
/// (empty, signs, letters, overflow) means there is no winner.
pub fn resolve_winner(result: &str) -> Option<u32> {
    let head = result.split(RESULT_DELIMITER).next()?.trim();
    if head.is_empty() || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Winning start number of `race`, `None` when it has no usable result.
pub fn race_winner(race: &Race) -> Option<u32> {
    race.tote_result_string.as_deref().and_then(resolve_winner)
}

/// Horse name truncated at the first `*`.
pub fn clean_name(raw: &str) -> String {
    match raw.split_once(NAME_MARKER) {
        Some((name, _annotation)) => name.to_string(),
        None => raw.to_string(),
    }
}

/// Maps a runner that started in a race won by `winner_number`.
pub fn to_performance(runner: &Runner, winner_number: u32, race_timestamp: i64) -> Performance {
    Performance {
        name: clean_name(&runner.horse_name),
        winner: runner.start_number == Some(winner_number),
        coach: runner.coach_name.clone(),
        driver: runner.driver_name.clone(),
        date: race_timestamp,
    }
}

/// All performances of one race. Scratched runners are skipped.
pub fn race_performances(winner_number: u32, runners: &[Runner], race_timestamp: i64) -> Vec<Performance> {
    runners
        .iter()
        .filter(|runner| !runner.scratched)
        .map(|runner| to_performance(runner, winner_number, race_timestamp))
        .collect()
}
