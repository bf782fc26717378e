//! Scripted opponent for solo games.

use std::time::Duration;

use rand::Rng;

pub const BOT_ID: &str = "bot";
pub const BOT_NAME: &str = "Bot";

/// How long the bot pretends to sketch after picking its word.
pub const SKETCH_DELAY: Duration = Duration::from_secs(5);

const GUESS_CHANCE: f64 = 0.5;
const GUESS_DELAY_MIN_SECS: f64 = 5.0;
const GUESS_DELAY_MAX_SECS: f64 = 15.0;

/// Plan the bot's single guess attempt for a round a human is drawing.
/// Returns the delay until the attempt fires, or `None` when the bot is
/// not going to get this one — the round then runs on to the clock or a
/// human guesser.
pub fn plan_guess<R: Rng>(rng: &mut R) -> Option<Duration> {
    let delay =
        Duration::from_secs_f64(rng.gen_range(GUESS_DELAY_MIN_SECS..GUESS_DELAY_MAX_SECS));
    rng.gen_bool(GUESS_CHANCE).then_some(delay)
}
