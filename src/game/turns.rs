//! Round-robin drawer assignment.

/// Drawer index for 1-based `round` over a fixed roster of `len` players.
/// Pure and deterministic; the roster order is fixed at game start, so
/// the same inputs always name the same drawer.
pub fn drawer_index(round: u32, len: usize) -> usize {
    debug_assert!(len > 0);
    (round.saturating_sub(1) as usize) % len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_through_the_roster() {
        assert_eq!(drawer_index(1, 3), 0);
        assert_eq!(drawer_index(2, 3), 1);
        assert_eq!(drawer_index(3, 3), 2);
        assert_eq!(drawer_index(4, 3), 0);
    }

    #[test]
    fn every_player_draws_once_per_cycle() {
        for n in 1..=6usize {
            let mut seen = vec![0u32; n];
            for round in 1..=n as u32 {
                seen[drawer_index(round, n)] += 1;
            }
            assert!(seen.iter().all(|&c| c == 1), "unfair cycle for n={n}");
        }
    }

    #[test]
    fn repeat_invocations_agree() {
        assert_eq!(drawer_index(17, 5), drawer_index(17, 5));
    }
}
