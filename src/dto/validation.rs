//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::game::PlayerInput;

/// Validates that no two players on a roster share a jersey number.
pub fn validate_unique_jerseys(players: &[PlayerInput]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for player in players {
        if !seen.insert(player.jersey_number) {
            let mut err = ValidationError::new("duplicate_jersey");
            err.message = Some(
                format!(
                    "jersey number {} is assigned to more than one player",
                    player.jersey_number
                )
                .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, jersey_number: u8) -> PlayerInput {
        PlayerInput {
            name: name.to_string(),
            jersey_number,
        }
    }

    #[test]
    fn test_unique_jerseys_ok() {
        let players = vec![player("A", 4), player("B", 5), player("C", 23)];
        assert!(validate_unique_jerseys(&players).is_ok());
    }

    #[test]
    fn test_unique_jerseys_duplicate() {
        let players = vec![player("A", 7), player("B", 7)];
        assert!(validate_unique_jerseys(&players).is_err());
    }
}
