use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::dao::models::{
    ActionRevisionEntity, ActionType, GameActionEntity, GameEntity, GameStatus, GameTeamEntity,
    PeriodScoreEntity, TeamSide,
};

/// Stored form of a game. Timestamps are bson datetimes. Identifiers the
/// query helpers below filter on are forced into their hyphenated string
/// form: the driver serializes typed documents through bson's raw
/// serializer, which is not human-readable, so a bare [`Uuid`] field would
/// land as a Binary element and never match a string filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id", with = "uuid_as_string")]
    id: Uuid,
    home: GameTeamEntity,
    away: GameTeamEntity,
    scheduled_at: DateTime,
    status: GameStatus,
    started_at: Option<DateTime>,
    finished_at: Option<DateTime>,
    home_score: i32,
    away_score: i32,
    #[serde(default)]
    period_scores: Vec<PeriodScoreEntity>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            home: value.home,
            away: value.away,
            scheduled_at: DateTime::from_system_time(value.scheduled_at),
            status: value.status,
            started_at: value.started_at.map(DateTime::from_system_time),
            finished_at: value.finished_at.map(DateTime::from_system_time),
            home_score: value.home_score,
            away_score: value.away_score,
            period_scores: value.period_scores,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            home: value.home,
            away: value.away,
            scheduled_at: value.scheduled_at.to_system_time(),
            status: value.status,
            started_at: value.started_at.map(|time| time.to_system_time()),
            finished_at: value.finished_at.map(|time| time.to_system_time()),
            home_score: value.home_score,
            away_score: value.away_score,
            period_scores: value.period_scores,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Stored form of one journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoActionDocument {
    #[serde(rename = "_id", with = "uuid_as_string")]
    id: Uuid,
    #[serde(with = "uuid_as_string")]
    game_id: Uuid,
    team: TeamSide,
    player_id: Option<Uuid>,
    assisted_by_player_id: Option<Uuid>,
    action_type: ActionType,
    points: i32,
    period: u8,
    game_clock_seconds: u32,
    paired_player_id: Option<Uuid>,
    substitution_reason: Option<String>,
    recorded_at: DateTime,
    #[serde(default)]
    corrected: bool,
    correction_reason: Option<String>,
    prior: Option<ActionRevisionEntity>,
    deleted_at: Option<DateTime>,
}

impl From<GameActionEntity> for MongoActionDocument {
    fn from(value: GameActionEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            team: value.team,
            player_id: value.player_id,
            assisted_by_player_id: value.assisted_by_player_id,
            action_type: value.action_type,
            points: value.points,
            period: value.period,
            game_clock_seconds: value.game_clock_seconds,
            paired_player_id: value.paired_player_id,
            substitution_reason: value.substitution_reason,
            recorded_at: DateTime::from_system_time(value.recorded_at),
            corrected: value.corrected,
            correction_reason: value.correction_reason,
            prior: value.prior,
            deleted_at: value.deleted_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoActionDocument> for GameActionEntity {
    fn from(value: MongoActionDocument) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            team: value.team,
            player_id: value.player_id,
            assisted_by_player_id: value.assisted_by_player_id,
            action_type: value.action_type,
            points: value.points,
            period: value.period,
            game_clock_seconds: value.game_clock_seconds,
            paired_player_id: value.paired_player_id,
            substitution_reason: value.substitution_reason,
            recorded_at: value.recorded_at.to_system_time(),
            corrected: value.corrected,
            correction_reason: value.correction_reason,
            prior: value.prior,
            deleted_at: value.deleted_at.map(|time| time.to_system_time()),
        }
    }
}

/// Serde adapter keeping a [`Uuid`] field in its hyphenated string form even
/// under a non-human-readable serializer.
mod uuid_as_string {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let text = String::deserialize(deserializer)?;
        Uuid::parse_str(&text).map_err(serde::de::Error::custom)
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn doc_game_id(game_id: Uuid) -> Document {
    doc! {"game_id": game_id.to_string()}
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn filter_ids_match_the_raw_document_encoding() {
        let action = GameActionEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            team: TeamSide::Home,
            player_id: Some(Uuid::new_v4()),
            assisted_by_player_id: None,
            action_type: ActionType::Made2Pt,
            points: 2,
            period: 1,
            game_clock_seconds: 480,
            paired_player_id: None,
            substitution_reason: None,
            recorded_at: SystemTime::now(),
            corrected: false,
            correction_reason: None,
            prior: None,
            deleted_at: None,
        };

        let document = MongoActionDocument::from(action.clone());
        // Same path the driver takes when inserting a typed document.
        let raw = mongodb::bson::serialize_to_raw_document_buf(&document).unwrap();

        assert_eq!(raw.get_str("_id").unwrap(), action.id.to_string());
        assert_eq!(raw.get_str("game_id").unwrap(), action.game_id.to_string());

        let round_trip: MongoActionDocument =
            mongodb::bson::deserialize_from_slice(raw.as_bytes()).unwrap();
        let entity = GameActionEntity::from(round_trip);
        assert_eq!(entity.id, action.id);
        assert_eq!(entity.game_id, action.game_id);
    }
}
