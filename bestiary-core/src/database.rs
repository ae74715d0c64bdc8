use crate::error::{BestiaryError, Result};
use crate::import::CreatureStore;
use crate::models::{AbilityEntry, AttackEntry, CreatureRecord, Movement, Saves};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

/// Row of the creature listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredCreature {
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub imported_at: String,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(4).build(manager)?;

        let db = Self { pool };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS creatures (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                size TEXT NOT NULL,
                monster_type TEXT NOT NULL,
                intelligence TEXT NOT NULL,
                alignment TEXT NOT NULL,
                level INTEGER NOT NULL,
                ac INTEGER NOT NULL,
                hp_dice TEXT NOT NULL,
                hp_value INTEGER NOT NULL,
                save_doom INTEGER NOT NULL,
                save_ray INTEGER NOT NULL,
                save_hold INTEGER NOT NULL,
                save_blast INTEGER NOT NULL,
                save_spell INTEGER NOT NULL,
                speed INTEGER NOT NULL,
                move_swim INTEGER NOT NULL DEFAULT 0,
                move_fly INTEGER NOT NULL DEFAULT 0,
                move_climb INTEGER NOT NULL DEFAULT 0,
                move_burrow INTEGER NOT NULL DEFAULT 0,
                morale INTEGER NOT NULL,
                xp_award INTEGER NOT NULL DEFAULT 0,
                encounters TEXT NOT NULL DEFAULT '',
                lair_chance INTEGER NOT NULL DEFAULT 0,
                treasure_type TEXT NOT NULL DEFAULT '',
                behaviour TEXT NOT NULL DEFAULT '',
                speech TEXT NOT NULL DEFAULT '',
                possessions TEXT NOT NULL DEFAULT '',
                imported_at TIMESTAMP NOT NULL
            );

            CREATE TABLE IF NOT EXISTS creature_attacks (
                id INTEGER PRIMARY KEY,
                creature_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                num_attacks INTEGER NOT NULL DEFAULT 1,
                attack_name TEXT NOT NULL,
                attack_bonus INTEGER NOT NULL DEFAULT 0,
                attack_damage TEXT NOT NULL,
                attack_effect TEXT NOT NULL DEFAULT '',
                attack_type TEXT NOT NULL,
                range_short INTEGER NOT NULL DEFAULT 0,
                range_medium INTEGER NOT NULL DEFAULT 0,
                range_long INTEGER NOT NULL DEFAULT 0,
                attack_group TEXT NOT NULL DEFAULT 'a',
                FOREIGN KEY (creature_id) REFERENCES creatures(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS creature_abilities (
                id INTEGER PRIMARY KEY,
                creature_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                FOREIGN KEY (creature_id) REFERENCES creatures(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_creature_attacks_creature_id ON creature_attacks(creature_id);
            CREATE INDEX IF NOT EXISTS idx_creature_abilities_creature_id ON creature_abilities(creature_id);
            CREATE INDEX IF NOT EXISTS idx_creatures_name ON creatures(name);
            "#,
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Insert a creature with its attacks and abilities. Returns the creature ID.
    pub fn insert_creature(&self, record: &CreatureRecord) -> Result<i64> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let imported_at = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO creatures (name, description, size, monster_type, intelligence, alignment, level, ac, hp_dice, hp_value, save_doom, save_ray, save_hold, save_blast, save_spell, speed, move_swim, move_fly, move_climb, move_burrow, morale, xp_award, encounters, lair_chance, treasure_type, behaviour, speech, possessions, imported_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.name,
                record.description,
                to_label(&record.size)?,
                to_label(&record.monster_type)?,
                to_label(&record.intelligence)?,
                to_label(&record.alignment)?,
                record.level,
                record.ac,
                record.hp_dice,
                record.hp_value,
                record.saves.doom,
                record.saves.ray,
                record.saves.hold,
                record.saves.blast,
                record.saves.spell,
                record.speed,
                record.movement.swim,
                record.movement.fly,
                record.movement.climb,
                record.movement.burrow,
                record.morale,
                record.xp_award,
                record.encounters,
                record.lair_chance,
                record.treasure_type,
                record.behaviour,
                record.speech,
                record.possessions,
                imported_at,
            ],
        )?;
        let creature_id = tx.last_insert_rowid();

        insert_attacks(&tx, creature_id, &record.attacks)?;
        insert_abilities(&tx, creature_id, &record.special_abilities)?;

        tx.commit()?;
        tracing::debug!(
            "Stored creature '{}' as #{} ({} attacks, {} abilities)",
            record.name,
            creature_id,
            record.attacks.len(),
            record.special_abilities.len()
        );
        Ok(creature_id)
    }

    /// Load a stored creature back into a record.
    pub fn get_creature(&self, id: i64) -> Result<CreatureRecord> {
        let conn = self.connection()?;

        let row = conn
            .query_row(
                "SELECT * FROM creatures WHERE id = ?",
                params![id],
                CreatureRow::from_row,
            )
            .optional()?
            .ok_or_else(|| BestiaryError::NotFound(format!("creature #{}", id)))?;

        let attacks = load_attacks(&conn, id)?;
        let special_abilities = load_abilities(&conn, id)?;
        row.into_record(attacks, special_abilities)
    }

    /// All stored creatures, ordered by name.
    pub fn list_creatures(&self) -> Result<Vec<StoredCreature>> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT id, name, level, imported_at FROM creatures ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredCreature {
                id: row.get(0)?,
                name: row.get(1)?,
                level: row.get(2)?,
                imported_at: row.get(3)?,
            })
        })?;

        let mut creatures = Vec::new();
        for row in rows {
            creatures.push(row?);
        }
        Ok(creatures)
    }
}

impl CreatureStore for Database {
    fn store_creature(&self, record: &CreatureRecord) -> Result<i64> {
        self.insert_creature(record)
    }
}

/// Enum value as its serde label, e.g. `demi-fey`.
fn to_label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(label) => Ok(label),
        other => Ok(other.to_string()),
    }
}

fn from_label<T: DeserializeOwned>(label: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(label))?)
}

fn insert_attacks(conn: &Connection, creature_id: i64, attacks: &[AttackEntry]) -> Result<()> {
    for (position, attack) in attacks.iter().enumerate() {
        conn.execute(
            "INSERT INTO creature_attacks (creature_id, position, num_attacks, attack_name, attack_bonus, attack_damage, attack_effect, attack_type, range_short, range_medium, range_long, attack_group) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                creature_id,
                position as i64,
                attack.num_attacks,
                attack.attack_name,
                attack.attack_bonus,
                attack.attack_damage,
                attack.attack_effect,
                to_label(&attack.attack_type)?,
                attack.range_short,
                attack.range_medium,
                attack.range_long,
                attack.attack_group.to_string(),
            ],
        )?;
    }
    Ok(())
}

fn insert_abilities(conn: &Connection, creature_id: i64, abilities: &[AbilityEntry]) -> Result<()> {
    for (position, ability) in abilities.iter().enumerate() {
        conn.execute(
            "INSERT INTO creature_abilities (creature_id, position, name, description) VALUES (?, ?, ?, ?)",
            params![creature_id, position as i64, ability.name, ability.description],
        )?;
    }
    Ok(())
}

fn load_attacks(conn: &Connection, creature_id: i64) -> Result<Vec<AttackEntry>> {
    let mut stmt = conn.prepare(
        "SELECT num_attacks, attack_name, attack_bonus, attack_damage, attack_effect, attack_type, range_short, range_medium, range_long, attack_group FROM creature_attacks WHERE creature_id = ? ORDER BY position",
    )?;
    let rows = stmt.query_map(params![creature_id], |row| {
        Ok((
            AttackEntry {
                num_attacks: row.get(0)?,
                attack_name: row.get(1)?,
                attack_bonus: row.get(2)?,
                attack_damage: row.get(3)?,
                attack_effect: row.get(4)?,
                range_short: row.get(6)?,
                range_medium: row.get(7)?,
                range_long: row.get(8)?,
                attack_group: row.get::<_, String>(9)?.chars().next().unwrap_or('a'),
                ..AttackEntry::default()
            },
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut attacks = Vec::new();
    for row in rows {
        let (mut attack, attack_type) = row?;
        attack.attack_type = from_label(attack_type)?;
        attacks.push(attack);
    }
    Ok(attacks)
}

fn load_abilities(conn: &Connection, creature_id: i64) -> Result<Vec<AbilityEntry>> {
    let mut stmt = conn.prepare(
        "SELECT name, description FROM creature_abilities WHERE creature_id = ? ORDER BY position",
    )?;
    let rows = stmt.query_map(params![creature_id], |row| {
        Ok(AbilityEntry {
            name: row.get(0)?,
            description: row.get(1)?,
        })
    })?;

    let mut abilities = Vec::new();
    for row in rows {
        abilities.push(row?);
    }
    Ok(abilities)
}

/// Raw `creatures` row; enum labels are decoded outside the row closure.
struct CreatureRow {
    name: String,
    description: String,
    size: String,
    monster_type: String,
    intelligence: String,
    alignment: String,
    level: i32,
    ac: i32,
    hp_dice: String,
    hp_value: i32,
    saves: Saves,
    speed: i32,
    movement: Movement,
    morale: i32,
    xp_award: i32,
    encounters: String,
    lair_chance: i32,
    treasure_type: String,
    behaviour: String,
    speech: String,
    possessions: String,
}

impl CreatureRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get("name")?,
            description: row.get("description")?,
            size: row.get("size")?,
            monster_type: row.get("monster_type")?,
            intelligence: row.get("intelligence")?,
            alignment: row.get("alignment")?,
            level: row.get("level")?,
            ac: row.get("ac")?,
            hp_dice: row.get("hp_dice")?,
            hp_value: row.get("hp_value")?,
            saves: Saves {
                doom: row.get("save_doom")?,
                ray: row.get("save_ray")?,
                hold: row.get("save_hold")?,
                blast: row.get("save_blast")?,
                spell: row.get("save_spell")?,
            },
            speed: row.get("speed")?,
            movement: Movement {
                swim: row.get("move_swim")?,
                fly: row.get("move_fly")?,
                climb: row.get("move_climb")?,
                burrow: row.get("move_burrow")?,
            },
            morale: row.get("morale")?,
            xp_award: row.get("xp_award")?,
            encounters: row.get("encounters")?,
            lair_chance: row.get("lair_chance")?,
            treasure_type: row.get("treasure_type")?,
            behaviour: row.get("behaviour")?,
            speech: row.get("speech")?,
            possessions: row.get("possessions")?,
        })
    }

    fn into_record(
        self,
        attacks: Vec<AttackEntry>,
        special_abilities: Vec<AbilityEntry>,
    ) -> Result<CreatureRecord> {
        Ok(CreatureRecord {
            name: self.name,
            description: self.description,
            size: from_label(self.size)?,
            monster_type: from_label(self.monster_type)?,
            intelligence: from_label(self.intelligence)?,
            alignment: from_label(self.alignment)?,
            level: self.level,
            ac: self.ac,
            hp_dice: self.hp_dice,
            hp_value: self.hp_value,
            saves: self.saves,
            attacks,
            speed: self.speed,
            movement: self.movement,
            morale: self.morale,
            xp_award: self.xp_award,
            encounters: self.encounters,
            lair_chance: self.lair_chance,
            treasure_type: self.treasure_type,
            behaviour: self.behaviour,
            speech: self.speech,
            possessions: self.possessions,
            special_abilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatblockFormat;
    use crate::parsers::parse_statblock;

    const OWLBEAR: &str = "Owlbear
A bear with the head of an owl.
LARGE MONSTROSITY—ANIMAL—NEUTRAL
Level 5 AC 14 HP 5d8 (22) Saves D10 R11 H12 B13 S14
Attacks 2 claws (+4, 1d6) and bite (+4, 1d8) or hug (see below)
Speed 40 Morale 9 XP 360
Hug: Crushes for 2d8 damage.";

    #[test]
    fn test_store_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("bestiary.db")).unwrap();

        let record = parse_statblock(OWLBEAR, StatblockFormat::Native).unwrap();
        let id = db.store_creature(&record).unwrap();

        let loaded = db.get_creature(id).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_list_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("bestiary.db")).unwrap();

        let record = parse_statblock(OWLBEAR, StatblockFormat::Native).unwrap();
        db.store_creature(&record).unwrap();
        db.store_creature(&record).unwrap();

        let listed = db.list_creatures().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Owlbear");
        assert_eq!(listed[0].level, 5);
        assert!(!listed[0].imported_at.is_empty());

        let err = db.get_creature(999).unwrap_err();
        assert!(matches!(err, BestiaryError::NotFound(_)));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bestiary.db");
        Database::new(&path).unwrap();
        let db = Database::new(&path).unwrap();
        assert!(db.list_creatures().unwrap().is_empty());
    }
}
