use std::convert::TryFrom;

use rusqlite::{Connection, Row};

use crate::error::AppResult;
use crate::models::waste_schedule::WasteScheduleRule;

impl TryFrom<&Row<'_>> for WasteScheduleRule {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(WasteScheduleRule {
            area: row.get("area")?,
            day_of_week: row.get::<_, i64>("day_of_week")? as u8,
        })
    }
}

pub struct WasteScheduleRepository;

impl WasteScheduleRepository {
    pub fn insert(conn: &Connection, rule: &WasteScheduleRule) -> AppResult<()> {
        conn.execute(
            "INSERT INTO waste_schedule_rules (area, day_of_week) VALUES (?1, ?2)",
            (&rule.area, rule.day_of_week as i64),
        )?;
        Ok(())
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<WasteScheduleRule>> {
        let mut stmt = conn.prepare(
            "SELECT area, day_of_week FROM waste_schedule_rules ORDER BY area ASC, day_of_week ASC",
        )?;
        let rules = stmt
            .query_map([], |row| WasteScheduleRule::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    pub fn list_for_area(conn: &Connection, area: &str) -> AppResult<Vec<WasteScheduleRule>> {
        let mut stmt = conn.prepare(
            "SELECT area, day_of_week FROM waste_schedule_rules WHERE area = ?1 ORDER BY day_of_week ASC",
        )?;
        let rules = stmt
            .query_map([area], |row| WasteScheduleRule::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Replaces every rule for an area in one transaction, the shape the
    /// municipal configuration screen saves in.
    pub fn replace_for_area(
        conn: &Connection,
        area: &str,
        days_of_week: &[u8],
    ) -> AppResult<()> {
        conn.execute("DELETE FROM waste_schedule_rules WHERE area = ?1", [area])?;
        for day in days_of_week {
            conn.execute(
                "INSERT INTO waste_schedule_rules (area, day_of_week) VALUES (?1, ?2)",
                (area, *day as i64),
            )?;
        }
        Ok(())
    }
}
