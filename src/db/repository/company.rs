use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Company;

pub fn insert_company(conn: &Connection, company: &Company) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO companies (id, name, registration_number, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            company.id.to_string(),
            company.name,
            company.registration_number,
            company.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_company(conn: &Connection, id: &Uuid) -> Result<Option<Company>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, registration_number, created_at FROM companies WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    });

    match result {
        Ok(row) => Ok(Some(company_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_companies(conn: &Connection) -> Result<Vec<Company>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, registration_number, created_at FROM companies ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut companies = Vec::new();
    for row in rows {
        companies.push(company_from_row(row?)?);
    }
    Ok(companies)
}

fn company_from_row(
    (id, name, registration_number, created_at): (String, String, Option<String>, String),
) -> Result<Company, DatabaseError> {
    Ok(Company {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name,
        registration_number,
        created_at: parse_timestamp(&created_at),
    })
}

/// Accepts both space- and T-separated timestamps.
pub(crate) fn parse_timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}
