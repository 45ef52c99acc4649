use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{DocumentDefinition, ExtractedDetails, FieldDefinition};

use super::company::parse_timestamp;

pub fn insert_document(conn: &Connection, doc: &DocumentDefinition) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO kyc_documents (id, name, fields, last_extracted_details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.id.to_string(),
            doc.name,
            fields_to_json(&doc.fields)?,
            doc.last_extracted_details
                .as_ref()
                .map(details_to_json)
                .transpose()?,
            doc.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_document(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<DocumentDefinition>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, fields, last_extracted_details, created_at
         FROM kyc_documents WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(DocumentRow {
            id: row.get::<_, String>(0)?,
            name: row.get::<_, String>(1)?,
            fields: row.get::<_, String>(2)?,
            last_extracted_details: row.get::<_, Option<String>>(3)?,
            created_at: row.get::<_, String>(4)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentDefinition>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, fields, last_extracted_details, created_at
         FROM kyc_documents ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(DocumentRow {
            id: row.get::<_, String>(0)?,
            name: row.get::<_, String>(1)?,
            fields: row.get::<_, String>(2)?,
            last_extracted_details: row.get::<_, Option<String>>(3)?,
            created_at: row.get::<_, String>(4)?,
        })
    })?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

/// Mirror the most recent successful extraction onto the definition.
pub fn update_last_extracted_details(
    conn: &Connection,
    document_id: &Uuid,
    details: &ExtractedDetails,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE kyc_documents SET last_extracted_details = ?2 WHERE id = ?1",
        params![document_id.to_string(), details_to_json(details)?],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "DocumentDefinition".into(),
            id: document_id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for DocumentDefinition mapping
struct DocumentRow {
    id: String,
    name: String,
    fields: String,
    last_extracted_details: Option<String>,
    created_at: String,
}

fn document_from_row(row: DocumentRow) -> Result<DocumentDefinition, DatabaseError> {
    Ok(DocumentDefinition {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        fields: serde_json::from_str(&row.fields)
            .map_err(|e| DatabaseError::ConstraintViolation(format!("fields JSON: {e}")))?,
        last_extracted_details: row
            .last_extracted_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| {
                DatabaseError::ConstraintViolation(format!("last_extracted_details JSON: {e}"))
            })?,
        created_at: parse_timestamp(&row.created_at),
    })
}

fn fields_to_json(fields: &[FieldDefinition]) -> Result<String, DatabaseError> {
    serde_json::to_string(fields).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn details_to_json(details: &ExtractedDetails) -> Result<String, DatabaseError> {
    serde_json::to_string(details).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
