use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{ExtractedDetails, UploadRecord, UploadStatus};

use super::company::parse_timestamp;
use super::document::details_to_json;

pub fn insert_upload(conn: &Connection, upload: &UploadRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO kyc_uploads (id, document_id, company_id, file_path, file_name,
         issue_date, expiry_date, status, extracted_details, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            upload.id.to_string(),
            upload.document_id.to_string(),
            upload.company_id.to_string(),
            upload.file_path,
            upload.file_name,
            upload.issue_date.map(|d| d.to_string()),
            upload.expiry_date.map(|d| d.to_string()),
            upload.status.as_str(),
            upload
                .extracted_details
                .as_ref()
                .map(details_to_json)
                .transpose()?,
            upload.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_upload(conn: &Connection, id: &Uuid) -> Result<Option<UploadRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, company_id, file_path, file_name, issue_date, expiry_date,
         status, extracted_details, uploaded_at
         FROM kyc_uploads WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], map_upload_row);

    match result {
        Ok(row) => Ok(Some(upload_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_uploads_for_company(
    conn: &Connection,
    company_id: &Uuid,
) -> Result<Vec<UploadRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, company_id, file_path, file_name, issue_date, expiry_date,
         status, extracted_details, uploaded_at
         FROM kyc_uploads WHERE company_id = ?1 ORDER BY uploaded_at DESC",
    )?;

    let rows = stmt.query_map(params![company_id.to_string()], map_upload_row)?;

    let mut uploads = Vec::new();
    for row in rows {
        uploads.push(upload_from_row(row?)?);
    }
    Ok(uploads)
}

/// Update status only. Used while extraction is in flight.
pub fn update_upload_status(
    conn: &Connection,
    id: &Uuid,
    status: UploadStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE kyc_uploads SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "UploadRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Persist extracted (or edited-and-confirmed) details plus the new status.
pub fn update_upload_details(
    conn: &Connection,
    id: &Uuid,
    details: &ExtractedDetails,
    status: UploadStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE kyc_uploads SET extracted_details = ?2, status = ?3 WHERE id = ?1",
        params![id.to_string(), details_to_json(details)?, status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "UploadRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for UploadRecord mapping
struct UploadRow {
    id: String,
    document_id: String,
    company_id: String,
    file_path: String,
    file_name: String,
    issue_date: Option<String>,
    expiry_date: Option<String>,
    status: String,
    extracted_details: Option<String>,
    uploaded_at: String,
}

fn map_upload_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UploadRow> {
    Ok(UploadRow {
        id: row.get::<_, String>(0)?,
        document_id: row.get::<_, String>(1)?,
        company_id: row.get::<_, String>(2)?,
        file_path: row.get::<_, String>(3)?,
        file_name: row.get::<_, String>(4)?,
        issue_date: row.get::<_, Option<String>>(5)?,
        expiry_date: row.get::<_, Option<String>>(6)?,
        status: row.get::<_, String>(7)?,
        extracted_details: row.get::<_, Option<String>>(8)?,
        uploaded_at: row.get::<_, String>(9)?,
    })
}

fn upload_from_row(row: UploadRow) -> Result<UploadRecord, DatabaseError> {
    Ok(UploadRecord {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_id: Uuid::parse_str(&row.document_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        company_id: Uuid::parse_str(&row.company_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        file_path: row.file_path,
        file_name: row.file_name,
        issue_date: row
            .issue_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        expiry_date: row
            .expiry_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        status: UploadStatus::from_str(&row.status)?,
        extracted_details: row
            .extracted_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| {
                DatabaseError::ConstraintViolation(format!("extracted_details JSON: {e}"))
            })?,
        uploaded_at: parse_timestamp(&row.uploaded_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::company::insert_company;
    use crate::db::repository::document::insert_document;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Company, DocumentDefinition, FieldDefinition, FieldType, FieldValue};

    fn seed(conn: &Connection) -> (Uuid, Uuid) {
        let company = Company {
            id: Uuid::new_v4(),
            name: "Acme Ltd".into(),
            registration_number: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        insert_company(conn, &company).unwrap();

        let doc = DocumentDefinition {
            id: Uuid::new_v4(),
            name: "Business Permit".into(),
            fields: vec![FieldDefinition {
                id: Uuid::new_v4(),
                name: "permit_no".into(),
                field_type: FieldType::Text,
            }],
            last_extracted_details: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        insert_document(conn, &doc).unwrap();

        (company.id, doc.id)
    }

    fn upload(company_id: Uuid, document_id: Uuid) -> UploadRecord {
        UploadRecord {
            id: Uuid::new_v4(),
            document_id,
            company_id,
            file_path: format!("{company_id}/{document_id}/permit.pdf"),
            file_name: "permit.pdf".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            status: UploadStatus::Uploaded,
            extracted_details: None,
            uploaded_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn insert_and_get_upload() {
        let conn = open_memory_database().unwrap();
        let (company_id, doc_id) = seed(&conn);
        let u = upload(company_id, doc_id);
        insert_upload(&conn, &u).unwrap();

        let fetched = get_upload(&conn, &u.id).unwrap().unwrap();
        assert_eq!(fetched.file_name, "permit.pdf");
        assert_eq!(fetched.status, UploadStatus::Uploaded);
        assert_eq!(fetched.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn update_details_sets_status_and_json() {
        let conn = open_memory_database().unwrap();
        let (company_id, doc_id) = seed(&conn);
        let u = upload(company_id, doc_id);
        insert_upload(&conn, &u).unwrap();

        let mut details = ExtractedDetails::new();
        details.insert("permit_no".into(), FieldValue::Text("BP-9981".into()));
        update_upload_details(&conn, &u.id, &details, UploadStatus::PendingReview).unwrap();

        let fetched = get_upload(&conn, &u.id).unwrap().unwrap();
        assert_eq!(fetched.status, UploadStatus::PendingReview);
        assert_eq!(
            fetched.extracted_details.unwrap().get("permit_no"),
            Some(&FieldValue::Text("BP-9981".into()))
        );
    }

    #[test]
    fn list_uploads_scoped_to_company() {
        let conn = open_memory_database().unwrap();
        let (company_id, doc_id) = seed(&conn);
        let (other_company, other_doc) = seed(&conn);

        insert_upload(&conn, &upload(company_id, doc_id)).unwrap();
        insert_upload(&conn, &upload(other_company, other_doc)).unwrap();

        let uploads = list_uploads_for_company(&conn, &company_id).unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].company_id, company_id);
    }

    #[test]
    fn update_status_on_missing_upload_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_upload_status(&conn, &Uuid::new_v4(), UploadStatus::Failed).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
