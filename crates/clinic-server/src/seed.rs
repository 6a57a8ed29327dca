//! Demo records loaded into empty stores on startup.
//!
//! Expiry dates are relative to the current day so that the low-stock and
//! expiring filters always have something to show.

use clinic_core::{ResourceKind, format_timestamp, into_object};
use clinic_storage::{RecordStore, StorageError};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use crate::auth::demo_users;

/// Number of records created per kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: Vec<(ResourceKind, usize)>,
}

impl SeedSummary {
    pub fn total(&self) -> usize {
        self.created.iter().map(|(_, n)| n).sum()
    }
}

/// Seeds every kind that has no records yet. Kinds that already hold data
/// are left untouched, so restarting against a database is harmless.
pub async fn seed_demo_data(store: &dyn RecordStore) -> Result<SeedSummary, StorageError> {
    let now = OffsetDateTime::now_utc();
    let mut summary = SeedSummary::default();

    for kind in ResourceKind::ALL {
        if store.count(kind, &[]).await? > 0 {
            tracing::debug!(kind = %kind, "store not empty, skipping seed");
            continue;
        }
        let records = demo_records(kind, now)?;
        let count = records.len();
        for record in records {
            store.create(kind, into_object(record)?).await?;
        }
        summary.created.push((kind, count));
    }

    tracing::info!(records = summary.total(), "demo data seeded");
    Ok(summary)
}

fn days_from(now: OffsetDateTime, days: i64) -> String {
    now.date().saturating_add(Duration::days(days)).to_string()
}

fn demo_records(kind: ResourceKind, now: OffsetDateTime) -> Result<Vec<Value>, StorageError> {
    let records = match kind {
        ResourceKind::Medicines => vec![
            json!({
                "name": "Biogesic", "generic_name": "Paracetamol", "category": "Analgesic",
                "dosage_form": "Tablet", "strength": "500mg", "unit": "tablet",
                "quantity": 500, "reorder_threshold": 100,
                "expiry_date": days_from(now, 400), "supplier": "Unilab", "price": 4.5
            }),
            json!({
                "name": "Amoxil", "generic_name": "Amoxicillin", "category": "Antibiotic",
                "dosage_form": "Capsule", "strength": "500mg", "unit": "capsule",
                "quantity": 40, "reorder_threshold": 50,
                "expiry_date": days_from(now, 20), "supplier": "GSK", "price": 12
            }),
            json!({
                "name": "Allerkid", "generic_name": "Cetirizine", "category": "Antihistamine",
                "dosage_form": "Syrup", "strength": "5mg/5ml", "unit": "bottle",
                "quantity": 60, "reorder_threshold": 20,
                "expiry_date": days_from(now, 25), "supplier": "Unilab", "price": 95
            }),
            json!({
                "name": "Cozaar", "generic_name": "Losartan", "category": "Antihypertensive",
                "dosage_form": "Tablet", "strength": "50mg", "unit": "tablet",
                "quantity": 15, "reorder_threshold": 30,
                "expiry_date": days_from(now, 365), "supplier": "MSD", "price": 18.75
            }),
        ],
        ResourceKind::Supplies => vec![
            json!({
                "name": "Sterile Gauze Pads", "category": "Wound Care", "unit": "pack",
                "quantity": 30, "reorder_threshold": 50,
                "expiry_date": days_from(now, 540), "supplier": "MedSupply Co."
            }),
            json!({
                "name": "Disposable Syringe 5ml", "category": "Injection", "unit": "piece",
                "quantity": 500, "reorder_threshold": 100,
                "expiry_date": days_from(now, 300), "supplier": "Terumo"
            }),
            json!({
                "name": "Isopropyl Alcohol 70%", "category": "Disinfectant", "unit": "bottle",
                "quantity": 20, "reorder_threshold": 20,
                "expiry_date": days_from(now, 10), "supplier": "Green Cross"
            }),
        ],
        ResourceKind::Equipment => vec![
            json!({
                "name": "Digital BP Monitor", "type": "Diagnostic", "status": "operational",
                "location": "Triage", "serial_number": "BP-22-0193",
                "purchase_date": "2022-03-14", "last_maintenance": days_from(now, -60)
            }),
            json!({
                "name": "ECG Machine", "type": "Diagnostic", "status": "maintenance",
                "location": "Room 2", "serial_number": "ECG-19-0042",
                "purchase_date": "2019-08-01", "last_maintenance": days_from(now, -7)
            }),
            json!({
                "name": "Nebulizer", "type": "Therapeutic", "status": "operational",
                "location": "Room 1", "serial_number": "NEB-23-1120",
                "purchase_date": "2023-01-20", "last_maintenance": days_from(now, -120)
            }),
        ],
        ResourceKind::Patients => vec![
            json!({
                "first_name": "Juan", "last_name": "Dela Cruz", "middle_name": "Santos",
                "birth_date": "1985-04-12", "sex": "M",
                "contact_number": "09171234567", "address": "Quezon City"
            }),
            json!({
                "first_name": "Maria", "last_name": "Garcia", "middle_name": "Lopez",
                "birth_date": "1992-11-03", "sex": "F",
                "contact_number": "09281234567", "address": "Makati City"
            }),
        ],
        ResourceKind::Consultations => vec![
            json!({
                "patient_id": "1", "physician": "Dr. Maria Santos",
                "consultation_date": days_from(now, -3), "chief_complaint": "Fever and cough",
                "diagnosis": "Acute bronchitis", "treatment": "Amoxicillin 500mg TID x 7 days",
                "notes": "Follow up after one week", "status": "completed"
            }),
            json!({
                "patient_id": "2", "physician": "Dr. Maria Santos",
                "consultation_date": days_from(now, 2), "chief_complaint": "Hypertension follow-up",
                "status": "scheduled"
            }),
        ],
        ResourceKind::AdminUsers => demo_users()
            .map(|user| json!({"name": user.name, "email": user.email, "role": user.role}))
            .collect(),
        ResourceKind::Logs => {
            let at = |hours: i64| format_timestamp(now - Duration::hours(hours));
            vec![
                json!({
                    "user": "admin@clinic.com", "action": "login", "resource_type": "auth",
                    "details": "Admin signed in", "ip_address": "127.0.0.1", "timestamp": at(3)?
                }),
                json!({
                    "user": "doctor@clinic.com", "action": "create", "resource_type": "consultation",
                    "resource_id": "1", "details": "Consultation recorded",
                    "ip_address": "127.0.0.1", "timestamp": at(2)?
                }),
                json!({
                    "user": "nurse@clinic.com", "action": "update", "resource_type": "medicine",
                    "resource_id": "2", "details": "Stock adjusted",
                    "ip_address": "127.0.0.1", "timestamp": at(1)?
                }),
            ]
        }
    };
    Ok(records)
}
