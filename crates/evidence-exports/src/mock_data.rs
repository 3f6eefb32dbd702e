//! Simulated platform data for exports.
//!
//! All data in this module is hardcoded and fictional.  `MockSource` stands
//! in for the primary database in demos and tests.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use evidence_contracts::EvidenceResult;

use crate::{
    payload::{
        AuditLogEntry, KycStatus, Transaction, TransactionType, UserRecord, UserRole,
        WalletSnapshot,
    },
    source::{ExportQuery, ExportSource},
};

/// `hour:00 UTC` on the given day of January 2026.  Out-of-range values
/// fall back to the Unix epoch.
pub fn jan_2026(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// An in-memory `ExportSource` seeded with three users, their wallets, and
/// a short audit trail spread over January 2026.
#[derive(Debug, Clone)]
pub struct MockSource {
    pub audit_logs: Vec<AuditLogEntry>,
    pub wallets: Vec<WalletSnapshot>,
    pub users: Vec<UserRecord>,
}

impl MockSource {
    pub fn new() -> Self {
        let admin = Uuid::new_v4().to_string();
        let creator = Uuid::new_v4().to_string();
        let fan = Uuid::new_v4().to_string();

        let users = vec![
            UserRecord {
                uid: admin.clone(),
                display_name: "ops-admin".to_string(),
                email: "ops@example.test".to_string(),
                role: UserRole::Admin,
                email_verified: true,
                verified_creator: false,
                kyc_status: KycStatus::NotStarted,
                created_at: jan_2026(1, 8),
            },
            UserRecord {
                uid: creator.clone(),
                display_name: "lumen".to_string(),
                email: "lumen@example.test".to_string(),
                role: UserRole::Creator,
                email_verified: true,
                verified_creator: true,
                kyc_status: KycStatus::Verified,
                created_at: jan_2026(2, 14),
            },
            UserRecord {
                uid: fan.clone(),
                display_name: "night-owl".to_string(),
                email: "owl@example.test".to_string(),
                role: UserRole::User,
                email_verified: false,
                verified_creator: false,
                kyc_status: KycStatus::Pending,
                created_at: jan_2026(3, 22),
            },
        ];

        let wallets = vec![
            WalletSnapshot {
                user: creator.clone(),
                balance: 455,
                currency: "TOK".to_string(),
                transactions: vec![
                    Transaction {
                        kind: TransactionType::Tip,
                        amount: 500,
                        from: Some(fan.clone()),
                        to: Some(creator.clone()),
                        created_at: jan_2026(6, 20),
                    },
                    Transaction {
                        kind: TransactionType::Fee,
                        amount: 45,
                        from: Some(creator.clone()),
                        to: None,
                        created_at: jan_2026(6, 20),
                    },
                ],
                updated_at: jan_2026(6, 20),
            },
            WalletSnapshot {
                user: fan.clone(),
                balance: 500,
                currency: "TOK".to_string(),
                transactions: vec![
                    Transaction {
                        kind: TransactionType::Credit,
                        amount: 1000,
                        from: None,
                        to: Some(fan.clone()),
                        created_at: jan_2026(4, 12),
                    },
                    Transaction {
                        kind: TransactionType::Tip,
                        amount: 500,
                        from: Some(fan.clone()),
                        to: Some(creator.clone()),
                        created_at: jan_2026(6, 20),
                    },
                ],
                updated_at: jan_2026(6, 20),
            },
        ];

        let entry = |action: &str, target: &str, details, created_at| AuditLogEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            actor: Some(admin.clone()),
            target: Some(target.to_string()),
            details,
            created_at,
        };

        let audit_logs = vec![
            entry("kyc_review", &creator, json!({ "decision": "verified" }), jan_2026(3, 10)),
            entry("content_takedown", "content/8812", json!({ "reason": "copyright" }), jan_2026(5, 9)),
            entry("user_blacklist", &fan, json!({ "reason": "chargeback" }), jan_2026(10, 9)),
            entry("export_users", "users", json!(null), jan_2026(20, 16)),
        ];

        Self {
            audit_logs,
            wallets,
            users,
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSource for MockSource {
    fn audit_logs(&self, query: &ExportQuery) -> EvidenceResult<Vec<AuditLogEntry>> {
        let mut logs: Vec<AuditLogEntry> = self
            .audit_logs
            .iter()
            .filter(|entry| query.contains(&entry.created_at))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(logs)
    }

    fn wallets(&self) -> EvidenceResult<Vec<WalletSnapshot>> {
        Ok(self.wallets.clone())
    }

    fn users(&self) -> EvidenceResult<Vec<UserRecord>> {
        Ok(self.users.clone())
    }
}
