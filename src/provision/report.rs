// ABOUTME: Final result of a provisioning run as returned to callers.
// ABOUTME: Completed when the storefront answered, pending when it was still starting.

use super::AdminPath;
use crate::tenant::Tenant;
use crate::types::TenantId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Completed,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub tenant_id: TenantId,
    pub port: u16,
    pub url: String,
    pub admin_url: String,
    pub admin_folder: String,
    pub admin_folder_detected: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub status: ReportStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl StoreReport {
    pub fn completed(tenant: &Tenant, admin: &AdminPath, host: &str, warnings: Vec<String>) -> Self {
        let message = if admin.is_discovered() {
            "Store created successfully".to_string()
        } else {
            format!(
                "Store created; admin folder not detected, using default '{}'",
                admin.as_str()
            )
        };
        Self::build(
            tenant,
            admin,
            host,
            ReportStatus::Completed,
            message,
            warnings,
        )
    }

    pub fn pending(tenant: &Tenant, attempts: u32, host: &str, warnings: Vec<String>) -> Self {
        let admin = AdminPath::Default(tenant.admin_folder.clone());
        let message = format!(
            "Store containers are running but the storefront did not answer after {attempts} attempts; it may need a few more minutes"
        );
        Self::build(
            tenant,
            &admin,
            host,
            ReportStatus::Pending,
            message,
            warnings,
        )
    }

    fn build(
        tenant: &Tenant,
        admin: &AdminPath,
        host: &str,
        status: ReportStatus,
        message: String,
        warnings: Vec<String>,
    ) -> Self {
        let url = tenant.url(host);
        StoreReport {
            tenant_id: tenant.id,
            port: tenant.port,
            admin_url: format!("{}/{}", url, admin.as_str()),
            url,
            admin_folder: admin.as_str().to_string(),
            admin_folder_detected: admin.is_discovered(),
            admin_email: tenant.credentials.email.clone(),
            admin_password: tenant.credentials.password.clone(),
            status,
            message,
            warnings,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReportStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdminCredentials;
    use std::path::PathBuf;

    fn tenant() -> Tenant {
        Tenant {
            id: TenantId::from_ordinal(2).unwrap(),
            port: 8082,
            dir: PathBuf::from("/tmp/tenant2"),
            credentials: AdminCredentials::new("a@b.com", "pw123"),
            admin_folder: "admin".to_string(),
        }
    }

    #[test]
    fn completed_report_fields() {
        let report = StoreReport::completed(
            &tenant(),
            &AdminPath::Discovered("admin7x2q".into()),
            "203.0.113.7",
            vec![],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["url"], "http://203.0.113.7:8082");
        assert_eq!(json["admin_url"], "http://203.0.113.7:8082/admin7x2q");
        assert_eq!(json["admin_folder"], "admin7x2q");
        assert_eq!(json["admin_folder_detected"], true);
        assert_eq!(json["admin_email"], "a@b.com");
        assert_eq!(json["admin_password"], "pw123");
        assert_eq!(json["tenant_id"], "tenant2");
        assert_eq!(json["port"], 8082);
        assert_eq!(json["status"], "completed");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn pending_report_uses_default_admin_folder() {
        let report = StoreReport::pending(&tenant(), 60, "localhost", vec!["slow".into()]);
        assert!(report.is_pending());
        assert_eq!(report.admin_folder, "admin");
        assert!(!report.admin_folder_detected);
        assert_eq!(report.admin_url, "http://localhost:8082/admin");
        assert_eq!(report.warnings, vec!["slow"]);
    }
}
