// ABOUTME: Settings baked into every rendered tenant stack.
// ABOUTME: Images, database credentials, storefront locale and health checks.

use super::HealthcheckConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub database_image: String,
    pub application_image: String,

    pub database_root_password: String,
    pub database_name: String,
    pub database_user: String,
    pub database_password: String,

    /// Admin folder the installer starts from and renames on first request.
    pub admin_folder: String,
    /// Prefix every renamed admin folder keeps.
    pub admin_prefix: String,
    pub install_folder: String,
    /// Web root inside the storefront container.
    pub document_root: String,

    pub language: String,
    pub country: String,

    pub database_healthcheck: HealthcheckConfig,
    pub application_healthcheck: HealthcheckConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            database_image: "mysql:5.7".to_string(),
            application_image: "prestashop/prestashop:8.1.6-apache".to_string(),
            database_root_password: "root".to_string(),
            database_name: "prestashop".to_string(),
            database_user: "psuser".to_string(),
            database_password: "pspassword".to_string(),
            admin_folder: "admin".to_string(),
            admin_prefix: "admin".to_string(),
            install_folder: "install".to_string(),
            document_root: "/var/www/html".to_string(),
            language: "en".to_string(),
            country: "US".to_string(),
            database_healthcheck: HealthcheckConfig::database_default(),
            application_healthcheck: HealthcheckConfig::application_default(),
        }
    }
}
