// ABOUTME: Compose file renderer for a tenant's database and storefront pair.
// ABOUTME: Builds the document from serde structs so values are always quoted correctly.

use super::{
    APPLICATION_CONTAINER_PORT, APPLICATION_SERVICE, DATABASE_SERVICE, RenderError, StackRenderer,
};
use crate::config::{HealthcheckConfig, StackConfig};
use crate::tenant::Tenant;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Serialize)]
struct ComposeFile {
    services: BTreeMap<&'static str, Service>,
    volumes: BTreeMap<String, BTreeMap<String, String>>,
    networks: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct Service {
    image: String,
    container_name: String,
    restart: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    depends_on: BTreeMap<&'static str, DependsOn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    environment: BTreeMap<&'static str, String>,
    volumes: Vec<String>,
    networks: Vec<String>,
    healthcheck: Healthcheck,
}

#[derive(Serialize)]
struct DependsOn {
    condition: &'static str,
}

#[derive(Serialize)]
struct Healthcheck {
    test: Vec<String>,
    interval: String,
    timeout: String,
    retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_period: Option<String>,
}

impl From<&HealthcheckConfig> for Healthcheck {
    fn from(hc: &HealthcheckConfig) -> Self {
        Healthcheck {
            test: hc.test.clone(),
            interval: compose_duration(hc.interval),
            timeout: compose_duration(hc.timeout),
            retries: hc.retries,
            start_period: hc.start_period.map(compose_duration),
        }
    }
}

/// Compose durations follow Go syntax, which has no spaces ("90s", "500ms").
fn compose_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Renders the two-service compose file for one tenant.
#[derive(Debug, Clone)]
pub struct ComposeRenderer {
    stack: StackConfig,
    public_host: String,
}

impl ComposeRenderer {
    pub fn new(stack: StackConfig, public_host: impl Into<String>) -> Self {
        Self {
            stack,
            public_host: public_host.into(),
        }
    }

    fn database(&self, tenant: &Tenant) -> Service {
        let s = &self.stack;
        let environment = BTreeMap::from([
            ("MYSQL_ROOT_PASSWORD", s.database_root_password.clone()),
            ("MYSQL_DATABASE", s.database_name.clone()),
            ("MYSQL_USER", s.database_user.clone()),
            ("MYSQL_PASSWORD", s.database_password.clone()),
        ]);

        Service {
            image: s.database_image.clone(),
            container_name: tenant.id.database_container().into_inner(),
            restart: "unless-stopped",
            depends_on: BTreeMap::new(),
            ports: Vec::new(),
            environment,
            volumes: vec![format!("{}:/var/lib/mysql", tenant.id.database_volume())],
            networks: vec![tenant.id.network()],
            healthcheck: Healthcheck::from(&s.database_healthcheck),
        }
    }

    fn application(&self, tenant: &Tenant) -> Service {
        let s = &self.stack;
        let environment = BTreeMap::from([
            ("DB_SERVER", DATABASE_SERVICE.to_string()),
            ("DB_NAME", s.database_name.clone()),
            ("DB_USER", s.database_user.clone()),
            ("DB_PASSWD", s.database_password.clone()),
            ("PS_INSTALL_AUTO", "1".to_string()),
            ("PS_DEV_MODE", "0".to_string()),
            ("PS_DOMAIN", tenant.domain(&self.public_host)),
            ("PS_LANGUAGE", s.language.clone()),
            ("PS_COUNTRY", s.country.clone()),
            ("PS_FOLDER_ADMIN", s.admin_folder.clone()),
            ("PS_FOLDER_INSTALL", s.install_folder.clone()),
            ("ADMIN_MAIL", tenant.credentials.email.clone()),
            ("ADMIN_PASSWD", tenant.credentials.password.clone()),
        ]);

        Service {
            image: s.application_image.clone(),
            container_name: tenant.id.application_container().into_inner(),
            restart: "unless-stopped",
            depends_on: BTreeMap::from([(
                DATABASE_SERVICE,
                DependsOn {
                    condition: "service_healthy",
                },
            )]),
            ports: vec![format!("{}:{}", tenant.port, APPLICATION_CONTAINER_PORT)],
            environment,
            volumes: vec![format!(
                "{}:{}",
                tenant.id.application_volume(),
                s.document_root
            )],
            networks: vec![tenant.id.network()],
            healthcheck: Healthcheck::from(&s.application_healthcheck),
        }
    }
}

impl StackRenderer for ComposeRenderer {
    fn render(&self, tenant: &Tenant) -> Result<String, RenderError> {
        let file = ComposeFile {
            services: BTreeMap::from([
                (DATABASE_SERVICE, self.database(tenant)),
                (APPLICATION_SERVICE, self.application(tenant)),
            ]),
            volumes: BTreeMap::from([
                (tenant.id.database_volume(), BTreeMap::new()),
                (tenant.id.application_volume(), BTreeMap::new()),
            ]),
            networks: BTreeMap::from([(tenant.id.network(), BTreeMap::new())]),
        };

        Ok(serde_yaml::to_string(&file)?)
    }
}
