// ABOUTME: Tenant records and the on-disk tenant directory layout.
// ABOUTME: Identities come from the directory count, so they survive restarts.

use crate::runtime::StackFile;
use crate::types::{AdminCredentials, TenantId};
use std::io;
use std::path::{Path, PathBuf};

/// One tenant store being provisioned.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub port: u16,
    pub dir: PathBuf,
    pub credentials: AdminCredentials,
    /// Admin folder name; starts as the configured default and is replaced
    /// once the installer's renamed folder has been discovered.
    pub admin_folder: String,
}

impl Tenant {
    pub fn stack_file(&self) -> StackFile {
        StackFile::new(self.id.project_name(), self.dir.clone())
    }

    /// Storefront base URL as seen from outside the host.
    pub fn url(&self, host: &str) -> String {
        format!("http://{}:{}", host, self.port)
    }

    /// URL for probes issued from this host.
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// `host:port` the storefront is told it lives at.
    pub fn domain(&self, host: &str) -> String {
        format!("{}:{}", host, self.port)
    }
}

/// The directory holding one subdirectory per tenant.
#[derive(Debug, Clone)]
pub struct TenantDirectory {
    root: PathBuf,
}

impl TenantDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: TenantId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Claim the next identity and create its directory.
    ///
    /// The candidate ordinal is the number of existing tenant directories plus
    /// one. If that directory already exists (a gap left by manual cleanup)
    /// the ordinal is bumped until a fresh directory can be created, so a
    /// claimed identity is never shared.
    pub fn claim_next(&self) -> io::Result<(TenantId, PathBuf)> {
        std::fs::create_dir_all(&self.root)?;

        let existing = self.count()?;
        let mut ordinal = u32::try_from(existing)
            .map_err(|_| io::Error::other("too many tenant directories"))?
            .saturating_add(1);

        loop {
            let id = TenantId::from_ordinal(ordinal)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let dir = self.path_for(id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((id, dir)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    ordinal = ordinal
                        .checked_add(1)
                        .ok_or_else(|| io::Error::other("tenant ordinals exhausted"))?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// [`claim_next`](Self::claim_next) on the blocking pool.
    pub async fn claim(&self) -> io::Result<(TenantId, PathBuf)> {
        let dirs = self.clone();
        tokio::task::spawn_blocking(move || dirs.claim_next())
            .await
            .map_err(io::Error::other)?
    }

    /// Directory of an existing tenant, if it was ever provisioned here.
    pub async fn existing(&self, id: TenantId) -> Option<PathBuf> {
        let dir = self.path_for(id);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Some(dir),
            _ => None,
        }
    }

    /// Identities of every tenant directory, sorted by ordinal.
    pub fn list(&self) -> io::Result<Vec<TenantId>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| TenantId::parse(n).ok()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn count(&self) -> io::Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.root)? {
            if entry?.file_type()?.is_dir() {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tenant_is_tenant1() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = TenantDirectory::new(tmp.path().join("tenants"));

        let (id, dir) = dirs.claim_next().unwrap();

        assert_eq!(id.to_string(), "tenant1");
        assert!(dir.is_dir());
        assert_eq!(dir, tmp.path().join("tenants").join("tenant1"));
    }

    #[test]
    fn ordinals_follow_directory_count() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = TenantDirectory::new(tmp.path());

        let (a, _) = dirs.claim_next().unwrap();
        let (b, _) = dirs.claim_next().unwrap();

        assert_eq!(a.ordinal(), 1);
        assert_eq!(b.ordinal(), 2);
        assert_eq!(dirs.list().unwrap(), vec![a, b]);
    }

    #[test]
    fn gap_in_numbering_never_reuses_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("tenant2")).unwrap();
        let dirs = TenantDirectory::new(tmp.path());

        // One directory exists, so the candidate is tenant2, which is taken.
        let (id, _) = dirs.claim_next().unwrap();

        assert_eq!(id.to_string(), "tenant3");
    }

    #[test]
    fn files_and_foreign_names_are_not_tenants() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(tmp.path().join("scratch")).unwrap();
        let dirs = TenantDirectory::new(tmp.path());

        assert!(dirs.list().unwrap().is_empty());
        let (id, _) = dirs.claim_next().unwrap();
        assert_eq!(id.to_string(), "tenant2");
    }

    #[tokio::test]
    async fn existing_finds_only_provisioned_tenants() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = TenantDirectory::new(tmp.path());
        let (id, dir) = dirs.claim().await.unwrap();

        assert_eq!(dirs.existing(id).await, Some(dir));
        assert_eq!(dirs.existing(TenantId::from_ordinal(9).unwrap()).await, None);
    }

    #[tokio::test]
    async fn async_claims_follow_the_same_numbering() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = TenantDirectory::new(tmp.path().join("tenants"));

        let (a, _) = dirs.claim().await.unwrap();
        let (b, _) = dirs.claim().await.unwrap();

        assert_eq!((a.ordinal(), b.ordinal()), (1, 2));
    }

    #[test]
    fn missing_root_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = TenantDirectory::new(tmp.path().join("absent"));
        assert!(dirs.list().unwrap().is_empty());
    }

    #[test]
    fn urls_use_the_assigned_port() {
        let tenant = Tenant {
            id: TenantId::from_ordinal(2).unwrap(),
            port: 8082,
            dir: PathBuf::from("/tmp/tenant2"),
            credentials: AdminCredentials::new("a@b.com", "pw123"),
            admin_folder: "admin".to_string(),
        };
        assert_eq!(tenant.url("203.0.113.7"), "http://203.0.113.7:8082");
        assert_eq!(tenant.domain("203.0.113.7"), "203.0.113.7:8082");
        assert_eq!(tenant.local_url(), "http://127.0.0.1:8082");
        assert_eq!(tenant.stack_file().project, "tenant2");
    }
}
