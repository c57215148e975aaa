//! File Staging - 文件系统参考音频暂存
//!
//! 实现 ResourceStagingPort trait，每个请求一个 `ref_<uuid>.<ext>` 文件

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ResourceStagingPort, StagedResource, StagingError};

/// 文件系统暂存
pub struct FileResourceStaging {
    /// 暂存目录
    base_dir: PathBuf,
}

impl FileResourceStaging {
    /// 创建暂存目录
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, StagingError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StagingError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn staged_path(&self, extension: &str) -> PathBuf {
        // 文件名独立于 request_id，批量请求内部也不会复用
        self.base_dir
            .join(format!("ref_{}.{}", Uuid::new_v4().simple(), extension))
    }
}

#[async_trait]
impl ResourceStagingPort for FileResourceStaging {
    async fn stage(
        &self,
        request_id: Uuid,
        data: &[u8],
        extension: &str,
    ) -> Result<StagedResource, StagingError> {
        let path = self.staged_path(extension);

        if let Err(e) = fs::write(&path, data).await {
            // 写入中途失败时不留下残缺文件
            let _ = fs::remove_file(&path).await;
            return Err(StagingError::IoError(format!(
                "Failed to stage {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(
            request_id = %request_id,
            path = %path.display(),
            size = data.len(),
            "Reference audio staged"
        );

        Ok(StagedResource::new(path, request_id))
    }

    fn release(&self, resource: &StagedResource) -> Result<(), StagingError> {
        // 从 StagingGuard::drop 调用，无法 await，同步删除单个文件
        std::fs::remove_file(resource.path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                StagingError::NotFound(resource.path().display().to_string())
            }
            _ => StagingError::IoError(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let staging = FileResourceStaging::new(dir.path().join("staging")).await.unwrap();
        let request_id = Uuid::new_v4();

        let resource = staging.stage(request_id, b"RIFFdata", "flac").await.unwrap();

        assert_eq!(resource.request_id(), request_id);
        assert!(resource.path().starts_with(staging.base_dir()));
        assert_eq!(resource.path().extension().unwrap(), "flac");
        let name = resource.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ref_"));
        assert_eq!(std::fs::read(resource.path()).unwrap(), b"RIFFdata");

        staging.release(&resource).unwrap();
        assert!(!resource.path().exists());
    }

    #[tokio::test]
    async fn test_same_request_gets_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let staging = FileResourceStaging::new(dir.path()).await.unwrap();
        let request_id = Uuid::new_v4();

        let a = staging.stage(request_id, b"a", "wav").await.unwrap();
        let b = staging.stage(request_id, b"b", "wav").await.unwrap();

        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_release_twice_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let staging = FileResourceStaging::new(dir.path()).await.unwrap();
        let resource = staging.stage(Uuid::new_v4(), b"x", "wav").await.unwrap();

        staging.release(&resource).unwrap();
        assert!(matches!(
            staging.release(&resource),
            Err(StagingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stage_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let staging = FileResourceStaging::new(dir.path().join("gone")).await.unwrap();
        std::fs::remove_dir_all(dir.path().join("gone")).unwrap();

        let result = staging.stage(Uuid::new_v4(), b"x", "wav").await;
        assert!(matches!(result, Err(StagingError::IoError(_))));
    }
}
