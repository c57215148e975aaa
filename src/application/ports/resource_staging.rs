//! Resource Staging Port - 上传参考音频的暂存
//!
//! 每个请求独占一个暂存文件；[`StagingGuard`] 保证在任何退出路径上恰好释放一次

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 暂存错误
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Staged file not found: {0}")]
    NotFound(String),
}

/// 已暂存的参考音频
#[derive(Debug)]
pub struct StagedResource {
    path: PathBuf,
    request_id: Uuid,
}

impl StagedResource {
    pub fn new(path: PathBuf, request_id: Uuid) -> Self {
        Self { path, request_id }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

/// Resource Staging Port
#[async_trait]
pub trait ResourceStagingPort: Send + Sync {
    /// 将上传内容写入唯一命名的临时文件
    ///
    /// 不校验音频格式
    async fn stage(
        &self,
        request_id: Uuid,
        data: &[u8],
        extension: &str,
    ) -> Result<StagedResource, StagingError>;

    /// 删除暂存文件
    ///
    /// 在 Drop 中同步调用，实现应只做单次快速删除。
    fn release(&self, resource: &StagedResource) -> Result<(), StagingError>;
}

/// 暂存资源守卫
///
/// 析构时释放资源；释放失败只记录日志，不影响请求结果。
pub struct StagingGuard {
    staging: Arc<dyn ResourceStagingPort>,
    resource: Option<StagedResource>,
}

impl StagingGuard {
    pub fn new(staging: Arc<dyn ResourceStagingPort>, resource: StagedResource) -> Self {
        Self {
            staging,
            resource: Some(resource),
        }
    }

    pub fn path(&self) -> &Path {
        // resource 只在 drop 中取出
        self.resource
            .as_ref()
            .map(StagedResource::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// 立即释放
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };

        match self.staging.release(&resource) {
            Ok(()) => tracing::debug!(
                request_id = %resource.request_id(),
                path = %resource.path().display(),
                "Staged resource released"
            ),
            Err(e) => tracing::warn!(
                request_id = %resource.request_id(),
                path = %resource.path().display(),
                error = %e,
                "Failed to release staged resource"
            ),
        }
    }
}
