//! 자산 이미지 업로드 협력자.
//!
//! 실제 저장소 연동은 제공되지 않습니다. 기본 구현 [`NoopImageUploader`]는 항상
//! `NotImplemented`를 반환하며, 핸들러는 경고만 기록하고 요청을 계속 처리합니다.

use async_trait::async_trait;
use axum::body::Bytes;

/// multipart에서 받은 이미지 파일.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 업로드 에러.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("이미지 업로드가 구현되지 않았습니다")]
    NotImplemented,
}

/// 이미지 업로드 인터페이스. 성공 시 공개 URL을 반환합니다.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_image(&self, file: ImageFile) -> Result<String, UploadError>;
}

/// 아무것도 저장하지 않는 업로더.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopImageUploader;

#[async_trait]
impl ImageUploader for NoopImageUploader {
    async fn upload_image(&self, _file: ImageFile) -> Result<String, UploadError> {
        Err(UploadError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_uploader_not_implemented() {
        let file = ImageFile {
            file_name: Some("laptop.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"\x89PNG"),
        };
        assert_eq!(file.len(), 4);
        assert!(!file.is_empty());
        assert!(matches!(
            NoopImageUploader.upload_image(file).await,
            Err(UploadError::NotImplemented)
        ));
    }
}
