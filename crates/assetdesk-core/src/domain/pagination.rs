//! 페이지네이션 계산.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// 검증된 페이지 요청 (page, limit 모두 1 이상).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// 새 페이지 요청 생성.
    ///
    /// 0 이하의 값은 보정하지 않고 에러로 처리합니다.
    pub fn new(page: i64, limit: i64) -> CoreResult<Self> {
        if page < 1 || limit < 1 {
            return Err(CoreError::InvalidInput(format!(
                "page와 limit은 1 이상이어야 합니다 (page={page}, limit={limit})"
            )));
        }
        let page = u32::try_from(page)
            .map_err(|_| CoreError::InvalidInput(format!("page 범위 초과: {page}")))?;
        let limit = u32::try_from(limit)
            .map_err(|_| CoreError::InvalidInput(format!("limit 범위 초과: {limit}")))?;
        // OFFSET은 BIGINT로 바인딩되므로 i64 범위 안에 있어야 함
        i64::from(page - 1)
            .checked_mul(i64::from(limit))
            .ok_or_else(|| {
                CoreError::InvalidInput(format!("offset 범위 초과 (page={page}, limit={limit})"))
            })?;
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 건너뛸 레코드 수. 생성 시 i64 범위가 보장됩니다.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// 전체 레코드 수에 대한 전체 페이지 수.
    pub fn total_pages(&self, total: u64) -> u64 {
        total_pages(total, self.limit)
    }
}

/// `ceil(total / limit)`.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit)
}

/// 한 페이지 분량의 조회 결과.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.limit)
    }
}
