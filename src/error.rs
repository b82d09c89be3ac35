//! Error taxonomy for search and crafting operations / 搜索与制作操作的错误分类
//!
//! Blank input is not an error (it short-circuits to an empty response),
//! so there is no variant for it. Provider failures carry the underlying
//! `anyhow::Error` from the data-source layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Query contains no CJK characters; the caller should prompt the
    /// user instead of showing an empty list. / 查询不包含中文字符
    #[error("query contains no CJK characters")]
    NotChineseInput,

    /// Cooperative cancellation. Always propagates, never replaced by a
    /// partial result list. / 操作已取消
    #[error("operation cancelled")]
    Cancelled,

    /// A newer request was issued before this one completed; the stale
    /// result is discarded. / 已被更新的请求取代
    #[error("superseded by a newer request")]
    Superseded,

    /// Data-source call failed. Inside the cascade this is recovered by
    /// advancing to the next stage; elsewhere it propagates. / 数据源调用失败
    #[error("provider failure: {0}")]
    Provider(#[source] anyhow::Error),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
