use serde::{Deserialize, Serialize};

/// 列表查询参数 `?limit=&offset=&q=` / List query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub q: Option<String>,
}

impl PageQuery {
    /// 超出 `1..=max` 的 limit 重置为默认值（不是截断）
    /// A limit outside `1..=max` resets to the default rather than clamping
    pub fn limit_or(&self, default: i64, max: i64) -> i64 {
        match self.limit {
            Some(l) if (1..=max).contains(&l) => l,
            _ => default,
        }
    }

    pub fn offset_or_default(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// 去除空白后的搜索词，空串视为无 / Trimmed search text, empty means none
    pub fn query(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// 分页结果 / One page of items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, limit: i64, offset: i64) -> Self {
        Self {
            items,
            limit,
            offset,
            q: None,
            total: None,
        }
    }

    pub fn with_query(mut self, q: Option<String>) -> Self {
        self.q = q;
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            limit: self.limit,
            offset: self.offset,
            q: self.q,
            total: self.total,
        }
    }
}

/// 总页数，至少为 1 / Total page count, at least 1
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 || total == 0 {
        return 1;
    }
    total.div_ceil(page_size)
}

/// 第 `page` 页（从 1 开始，0 视为 1）的偏移量，溢出时饱和
/// Offset of the 1-based `page` (0 counts as 1), saturating on overflow
pub fn page_offset(page: u64, page_size: i64) -> i64 {
    let skipped = i64::try_from(page.saturating_sub(1)).unwrap_or(i64::MAX);
    skipped.saturating_mul(page_size.max(0))
}
