use crate::aggregator::Item;

/// One page of the merged feed. `number` is 1-based.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Item>,
    pub number: usize,
    pub total_pages: usize,
}

/// Slice `feed` into its `number`-th page of `page_size` items.
///
/// Page numbers below 1 clamp to 1; numbers past the last page yield an
/// empty item list rather than an error. `page_size` must be at least 1
/// (enforced at config load).
pub fn paginate(feed: &[Item], number: i64, page_size: usize) -> Page {
    let number = number.max(1) as usize;
    let total_pages = feed.len().div_ceil(page_size);

    let start = (number - 1).saturating_mul(page_size).min(feed.len());
    let end = start.saturating_add(page_size).min(feed.len());

    Page {
        items: feed[start..end].to_vec(),
        number,
        total_pages,
    }
}
