use std::collections::BTreeSet;

/// One entry of a numbered pagination control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Gap,
}

/// Numbered pages to show around `current`: always the first and last page,
/// `siblings` pages on each side of the current one, and a gap wherever more
/// than one page is skipped. A single skipped page is shown instead of a gap.
#[must_use]
pub fn page_window(current: u32, total: u32, siblings: u32) -> Vec<PageSlot> {
    if total == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total);
    let start = current.saturating_sub(siblings).max(1);
    let end = current.saturating_add(siblings).min(total);

    let mut pages: BTreeSet<u32> = (start..=end).collect();
    pages.insert(1);
    pages.insert(total);

    let mut slots = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<u32> = None;
    for page in pages {
        if let Some(prev) = previous {
            match page - prev {
                1 => {}
                2 => slots.push(PageSlot::Page(prev + 1)),
                _ => slots.push(PageSlot::Gap),
            }
        }
        slots.push(PageSlot::Page(page));
        previous = Some(page);
    }

    slots
}

/// Text rendering of a window, with the current page bracketed.
#[must_use]
pub fn render_window(slots: &[PageSlot], current: u32) -> String {
    slots
        .iter()
        .map(|slot| match slot {
            PageSlot::Page(page) if *page == current => format!("[{page}]"),
            PageSlot::Page(page) => page.to_string(),
            PageSlot::Gap => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
