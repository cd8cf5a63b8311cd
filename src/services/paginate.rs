// src/services/paginate.rs

//! Scroll-to-load pagination.

use std::thread;
use std::time::Duration;

use crate::error::Result;

/// A scrollable page driven by the browser shim.
pub trait ScrollSurface {
    /// Current scrollable height of the page.
    fn page_extent(&mut self) -> Result<u64>;

    fn scroll_to_bottom(&mut self) -> Result<()>;
}

/// Scroll until the page stops growing or `max_scrolls` is reached.
///
/// Returns the number of scrolls performed.
pub fn scroll_until_stable<S: ScrollSurface>(
    surface: &mut S,
    max_scrolls: usize,
    pause: Duration,
) -> Result<usize> {
    let mut last = surface.page_extent()?;
    for scrolls in 1..=max_scrolls {
        surface.scroll_to_bottom()?;
        thread::sleep(pause);

        let extent = surface.page_extent()?;
        log::debug!("Scroll {}: extent {} -> {}", scrolls, last, extent);
        if extent == last {
            return Ok(scrolls);
        }
        last = extent;
    }
    Ok(max_scrolls)
}
