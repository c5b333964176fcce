//! Pure calculation functions for output sizes.
//!
//! All functions here are pure and testable without any I/O or images.

/// Pick the render target: the matched layout size if any, else the
/// image's own intrinsic size.
///
/// # Examples
/// ```
/// # use theme_resizer::imaging::calculate_target_size;
/// assert_eq!(calculate_target_size(Some((1080, 1720)), (800, 600)), (1080, 1720));
/// assert_eq!(calculate_target_size(None, (1200, 400)), (1200, 400));
/// ```
pub fn calculate_target_size(layout: Option<(u32, u32)>, intrinsic: (u32, u32)) -> (u32, u32) {
    layout.unwrap_or(intrinsic)
}

/// The size export uses: the custom override when enabled, else the size
/// the record was originally rendered at.
pub fn calculate_effective_size(
    is_custom: bool,
    custom: (u32, u32),
    rendered: (u32, u32),
) -> (u32, u32) {
    if is_custom { custom } else { rendered }
}

/// Parse a `WIDTHxHEIGHT` size string (`x` or `X` separator, both parts > 0).
///
/// # Examples
/// ```
/// # use theme_resizer::imaging::parse_size;
/// assert_eq!(parse_size("1080x1720"), Some((1080, 1720)));
/// assert_eq!(parse_size("0x10"), None);
/// ```
pub fn parse_size(text: &str) -> Option<(u32, u32)> {
    let (w, h) = text.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}
