//! Size metrics shown next to every converted document.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable size using binary units, capped at GB.
///
/// Bytes render as an integer count (`"0 B"`, `"1023 B"`); larger units use
/// two decimals (`"1.00 KB"`, `"1.50 MB"`, `"2048.00 GB"`).
pub fn size_label(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Percentage by which `converted_size` is smaller than `original_size`.
///
/// Negative when the extracted text is larger than the source. `None` for a
/// zero-byte source, where the ratio is undefined.
pub fn delta_percent(original_size: u64, converted_size: u64) -> Option<f64> {
    if original_size == 0 {
        return None;
    }
    let original = original_size as f64;
    Some((original - converted_size as f64) * 100.0 / original)
}
