//! # Utility Functions Module
//!
//! Small helpers shared by the tool invocations and the batch reporting:
//! argument building for external commands and human-readable size math.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// Used to build argument lists for external tools without a `.to_string()`
/// on every element.
///
/// # Example
/// ```rust
/// use upload_optimizer::utils::to_string_vec;
///
/// let quality = 80;
/// let args = to_string_vec(["-q", &quality.to_string(), "-quiet"]);
/// assert_eq!(args, vec!["-q", "80", "-quiet"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds a `Vec<String>` argument list from heterogeneous displayable values.
///
/// ```rust
/// use upload_optimizer::args;
///
/// let level = 7;
/// let args = args!["-quiet", format!("-o{}", level), "-strip", "all"];
/// assert_eq!(args, vec!["-quiet", "-o7", "-strip", "all"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}

/// Human-readable file size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Percentage reduction from `original_size` to `new_size`; negative when the file grew
pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
    if original_size == 0 {
        0.0
    } else {
        ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let num = 42;
        let result = to_string_vec(["--quality", &num.to_string(), "--optimize"]);
        assert_eq!(result, vec!["--quality", "42", "--optimize"]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_args_macro_mixes_types() {
        let quality = 80;
        let result = args!["-q", quality, format!("--max={}", quality)];
        assert_eq!(result, vec!["-q", "80", "--max=80"]);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(calculate_reduction(0, 10), 0.0);
        assert_eq!(calculate_reduction(200, 150), 25.0);
        assert!(calculate_reduction(100, 120) < 0.0);
    }
}
