pub struct FileSizeUtils;

impl FileSizeUtils {
    /// Human-readable size with the largest fitting binary unit, e.g. "5 MB".
    pub fn format_size(size: u64) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        let mut value = size as f64;
        let mut unit_index = 0;

        while value >= 1024.0 && unit_index < UNITS.len() - 1 {
            value /= 1024.0;
            unit_index += 1;
        }

        if value.fract() == 0.0 {
            format!("{} {}", value as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", value, UNITS[unit_index])
        }
    }

    /// Size in kilobytes with two decimals, as shown on file cards.
    pub fn format_kilobytes(size: u64) -> String {
        format!("{:.2} KB", size as f64 / 1024.0)
    }
}
