//! `/text` body: three plain lines for terminals and scripts.
//!
//! ```text
//! Now: 21.5°C 40.0% | Avg: 21.4°C 40.1%
//! 5m: 21.0°C 39.5% | 10m: -- | 30m: -- | 1h: --
//! Mem low-water: 143.25KB free
//! ```

use alloc::string::String;
use core::fmt::Write;

use super::Snapshot;
use crate::display::PLACEHOLDER;
use crate::memory::Kib;
use crate::storage::Reading;

pub fn status_body(snapshot: &Snapshot<'_>) -> String {
    let mut body = String::new();

    body.push_str("Now: ");
    push_reading(&mut body, snapshot.current);
    body.push_str(" | Avg: ");
    push_reading(&mut body, snapshot.average);
    body.push('\n');

    for (i, entry) in snapshot.lags.entries().iter().enumerate() {
        if i > 0 {
            body.push_str(" | ");
        }
        let _ = write!(body, "{}: ", snapshot.time_base.label_for_buckets(entry.buckets));
        push_reading(&mut body, entry.reading);
    }
    body.push('\n');

    body.push_str("Mem low-water: ");
    match snapshot.memory {
        Some(report) => {
            let _ = write!(body, "{} free", Kib(report.low_water_bytes));
        }
        None => body.push_str(PLACEHOLDER),
    }
    body.push('\n');

    body
}

fn push_reading(body: &mut String, reading: Option<Reading>) {
    match reading {
        Some(reading) => {
            let _ = write!(body, "{}", reading);
        }
        None => body.push_str(PLACEHOLDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryReport;
    use crate::render::fixture;
    use crate::storage::LagSnapshot;
    use alloc::vec::Vec;

    #[test]
    fn test_three_lines_with_placeholders() {
        let store = fixture::store(61, 6);
        let lags = LagSnapshot::compute(&store, &[5, 10, 30, 60]);
        let mut snapshot = fixture::snapshot(&store, &lags);
        snapshot.average = Some(Reading::new(20_250, 40_250));
        snapshot.memory = Some(MemoryReport {
            free_bytes: 4096,
            allocated_bytes: 1024,
            low_water_bytes: 2048,
        });

        let body = status_body(&snapshot);
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(
            lines,
            [
                "Now: 20.5°C 40.5% | Avg: 20.3°C 40.3%",
                "5m: 20.0°C 40.0% | 10m: -- | 30m: -- | 1h: --",
                "Mem low-water: 2.00KB free",
            ]
        );
    }

    #[test]
    fn test_nothing_measured_yet() {
        let store = fixture::store(61, 0);
        let lags = LagSnapshot::compute(&store, &[5]);
        let snapshot = fixture::snapshot(&store, &lags);

        assert_eq!(status_body(&snapshot), "Now: -- | Avg: --\n5m: --\nMem low-water: --\n");
    }
}
