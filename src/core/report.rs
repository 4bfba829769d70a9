use std::io::Write;

use crate::core::record::Record;
use crate::core::Result;

/// Writes a header row and one row per slot: name, status, time, value.
pub fn render(records: &[Record], out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{:>16} | {:>8} | {:>12} | {:<64} |",
        "Name", "Status", "Time", "Value"
    )?;
    for record in records {
        writeln!(
            out,
            "{:>16} | {:>8} | {:>12} | {:<64} |",
            record.name(),
            record.status,
            record.time,
            record.value()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::core::record::{Record, Status};

    #[test]
    fn one_row_per_slot_in_column_order() {
        let mut ready = Record::ready();
        ready.set_name(b"new_worker");
        ready.time = 10;
        ready.set_value(b"done");
        let records = vec![Record::default(), ready];

        let mut out = Vec::new();
        render(&records, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("Name |   Status |"));
        assert!(lines[1].contains("|     None |            0 |"));
        assert!(lines[2].starts_with("      new_worker |    Ready |           10 | done"));
        assert!(lines[2].ends_with(" |"));
        assert_eq!(Status::Ready.as_str(), "Ready");
    }
}
