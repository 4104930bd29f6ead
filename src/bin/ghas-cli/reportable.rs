use anyhow::Result;
use serde::Serialize;

use crate::args::Reportable;

/// A list of items, shown to humans as a table
pub struct TableReporter<T> {
    pub items: Vec<T>,

    /// Was the listing drained, or cut short by an error?
    pub complete: bool,

    pub titles: &'static [&'static str],
    pub row: fn(&T) -> Vec<String>,
}

impl<T: Serialize> Reportable for TableReporter<T> {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
        use prettytable::{Cell, Row, Table};

        let f = FormatBuilder::new()
            .column_separator(' ')
            .separators(&[LinePosition::Title], LineSeparator::new('─', '─', '─', '─'))
            .padding(1, 1)
            .build();

        let mut table = Table::new();
        table.set_format(f);
        table.set_titles(Row::new(
            self.titles.iter().map(|t| Cell::new(t).style_spec("lb")).collect(),
        ));
        for item in &self.items {
            table.add_row(Row::new((self.row)(item).iter().map(|c| Cell::new(c)).collect()));
        }

        writeln!(writer)?;
        table.print(&mut writer)?;
        writeln!(writer)?;
        writeln!(writer, "{} items", self.items.len())?;
        if !self.complete {
            writeln!(writer, "Listing incomplete: it stopped early because of an error")?;
        }
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.items)?;
        Ok(())
    }

    fn jsonl_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        for item in &self.items {
            serde_json::to_writer(&mut writer, item)?;
            writeln!(&mut writer)?;
        }
        Ok(())
    }
}

/// A single object; humans get its `Display` form
pub struct ObjectReporter<T>(pub T);

impl<T: Serialize + std::fmt::Display> Reportable for ObjectReporter<T> {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", self.0)?;
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.0)?;
        Ok(())
    }

    fn jsonl_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, &self.0)?;
        writeln!(&mut writer)?;
        Ok(())
    }
}

/// Raw JSON from the API, pretty-printed for humans
pub struct JsonReporter(pub serde_json::Value);

impl Reportable for JsonReporter {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.0)?;
        writeln!(writer)?;
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.0)?;
        Ok(())
    }

    fn jsonl_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        match &self.0 {
            serde_json::Value::Array(items) => {
                for item in items {
                    serde_json::to_writer(&mut writer, item)?;
                    writeln!(&mut writer)?;
                }
            }
            other => {
                serde_json::to_writer(&mut writer, other)?;
                writeln!(&mut writer)?;
            }
        }
        Ok(())
    }
}
