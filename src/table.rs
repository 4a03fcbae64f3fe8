use super::error::{Error, SeqlabResult};
use super::myio;
use std::io::Read;
use std::path::Path;

const DELIMITERS: [u8; 4] = [b'\t', b',', b';', b'|'];

/// Guess the delimiter of a small delimited text sample.
///
/// The first candidate that occurs the same, non-zero, number of times on each of the
/// first lines wins. Otherwise the candidate most frequent on the header line is used,
/// and tab when none occurs at all.
/// # Example
/// ```
/// use seqlab::table::sniff_delimiter;
/// assert_eq!(sniff_delimiter("a,b\tc\n1,2\t3\n4,5\t6\n"), b'\t');
/// assert_eq!(sniff_delimiter("Name,Color,Barcode\nTim,green,ACGT\n"), b',');
/// assert_eq!(sniff_delimiter("one column\n1\n"), b'\t');
/// ```
pub fn sniff_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();
    let count = |line: &str, d: u8| line.bytes().filter(|&b| b == d).count();
    let Some(first) = lines.first() else {
        return b'\t';
    };
    for d in DELIMITERS {
        let n = count(first, d);
        if n > 0 && lines.iter().all(|l| count(l, d) == n) {
            return d;
        }
    }
    DELIMITERS
        .iter()
        .copied()
        .filter(|&d| count(first, d) > 0)
        .max_by_key(|&d| count(first, d))
        .unwrap_or(b'\t')
}

/// A delimited text table with a header row, kept as text so that it can be written
/// back unchanged apart from added columns.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// # Example
    /// ```
    /// let t = seqlab::table::Table::from_path(".test/clinical_data.txt").unwrap();
    /// assert_eq!(t.delimiter, b'\t');
    /// assert_eq!(t.rows.len(), 4);
    /// let code = t.column("code_name").unwrap();
    /// assert_eq!(t.rows[0][code], "FOX");
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> SeqlabResult<Table> {
        let path = path.as_ref();
        let mut text = String::new();
        myio::reader(path)?.read_to_string(&mut text)?;
        Table::from_text(&path.display().to_string(), &text)
    }

    pub fn from_text(name: &str, text: &str) -> SeqlabResult<Table> {
        let delimiter = sniff_delimiter(text);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for (idx, rec) in reader.records().enumerate() {
            let rec = rec?;
            if rec.iter().all(str::is_empty) {
                continue;
            }
            if rec.len() != headers.len() {
                return Err(Error::Parse {
                    path: name.to_string(),
                    line: idx + 2,
                    msg: format!("expected {} fields, found {}", headers.len(), rec.len()),
                });
            }
            rows.push(rec.iter().map(str::to_string).collect());
        }
        Ok(Table {
            name: name.to_string(),
            delimiter,
            headers,
            rows,
        })
    }

    /// Index of a header column.
    pub fn column(&self, header: &str) -> SeqlabResult<usize> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| Error::MissingColumn {
                path: self.name.clone(),
                column: header.to_string(),
            })
    }

    /// Values of one column, in row order.
    pub fn values(&self, header: &str) -> SeqlabResult<Vec<&str>> {
        let idx = self.column(header)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Append a column; `values` must have one entry per row.
    pub fn add_column(&mut self, header: &str, values: Vec<String>) -> SeqlabResult<()> {
        if values.len() != self.rows.len() {
            return Err(Error::Invalid(format!(
                "column {} has {} values for {} rows",
                header,
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.push(header.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> SeqlabResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(myio::writer(path)?);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_with_spaces() {
        let t = Table::from_text("t", "code_name\tDiamater (mm)\nFOX\t25\n\n").unwrap();
        assert_eq!(t.values("Diamater (mm)").unwrap(), vec!["25"]);
        assert!(matches!(
            t.column("Status"),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let err = Table::from_text("t", "a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_added_column_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("t.txt");
        let mut t = Table::from_text("t", "a,b\n1,2\n").unwrap();
        t.add_column("c", vec!["3".to_string()]).unwrap();
        t.write(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a,b,c\n1,2,3\n");
        assert!(t.add_column("d", vec![]).is_err());
    }
}
