use super::error::{Error, SeqlabResult};
use super::table::Table;
use bimap::BiMap;
use linear_map::LinearMap;
use std::path::Path;

pub const HEADER_NAME: &str = "Name";
pub const HEADER_COLOR: &str = "Color";
pub const HEADER_BARCODE: &str = "Barcode";

/// Barcodes, names and mold colors of the multiplexed samples.
#[derive(Debug, Clone)]
pub struct SampleSheet {
    pub bc_length: usize,
    barcodes: BiMap<String, String>,
    colors: LinearMap<String, String>,
    by_color: LinearMap<String, Vec<String>>,
}

impl SampleSheet {
    /// # Example
    /// ```
    /// let sheet = seqlab::samples::SampleSheet::from_path(".test/samples.txt").unwrap();
    /// assert_eq!(sheet.bc_length, 5);
    /// assert_eq!(sheet.name_for_barcode(b"TACGA"), Some("Tim"));
    /// assert_eq!(sheet.color("Tim"), Some("green"));
    /// assert_eq!(sheet.len(), 4);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> SeqlabResult<SampleSheet> {
        SampleSheet::from_table(&Table::from_path(path)?)
    }

    pub fn from_table(table: &Table) -> SeqlabResult<SampleSheet> {
        let name = table.column(HEADER_NAME)?;
        let color = table.column(HEADER_COLOR)?;
        let barcode = table.column(HEADER_BARCODE)?;
        if table.rows.is_empty() {
            return Err(Error::Invalid(format!("{} lists no samples", table.name)));
        }

        let mut lengths: Vec<usize> = table.rows.iter().map(|r| r[barcode].len()).collect();
        lengths.sort_unstable();
        lengths.dedup();
        if lengths.len() != 1 {
            return Err(Error::BarcodeLength {
                path: table.name.clone(),
                lengths: itertools::join(&lengths, ", "),
            });
        }

        let mut sheet = SampleSheet {
            bc_length: lengths[0],
            barcodes: BiMap::new(),
            colors: LinearMap::new(),
            by_color: LinearMap::new(),
        };
        for row in &table.rows {
            let (bc, nm, col) = (
                row[barcode].to_ascii_uppercase(),
                row[name].clone(),
                row[color].clone(),
            );
            if sheet.barcodes.contains_left(&bc) {
                return Err(Error::Duplicate {
                    path: table.name.clone(),
                    what: "barcode",
                    value: bc,
                });
            }
            if sheet.barcodes.contains_right(&nm) {
                return Err(Error::Duplicate {
                    path: table.name.clone(),
                    what: "sample name",
                    value: nm,
                });
            }
            sheet.barcodes.insert(bc, nm.clone());
            sheet.colors.insert(nm.clone(), col.clone());
            sheet.by_color.entry(col).or_insert_with(Vec::new).push(nm);
        }
        log::debug!(
            "{} samples with {} bp barcodes",
            sheet.len(),
            sheet.bc_length
        );
        Ok(sheet)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn name_for_barcode(&self, barcode: &[u8]) -> Option<&str> {
        let barcode = std::str::from_utf8(barcode).ok()?;
        self.barcodes.get_by_left(barcode).map(String::as_str)
    }

    pub fn barcode_for_name(&self, name: &str) -> Option<&str> {
        self.barcodes.get_by_right(name).map(String::as_str)
    }

    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    /// Sample names in sheet order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }

    /// Colors in first-seen order, each with its samples.
    pub fn by_color(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_color.iter().map(|(c, n)| (c.as_str(), n.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(text: &str) -> SeqlabResult<SampleSheet> {
        SampleSheet::from_table(&Table::from_text("samples", text)?)
    }

    #[test]
    fn test_colors_keep_sheet_order() {
        let s = sheet("Name,Color,Barcode\nA,red,AAC\nB,blue,CCA\nC,red,ggt\n").unwrap();
        let colors: Vec<(&str, &[String])> = s.by_color().collect();
        assert_eq!(colors[0].0, "red");
        assert_eq!(colors[0].1, &["A".to_string(), "C".to_string()]);
        assert_eq!(colors[1].0, "blue");
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(s.barcode_for_name("C"), Some("GGT"));
    }

    #[test]
    fn test_barcode_lengths_must_match() {
        let err = sheet("Name,Color,Barcode\nA,red,AAC\nB,blue,CCAA\n").unwrap_err();
        match err {
            Error::BarcodeLength { lengths, .. } => assert_eq!(lengths, "3, 4"),
            e => panic!("unexpected error {}", e),
        }
    }

    #[test]
    fn test_duplicates_and_empty() {
        assert!(matches!(
            sheet("Name,Color,Barcode\nA,red,AAC\nB,blue,AAC\n"),
            Err(Error::Duplicate { what: "barcode", .. })
        ));
        assert!(matches!(
            sheet("Name,Color,Barcode\nA,red,AAC\nA,blue,CCC\n"),
            Err(Error::Duplicate { what: "sample name", .. })
        ));
        assert!(sheet("Name,Color,Barcode\n").is_err());
        assert!(matches!(
            sheet("Name,Barcode\nA,AAC\n"),
            Err(Error::MissingColumn { .. })
        ));
    }
}
