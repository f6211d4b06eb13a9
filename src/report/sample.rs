// src/report/sample.rs

//! Embedded shapefile sample for the smoke test
//!
//! Five points with two attribute columns, stored base64 encoded. A
//! shapefile is three files sharing a stem: geometry (`.shp`), index
//! (`.shx`) and attributes (`.dbf`).

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fs;
use std::path::{Path, PathBuf};

/// Big-endian file code at offset 0 of every `.shp` and `.shx`
pub const SHAPEFILE_FILE_CODE: i32 = 9994;

const SHP: &str = "
AAAnCgAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAoOgDAAALAAAAAAAAAAAAAAAA
AAAAAADwPwAAAAAAABBAAAAAAAAAFEAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
AAAAAAAAAAAAAAAAAAEAAAASCwAAAAAAAAAAAPA/AAAAAAAA8D8AAAAAAAAA
AAAAAAAAAAAAAAAAAgAAABILAAAAAAAAAAAACEAAAAAAAADwPwAAAAAAAAAA
AAAAAAAAAAAAAAADAAAAEgsAAAAAAAAAAAAQQAAAAAAAAAhAAAAAAAAAAAAA
AAAAAAAAAAAAAAQAAAASCwAAAAAAAAAAAABAAAAAAAAAAEAAAAAAAAAAAAAA
AAAAAAAAAAAABQAAABILAAAAAAAAAAAAAAAAAAAAAAAUQAAAAAAAACJAAAAA
AAAAAEA=
";

const DBF: &str = "
A3IJGgUAAABhAFsAAAAAAAAAAAAAAAAAAAAAAAAAAABGSVJTVF9GTEQAAEMA
AAAAMgAAAAAAAAAAAAAAAAAAAFNFQ09ORF9GTEQAQwAAAAAoAAAAAAAAAAAA
AAAAAAAADSBGaXJzdCAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgIFBvaW50ICAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgU2Vjb25kICAgICAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgICBQb2ludCAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgIFRoaXJkICAgICAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgICAgUG9pbnQgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICBGb3VydGggICAgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgICAgIFBvaW50ICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgQXBwZW5kZWQgICAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAgICAgICAgICBQb2ludCAgICAgICAgICAgICAgICAgICAgICAg
ICAgICAgICAg
";

const SHX: &str = "
AAAnCgAAAAAAAAAAAAAAAAAAAAAAAAAAAAAARugDAAALAAAAAAAAAAAAAAAA
AAAAAADwPwAAAAAAABBAAAAAAAAAFEAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
AAAAAAAAAAAAAAAAADIAAAASAAAASAAAABIAAABeAAAAEgAAAHQAAAASAAAA
igAAABI=
";

fn decode(name: &str, encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.split_whitespace().collect();
    BASE64
        .decode(compact)
        .map_err(|e| Error::ParseError(format!("Embedded sample {} is not valid base64: {}", name, e)))
}

/// Read the big-endian file code of a `.shp` or `.shx` header
pub fn file_code(bytes: &[u8]) -> Option<i32> {
    let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(i32::from_be_bytes(head))
}

/// A shapefile held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapefileSample {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
    pub dbf: Vec<u8>,
}

impl ShapefileSample {
    /// The embedded five-point sample
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            shp: decode("shp", SHP)?,
            shx: decode("shx", SHX)?,
            dbf: decode("dbf", DBF)?,
        })
    }

    /// Same sample with the geometry file code zeroed
    ///
    /// A working loader must reject it.
    pub fn with_corrupt_header(mut self) -> Self {
        for byte in self.shp.iter_mut().take(4) {
            *byte = 0;
        }
        self
    }

    /// Whether the geometry header carries the shapefile file code
    pub fn has_valid_header(&self) -> bool {
        file_code(&self.shp) == Some(SHAPEFILE_FILE_CODE)
    }

    /// Write `<stem>.shp`, `<stem>.shx` and `<stem>.dbf` into `dir`
    ///
    /// Returns the path of the `.shp` file.
    pub fn write_to(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        let shp = dir.join(format!("{}.shp", stem));
        fs::write(&shp, &self.shp)?;
        fs::write(dir.join(format!("{}.shx", stem)), &self.shx)?;
        fs::write(dir.join(format!("{}.dbf", stem)), &self.dbf)?;
        Ok(shp)
    }
}
