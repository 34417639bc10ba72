//! A CLI tool for inspecting the contents of a DICOM file.
//! Prints the classic dump tree view of the decoded data set,
//! one line per element, nested sequence items indented with `>`.
//!
//! Usage:
//!
//! ```none
//! dcmdump <file.dcm>
//! ```
use dcmio_core::Dataset;
use dcmio_parser::Parser;
use std::io::{stdout, ErrorKind, Result as IoResult, Write};
use std::process::exit;

type DynResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> DynResult<()> {
    let filename = match std::env::args().nth(1) {
        Some(filename) => filename,
        None => {
            eprintln!("usage: dcmdump <file.dcm>");
            exit(2);
        }
    };

    let dataset = Parser::new().parse_file(&filename)?;

    match dump(&dataset) {
        Err(ref e) if e.kind() == ErrorKind::BrokenPipe => {
            Ok(()) // handle broken pipe separately with a no-op
        }
        Err(e) => Err(e.into()), // raise other errors
        _ => Ok(()),             // all good
    }
}

fn dump(dataset: &Dataset) -> IoResult<()> {
    let mut to = stdout();
    writeln!(to, "# Dicom-File-Format")?;
    writeln!(to)?;
    writeln!(to, "{}", dataset)?;
    Ok(())
}
