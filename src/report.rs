use std::io::Write;

use ndarray::Array2;

use crate::core::roofline::Roofline;

/// Write the achievable performance matrix as CSV: a header row with the
/// intensity sweep, then one row per platform. The normalized matrix, when
/// present, follows with rows labelled `<name> (normalized)`.
pub fn write_table<W: Write>(writer: W, roofline: &Roofline) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["platform".to_string()];
    header.extend(roofline.intensity().iter().map(|i| i.to_string()));
    out.write_record(&header)?;

    write_rows(&mut out, roofline.platforms(), roofline.achievable(), "")?;
    if let Some(normalized) = roofline.normalized() {
        write_rows(&mut out, roofline.platforms(), normalized, " (normalized)")?;
    }

    out.flush()?;
    Ok(())
}

fn write_rows<W: Write>(
    out: &mut csv::Writer<W>,
    names: &[String],
    matrix: &Array2<f64>,
    suffix: &str,
) -> Result<(), csv::Error> {
    for (name, row) in names.iter().zip(matrix.rows()) {
        let mut record = vec![format!("{name}{suffix}")];
        record.extend(row.iter().map(|v| v.to_string()));
        out.write_record(&record)?;
    }
    Ok(())
}
