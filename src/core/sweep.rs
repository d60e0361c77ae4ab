use crate::error::RooflineError;

/// Default lowest intensity exponent: 2^-4 FLOP/byte.
pub const DEFAULT_START: i32 = -4;
/// Default highest intensity exponent: 2^6 FLOP/byte.
pub const DEFAULT_STOP: i32 = 6;
/// Largest accepted magnitude of a sweep exponent.
pub const MAX_EXPONENT: i32 = 60;

/// `num` points spaced evenly in log2 between `2^start` and `2^stop`,
/// both ends included.
pub fn log2_space(start: f64, stop: f64, num: usize) -> Result<Vec<f64>, RooflineError> {
    if !(start.is_finite() && stop.is_finite()) {
        return Err(RooflineError::invalid(format!(
            "sweep bounds must be finite, got {start}..{stop}"
        )));
    }
    match num {
        0 => Err(RooflineError::invalid("sweep needs at least one point")),
        1 => Ok(vec![start.exp2()]),
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            Ok((0..num)
                .map(|k| (start + k as f64 * step).exp2())
                .collect())
        }
    }
}

/// Intensity sweep with one point per integer exponent between `start` and
/// `stop`, i.e. `|stop - start| + 1` points. Exponents beyond
/// `±MAX_EXPONENT` are rejected.
pub fn intensity_sweep(start: i32, stop: i32) -> Result<Vec<f64>, RooflineError> {
    ensure_exponent("start", start)?;
    ensure_exponent("stop", stop)?;
    let num = start.abs_diff(stop) as usize + 1;
    log2_space(f64::from(start), f64::from(stop), num)
}

/// The default sweep, 2^-4 ..= 2^6.
pub fn default_sweep() -> Vec<f64> {
    (DEFAULT_START..=DEFAULT_STOP)
        .map(|exponent| f64::from(exponent).exp2())
        .collect()
}

pub(crate) fn ensure_exponent(name: &str, exponent: i32) -> Result<(), RooflineError> {
    if exponent.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
        return Err(RooflineError::invalid(format!(
            "sweep {name} exponent {exponent} is outside -{MAX_EXPONENT}..={MAX_EXPONENT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep_spans_eleven_powers_of_two() {
        let sweep = default_sweep();
        assert_eq!(sweep.len(), 11);
        assert_eq!(sweep[0], 0.0625);
        assert_eq!(sweep[4], 1.0);
        assert_eq!(sweep[10], 64.0);
        for pair in sweep.windows(2) {
            assert_eq!(pair[1] / pair[0], 2.0);
        }
    }

    #[test]
    fn custom_bounds() {
        assert_eq!(intensity_sweep(0, 3).unwrap(), vec![1.0, 2.0, 4.0, 8.0]);
        assert_eq!(intensity_sweep(2, 2).unwrap(), vec![4.0]);
        assert_eq!(intensity_sweep(1, -1).unwrap(), vec![2.0, 1.0, 0.5]);
    }

    #[test]
    fn exponents_beyond_limit_are_rejected() {
        assert!(intensity_sweep(i32::MIN, i32::MAX).is_err());
        assert!(intensity_sweep(0, MAX_EXPONENT + 1).is_err());
        assert!(intensity_sweep(-MAX_EXPONENT - 1, 0).is_err());
        assert_eq!(intensity_sweep(-MAX_EXPONENT, MAX_EXPONENT).unwrap().len(), 121);
    }

    #[test]
    fn log2_space_with_custom_point_count() {
        let sweep = log2_space(0.0, 4.0, 3).unwrap();
        assert_eq!(sweep, vec![1.0, 4.0, 16.0]);

        let fine = log2_space(-1.0, 1.0, 5).unwrap();
        assert_eq!(fine.len(), 5);
        assert_eq!(fine[0], 0.5);
        assert_eq!(fine[4], 2.0);
        assert!((fine[1] - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn log2_space_matches_integer_sweep() {
        assert_eq!(
            log2_space(-4.0, 6.0, 11).unwrap(),
            intensity_sweep(DEFAULT_START, DEFAULT_STOP).unwrap()
        );
        assert_eq!(
            default_sweep(),
            intensity_sweep(DEFAULT_START, DEFAULT_STOP).unwrap()
        );
    }

    #[test]
    fn log2_space_rejects_degenerate_input() {
        assert!(log2_space(0.0, 1.0, 0).is_err());
        assert!(log2_space(f64::NAN, 1.0, 4).is_err());
        assert_eq!(log2_space(3.0, 9.0, 1).unwrap(), vec![8.0]);
    }
}
