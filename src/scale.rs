use anyhow::{bail, Result};

/// Step function from a population total to one of a fixed set of colours.
///
/// A value equal to a breakpoint falls into the bucket *above* it, so with
/// breakpoints `[10_000, 100_000]` the value `100_000` takes `colors[2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale {
    breakpoints: Vec<f64>,
    colors: Vec<String>,
}

impl ThresholdScale {
    pub fn new(breakpoints: Vec<f64>, colors: Vec<String>) -> Result<Self> {
        if colors.len() != breakpoints.len() + 1 {
            bail!(
                "expected {} colours for {} breakpoints, got {}",
                breakpoints.len() + 1,
                breakpoints.len(),
                colors.len()
            );
        }
        if let Some(bad) = breakpoints.iter().find(|b| !b.is_finite()) {
            bail!("breakpoint {} is not a finite number", bad);
        }
        if breakpoints.windows(2).any(|w| w[0] > w[1]) {
            bail!("breakpoints must be in ascending order");
        }
        Ok(Self { breakpoints, colors })
    }

    /// Index of the bucket `value` falls into (bisect right).
    pub fn bucket(&self, value: f64) -> usize {
        self.breakpoints.partition_point(|b| *b <= value)
    }

    pub fn color_for(&self, value: f64) -> &str {
        &self.colors[self.bucket(value)]
    }
}
