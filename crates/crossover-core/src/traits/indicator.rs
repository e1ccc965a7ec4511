//! Indicator trait definition.

/// Trait for technical indicators over a price series.
///
/// Output is aligned index-for-index with the input: `None` where the
/// indicator has no value yet (warmup) or where the window holds a
/// non-finite input.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input data (typically closes, oldest first)
    ///
    /// # Returns
    /// A vector of the same length as `data`
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Get the window length.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
