//! Core trait definitions shared across the workspace.

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}

/// A type with a two-dimensional extent.
pub trait Shaped {
    /// (n_rows, n_cols).
    fn shape(&self) -> (usize, usize);

    /// Number of rows.
    fn n_rows(&self) -> usize {
        self.shape().0
    }

    /// Number of columns.
    fn n_cols(&self) -> usize {
        self.shape().1
    }
}
