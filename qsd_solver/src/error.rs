use thiserror::Error;

/// Returned when an operand disagrees with the dimension of the initial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    /// The initial state is not an `N x 1` column vector
    #[error("initial state should have dimensions Nx1; got {rows}x{cols}")]
    InitialState { rows: usize, cols: usize },

    /// The initial state has no components
    #[error("initial state is empty")]
    EmptyState,

    /// The Hamiltonian is not `N x N`
    #[error("hamiltonian should have dimensions {expected}x{expected} (same size as the initial state); got {rows}x{cols}")]
    Hamiltonian {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// A coupling operator is not `N x N`
    #[error("coupling operator {index} should have dimensions {expected}x{expected} (same size as the initial state); got {rows}x{cols}")]
    CouplingOperator {
        index: usize,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// An observable is not `N x N`
    #[error("observable {index} should have dimensions {expected}x{expected} (same size as the initial state); got {rows}x{cols}")]
    Observable {
        index: usize,
        expected: usize,
        rows: usize,
        cols: usize,
    },
}

/// Returned by a [`Solver`][crate::solvers::Solver] when integration fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("time grid must contain at least one point")]
    EmptyTimeGrid,

    #[error("time grid must be strictly increasing; t[{index}] = {t} does not exceed the previous sample")]
    NonIncreasingTimeGrid { index: usize, t: f64 },

    #[error("target step must be positive; got {dt}")]
    InvalidStep { dt: f64 },

    #[error("state became non-finite while integrating up to t = {t}")]
    NonFiniteState { t: f64 },
}

/// Returned from [`EnsembleSolver::solve`][crate::ensemble::EnsembleSolver::solve].
#[derive(Debug, Error)]
pub enum QSDError {
    /// [`DimensionError`]
    #[error("dimension mismatch: {0}")]
    Dimension(#[from] DimensionError),

    /// The requested configuration has no implementation
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// [`SolverError`]
    #[error("integration failed: {0}")]
    Solver(#[from] SolverError),
}
