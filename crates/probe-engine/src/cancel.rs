/// Cancellation signal shared between a caller and any number of runs.
///
/// Cloning yields a handle to the same signal. Once cancelled it stays
/// cancelled.
pub type Cancellation = tokio_util::sync::CancellationToken;
