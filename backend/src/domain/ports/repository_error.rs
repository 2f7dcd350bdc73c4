//! Error shared by every persistence port.

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "repository query failed: {message}",
        /// A storage-level uniqueness rule rejected the write.
        Conflict { message: String } =>
            "repository uniqueness violated: {message}",
    }
}
