pub mod correlation;

pub use correlation::{CorrelationId, CorrelationIdMiddleware, CORRELATION_HEADER};
