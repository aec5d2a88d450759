/*!
 * Monitoring
 * Structured tracing for engine requests
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_request, RequestSpan};
