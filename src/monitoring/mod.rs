/*!
 * Monitoring
 * Structured logging setup for applications embedding the arena pool
 */

mod tracer;

pub use tracer::{init_tracing, try_init_tracing, ENV_TRACE_JSON};
