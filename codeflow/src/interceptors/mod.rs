//! Interceptors (middleware) around stage execution, and the wrapper that
//! runs a stage through them.

mod chain;
mod instrumented;
mod logging;

pub use chain::{Interceptor, InterceptorChain};
pub use instrumented::InstrumentedStage;
pub use logging::{StateLoggingInterceptor, ENTRY_FIELDS};
