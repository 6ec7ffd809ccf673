//! The send pipeline: route → intercept → transform → enqueue, with a
//! dead-letter fallback for undeliverable messages.

pub mod dead_letter;
pub mod pipeline;

pub use dead_letter::{DeadLetterStore, DEFAULT_DEAD_LETTER_CAPACITY};
pub use pipeline::{
    DispatchError, Dispatcher, InterceptError, Interceptor, Route, TransformError, Transformer,
};
