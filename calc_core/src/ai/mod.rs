//! # Shop Assistant
//!
//! Client side of the hosted assistant: a streaming chat over server-sent
//! events and a quiz generator. Both are plain HTTPS functions under
//! `{backend}/functions/v1/` authorized with a bearer key.
//!
//! - [`sse`] - Chunk-safe SSE line parser
//! - [`chat`] - `ChatClient` for chat and quiz requests
//! - [`quiz`] - Quiz types and scoring

pub mod chat;
pub mod quiz;
pub mod sse;

pub use chat::{status_error, ChatClient, ChatMessage, ChatRole};
pub use quiz::{Difficulty, Quiz, QuizQuestion, QuizRequest, QuizScore};
pub use sse::{SseEvent, SseParser};
