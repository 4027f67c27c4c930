//! Test modules for the activity-content pipeline
//!
//! Unit tests for individual components live next to the code they test.
//! The modules here exercise components together: resilience over a client,
//! the OpenAI client over a mock HTTP server and the full pipeline.

pub mod support;

pub mod openai_mock_tests;
