//! Declarative HTTP contract testing.
//!
//! Scenarios pair a [`RequestDescriptor`] with [`AssertionSpec`]s. The
//! [`ScenarioRunner`] executes them through an injected [`HttpClient`],
//! evaluates every assertion and hands the ordered [`SuiteResult`] to a
//! [`ReportSink`].

pub mod cli;
pub mod collections;
pub mod config;
pub mod environment;
pub mod error;
pub mod http;
pub mod report;
pub mod storage;
pub mod testing;

pub use config::{RunMode, RunOptions};
pub use error::{ErrorKind, ExecutionError, ReportError, SuiteError, TransportError};
pub use http::client::{HttpClient, OutgoingRequest, ReqwestClient, TransportResponse};
pub use http::executor::HttpExecutor;
pub use http::method::HttpMethod;
pub use http::request::RequestDescriptor;
pub use http::response::ResponseCapture;
pub use report::{JsonReporter, ReportSink, TextReporter};
pub use testing::{
    AssertionResult, AssertionSpec, ResultKind, Scenario, ScenarioRunner, SuiteResult, ValueType,
    evaluate,
};
